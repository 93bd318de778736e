use anyhow::{Context, Result, bail};
use antcolony_core::{ColonyConfig, ControlCommand, WorldState, apply_control_command};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "antcolony",
    version,
    about = "Run the ant colony foraging simulation headlessly"
)]
struct Cli {
    /// JSON file with configuration overrides; missing fields keep their defaults.
    #[arg(long, env = "ANTCOLONY_CONFIG")]
    config: Option<PathBuf>,

    /// RNG seed for a reproducible run.
    #[arg(long, env = "ANTCOLONY_SEED")]
    seed: Option<u64>,

    /// Ants spawned in the nest before the first tick.
    #[arg(long, default_value_t = 100)]
    ants: u32,

    /// Extra single food items scattered before the first tick.
    #[arg(long, default_value_t = 0)]
    food: u32,

    /// Extra food supplies, given as `x,y`.
    #[arg(long = "food-supply", value_parser = parse_point)]
    food_supplies: Vec<(f32, f32)>,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 2_000)]
    ticks: u64,

    /// Log a summary every this many ticks (0 disables periodic reports).
    #[arg(long, default_value_t = 250)]
    report_every: u64,

    /// Write the final world snapshot as JSON to this path.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn parse_point(raw: &str) -> Result<(f32, f32), String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{raw}`"))?;
    let x = x.trim().parse::<f32>().map_err(|err| err.to_string())?;
    let y = y.trim().parse::<f32>().map_err(|err| err.to_string())?;
    Ok((x, y))
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let mut world = bootstrap_world(config, &cli)?;
    info!(
        ants = world.ant_count(),
        food = world.food_count(),
        walls = world.arena().wall_count(),
        nest_x = world.nest().position.x,
        nest_y = world.nest().position.y,
        "Starting ant colony simulation"
    );

    run(&mut world, cli.ticks, cli.report_every);

    if let Some(summary) = world.history().last() {
        info!(
            tick = summary.tick.0,
            ants = summary.ant_count,
            free_food = summary.free_food,
            carried = summary.carried_food,
            delivered = summary.delivered_total,
            pheromones = summary.active_pheromones,
            pooled = summary.pooled_pheromones,
            "Simulation finished"
        );
    } else {
        warn!("Simulation finished without recording any ticks");
    }

    if let Some(path) = &cli.snapshot {
        write_snapshot(&world, path)?;
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load_config(cli: &Cli) -> Result<ColonyConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str::<ColonyConfig>(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => ColonyConfig::default(),
    };
    if cli.seed.is_some() {
        config.rng_seed = cli.seed;
    }
    config.initial_ants = cli.ants;
    Ok(config)
}

fn bootstrap_world(config: ColonyConfig, cli: &Cli) -> Result<WorldState> {
    let mut world = WorldState::new(config).context("failed to build world")?;
    if cli.food > 0 {
        apply_control_command(&mut world, ControlCommand::SpawnFood { count: cli.food });
    }
    for &(x, y) in &cli.food_supplies {
        let (width, height) = (
            world.config().world_width as f32,
            world.config().world_height as f32,
        );
        if !(0.0..width).contains(&x) || !(0.0..height).contains(&y) {
            bail!("food supply at ({x}, {y}) lies outside the {width}x{height} world");
        }
        apply_control_command(&mut world, ControlCommand::SpawnFoodSupply { x, y });
    }
    Ok(world)
}

fn run(world: &mut WorldState, ticks: u64, report_every: u64) {
    for _ in 0..ticks {
        let events = world.step();
        if report_every > 0 && events.tick.0.is_multiple_of(report_every) {
            info!(
                tick = events.tick.0,
                free_food = world.food_count(),
                carrying = world.carrying_count(),
                delivered = world.delivered_total(),
                pheromones = world.pheromones().active_count(),
                "progress"
            );
        }
    }
}

fn write_snapshot(world: &WorldState, path: &Path) -> Result<()> {
    let json = serde_json::to_string(&world.snapshot()).context("failed to encode snapshot")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote world snapshot");
    Ok(())
}
