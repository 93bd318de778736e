use antcolony_core::{
    Ant, AntMode, ColonyConfig, ControlCommand, Food, Nest, PheromoneKind, Position, Tick,
    WallGrid, WorldSnapshot, WorldState, apply_control_command, signed_angle_difference,
};

fn open_config(seed: u64) -> ColonyConfig {
    ColonyConfig {
        wall_segments: 0,
        initial_food_supplies: 0,
        initial_ants: 0,
        rng_seed: Some(seed),
        ..ColonyConfig::default()
    }
}

fn open_world(config: ColonyConfig) -> WorldState {
    let (cols, rows) = config.validate().expect("config");
    let arena = WallGrid::bordered(cols, rows, config.cell_size as f32).expect("arena");
    let nest = Nest::new(Position::new(400.0, 300.0), config.nest_radius);
    WorldState::with_layout(config, arena, nest).expect("world")
}

fn assert_world_invariants(world: &WorldState, expected_food: u64) {
    let carried = world
        .ants()
        .filter(|(_, ant)| ant.carrying.is_some())
        .count();
    assert_eq!(carried, world.carrying_count());
    assert_eq!(
        world.food_count() as u64 + carried as u64 + world.delivered_total(),
        expected_food,
        "food must be conserved at tick {:?}",
        world.tick()
    );

    for (id, ant) in world.ants() {
        let expected_mode = if ant.carrying.is_some() {
            AntMode::Returning
        } else {
            AntMode::Seeking
        };
        assert_eq!(ant.mode(), expected_mode);
        assert!((0.0..std::f32::consts::TAU).contains(&ant.heading));
        let bucket = world.index().bucket_of(ant.position.x, ant.position.y);
        assert_eq!(ant.bucket(), bucket);
        if let Some(bucket) = bucket {
            assert!(world.index().ants_in(bucket).contains(&id));
        }
    }
    assert_eq!(world.index().ant_count(), world.ant_count());

    let field = world.pheromones();
    let mut indexed = 0;
    for (id, pheromone) in field.iter_active() {
        assert!(pheromone.lifetime >= 1);
        assert!(pheromone.lifetime <= pheromone.initial_lifetime);
        assert!(field.get(id).is_some());
        let bucket = world
            .index()
            .bucket_of(pheromone.position.x, pheromone.position.y);
        assert_eq!(pheromone.bucket, bucket);
        if let Some(bucket) = bucket {
            assert!(world.index().pheromones_in(bucket).contains(&id));
            indexed += 1;
        }
    }
    assert_eq!(world.index().pheromone_count(), indexed);
    assert_eq!(
        field.active_count() + field.pooled_count(),
        field.slot_count()
    );
}

#[test]
fn seeking_ant_walks_to_nearby_food_and_picks_it_up() {
    let mut world = open_world(open_config(1));
    let ant = world.insert_ant(Ant::new(Position::new(400.0, 300.0), 0.0, 0.5));
    world.place_food(Position::new(440.0, 300.0));

    let mut picked_at = None;
    for _ in 0..120 {
        let events = world.step();
        if events.pickups > 0 {
            picked_at = Some(events.tick);
            break;
        }
    }

    let picked_at = picked_at.expect("ant should reach the food");
    assert!(picked_at > Tick(50));
    assert_eq!(world.food_count(), 0);
    assert_eq!(world.carrying_count(), 1);
    assert_eq!(world.ant(ant).expect("ant").mode(), AntMode::Returning);
}

#[test]
fn returning_ant_drops_food_at_nest_edge() {
    // At speed 1 the ant covers the last unit in one tick; the default 0.5
    // takes two, see `returning_ant_at_default_speed_drops_on_third_tick`.
    let config = ColonyConfig {
        ant_speed: 1.0,
        ..open_config(2)
    };
    let mut world = open_world(config);
    let cargo = Food::new(Position::new(600.0, 300.0));
    let ant = world.insert_ant(
        Ant::new(Position::new(431.0, 300.0), std::f32::consts::PI, 1.0).carrying(cargo),
    );

    let first = world.step();
    assert_eq!(first.deliveries, 0);
    let moved = *world.ant(ant).expect("ant");
    assert!((moved.position.x - 430.0).abs() < 1e-3);
    assert_eq!(moved.mode(), AntMode::Returning);

    let second = world.step();
    assert_eq!(second.deliveries, 1);
    assert_eq!(world.delivered_total(), 1);
    let dropped = world.ant(ant).expect("ant");
    assert_eq!(dropped.mode(), AntMode::Seeking);
    // Drop-off ends the update before the ant moves.
    assert_eq!(dropped.position, moved.position);
}

#[test]
fn returning_ant_at_default_speed_drops_on_third_tick() {
    let mut world = open_world(open_config(2));
    let speed = world.config().ant_speed;
    let cargo = Food::new(Position::new(600.0, 300.0));
    let ant = world.insert_ant(
        Ant::new(Position::new(431.0, 300.0), std::f32::consts::PI, speed).carrying(cargo),
    );

    let deliveries: Vec<usize> = (0..3).map(|_| world.step().deliveries).collect();
    assert_eq!(deliveries, vec![0, 0, 1]);
    let dropped = world.ant(ant).expect("ant");
    assert!((dropped.position.x - 430.0).abs() < 1e-3);
    assert_eq!(dropped.mode(), AntMode::Seeking);
}

#[test]
fn first_inserted_ant_wins_contested_food() {
    let mut world = open_world(open_config(7));
    let first = world.insert_ant(Ant::new(Position::new(197.0, 200.0), 0.0, 0.5));
    let second = world.insert_ant(Ant::new(Position::new(203.0, 200.0), 0.0, 0.5));
    // The second ant is closer, but the first one is updated first.
    world.place_food(Position::new(205.0, 200.0));

    let events = world.step();
    assert_eq!(events.pickups, 1);
    assert_eq!(world.food_count(), 0);
    assert_eq!(world.ant(first).expect("first").mode(), AntMode::Returning);
    assert_eq!(world.ant(second).expect("second").mode(), AntMode::Seeking);
}

fn heading_change_after_one_tick(marker: Option<(Position, PheromoneKind)>) -> f32 {
    let mut world = open_world(open_config(8));
    let ant = world.insert_ant(Ant::new(Position::new(200.0, 200.0), 0.0, 0.5));
    if let Some((position, kind)) = marker {
        world.deposit_pheromone(position, kind);
    }
    world.step();
    let heading = world.ant(ant).expect("ant").heading;
    assert!(heading.is_finite());
    signed_angle_difference(heading, 0.0)
}

#[test]
fn seeker_turns_toward_returning_trail() {
    let turn = heading_change_after_one_tick(Some((
        Position::new(200.0, 210.0),
        PheromoneKind::Returning,
    )));
    assert!((turn - 0.2).abs() < 1e-5, "turned {turn}");
}

#[test]
fn seeker_turns_away_from_seeking_trail() {
    let turn = heading_change_after_one_tick(Some((
        Position::new(200.0, 210.0),
        PheromoneKind::Seeking,
    )));
    assert!((turn + 0.2).abs() < 1e-5, "turned {turn}");
}

#[test]
fn negligible_pheromone_signal_falls_back_to_wander() {
    let half_wander = ColonyConfig::default().random_turn_factor * 0.5 + 1e-5;

    // A marker under the ant has no bearing and is skipped.
    let coincident = heading_change_after_one_tick(Some((
        Position::new(200.0, 200.0),
        PheromoneKind::Returning,
    )));
    assert!(coincident.abs() <= half_wander, "turned {coincident}");

    // Near the edge of the sensing radius the pull stays under the threshold.
    let faint = heading_change_after_one_tick(Some((
        Position::new(200.0, 229.9),
        PheromoneKind::Returning,
    )));
    assert!(faint.abs() <= half_wander, "turned {faint}");

    let bare = heading_change_after_one_tick(None);
    assert!(bare.abs() <= half_wander, "turned {bare}");
}

#[test]
fn snapshot_lists_food_supplies() {
    let mut world = open_world(open_config(10));
    world.spawn_food_supply(Position::new(150.0, 120.0));
    let snapshot = world.snapshot();
    assert_eq!(snapshot.food_supplies.len(), 1);
    assert_eq!(snapshot.food_supplies[0].center, Position::new(150.0, 120.0));
    assert_eq!(
        snapshot.food_supplies[0].radius,
        world.config().food_supply_radius
    );
    assert_eq!(snapshot.food.len(), 100);
}

#[test]
fn wall_ahead_forces_a_sharp_turn() {
    let config = open_config(3);
    let (cols, rows) = config.validate().expect("config");
    let mut arena = WallGrid::bordered(cols, rows, 10.0).expect("arena");
    for row in 1..rows - 1 {
        arena.set_wall(50, row, true);
    }
    let nest = Nest::new(Position::new(200.0, 300.0), config.nest_radius);
    let mut world = WorldState::with_layout(config, arena, nest).expect("world");
    let ant = world.insert_ant(Ant::new(Position::new(460.0, 300.0), 0.0, 0.5));

    let events = world.step();
    assert_eq!(events.wall_avoidances, 1);
    let heading = world.ant(ant).expect("ant").heading;
    let turned = signed_angle_difference(heading, 0.0).abs();
    assert!(turned >= 0.19, "turned only {turned}");
    assert!(turned <= world.config().max_turn_rate + 1e-5);
}

#[test]
fn open_ground_never_triggers_wall_avoidance() {
    let mut world = open_world(open_config(4));
    world.insert_ant(Ant::new(Position::new(400.0, 300.0), 1.0, 0.5));
    for _ in 0..50 {
        assert_eq!(world.step().wall_avoidances, 0);
    }
}

#[test]
fn food_is_conserved_while_colony_forages() {
    let config = ColonyConfig {
        initial_ants: 60,
        rng_seed: Some(0xA11CE),
        ..ColonyConfig::default()
    };
    let mut world = WorldState::new(config).expect("world");
    let initial_food = world.food_count() as u64;
    assert_eq!(initial_food, 200);

    for tick in 0..600 {
        world.step();
        if tick % 25 == 0 {
            assert_world_invariants(&world, initial_food);
        }
    }
    assert_world_invariants(&world, initial_food);
    assert_eq!(world.tick(), Tick(600));
}

#[test]
fn expired_pheromone_slots_are_recycled() {
    let config = ColonyConfig {
        seeking_lifetime: 10,
        ..open_config(5)
    };
    let mut world = open_world(config);
    world.insert_ant(Ant::new(Position::new(400.0, 300.0), 0.0, 0.5));

    let mut expired = 0;
    for _ in 0..100 {
        let events = world.step();
        expired += events.pheromones_expired;
        assert!(world.pheromones().active_count() <= 2);
    }
    assert!(expired >= 15);
    assert_eq!(world.pheromones().slot_count(), 2);
    assert!(
        world
            .pheromones()
            .iter_active()
            .all(|(_, p)| p.kind == PheromoneKind::Seeking)
    );
}

#[test]
fn loaded_ant_lays_returning_trail() {
    let mut world = open_world(open_config(6));
    let cargo = Food::new(Position::new(0.0, 0.0));
    world.insert_ant(Ant::new(Position::new(600.0, 300.0), 0.0, 0.5).carrying(cargo));
    for _ in 0..5 {
        world.step();
    }
    let kinds: Vec<PheromoneKind> = world
        .pheromones()
        .iter_active()
        .map(|(_, p)| p.kind)
        .collect();
    assert_eq!(kinds, vec![PheromoneKind::Returning]);
}

#[test]
fn seeded_worlds_evolve_identically() {
    let config = ColonyConfig {
        initial_ants: 30,
        rng_seed: Some(0xDEADBEEF),
        ..ColonyConfig::default()
    };
    let mut a = WorldState::new(config.clone()).expect("world a");
    let mut b = WorldState::new(config).expect("world b");
    assert_eq!(a.snapshot(), b.snapshot());
    for _ in 0..300 {
        assert_eq!(a.step(), b.step());
    }
    assert_eq!(a.snapshot(), b.snapshot());
    let history_a: Vec<_> = a.history().cloned().collect();
    let history_b: Vec<_> = b.history().cloned().collect();
    assert_eq!(history_a, history_b);
}

#[test]
fn control_commands_extend_the_world() {
    let mut world = WorldState::new(ColonyConfig {
        rng_seed: Some(9),
        ..ColonyConfig::default()
    })
    .expect("world");
    let nest = *world.nest();
    apply_control_command(&mut world, ControlCommand::SpawnAnts { count: 10 });
    apply_control_command(&mut world, ControlCommand::SpawnFood { count: 5 });
    apply_control_command(
        &mut world,
        ControlCommand::SpawnFoodSupply { x: 100.0, y: 100.0 },
    );
    assert_eq!(world.ant_count(), 10);
    assert_eq!(world.food_count(), 305);
    assert!(world.ants().all(|(_, ant)| nest.contains(ant.position)));

    let ids: Vec<_> = world.ants().map(|(id, _)| id).collect();
    let extra = world.spawn_ant();
    let order: Vec<_> = world.ants().map(|(id, _)| id).collect();
    assert_eq!(&order[..ids.len()], &ids[..]);
    assert_eq!(order.last(), Some(&extra));
}

#[test]
fn snapshot_serialises_to_json() {
    let mut world = WorldState::new(ColonyConfig {
        initial_ants: 5,
        rng_seed: Some(12),
        ..ColonyConfig::default()
    })
    .expect("world");
    for _ in 0..10 {
        world.step();
    }
    let snapshot = world.snapshot();
    assert_eq!(snapshot.ants.len(), 5);
    assert!(!snapshot.pheromones.is_empty());
    assert_eq!(
        snapshot.pheromones.len(),
        world.pheromones().active_count()
    );
    assert_eq!(snapshot.food.len(), world.food_count());
    assert_eq!(snapshot.walls.cols(), 80);

    let json = serde_json::to_string(&snapshot).expect("serialize");
    let parsed: WorldSnapshot = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(parsed.tick, Tick(10));
    assert_eq!(parsed.ants.len(), 5);
    assert_eq!(parsed.walls.cells().len(), 80 * 60);
}
