use std::time::Duration;

use rampart_core::{Command, EnemyKind, Event, SpawnStream, WaveNumber};
use rampart_system_wave_scheduler::{Config, SpawnEntry, WaveScheduler};
use rampart_world::{self as world, query, World};

fn manual() -> WaveScheduler {
    WaveScheduler::new(Config::new(false, Duration::from_secs(10)))
}

fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn spawned(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::EnemySpawned { .. }))
        .count()
}

fn completions(events: &[Event], stream_filter: impl Fn(SpawnStream) -> bool) -> usize {
    events
        .iter()
        .filter(|event| {
            matches!(event, Event::WaveCompleted { stream, .. } if stream_filter(*stream))
        })
        .count()
}

fn main_starts(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::WaveStarted {
                    stream: SpawnStream::Main,
                    ..
                }
            )
        })
        .count()
}

fn tick(scheduler: &mut WaveScheduler, world: &mut World, dt: Duration) -> Vec<Event> {
    let mut commands = Vec::new();
    scheduler.handle(dt, &query::enemy_view(world), &mut commands);
    apply_all(world, commands)
}

fn escape_everyone(world: &mut World) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::AdvanceEnemies {
            dt: Duration::from_secs(300),
        },
        &mut events,
    );
    assert_eq!(query::enemy_count(world), 0);
}

#[test]
fn ten_spawns_at_fixed_spacing_land_on_schedule() {
    let mut world = World::new();
    let mut scheduler = manual();
    let entries = vec![SpawnEntry::new(EnemyKind::Basic, Duration::from_millis(1_500)); 10];

    let mut commands = Vec::new();
    let _ = scheduler.start_main_wave_with(entries, &mut commands);
    let mut spawn_times = vec![Duration::ZERO; spawned(&apply_all(&mut world, commands))];

    let step = Duration::from_millis(500);
    let mut clock = Duration::ZERO;
    while clock < Duration::from_secs(15) {
        clock += step;
        let mut commands = Vec::new();
        scheduler.handle(step, &query::enemy_view(&world), &mut commands);
        let count = spawned(&apply_all(&mut world, commands));
        spawn_times.extend(std::iter::repeat(clock).take(count));
    }

    let expected: Vec<Duration> = (0..10u64)
        .map(|index| Duration::from_millis(1_500 * index))
        .collect();
    assert_eq!(spawn_times, expected);
    assert_eq!(scheduler.queued_spawns(), 0);
    assert!(
        scheduler.is_wave_in_progress(),
        "live enemies keep the main wave running"
    );
}

#[test]
fn main_wave_completes_once_enemies_are_gone_and_pays_once() {
    let mut world = World::new();
    let mut scheduler = manual();
    let mut commands = Vec::new();
    let wave = scheduler
        .start_main_wave_with(
            vec![SpawnEntry::new(EnemyKind::Fast, Duration::ZERO)],
            &mut commands,
        )
        .expect("no wave in progress");
    let _ = apply_all(&mut world, commands);
    assert_eq!(query::enemy_count(&world), 1);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::AdvanceEnemies {
            dt: Duration::from_secs(60),
        },
        &mut events,
    );
    assert_eq!(query::enemy_count(&world), 0);
    let money_before = query::economy(&world).money();

    let mut completions = 0;
    for _ in 0..3 {
        let mut commands = Vec::new();
        scheduler.handle(
            Duration::from_millis(100),
            &query::enemy_view(&world),
            &mut commands,
        );
        completions += apply_all(&mut world, commands)
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::WaveCompleted {
                        stream: SpawnStream::Main,
                        ..
                    }
                )
            })
            .count();
    }

    assert_eq!(completions, 1);
    assert_eq!(wave, WaveNumber::new(1));
    assert_eq!(query::economy(&world).money(), money_before + 25);
}

#[test]
fn parallel_wave_completes_independently_of_main_wave() {
    let mut world = World::new();
    let mut scheduler = manual();
    let mut commands = Vec::new();
    let _ = scheduler.start_main_wave_with(
        vec![
            SpawnEntry::new(EnemyKind::Tank, Duration::from_secs(30)),
            SpawnEntry::new(EnemyKind::Tank, Duration::ZERO),
        ],
        &mut commands,
    );
    let extra = scheduler.send_extra_wave_with(Vec::new(), &mut commands);
    let _ = apply_all(&mut world, commands);

    let mut commands = Vec::new();
    scheduler.handle(
        Duration::from_millis(100),
        &query::enemy_view(&world),
        &mut commands,
    );
    let events = apply_all(&mut world, commands);

    assert!(events.iter().any(|event| matches!(
        event,
        Event::WaveCompleted { wave, stream: SpawnStream::Parallel(_), .. } if *wave == extra
    )));
    assert!(scheduler.is_wave_in_progress());
    assert_eq!(scheduler.active_parallel_waves(), 0);
}

#[test]
fn parallel_wave_waits_for_its_own_enemies() {
    let mut world = World::new();
    let mut scheduler = manual();
    let mut commands = Vec::new();
    let extra = scheduler.send_extra_wave_with(
        vec![SpawnEntry::new(EnemyKind::Tank, Duration::ZERO)],
        &mut commands,
    );
    let _ = apply_all(&mut world, commands);
    assert_eq!(query::enemy_count(&world), 1);

    let is_parallel = |stream: SpawnStream| matches!(stream, SpawnStream::Parallel(_));
    for _ in 0..5 {
        let events = tick(&mut scheduler, &mut world, Duration::from_millis(100));
        assert_eq!(completions(&events, is_parallel), 0);
    }
    assert_eq!(scheduler.active_parallel_waves(), 1);

    escape_everyone(&mut world);
    let money_before = query::economy(&world).money();

    let mut settled = Vec::new();
    for _ in 0..3 {
        settled.extend(tick(&mut scheduler, &mut world, Duration::from_millis(100)));
    }

    assert_eq!(completions(&settled, is_parallel), 1);
    assert!(settled.iter().any(|event| matches!(
        event,
        Event::WaveCompleted { wave, reward: 25, .. } if *wave == extra
    )));
    assert_eq!(scheduler.active_parallel_waves(), 0);
    assert_eq!(query::economy(&world).money(), money_before + 25);
}

#[test]
fn auto_wave_countdown_holds_while_enemies_are_alive() {
    let mut world = World::new();
    let mut scheduler = WaveScheduler::new(Config::new(true, Duration::from_secs(10)));

    for _ in 0..6 {
        assert_eq!(main_starts(&tick(&mut scheduler, &mut world, Duration::from_secs(1))), 0);
    }
    assert_eq!(
        scheduler.auto_wave_time_remaining(),
        Some(Duration::from_secs(4))
    );

    let mut commands = Vec::new();
    let _ = scheduler.send_extra_wave_with(
        vec![SpawnEntry::new(EnemyKind::Tank, Duration::ZERO)],
        &mut commands,
    );
    let _ = apply_all(&mut world, commands);

    for _ in 0..15 {
        assert_eq!(main_starts(&tick(&mut scheduler, &mut world, Duration::from_secs(1))), 0);
        assert_eq!(
            scheduler.auto_wave_time_remaining(),
            Some(Duration::from_secs(10))
        );
    }
    assert!(!scheduler.is_wave_in_progress());

    escape_everyone(&mut world);
    for _ in 0..9 {
        assert_eq!(main_starts(&tick(&mut scheduler, &mut world, Duration::from_secs(1))), 0);
    }
    assert_eq!(main_starts(&tick(&mut scheduler, &mut world, Duration::from_secs(1))), 1);
    assert!(scheduler.is_wave_in_progress());
    assert_eq!(scheduler.current_wave(), WaveNumber::new(2));
}

#[test]
fn baked_difficulty_survives_later_escalation() {
    let mut world = World::new();
    let mut scheduler = manual();
    let mut commands = Vec::new();

    let _ = scheduler.send_extra_wave_with(Vec::new(), &mut commands);
    let _ = scheduler.send_extra_wave_with(Vec::new(), &mut commands);
    let _ = scheduler.start_main_wave_with(
        vec![SpawnEntry::new(EnemyKind::Basic, Duration::from_secs(60))],
        &mut commands,
    );
    let _ = apply_all(&mut world, commands);

    let enemy = query::enemy_view(&world)
        .into_vec()
        .pop()
        .expect("basic spawned");
    assert_eq!(enemy.max_health, 36.0);

    let mut commands = Vec::new();
    for _ in 0..3 {
        let _ = scheduler.send_extra_wave_with(Vec::new(), &mut commands);
    }
    let _ = apply_all(&mut world, commands);
    assert!(scheduler.difficulty_multiplier() > 1.4);

    let same = query::enemy_view(&world)
        .into_vec()
        .into_iter()
        .find(|snapshot| snapshot.id == enemy.id)
        .expect("enemy still alive");
    assert_eq!(same.max_health, 36.0);
    assert_eq!(same.health, 36.0);
}

#[test]
fn remaining_spawns_count_every_stream() {
    let mut scheduler = manual();
    let mut commands = Vec::new();
    let _ = scheduler.start_main_wave(&mut commands);
    let _ = scheduler.send_extra_wave(&mut commands);

    // Six basics, then eight basics and a fast; each stream released its head.
    assert_eq!(scheduler.queued_spawns(), 5 + 8);
    assert_eq!(scheduler.current_wave(), WaveNumber::new(2));
}
