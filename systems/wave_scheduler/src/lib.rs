#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduler responsible for emitting enemy spawn commands.
//!
//! The scheduler owns one exclusive main stream and any number of parallel
//! streams. Each stream is a queue of [`SpawnEntry`] values whose delays are
//! measured from the previous spawn. Streams never touch the world directly;
//! they emit [`Command::BeginWave`], [`Command::SpawnEnemy`] and
//! [`Command::CompleteWave`] for the world to execute.

use std::{collections::VecDeque, time::Duration};

use log::{debug, info};
use rampart_core::{
    Command, EnemyKind, EnemyView, ParallelWaveId, SpawnStream, WaveError, WaveNumber,
};

const DIFFICULTY_STEP: f32 = 1.2;
const DIFFICULTY_INTERVAL: u32 = 3;
const BASE_WAVE_REWARD: u32 = 20;
const WAVE_REWARD_STEP: u32 = 5;
const DEFAULT_AUTO_WAVE_DELAY: Duration = Duration::from_secs(10);

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    auto_wave: bool,
    auto_wave_delay: Duration,
}

impl Config {
    /// Creates a new configuration using the provided auto-wave settings.
    #[must_use]
    pub const fn new(auto_wave: bool, auto_wave_delay: Duration) -> Self {
        Self {
            auto_wave,
            auto_wave_delay,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(true, DEFAULT_AUTO_WAVE_DELAY)
    }
}

/// Single queued spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnEntry {
    /// Kind of enemy to spawn.
    pub kind: EnemyKind,
    /// Wait after this entry spawns before the next entry is due.
    pub delay: Duration,
}

impl SpawnEntry {
    /// Creates a spawn entry.
    #[must_use]
    pub const fn new(kind: EnemyKind, delay: Duration) -> Self {
        Self { kind, delay }
    }
}

/// Builds the spawn list for the provided wave number.
#[must_use]
pub fn compose_wave(wave: WaveNumber) -> Vec<SpawnEntry> {
    let n = wave.get();
    let mut entries = Vec::new();

    push_group(&mut entries, EnemyKind::Basic, 4 + 2 * n, 1_500);
    if n >= 2 {
        push_group(&mut entries, EnemyKind::Fast, n / 2, 800);
    }
    if n % 3 == 0 {
        push_group(&mut entries, EnemyKind::Tank, n / 3, 2_500);
    }
    if n % 10 == 0 {
        push_group(&mut entries, EnemyKind::Boss, 1, 4_000);
    }

    entries
}

fn push_group(entries: &mut Vec<SpawnEntry>, kind: EnemyKind, count: u32, delay_ms: u64) {
    let entry = SpawnEntry::new(kind, Duration::from_millis(delay_ms));
    entries.extend((0..count).map(|_| entry));
}

/// Money credited when the provided wave completes.
#[must_use]
pub fn wave_reward(wave: WaveNumber) -> u32 {
    BASE_WAVE_REWARD.saturating_add(WAVE_REWARD_STEP.saturating_mul(wave.get()))
}

/// Ordered spawn queue with its own clock.
#[derive(Debug)]
struct SpawnQueue {
    entries: VecDeque<SpawnEntry>,
    elapsed: Duration,
    wait: Duration,
}

impl SpawnQueue {
    fn new(entries: Vec<SpawnEntry>) -> Self {
        Self {
            entries: entries.into(),
            elapsed: Duration::ZERO,
            wait: Duration::ZERO,
        }
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Advances the queue clock and yields every entry that became due.
    ///
    /// Entries with a zero delay chain within the same call; leftover time
    /// carries over to the next due entry.
    fn drain_due(&mut self, dt: Duration) -> Vec<EnemyKind> {
        self.elapsed = self.elapsed.saturating_add(dt);

        let mut due = Vec::new();
        while !self.entries.is_empty() && self.elapsed >= self.wait {
            self.elapsed -= self.wait;
            let Some(entry) = self.entries.pop_front() else {
                break;
            };
            self.wait = entry.delay;
            due.push(entry.kind);
        }

        if self.entries.is_empty() {
            self.elapsed = Duration::ZERO;
        }
        due
    }
}

#[derive(Debug)]
struct MainWave {
    wave: WaveNumber,
    queue: SpawnQueue,
}

#[derive(Debug)]
struct ParallelWave {
    id: ParallelWaveId,
    wave: WaveNumber,
    multiplier: f32,
    queue: SpawnQueue,
}

/// Pure system that sequences waves and emits spawn commands.
#[derive(Debug)]
pub struct WaveScheduler {
    current_wave: WaveNumber,
    difficulty_multiplier: f32,
    main: Option<MainWave>,
    parallel: Vec<ParallelWave>,
    next_parallel_id: u32,
    auto_wave: bool,
    auto_wave_delay: Duration,
    auto_wave_timer: Duration,
}

impl WaveScheduler {
    /// Creates a new scheduler using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            current_wave: WaveNumber::default(),
            difficulty_multiplier: 1.0,
            main: None,
            parallel: Vec::new(),
            next_parallel_id: 0,
            auto_wave: config.auto_wave,
            auto_wave_delay: config.auto_wave_delay,
            auto_wave_timer: Duration::ZERO,
        }
    }

    /// Number of the most recently started wave; zero before the first.
    #[must_use]
    pub fn current_wave(&self) -> WaveNumber {
        self.current_wave
    }

    /// Multiplier baked into newly spawned main-wave enemies.
    #[must_use]
    pub fn difficulty_multiplier(&self) -> f32 {
        self.difficulty_multiplier
    }

    /// Reports whether the exclusive main wave is running.
    #[must_use]
    pub fn is_wave_in_progress(&self) -> bool {
        self.main.is_some()
    }

    /// Number of parallel streams that have not completed.
    #[must_use]
    pub fn active_parallel_waves(&self) -> usize {
        self.parallel.len()
    }

    /// Entries still waiting across every stream.
    #[must_use]
    pub fn queued_spawns(&self) -> usize {
        let main = self.main.as_ref().map_or(0, |main| main.queue.len());
        let parallel: usize = self.parallel.iter().map(|wave| wave.queue.len()).sum();
        main + parallel
    }

    /// Time left before the next main wave starts on its own.
    ///
    /// Returns `None` while auto-wave is disabled or a main wave is running.
    #[must_use]
    pub fn auto_wave_time_remaining(&self) -> Option<Duration> {
        if !self.auto_wave || self.main.is_some() {
            return None;
        }
        Some(self.auto_wave_delay.saturating_sub(self.auto_wave_timer))
    }

    /// Enables or disables the auto-wave countdown, resetting it either way.
    pub fn set_auto_wave(&mut self, enabled: bool) {
        self.auto_wave = enabled;
        self.auto_wave_timer = Duration::ZERO;
    }

    /// Starts the next main wave using its standard composition.
    pub fn start_main_wave(&mut self, out: &mut Vec<Command>) -> Result<WaveNumber, WaveError> {
        if self.main.is_some() {
            return Err(WaveError::WaveInProgress);
        }
        let entries = compose_wave(self.current_wave.next());
        self.start_main_wave_with(entries, out)
    }

    /// Starts the next main wave with an explicit spawn list.
    ///
    /// Entries that are due immediately are emitted before returning.
    pub fn start_main_wave_with(
        &mut self,
        entries: Vec<SpawnEntry>,
        out: &mut Vec<Command>,
    ) -> Result<WaveNumber, WaveError> {
        if self.main.is_some() {
            return Err(WaveError::WaveInProgress);
        }

        let wave = self.advance_wave_counter();
        let stream = SpawnStream::Main;
        info!(
            "starting main wave {wave} with {} spawns at x{:.2}",
            entries.len(),
            self.difficulty_multiplier
        );
        out.push(Command::BeginWave { wave, stream });

        let mut queue = SpawnQueue::new(entries);
        emit_spawns(queue.drain_due(Duration::ZERO), self.difficulty_multiplier, stream, out);
        self.main = Some(MainWave { wave, queue });
        self.auto_wave_timer = Duration::ZERO;
        Ok(wave)
    }

    /// Starts a parallel wave using the standard composition.
    pub fn send_extra_wave(&mut self, out: &mut Vec<Command>) -> WaveNumber {
        let entries = compose_wave(self.current_wave.next());
        self.send_extra_wave_with(entries, out)
    }

    /// Starts a parallel wave with an explicit spawn list.
    ///
    /// The stream keeps the difficulty multiplier in effect right after its
    /// own wave number was assigned.
    pub fn send_extra_wave_with(
        &mut self,
        entries: Vec<SpawnEntry>,
        out: &mut Vec<Command>,
    ) -> WaveNumber {
        let wave = self.advance_wave_counter();
        let id = ParallelWaveId::new(self.next_parallel_id);
        self.next_parallel_id = self.next_parallel_id.wrapping_add(1);
        let stream = SpawnStream::Parallel(id);
        let multiplier = self.difficulty_multiplier;
        info!(
            "sending parallel wave {wave} as {id:?} with {} spawns at x{multiplier:.2}",
            entries.len()
        );
        out.push(Command::BeginWave { wave, stream });

        let mut queue = SpawnQueue::new(entries);
        emit_spawns(queue.drain_due(Duration::ZERO), multiplier, stream, out);
        self.parallel.push(ParallelWave {
            id,
            wave,
            multiplier,
            queue,
        });
        wave
    }

    /// Advances every stream by `dt`, completing finished waves and running
    /// the auto-wave countdown.
    ///
    /// `enemies` must describe the live enemies after this tick's movement.
    pub fn handle(&mut self, dt: Duration, enemies: &EnemyView, out: &mut Vec<Command>) {
        let mut spawned_main = 0;
        if let Some(main) = self.main.as_mut() {
            let due = main.queue.drain_due(dt);
            spawned_main = due.len();
            emit_spawns(due, self.difficulty_multiplier, SpawnStream::Main, out);
        }

        let mut spawned_parallel = 0;
        let mut finished = Vec::new();
        for wave in &mut self.parallel {
            let stream = SpawnStream::Parallel(wave.id);
            let due = wave.queue.drain_due(dt);
            let spawned = due.len();
            spawned_parallel += spawned;
            emit_spawns(due, wave.multiplier, stream, out);

            let alive = enemies.iter().any(|enemy| enemy.stream == stream);
            if wave.queue.is_empty() && spawned == 0 && !alive {
                finished.push(wave.id);
                complete(wave.wave, stream, out);
            }
        }
        self.parallel.retain(|wave| !finished.contains(&wave.id));

        let live = enemies.len() + spawned_main + spawned_parallel;
        let main_finished = self
            .main
            .as_ref()
            .is_some_and(|main| main.queue.is_empty() && live == 0);
        if main_finished {
            if let Some(main) = self.main.take() {
                complete(main.wave, SpawnStream::Main, out);
            }
        }

        self.run_auto_wave(dt, live, out);
    }

    fn run_auto_wave(&mut self, dt: Duration, live: usize, out: &mut Vec<Command>) {
        if !self.auto_wave || self.main.is_some() || live > 0 {
            self.auto_wave_timer = Duration::ZERO;
            return;
        }

        self.auto_wave_timer = self.auto_wave_timer.saturating_add(dt);
        if self.auto_wave_timer < self.auto_wave_delay {
            return;
        }

        debug!("auto-wave countdown expired");
        if let Err(error) = self.start_main_wave(out) {
            debug!("auto-wave skipped: {error}");
        }
    }

    /// Increments the shared wave counter, escalating difficulty on every
    /// third wave.
    fn advance_wave_counter(&mut self) -> WaveNumber {
        self.current_wave = self.current_wave.next();
        if self.current_wave.get() % DIFFICULTY_INTERVAL == 0 {
            self.difficulty_multiplier *= DIFFICULTY_STEP;
        }
        self.current_wave
    }
}

impl Default for WaveScheduler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn emit_spawns(due: Vec<EnemyKind>, multiplier: f32, stream: SpawnStream, out: &mut Vec<Command>) {
    for kind in due {
        debug!("spawning {} on {stream:?}", kind.name());
        out.push(Command::SpawnEnemy {
            kind,
            multiplier,
            stream,
        });
    }
}

fn complete(wave: WaveNumber, stream: SpawnStream, out: &mut Vec<Command>) {
    out.push(Command::CompleteWave {
        wave,
        stream,
        reward: wave_reward(wave),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_count(commands: &[Command]) -> usize {
        commands
            .iter()
            .filter(|command| matches!(command, Command::SpawnEnemy { .. }))
            .count()
    }

    #[test]
    fn fresh_queue_releases_head_immediately() {
        let mut queue = SpawnQueue::new(vec![
            SpawnEntry::new(EnemyKind::Basic, Duration::ZERO),
            SpawnEntry::new(EnemyKind::Fast, Duration::from_secs(1)),
            SpawnEntry::new(EnemyKind::Tank, Duration::ZERO),
        ]);

        assert_eq!(
            queue.drain_due(Duration::ZERO),
            vec![EnemyKind::Basic, EnemyKind::Fast]
        );
        assert!(queue.drain_due(Duration::from_millis(999)).is_empty());
        assert_eq!(queue.drain_due(Duration::from_millis(1)), vec![EnemyKind::Tank]);
        assert!(queue.is_empty());
    }

    #[test]
    fn leftover_time_carries_into_next_entry() {
        let mut queue = SpawnQueue::new(vec![
            SpawnEntry::new(EnemyKind::Basic, Duration::from_secs(1)),
            SpawnEntry::new(EnemyKind::Basic, Duration::from_secs(1)),
            SpawnEntry::new(EnemyKind::Basic, Duration::from_secs(1)),
        ]);

        assert_eq!(queue.drain_due(Duration::ZERO).len(), 1);
        assert_eq!(queue.drain_due(Duration::from_millis(2_500)).len(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn compose_wave_follows_escalation_rules() {
        let count = |entries: &[SpawnEntry], kind: EnemyKind| {
            entries.iter().filter(|entry| entry.kind == kind).count()
        };

        let first = compose_wave(WaveNumber::new(1));
        assert_eq!(first.len(), 6);
        assert_eq!(count(&first, EnemyKind::Basic), 6);

        let sixth = compose_wave(WaveNumber::new(6));
        assert_eq!(count(&sixth, EnemyKind::Basic), 16);
        assert_eq!(count(&sixth, EnemyKind::Fast), 3);
        assert_eq!(count(&sixth, EnemyKind::Tank), 2);
        assert_eq!(count(&sixth, EnemyKind::Boss), 0);

        let tenth = compose_wave(WaveNumber::new(10));
        assert_eq!(count(&tenth, EnemyKind::Tank), 0);
        assert_eq!(count(&tenth, EnemyKind::Boss), 1);
    }

    #[test]
    fn wave_reward_grows_linearly() {
        assert_eq!(wave_reward(WaveNumber::new(1)), 25);
        assert_eq!(wave_reward(WaveNumber::new(4)), 40);
    }

    #[test]
    fn main_wave_is_exclusive() {
        let mut scheduler = WaveScheduler::new(Config::new(false, Duration::ZERO));
        let mut out = Vec::new();

        assert_eq!(scheduler.start_main_wave(&mut out), Ok(WaveNumber::new(1)));
        assert_eq!(
            out.first(),
            Some(&Command::BeginWave {
                wave: WaveNumber::new(1),
                stream: SpawnStream::Main,
            })
        );
        assert_eq!(spawn_count(&out), 1);
        assert!(scheduler.is_wave_in_progress());

        out.clear();
        assert_eq!(
            scheduler.start_main_wave(&mut out),
            Err(WaveError::WaveInProgress)
        );
        assert!(out.is_empty());
        assert_eq!(scheduler.current_wave(), WaveNumber::new(1));
    }

    #[test]
    fn difficulty_escalates_on_every_third_wave_from_any_stream() {
        let mut scheduler = WaveScheduler::new(Config::new(false, Duration::ZERO));
        let mut out = Vec::new();

        let _ = scheduler.start_main_wave_with(Vec::new(), &mut out);
        let _ = scheduler.send_extra_wave_with(Vec::new(), &mut out);
        assert_eq!(scheduler.difficulty_multiplier(), 1.0);

        let third = scheduler.send_extra_wave_with(
            vec![SpawnEntry::new(EnemyKind::Basic, Duration::ZERO)],
            &mut out,
        );
        assert_eq!(third, WaveNumber::new(3));
        assert!((scheduler.difficulty_multiplier() - 1.2).abs() < 1e-6);

        let multiplier = out.iter().rev().find_map(|command| match command {
            Command::SpawnEnemy { multiplier, .. } => Some(*multiplier),
            _ => None,
        });
        assert_eq!(multiplier, Some(scheduler.difficulty_multiplier()));
    }

    #[test]
    fn empty_main_wave_completes_on_next_pass_and_pays_once() {
        let mut scheduler = WaveScheduler::new(Config::new(false, Duration::ZERO));
        let mut out = Vec::new();
        let _ = scheduler.start_main_wave_with(Vec::new(), &mut out);

        out.clear();
        scheduler.handle(Duration::from_millis(16), &EnemyView::default(), &mut out);
        assert_eq!(
            out,
            vec![Command::CompleteWave {
                wave: WaveNumber::new(1),
                stream: SpawnStream::Main,
                reward: 25,
            }]
        );
        assert!(!scheduler.is_wave_in_progress());

        out.clear();
        scheduler.handle(Duration::from_millis(16), &EnemyView::default(), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn final_spawn_holds_completion_until_next_pass() {
        let mut scheduler = WaveScheduler::new(Config::new(false, Duration::ZERO));
        let mut out = Vec::new();
        let _ = scheduler.start_main_wave_with(
            vec![
                SpawnEntry::new(EnemyKind::Basic, Duration::from_secs(1)),
                SpawnEntry::new(EnemyKind::Basic, Duration::from_secs(1)),
            ],
            &mut out,
        );

        out.clear();
        scheduler.handle(Duration::from_secs(1), &EnemyView::default(), &mut out);
        assert_eq!(spawn_count(&out), 1);
        assert!(
            scheduler.is_wave_in_progress(),
            "a spawn emitted this pass keeps the wave alive"
        );
    }

    #[test]
    fn auto_wave_starts_after_quiet_delay() {
        let mut scheduler = WaveScheduler::new(Config::new(true, Duration::from_secs(10)));
        let mut out = Vec::new();

        scheduler.handle(Duration::from_secs(4), &EnemyView::default(), &mut out);
        assert_eq!(
            scheduler.auto_wave_time_remaining(),
            Some(Duration::from_secs(6))
        );
        assert!(out.is_empty());

        scheduler.handle(Duration::from_secs(6), &EnemyView::default(), &mut out);
        assert!(scheduler.is_wave_in_progress());
        assert_eq!(scheduler.current_wave(), WaveNumber::new(1));
        assert_eq!(scheduler.auto_wave_time_remaining(), None);

        scheduler.set_auto_wave(false);
        assert_eq!(scheduler.auto_wave_time_remaining(), None);
    }
}
