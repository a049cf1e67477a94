#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Presentation-facing facade that drives the Rampart combat simulation.
//!
//! [`Simulation`] owns the authoritative world together with the pure
//! targeting, combat and wave systems, and runs them in a fixed order on
//! every tick: towers act first, then enemies move, then the wave scheduler
//! spawns and settles waves. Presentation layers poll the HUD accessors and
//! drain [`Event`] values after each tick.

mod config;

use std::time::Duration;

use glam::Vec2;
use log::{info, warn};
use rampart_core::{
    CellCoord, Command, EnemyView, Event, PlacementError, RemovalError, TowerId, TowerKind,
    TowerTarget, TowerView, UpgradeError, WaveError, WaveNumber,
};
use rampart_system_tower_combat::TowerCombat;
use rampart_system_tower_targeting::TowerTargeting;
use rampart_system_wave_scheduler::WaveScheduler;
use rampart_world::{self as world, query, World};

pub use config::{ConfigError, SimulationConfig, WaveConfig};
pub use rampart_system_wave_scheduler::SpawnEntry;

/// Lifetime statistics of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionStats {
    /// Enemies killed by towers.
    pub kills: u32,
    /// Health removed from enemies, excluding overkill.
    pub damage_dealt: f64,
}

/// Outcome a placement would have at the hovered position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementPreview {
    /// Cell under the hovered position.
    pub cell: CellCoord,
    /// Centre of that cell, where the tower would stand.
    pub position: Vec2,
    /// Targeting radius of a freshly built tower.
    pub range: f32,
    /// Price of the tower.
    pub cost: u32,
    /// Reason the placement would fail, if any.
    pub blocked_by: Option<PlacementError>,
}

impl PlacementPreview {
    /// Reports whether placing the tower would succeed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.blocked_by.is_none()
    }
}

/// Authoritative simulation together with its systems.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    targeting: TowerTargeting,
    combat: TowerCombat,
    scheduler: WaveScheduler,
    targets: Vec<TowerTarget>,
    commands: Vec<Command>,
    events: Vec<Event>,
    time_scale: f32,
}

impl Simulation {
    /// Builds a session from the provided configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        let scheduler = WaveScheduler::new(config.waves.scheduler_config()?);
        let layout = config.map.unwrap_or_default();
        let world = World::with_config(&layout, config.economy)?;
        info!(
            "simulation ready on a {0}x{0} map with {1} money",
            layout.size,
            query::economy(&world).money()
        );
        Ok(Self::from_parts(world, scheduler))
    }

    fn from_parts(world: World, scheduler: WaveScheduler) -> Self {
        Self {
            world,
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            scheduler,
            targets: Vec::new(),
            commands: Vec::new(),
            events: Vec::new(),
            time_scale: 1.0,
        }
    }

    /// Advances the simulation by `dt`, scaled by the current time scale.
    ///
    /// Does nothing once the base has been destroyed.
    pub fn tick(&mut self, dt: Duration) {
        if self.is_game_over() {
            return;
        }

        let dt = scale_duration(dt, self.time_scale);
        if dt.is_zero() {
            return;
        }

        let towers = query::tower_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.targeting.handle(&towers, &enemies, &mut self.targets);
        let targets = std::mem::take(&mut self.targets);
        self.apply(Command::UpdateTowers { dt, targets });

        self.combat
            .handle(&query::tower_view(&self.world), &mut self.commands);
        self.flush_commands();

        self.apply(Command::AdvanceEnemies { dt });
        if self.is_game_over() {
            warn!("base destroyed during wave {}", self.scheduler.current_wave());
            return;
        }

        self.scheduler
            .handle(dt, &query::enemy_view(&self.world), &mut self.commands);
        self.flush_commands();
    }

    fn apply(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.events);
    }

    fn flush_commands(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }

    /// Applies `command` and returns the first answer `pick` finds among the
    /// events it produced.
    fn apply_and_find<T>(
        &mut self,
        command: Command,
        pick: impl FnMut(&Event) -> Option<T>,
    ) -> Option<T> {
        let start = self.events.len();
        self.apply(command);
        self.events[start..].iter().find_map(pick)
    }

    /// Builds a tower at the cell under `position` if the cell is buildable
    /// and the tower is affordable.
    pub fn create_tower(&mut self, kind: TowerKind, position: Vec2) -> Option<TowerId> {
        let cell = self.world_to_grid(position)?;
        self.place_tower(kind, cell).ok()
    }

    /// Builds a tower on `cell`, paying its build cost.
    pub fn place_tower(&mut self, kind: TowerKind, cell: CellCoord) -> Result<TowerId, PlacementError> {
        self.apply_and_find(Command::PlaceTower { kind, cell }, placement_answer)
            .unwrap_or(Err(PlacementError::OutOfBounds))
    }

    /// Installs a tower on `cell` without charging for it.
    pub fn install_tower(
        &mut self,
        kind: TowerKind,
        cell: CellCoord,
    ) -> Result<TowerId, PlacementError> {
        self.apply_and_find(Command::InstallTower { kind, cell }, placement_answer)
            .unwrap_or(Err(PlacementError::OutOfBounds))
    }

    /// Upgrades a tower, returning the level it reached.
    pub fn upgrade_tower(&mut self, tower: TowerId) -> Result<u8, UpgradeError> {
        self.apply_and_find(Command::UpgradeTower { tower }, |event| match event {
            Event::TowerUpgraded { level, .. } => Some(Ok(*level)),
            Event::TowerUpgradeRejected { reason, .. } => Some(Err(*reason)),
            _ => None,
        })
        .unwrap_or(Err(UpgradeError::MissingTower))
    }

    /// Sells a tower, returning the refund credited.
    ///
    /// The tower's cell is buildable again as soon as this returns.
    pub fn sell_tower(&mut self, tower: TowerId) -> Result<u32, RemovalError> {
        self.apply_and_find(Command::SellTower { tower }, |event| match event {
            Event::TowerSold { refund, .. } => Some(Ok(*refund)),
            Event::TowerRemovalRejected { reason, .. } => Some(Err(*reason)),
            _ => None,
        })
        .unwrap_or(Err(RemovalError::MissingTower))
    }

    /// Removes a tower without a refund.
    pub fn remove_tower(&mut self, tower: TowerId) -> Result<(), RemovalError> {
        self.apply_and_find(Command::RemoveTower { tower }, |event| match event {
            Event::TowerRemoved { .. } => Some(Ok(())),
            Event::TowerRemovalRejected { reason, .. } => Some(Err(*reason)),
            _ => None,
        })
        .unwrap_or(Err(RemovalError::MissingTower))
    }

    /// Starts the next main wave.
    pub fn start_wave(&mut self) -> Result<WaveNumber, WaveError> {
        let wave = self.scheduler.start_main_wave(&mut self.commands)?;
        self.flush_commands();
        Ok(wave)
    }

    /// Starts the next main wave with an explicit spawn list.
    pub fn start_wave_with(&mut self, entries: Vec<SpawnEntry>) -> Result<WaveNumber, WaveError> {
        let wave = self
            .scheduler
            .start_main_wave_with(entries, &mut self.commands)?;
        self.flush_commands();
        Ok(wave)
    }

    /// Sends a parallel wave alongside whatever is already running.
    pub fn send_extra_wave(&mut self) -> WaveNumber {
        let wave = self.scheduler.send_extra_wave(&mut self.commands);
        self.flush_commands();
        wave
    }

    /// Sends a parallel wave with an explicit spawn list.
    pub fn send_extra_wave_with(&mut self, entries: Vec<SpawnEntry>) -> WaveNumber {
        let wave = self
            .scheduler
            .send_extra_wave_with(entries, &mut self.commands);
        self.flush_commands();
        wave
    }

    /// Enables or disables automatic main waves.
    pub fn set_auto_wave(&mut self, enabled: bool) {
        self.scheduler.set_auto_wave(enabled);
    }

    /// Sets the multiplier applied to every `dt` passed to [`Simulation::tick`].
    ///
    /// Zero pauses the simulation. Negative or non-finite values are ignored.
    pub fn set_time_scale(&mut self, scale: f32) {
        if !scale.is_finite() || scale < 0.0 {
            warn!("ignoring invalid time scale {scale}, keeping {}", self.time_scale);
            return;
        }
        self.time_scale = scale;
    }

    /// Current time scale.
    #[must_use]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Takes every event produced since the previous call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Converts a world position into the containing cell.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec2) -> Option<CellCoord> {
        query::world_to_grid(&self.world, position)
    }

    /// World position of the cell centre.
    #[must_use]
    pub fn grid_to_world(&self, cell: CellCoord) -> Vec2 {
        query::grid_to_world(&self.world, cell)
    }

    /// Reports whether `cell` is buildable, ignoring funds.
    #[must_use]
    pub fn can_place_tower(&self, cell: CellCoord) -> bool {
        query::can_place_tower(&self.world, cell)
    }

    /// Describes what placing `kind` at `position` would do.
    ///
    /// Returns `None` when the position lies outside the grid.
    #[must_use]
    pub fn placement_preview(&self, kind: TowerKind, position: Vec2) -> Option<PlacementPreview> {
        let cell = self.world_to_grid(position)?;
        let cost = kind.build_cost();
        let blocked_by = if !self.can_place_tower(cell) {
            Some(PlacementError::Occupied)
        } else if self.money() < cost {
            Some(PlacementError::InsufficientFunds)
        } else {
            None
        };

        Some(PlacementPreview {
            cell,
            position: self.grid_to_world(cell),
            range: kind.base_stats().range,
            cost,
            blocked_by,
        })
    }

    /// World-space waypoints enemies follow.
    #[must_use]
    pub fn path(&self) -> &[Vec2] {
        query::path(&self.world)
    }

    /// Banner adapters may show on startup.
    #[must_use]
    pub fn welcome_banner(&self) -> &'static str {
        query::welcome_banner(&self.world)
    }

    /// Remaining base health.
    #[must_use]
    pub fn health(&self) -> u32 {
        query::economy(&self.world).health()
    }

    /// Upper bound for base health.
    #[must_use]
    pub fn max_health(&self) -> u32 {
        query::economy(&self.world).max_health()
    }

    /// Money available for purchases.
    #[must_use]
    pub fn money(&self) -> u32 {
        query::economy(&self.world).money()
    }

    /// Number of the most recently started wave.
    #[must_use]
    pub fn current_wave(&self) -> WaveNumber {
        self.scheduler.current_wave()
    }

    /// Multiplier baked into newly spawned main-wave enemies.
    #[must_use]
    pub fn difficulty_multiplier(&self) -> f32 {
        self.scheduler.difficulty_multiplier()
    }

    /// Reports whether the exclusive main wave is running.
    #[must_use]
    pub fn is_wave_in_progress(&self) -> bool {
        self.scheduler.is_wave_in_progress()
    }

    /// Time left before the next automatic main wave, if one is pending.
    #[must_use]
    pub fn auto_wave_time_remaining(&self) -> Option<Duration> {
        self.scheduler.auto_wave_time_remaining()
    }

    /// Queued spawns across every stream plus enemies still alive.
    #[must_use]
    pub fn remaining_enemies_in_wave(&self) -> usize {
        self.scheduler.queued_spawns() + query::enemy_count(&self.world)
    }

    /// Kills and damage dealt so far.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        let economy = query::economy(&self.world);
        SessionStats {
            kills: economy.total_kills(),
            damage_dealt: economy.total_damage_dealt(),
        }
    }

    /// Snapshot of every tower.
    #[must_use]
    pub fn towers(&self) -> TowerView {
        query::tower_view(&self.world)
    }

    /// Snapshot of every live enemy.
    #[must_use]
    pub fn enemies(&self) -> EnemyView {
        query::enemy_view(&self.world)
    }

    /// Reports whether the base has been destroyed.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        query::economy(&self.world).is_defeated()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::from_parts(World::new(), WaveScheduler::default())
    }
}

fn placement_answer(event: &Event) -> Option<Result<TowerId, PlacementError>> {
    match event {
        Event::TowerPlaced { tower, .. } => Some(Ok(*tower)),
        Event::TowerPlacementRejected { reason, .. } => Some(Err(*reason)),
        _ => None,
    }
}

fn scale_duration(dt: Duration, scale: f32) -> Duration {
    if scale == 1.0 {
        return dt;
    }
    Duration::try_from_secs_f64(dt.as_secs_f64() * f64::from(scale)).unwrap_or(Duration::ZERO)
}
