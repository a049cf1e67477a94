#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rampart combat simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems and adapters submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that presentation layers and systems react to. Systems consume immutable
//! views such as [`EnemyView`] and [`TowerView`] and respond exclusively with
//! new command batches.

use std::{fmt, str::FromStr, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Rampart stands. Hold the line.";

/// Highest level a tower can be upgraded to.
pub const MAX_TOWER_LEVEL: u8 = 3;

/// Share of every purchase that is refunded when a tower is sold.
pub const SELL_REFUND_PERCENT: u32 = 70;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests a paid tower placement on the provided cell.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Cell that will host the tower.
        cell: CellCoord,
    },
    /// Installs a tower without charging for it.
    ///
    /// Used by fusion collaborators that replace consumed towers with a hybrid.
    InstallTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Cell that will host the tower.
        cell: CellCoord,
    },
    /// Requests that a tower advance to its next level.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Sells a tower, refunding its accumulated sell value.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Removes a tower without any refund.
    RemoveTower {
        /// Identifier of the tower to remove.
        tower: TowerId,
    },
    /// Assigns freshly computed targets and charges tower cooldowns.
    UpdateTowers {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Nearest-enemy assignments computed for this tick.
        targets: Vec<TowerTarget>,
    },
    /// Requests that a charged tower fire at its current target.
    FireTower {
        /// Tower that fires.
        tower: TowerId,
        /// Enemy the shot is aimed at.
        target: EnemyId,
    },
    /// Moves enemies along the route and ticks their status effects.
    AdvanceEnemies {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a spawn stream became active.
    BeginWave {
        /// Wave number assigned to the stream.
        wave: WaveNumber,
        /// Stream that carries the wave.
        stream: SpawnStream,
    },
    /// Requests that a new enemy enter the route.
    SpawnEnemy {
        /// Kind of enemy to create.
        kind: EnemyKind,
        /// Difficulty multiplier baked into the enemy's stats.
        multiplier: f32,
        /// Stream responsible for the spawn.
        stream: SpawnStream,
    },
    /// Credits the reward of a completed wave.
    CompleteWave {
        /// Wave that completed.
        wave: WaveNumber,
        /// Stream that carried the wave.
        stream: SpawnStream,
        /// Money credited for completing the wave.
        reward: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Cell occupied by the tower.
        cell: CellCoord,
        /// Money spent on the placement.
        cost: u32,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower advanced a level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Level reached by the upgrade.
        level: u8,
        /// Money spent on the upgrade.
        cost: u32,
    },
    /// Reports that an upgrade request was rejected.
    TowerUpgradeRejected {
        /// Identifier of the tower targeted for upgrade.
        tower: TowerId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Identifier of the sold tower.
        tower: TowerId,
        /// Cell freed by the sale.
        cell: CellCoord,
        /// Money credited for the sale.
        refund: u32,
    },
    /// Confirms that a tower was removed without a refund.
    TowerRemoved {
        /// Identifier of the removed tower.
        tower: TowerId,
        /// Cell freed by the removal.
        cell: CellCoord,
    },
    /// Reports that a sale or removal request was rejected.
    TowerRemovalRejected {
        /// Identifier of the tower targeted for removal.
        tower: TowerId,
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Confirms that a tower fired a shot.
    TowerFired {
        /// Tower that fired.
        tower: TowerId,
        /// Enemy that was hit.
        target: EnemyId,
    },
    /// Confirms that an enemy entered the route.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Kind of enemy that spawned.
        kind: EnemyKind,
        /// Stream responsible for the spawn.
        stream: SpawnStream,
        /// World position of the spawn point.
        position: Vec2,
    },
    /// Reports damage dealt to an enemy.
    EnemyDamaged {
        /// Enemy that took damage.
        enemy: EnemyId,
        /// World position of the enemy when hit.
        position: Vec2,
        /// Health removed by the hit.
        amount: f32,
        /// Element of the tower that dealt the damage.
        element: Element,
    },
    /// Reports that an enemy was killed by tower fire.
    EnemyKilled {
        /// Enemy that died.
        enemy: EnemyId,
        /// Kind of enemy that died.
        kind: EnemyKind,
        /// World position of the enemy when it died.
        position: Vec2,
        /// Money credited for the kill.
        reward: u32,
    },
    /// Reports that an enemy reached the end of the route.
    EnemyReachedEnd {
        /// Enemy that escaped.
        enemy: EnemyId,
        /// Kind of enemy that escaped.
        kind: EnemyKind,
        /// Health removed from the base.
        damage: u32,
    },
    /// Announces that a spawn stream started.
    WaveStarted {
        /// Wave number assigned to the stream.
        wave: WaveNumber,
        /// Stream that carries the wave.
        stream: SpawnStream,
    },
    /// Announces that a wave completed and its reward was credited.
    WaveCompleted {
        /// Wave that completed.
        wave: WaveNumber,
        /// Stream that carried the wave.
        stream: SpawnStream,
        /// Money credited for the completion.
        reward: u32,
    },
    /// Announces that base health reached zero.
    BaseDestroyed,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One-based wave counter shared by main and parallel waves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaveNumber(u32);

impl WaveNumber {
    /// Creates a new wave number.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric wave value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the wave that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for WaveNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a parallel spawn stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParallelWaveId(u32);

impl ParallelWaveId {
    /// Creates a new parallel wave identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Spawn stream responsible for an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnStream {
    /// The single exclusive main wave.
    Main,
    /// An independently clocked parallel wave.
    Parallel(ParallelWaveId),
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Damage element carried by tower shots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    /// Plain kinetic damage.
    Physical,
    /// Fire damage.
    Fire,
    /// Ice damage, usually paired with slowing effects.
    Ice,
    /// Lightning damage, usually paired with stuns.
    Lightning,
}

/// Time-boxed status effect applied by a tower hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StatusEffect {
    /// Multiplies movement speed by `factor` for `duration`.
    Slow {
        /// Speed multiplier in the range `0.0..=1.0`.
        factor: f32,
        /// How long the slow lasts.
        duration: Duration,
    },
    /// Halts movement entirely for `duration`.
    Freeze {
        /// How long the freeze lasts.
        duration: Duration,
    },
    /// Halts movement entirely for `duration`.
    Stun {
        /// How long the stun lasts.
        duration: Duration,
    },
}

/// Base statistics of an enemy kind before difficulty scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Hit points at spawn.
    pub health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Health removed from the base when the enemy escapes.
    pub damage: u32,
    /// Money credited when the enemy is killed.
    pub reward: u32,
}

/// Kinds of enemies that can walk the route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Baseline walker.
    Basic,
    /// Fragile runner.
    Fast,
    /// Slow, durable walker.
    Tank,
    /// Rare, extremely durable walker.
    Boss,
}

impl EnemyKind {
    /// Every enemy kind in declaration order.
    pub const ALL: [EnemyKind; 4] = [Self::Basic, Self::Fast, Self::Tank, Self::Boss];

    /// Returns the unscaled statistics of the kind.
    #[must_use]
    pub const fn base_stats(self) -> EnemyStats {
        match self {
            Self::Basic => EnemyStats {
                health: 30.0,
                speed: 2.0,
                damage: 1,
                reward: 10,
            },
            Self::Fast => EnemyStats {
                health: 20.0,
                speed: 3.5,
                damage: 1,
                reward: 12,
            },
            Self::Tank => EnemyStats {
                health: 100.0,
                speed: 1.2,
                damage: 3,
                reward: 25,
            },
            Self::Boss => EnemyStats {
                health: 500.0,
                speed: 0.8,
                damage: 10,
                reward: 100,
            },
        }
    }

    /// Lowercase name used by adapters and configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Fast => "fast",
            Self::Tank => "tank",
            Self::Boss => "boss",
        }
    }
}

impl FromStr for EnemyKind {
    type Err = UnknownKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownKindError(value.to_owned()))
    }
}

/// Combat statistics of a tower at a given level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerLevelStats {
    /// Damage dealt per shot.
    pub damage: f32,
    /// Targeting radius in world units.
    pub range: f32,
    /// Shots fired per second.
    pub fire_rate: f32,
}

impl TowerLevelStats {
    const fn new(damage: f32, range: f32, fire_rate: f32) -> Self {
        Self {
            damage,
            range,
            fire_rate,
        }
    }

    /// Simulated time that must elapse between two shots.
    #[must_use]
    pub fn fire_period(&self) -> Duration {
        if self.fire_rate <= 0.0 || !self.fire_rate.is_finite() {
            return Duration::MAX;
        }
        Duration::from_secs_f32(1.0 / self.fire_rate)
    }
}

const BASIC_LEVELS: [TowerLevelStats; 3] = [
    TowerLevelStats::new(10.0, 6.0, 1.0),
    TowerLevelStats::new(15.0, 7.0, 1.2),
    TowerLevelStats::new(22.0, 8.0, 1.5),
];
const FIRE_LEVELS: [TowerLevelStats; 3] = [
    TowerLevelStats::new(14.0, 5.0, 0.8),
    TowerLevelStats::new(20.0, 6.0, 1.0),
    TowerLevelStats::new(30.0, 7.0, 1.2),
];
const ICE_LEVELS: [TowerLevelStats; 3] = [
    TowerLevelStats::new(6.0, 5.0, 0.8),
    TowerLevelStats::new(9.0, 6.0, 0.9),
    TowerLevelStats::new(12.0, 7.0, 1.0),
];
const LIGHTNING_LEVELS: [TowerLevelStats; 3] = [
    TowerLevelStats::new(12.0, 7.0, 0.6),
    TowerLevelStats::new(18.0, 8.0, 0.7),
    TowerLevelStats::new(26.0, 9.0, 0.8),
];
const STEAM_LEVELS: [TowerLevelStats; 3] = [
    TowerLevelStats::new(18.0, 6.0, 1.0),
    TowerLevelStats::new(26.0, 7.0, 1.1),
    TowerLevelStats::new(36.0, 8.0, 1.2),
];
const PLASMA_LEVELS: [TowerLevelStats; 3] = [
    TowerLevelStats::new(26.0, 6.0, 0.8),
    TowerLevelStats::new(36.0, 7.0, 0.9),
    TowerLevelStats::new(50.0, 8.0, 1.0),
];
const BLIZZARD_LEVELS: [TowerLevelStats; 3] = [
    TowerLevelStats::new(10.0, 7.0, 1.0),
    TowerLevelStats::new(14.0, 8.0, 1.1),
    TowerLevelStats::new(20.0, 9.0, 1.2),
];

/// Types of towers that can be constructed on buildable cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerKind {
    /// Physical single-target tower.
    Basic,
    /// Heavy-hitting fire tower.
    Fire,
    /// Slowing ice tower; freezes at its top level.
    Ice,
    /// Long-range stunning lightning tower.
    Lightning,
    /// Fire and ice hybrid that scalds and slows.
    Steam,
    /// Fire and lightning hybrid that stuns.
    Plasma,
    /// Ice and lightning hybrid that freezes.
    Blizzard,
}

impl TowerKind {
    /// Every tower kind in declaration order.
    pub const ALL: [TowerKind; 7] = [
        Self::Basic,
        Self::Fire,
        Self::Ice,
        Self::Lightning,
        Self::Steam,
        Self::Plasma,
        Self::Blizzard,
    ];

    /// Element carried by the tower's shots.
    #[must_use]
    pub const fn element(self) -> Element {
        match self {
            Self::Basic => Element::Physical,
            Self::Fire | Self::Steam => Element::Fire,
            Self::Ice | Self::Blizzard => Element::Ice,
            Self::Lightning | Self::Plasma => Element::Lightning,
        }
    }

    /// Reports whether the kind is produced by fusing two elemental towers.
    #[must_use]
    pub const fn is_hybrid(self) -> bool {
        matches!(self, Self::Steam | Self::Plasma | Self::Blizzard)
    }

    /// Money required to build the tower.
    #[must_use]
    pub const fn build_cost(self) -> u32 {
        match self {
            Self::Basic => 50,
            Self::Fire => 75,
            Self::Ice => 70,
            Self::Lightning => 90,
            Self::Steam => 160,
            Self::Plasma => 180,
            Self::Blizzard => 170,
        }
    }

    /// Money required to upgrade from `level` to the next level.
    ///
    /// Returns `None` once `level` is at or beyond [`MAX_TOWER_LEVEL`].
    #[must_use]
    pub const fn upgrade_cost(self, level: u8) -> Option<u32> {
        let costs: [u32; 2] = match self {
            Self::Basic => [40, 80],
            Self::Fire => [60, 110],
            Self::Ice => [55, 100],
            Self::Lightning => [70, 130],
            Self::Steam => [90, 150],
            Self::Plasma => [100, 170],
            Self::Blizzard => [95, 160],
        };
        match level {
            1 => Some(costs[0]),
            2 => Some(costs[1]),
            _ => None,
        }
    }

    /// Combat statistics of a freshly built, level one tower.
    #[must_use]
    pub const fn base_stats(self) -> TowerLevelStats {
        self.levels()[0]
    }

    /// Combat statistics at the provided one-based level.
    #[must_use]
    pub fn stats(self, level: u8) -> Option<TowerLevelStats> {
        let index = usize::from(level.checked_sub(1)?);
        self.levels().get(index).copied()
    }

    /// Status effect applied to every enemy hit at the provided level.
    #[must_use]
    pub fn on_hit(self, level: u8) -> Option<StatusEffect> {
        match self {
            Self::Basic | Self::Fire => None,
            Self::Ice if level >= MAX_TOWER_LEVEL => Some(StatusEffect::Freeze {
                duration: Duration::from_secs(1),
            }),
            Self::Ice => Some(StatusEffect::Slow {
                factor: 0.5,
                duration: Duration::from_secs(2),
            }),
            Self::Lightning => Some(StatusEffect::Stun {
                duration: Duration::from_millis(300),
            }),
            Self::Steam => Some(StatusEffect::Slow {
                factor: 0.6,
                duration: Duration::from_millis(1_500),
            }),
            Self::Plasma => Some(StatusEffect::Stun {
                duration: Duration::from_millis(400),
            }),
            Self::Blizzard => Some(StatusEffect::Freeze {
                duration: Duration::from_millis(800),
            }),
        }
    }

    /// Lowercase name used by adapters and configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Fire => "fire",
            Self::Ice => "ice",
            Self::Lightning => "lightning",
            Self::Steam => "steam",
            Self::Plasma => "plasma",
            Self::Blizzard => "blizzard",
        }
    }

    const fn levels(self) -> &'static [TowerLevelStats; 3] {
        match self {
            Self::Basic => &BASIC_LEVELS,
            Self::Fire => &FIRE_LEVELS,
            Self::Ice => &ICE_LEVELS,
            Self::Lightning => &LIGHTNING_LEVELS,
            Self::Steam => &STEAM_LEVELS,
            Self::Plasma => &PLASMA_LEVELS,
            Self::Blizzard => &BLIZZARD_LEVELS,
        }
    }
}

impl FromStr for TowerKind {
    type Err = UnknownKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownKindError(value.to_owned()))
    }
}

/// Reports a tower or enemy kind name that matches no known kind.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown kind `{0}`")]
pub struct UnknownKindError(String);

/// Sell value contributed by a purchase of the provided cost.
#[must_use]
pub const fn refund_share(cost: u32) -> u32 {
    let scaled = cost as u64 * SELL_REFUND_PERCENT as u64 / 100;
    scaled as u32
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The requested cell lies outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// The requested cell is not an empty buildable cell.
    #[error("cell is not buildable")]
    Occupied,
    /// The economy cannot cover the build cost.
    #[error("insufficient funds")]
    InsufficientFunds,
}

/// Reasons an upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
    /// The tower already reached its top level.
    #[error("tower is already at its maximum level")]
    MaxLevel,
    /// The economy cannot cover the upgrade cost.
    #[error("insufficient funds")]
    InsufficientFunds,
}

/// Reasons a sale or removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum RemovalError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
}

/// Reasons a wave start request may be rejected by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum WaveError {
    /// A main wave is already in progress.
    #[error("a main wave is already in progress")]
    WaveInProgress,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Kind of enemy.
    pub kind: EnemyKind,
    /// Current world position.
    pub position: Vec2,
    /// Index of the waypoint the enemy is walking toward.
    pub path_index: usize,
    /// Remaining hit points.
    pub health: f32,
    /// Hit points at spawn after difficulty scaling.
    pub max_health: f32,
    /// Indicates whether a freeze currently halts the enemy.
    pub frozen: bool,
    /// Indicates whether a stun currently halts the enemy.
    pub stunned: bool,
    /// Active speed multiplier; `1.0` when not slowed.
    pub slow_factor: f32,
    /// Stream that spawned the enemy.
    pub stream: SpawnStream,
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of live enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Looks up the snapshot of a specific enemy.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Live enemies within `range` of `position`, boundary included, in
    /// creation order.
    pub fn enemies_in_range(
        &self,
        position: Vec2,
        range: f32,
    ) -> impl Iterator<Item = &EnemySnapshot> + '_ {
        let range_sq = range * range;
        self.snapshots.iter().filter(move |snapshot| {
            range >= 0.0
                && snapshot.health > 0.0
                && snapshot.position.distance_squared(position) <= range_sq
        })
    }

    /// Closest live enemy within `max_range` of `position`.
    ///
    /// Equidistant enemies resolve to the one created first.
    #[must_use]
    pub fn closest_enemy(&self, position: Vec2, max_range: f32) -> Option<&EnemySnapshot> {
        let mut best: Option<(f32, &EnemySnapshot)> = None;

        for snapshot in self.enemies_in_range(position, max_range) {
            let distance_sq = snapshot.position.distance_squared(position);
            match best {
                Some((best_distance, _)) if best_distance <= distance_sq => {}
                _ => best = Some((distance_sq, snapshot)),
            }
        }

        best.map(|(_, snapshot)| snapshot)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Cell occupied by the tower.
    pub cell: CellCoord,
    /// World position of the cell centre.
    pub position: Vec2,
    /// Current one-based level.
    pub level: u8,
    /// Combat statistics for the current level.
    pub stats: TowerLevelStats,
    /// Charge accumulated toward the next shot.
    pub cooldown: Duration,
    /// Enemy currently targeted, if any.
    pub target: Option<EnemyId>,
    /// Money refunded if the tower is sold.
    pub sell_value: u32,
    /// Money required for the next upgrade, if one exists.
    pub upgrade_cost: Option<u32>,
}

impl TowerSnapshot {
    /// Reports whether the tower has accumulated a full fire period.
    #[must_use]
    pub fn is_charged(&self) -> bool {
        self.cooldown >= self.stats.fire_period()
    }
}

/// Read-only snapshot describing all towers placed on the grid.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Number of towers captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no towers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Nearest-enemy assignment computed for a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Tower that acquired the target.
    pub tower: TowerId,
    /// Enemy selected as the target.
    pub enemy: EnemyId,
}
