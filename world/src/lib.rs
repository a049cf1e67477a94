#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Rampart.

mod economy;
mod enemies;
mod grid;
mod towers;

use log::{debug, info, warn};
use rampart_core::{
    refund_share, CellCoord, Command, EnemyId, Event, PlacementError, RemovalError, SpawnStream,
    TowerId, TowerKind, UpgradeError, WaveNumber, WELCOME_BANNER,
};
use std::time::Duration;

pub use economy::{Economy, EconomyConfig, UNLIMITED_MONEY_BALANCE};
pub use grid::{GridCell, GridMap, LayoutError, MapLayout};

use enemies::EnemyRegistry;
use towers::TowerRegistry;

/// Represents the authoritative Rampart world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid: GridMap,
    enemies: EnemyRegistry,
    towers: TowerRegistry,
    economy: Economy,
    base_destroyed: bool,
}

impl World {
    /// Creates a world on the standard map with the default economy.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(GridMap::standard(), EconomyConfig::default())
    }

    /// Creates a world from an author-defined map and starting economy.
    pub fn with_config(layout: &MapLayout, economy: EconomyConfig) -> Result<Self, LayoutError> {
        let grid = GridMap::from_layout(layout)?;
        Ok(Self::from_parts(grid, economy))
    }

    fn from_parts(grid: GridMap, economy: EconomyConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            grid,
            enemies: EnemyRegistry::new(),
            towers: TowerRegistry::new(),
            economy: Economy::new(economy),
            base_destroyed: false,
        }
    }

    fn place_tower(
        &mut self,
        kind: TowerKind,
        cell: CellCoord,
        cost: u32,
        out_events: &mut Vec<Event>,
    ) {
        if let Err(reason) = self.pay_for_placement(cell, cost) {
            debug!("rejected {} tower at {cell:?}: {reason}", kind.name());
            out_events.push(Event::TowerPlacementRejected { kind, cell, reason });
            return;
        }

        let occupied = self.grid.set_tower_placed(cell, true);
        debug_assert!(occupied, "placement check must guarantee an empty cell");

        let position = self.grid.grid_to_world(cell);
        let sell_value = refund_share(cost);
        let tower = self.towers.insert(kind, cell, position, sell_value);
        info!("placed {} tower {tower:?} at {cell:?} for {cost}", kind.name());
        out_events.push(Event::TowerPlaced {
            tower,
            kind,
            cell,
            cost,
        });
    }

    /// Validates bounds and occupancy, then pays for the tower.
    fn pay_for_placement(&mut self, cell: CellCoord, cost: u32) -> Result<(), PlacementError> {
        if !self.grid.in_bounds(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if !self.grid.can_place_tower(cell) {
            return Err(PlacementError::Occupied);
        }
        if !self.economy.spend_money(cost) {
            return Err(PlacementError::InsufficientFunds);
        }
        Ok(())
    }

    fn upgrade_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        if let Err(reason) = self.try_upgrade(tower, out_events) {
            debug!("rejected upgrade of {tower:?}: {reason}");
            out_events.push(Event::TowerUpgradeRejected { tower, reason });
        }
    }

    fn try_upgrade(
        &mut self,
        tower: TowerId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), UpgradeError> {
        let state = self.towers.get(tower).ok_or(UpgradeError::MissingTower)?;
        let cost = state
            .kind
            .upgrade_cost(state.level)
            .ok_or(UpgradeError::MaxLevel)?;
        if !self.economy.spend_money(cost) {
            return Err(UpgradeError::InsufficientFunds);
        }

        let state = self
            .towers
            .get_mut(tower)
            .ok_or(UpgradeError::MissingTower)?;
        let level = state.level_up(cost).ok_or(UpgradeError::MaxLevel)?;
        info!("upgraded {tower:?} to level {level} for {cost}");
        out_events.push(Event::TowerUpgraded { tower, level, cost });
        Ok(())
    }

    /// Detaches a tower and frees its cell in one step.
    fn take_tower(&mut self, tower: TowerId) -> Result<towers::TowerState, RemovalError> {
        let state = self.towers.remove(tower).ok_or(RemovalError::MissingTower)?;
        let _ = self.grid.set_tower_placed(state.cell, false);
        Ok(state)
    }

    fn sell_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        match self.take_tower(tower) {
            Ok(state) => {
                self.economy.add_money(state.sell_value);
                info!("sold {tower:?} for {}", state.sell_value);
                out_events.push(Event::TowerSold {
                    tower,
                    cell: state.cell,
                    refund: state.sell_value,
                });
            }
            Err(reason) => {
                debug!("rejected sale of {tower:?}: {reason}");
                out_events.push(Event::TowerRemovalRejected { tower, reason });
            }
        }
    }

    fn remove_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        match self.take_tower(tower) {
            Ok(state) => {
                info!("removed {tower:?} without refund");
                out_events.push(Event::TowerRemoved {
                    tower,
                    cell: state.cell,
                });
            }
            Err(reason) => {
                debug!("rejected removal of {tower:?}: {reason}");
                out_events.push(Event::TowerRemovalRejected { tower, reason });
            }
        }
    }

    fn fire_tower(&mut self, tower: TowerId, target: EnemyId, out_events: &mut Vec<Event>) {
        let Some(state) = self.towers.get_mut(tower) else {
            debug!("fire request for missing {tower:?}");
            return;
        };
        if state.target != Some(target)
            || !self
                .enemies
                .is_targetable(target, state.position, state.stats.range)
        {
            debug!("{tower:?} lost {target:?} before firing");
            return;
        }
        if !state.consume_shot() {
            debug!("{tower:?} is not charged");
            return;
        }

        let damage = state.stats.damage;
        let element = state.kind.element();
        let effect = state.kind.on_hit(state.level);
        out_events.push(Event::TowerFired { tower, target });

        let Some(outcome) = self.enemies.apply_damage(target, damage) else {
            return;
        };
        self.economy.add_damage_dealt(outcome.dealt);
        out_events.push(Event::EnemyDamaged {
            enemy: target,
            position: outcome.position,
            amount: outcome.dealt,
            element,
        });

        if outcome.killed {
            if let Some(enemy) = self.enemies.remove(target) {
                self.economy.add_money(enemy.reward);
                self.economy.add_kill();
                debug!("{tower:?} killed {target:?} for {}", enemy.reward);
                out_events.push(Event::EnemyKilled {
                    enemy: target,
                    kind: enemy.kind,
                    position: outcome.position,
                    reward: enemy.reward,
                });
            }
        } else if let Some(effect) = effect {
            let _ = self.enemies.apply_effect(target, effect);
        }
    }

    fn advance_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let escaped = self.enemies.update(dt, self.grid.path());
        for id in escaped {
            if let Some(enemy) = self.enemies.remove(id) {
                self.economy.take_damage(enemy.damage);
                debug!("{id:?} reached the end for {} damage", enemy.damage);
                out_events.push(Event::EnemyReachedEnd {
                    enemy: id,
                    kind: enemy.kind,
                    damage: enemy.damage,
                });
            }
        }

        if self.economy.is_defeated() && !self.base_destroyed {
            self.base_destroyed = true;
            warn!("base destroyed");
            out_events.push(Event::BaseDestroyed);
        }
    }

    fn complete_wave(
        &mut self,
        wave: WaveNumber,
        stream: SpawnStream,
        reward: u32,
        out_events: &mut Vec<Event>,
    ) {
        self.economy.add_money(reward);
        info!("wave {wave} on {stream:?} completed, reward {reward}");
        out_events.push(Event::WaveCompleted {
            wave,
            stream,
            reward,
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceTower { kind, cell } => {
            world.place_tower(kind, cell, kind.build_cost(), out_events);
        }
        Command::InstallTower { kind, cell } => {
            world.place_tower(kind, cell, 0, out_events);
        }
        Command::UpgradeTower { tower } => world.upgrade_tower(tower, out_events),
        Command::SellTower { tower } => world.sell_tower(tower, out_events),
        Command::RemoveTower { tower } => world.remove_tower(tower, out_events),
        Command::UpdateTowers { dt, targets } => {
            world.towers.update(dt, &targets, &world.enemies);
        }
        Command::FireTower { tower, target } => world.fire_tower(tower, target, out_events),
        Command::AdvanceEnemies { dt } => world.advance_enemies(dt, out_events),
        Command::BeginWave { wave, stream } => {
            info!("wave {wave} started on {stream:?}");
            out_events.push(Event::WaveStarted { wave, stream });
        }
        Command::SpawnEnemy {
            kind,
            multiplier,
            stream,
        } => {
            let enemy = world
                .enemies
                .create(kind, multiplier, stream, world.grid.path());
            let position = world
                .enemies
                .get(enemy)
                .map(|spawned| spawned.position)
                .unwrap_or_default();
            debug!("spawned {} {enemy:?} on {stream:?}", kind.name());
            out_events.push(Event::EnemySpawned {
                enemy,
                kind,
                stream,
                position,
            });
        }
        Command::CompleteWave {
            wave,
            stream,
            reward,
        } => world.complete_wave(wave, stream, reward, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use rampart_core::{CellCoord, EnemyView, TowerId, TowerSnapshot, TowerView};

    use super::{Economy, GridMap, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the world's grid.
    #[must_use]
    pub fn grid(world: &World) -> &GridMap {
        &world.grid
    }

    /// Provides read-only access to health, money and statistics.
    #[must_use]
    pub fn economy(world: &World) -> &Economy {
        &world.economy
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        world.enemies.view()
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        world.towers.view()
    }

    /// Number of live enemies on the route.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Snapshot of a single tower.
    #[must_use]
    pub fn tower(world: &World, id: TowerId) -> Option<TowerSnapshot> {
        world.towers.snapshot(id)
    }

    /// Snapshot of the tower occupying `cell`, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: CellCoord) -> Option<TowerSnapshot> {
        world
            .towers
            .tower_at(cell)
            .and_then(|tower| world.towers.snapshot(tower.id))
    }

    /// World-space waypoints enemies follow.
    #[must_use]
    pub fn path(world: &World) -> &[Vec2] {
        world.grid.path()
    }

    /// Converts a world position into the containing cell.
    #[must_use]
    pub fn world_to_grid(world: &World, position: Vec2) -> Option<CellCoord> {
        world.grid.world_to_grid(position)
    }

    /// Converts a cell into the world position of its centre.
    #[must_use]
    pub fn grid_to_world(world: &World, cell: CellCoord) -> Vec2 {
        world.grid.grid_to_world(cell)
    }

    /// Reports whether a tower may be built on `cell`, ignoring funds.
    #[must_use]
    pub fn can_place_tower(world: &World, cell: CellCoord) -> bool {
        world.grid.can_place_tower(cell)
    }

    /// Reports whether the base has been destroyed.
    #[must_use]
    pub fn is_base_destroyed(world: &World) -> bool {
        world.base_destroyed
    }
}
