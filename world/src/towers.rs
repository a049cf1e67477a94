//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use rampart_core::{
    refund_share, CellCoord, EnemyId, TowerId, TowerKind, TowerLevelStats, TowerSnapshot,
    TowerTarget, TowerView,
};

use crate::enemies::EnemyRegistry;

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Cell occupied by the tower.
    pub(crate) cell: CellCoord,
    /// World position of the occupied cell's centre.
    pub(crate) position: Vec2,
    pub(crate) level: u8,
    pub(crate) stats: TowerLevelStats,
    /// Charge accumulated toward the next shot, capped at one fire period.
    pub(crate) cooldown: Duration,
    pub(crate) target: Option<EnemyId>,
    /// Refund owed on sale; grows with every purchase made for the tower.
    pub(crate) sell_value: u32,
}

impl TowerState {
    fn fire_period(&self) -> Duration {
        self.stats.fire_period()
    }

    pub(crate) fn is_charged(&self) -> bool {
        self.cooldown >= self.fire_period()
    }

    /// Moves the tower to the next level, returning the new level.
    ///
    /// Charge carried over from the previous level never exceeds the new
    /// fire period.
    pub(crate) fn level_up(&mut self, cost: u32) -> Option<u8> {
        let level = self.level.checked_add(1)?;
        let stats = self.kind.stats(level)?;
        self.level = level;
        self.stats = stats;
        self.cooldown = self.cooldown.min(self.fire_period());
        self.sell_value = self.sell_value.saturating_add(refund_share(cost));
        Some(level)
    }

    /// Spends one fire period of accumulated charge.
    pub(crate) fn consume_shot(&mut self) -> bool {
        if !self.is_charged() {
            return false;
        }
        self.cooldown = self.cooldown.saturating_sub(self.fire_period());
        true
    }

    fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            cell: self.cell,
            position: self.position,
            level: self.level,
            stats: self.stats,
            cooldown: self.cooldown,
            target: self.target,
            sell_value: self.sell_value,
            upgrade_cost: self.kind.upgrade_cost(self.level),
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Registers a level one tower and returns its identifier.
    ///
    /// `sell_value` seeds the refund owed when the tower is later sold.
    pub(crate) fn insert(
        &mut self,
        kind: TowerKind,
        cell: CellCoord,
        position: Vec2,
        sell_value: u32,
    ) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().wrapping_add(1));

        let state = TowerState {
            id,
            kind,
            cell,
            position,
            level: 1,
            stats: kind.base_stats(),
            cooldown: Duration::ZERO,
            target: None,
            sell_value,
        };
        let _ = self.entries.insert(id, state);
        id
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    pub(crate) fn tower_at(&self, cell: CellCoord) -> Option<&TowerState> {
        self.entries.values().find(|tower| tower.cell == cell)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Records target assignments and charges towers that hold a valid one.
    ///
    /// Assignments are revalidated against live enemies; a tower whose
    /// target died or left range goes idle and keeps its current charge.
    pub(crate) fn update(&mut self, dt: Duration, targets: &[TowerTarget], enemies: &EnemyRegistry) {
        for tower in self.entries.values_mut() {
            let assigned = targets
                .iter()
                .find(|target| target.tower == tower.id)
                .map(|target| target.enemy)
                .filter(|enemy| enemies.is_targetable(*enemy, tower.position, tower.stats.range));

            tower.target = assigned;
            if assigned.is_some() {
                let period = tower.fire_period();
                tower.cooldown = tower.cooldown.saturating_add(dt).min(period);
            }
        }
    }

    pub(crate) fn view(&self) -> TowerView {
        TowerView::from_snapshots(self.entries.values().map(TowerState::snapshot).collect())
    }

    pub(crate) fn snapshot(&self, id: TowerId) -> Option<TowerSnapshot> {
        self.get(id).map(TowerState::snapshot)
    }
}
