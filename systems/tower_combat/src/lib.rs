#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits firing commands for charged towers.

use rampart_core::{Command, TowerView};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireTower` entries for towers ready to fire.
    ///
    /// A tower is ready once it holds a target and has accumulated a full
    /// fire period. Commands are emitted in ascending tower order.
    pub fn handle(&mut self, towers: &TowerView, out: &mut Vec<Command>) {
        if towers.is_empty() {
            return;
        }

        self.scratch.clear();

        for snapshot in towers.iter() {
            let Some(target) = snapshot.target else {
                continue;
            };
            if snapshot.is_charged() {
                self.scratch.push(Command::FireTower {
                    tower: snapshot.id,
                    target,
                });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::{CellCoord, EnemyId, TowerId, TowerKind, TowerSnapshot};
    use std::time::Duration;

    #[test]
    fn empty_view_is_silent() {
        let mut system = TowerCombat::new();
        let mut out = Vec::new();

        system.handle(&TowerView::default(), &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn firing_respects_cooldown_readiness() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![
            snapshot(5, Some(1), Duration::from_secs(1)),
            snapshot(2, Some(4), Duration::from_secs(2)),
        ]);
        let mut out = Vec::new();

        system.handle(&towers, &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireTower {
                    tower: TowerId::new(2),
                    target: EnemyId::new(4),
                },
                Command::FireTower {
                    tower: TowerId::new(5),
                    target: EnemyId::new(1),
                },
            ],
        );
    }

    #[test]
    fn uncharged_or_idle_towers_are_skipped() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![
            snapshot(3, Some(9), Duration::from_millis(250)),
            snapshot(8, Some(2), Duration::from_secs(1)),
            snapshot(11, None, Duration::from_secs(1)),
        ]);
        let mut out = Vec::new();

        system.handle(&towers, &mut out);

        assert_eq!(
            out,
            vec![Command::FireTower {
                tower: TowerId::new(8),
                target: EnemyId::new(2),
            }],
        );
    }

    fn snapshot(tower: u32, target: Option<u32>, cooldown: Duration) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(tower),
            kind: TowerKind::Basic,
            cell: CellCoord::new(0, 0),
            position: Default::default(),
            level: 1,
            stats: TowerKind::Basic.base_stats(),
            cooldown,
            target: target.map(EnemyId::new),
            sell_value: 35,
            upgrade_cost: TowerKind::Basic.upgrade_cost(1),
        }
    }
}
