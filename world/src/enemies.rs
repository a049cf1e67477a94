//! Authoritative enemy state: movement, status effects, and despawn.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use rampart_core::{EnemyId, EnemyKind, EnemySnapshot, EnemyView, SpawnStream, StatusEffect};

/// Live enemy stored inside the registry.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) position: Vec2,
    pub(crate) path_index: usize,
    pub(crate) speed: f32,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    /// Base health removed when the enemy escapes.
    pub(crate) damage: u32,
    pub(crate) reward: u32,
    pub(crate) stream: SpawnStream,
    alive: bool,
    frozen: EffectTimer,
    stunned: EffectTimer,
    slow: SlowEffect,
}

impl Enemy {
    fn is_halted(&self) -> bool {
        self.frozen.is_active() || self.stunned.is_active()
    }

    /// Walks toward the current waypoint, carrying leftover distance past
    /// reached waypoints. Returns `true` once the route is exhausted.
    fn advance(&mut self, dt: Duration, path: &[Vec2]) -> bool {
        let mut budget = self.speed * self.slow.factor() * dt.as_secs_f32();

        while budget > 0.0 {
            let Some(&waypoint) = path.get(self.path_index) else {
                break;
            };

            let offset = waypoint - self.position;
            let distance = offset.length();
            if distance <= budget {
                self.position = waypoint;
                self.path_index += 1;
                budget -= distance;
            } else {
                self.position += offset / distance * budget;
                budget = 0.0;
            }
        }

        self.path_index >= path.len()
    }

    fn tick_effects(&mut self, dt: Duration) {
        self.frozen.tick(dt);
        self.stunned.tick(dt);
        self.slow.tick(dt);
    }

    fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            path_index: self.path_index,
            health: self.health,
            max_health: self.max_health,
            frozen: self.frozen.is_active(),
            stunned: self.stunned.is_active(),
            slow_factor: self.slow.factor(),
            stream: self.stream,
        }
    }
}

/// Remaining duration of a halting effect.
#[derive(Clone, Copy, Debug, Default)]
struct EffectTimer {
    remaining: Duration,
}

impl EffectTimer {
    fn is_active(&self) -> bool {
        !self.remaining.is_zero()
    }

    /// Refreshes to the longer of the remaining and requested durations.
    fn apply(&mut self, duration: Duration) {
        self.remaining = self.remaining.max(duration);
    }

    fn tick(&mut self, dt: Duration) {
        self.remaining = self.remaining.saturating_sub(dt);
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct SlowEffect {
    factor: f32,
    timer: EffectTimer,
}

impl SlowEffect {
    fn factor(&self) -> f32 {
        if self.timer.is_active() {
            self.factor
        } else {
            1.0
        }
    }

    fn apply(&mut self, factor: f32, duration: Duration) {
        let factor = factor.clamp(0.0, 1.0);
        self.factor = if self.timer.is_active() {
            self.factor.min(factor)
        } else {
            factor
        };
        self.timer.apply(duration);
    }

    fn tick(&mut self, dt: Duration) {
        self.timer.tick(dt);
    }
}

/// Result of applying damage to a live enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DamageOutcome {
    pub(crate) position: Vec2,
    /// Health actually removed; overkill is not counted.
    pub(crate) dealt: f32,
    pub(crate) killed: bool,
}

/// Registry that owns every live enemy and allocates identifiers.
#[derive(Debug)]
pub(crate) struct EnemyRegistry {
    entries: BTreeMap<EnemyId, Enemy>,
    next_enemy_id: EnemyId,
}

impl EnemyRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    /// Creates an enemy at the start of the route with difficulty baked in.
    ///
    /// The multiplier scales health, damage, and reward once; later changes
    /// to the scheduler's multiplier never reach this enemy.
    pub(crate) fn create(
        &mut self,
        kind: EnemyKind,
        multiplier: f32,
        stream: SpawnStream,
        path: &[Vec2],
    ) -> EnemyId {
        let multiplier = if multiplier.is_finite() && multiplier > 0.0 {
            multiplier
        } else {
            1.0
        };
        let base = kind.base_stats();
        let health = (base.health * multiplier).round().max(1.0);

        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().wrapping_add(1));

        let enemy = Enemy {
            id,
            kind,
            position: path.first().copied().unwrap_or(Vec2::ZERO),
            path_index: 1,
            speed: base.speed,
            health,
            max_health: health,
            damage: scale(base.damage, multiplier),
            reward: scale(base.reward, multiplier),
            stream,
            alive: true,
            frozen: EffectTimer::default(),
            stunned: EffectTimer::default(),
            slow: SlowEffect::default(),
        };
        let _ = self.entries.insert(id, enemy);
        id
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.entries.get(&id).filter(|enemy| enemy.alive)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.values().filter(|enemy| enemy.alive).count()
    }

    /// Advances every enemy and reports those that overran the route.
    ///
    /// The caller is responsible for removing the reported enemies and
    /// applying their damage to the economy.
    pub(crate) fn update(&mut self, dt: Duration, path: &[Vec2]) -> Vec<EnemyId> {
        let ids: Vec<EnemyId> = self.entries.keys().copied().collect();
        let mut escaped = Vec::new();

        for id in ids {
            let Some(enemy) = self.entries.get_mut(&id) else {
                continue;
            };
            if !enemy.alive {
                continue;
            }

            let reached_end = !enemy.is_halted() && enemy.advance(dt, path);
            enemy.tick_effects(dt);
            if reached_end {
                escaped.push(id);
            }
        }

        escaped
    }

    /// Reports whether the enemy is alive and within `range` of `position`.
    pub(crate) fn is_targetable(&self, id: EnemyId, position: Vec2, range: f32) -> bool {
        self.get(id)
            .is_some_and(|enemy| enemy.position.distance_squared(position) <= range * range)
    }

    pub(crate) fn apply_damage(&mut self, id: EnemyId, amount: f32) -> Option<DamageOutcome> {
        let enemy = self.entries.get_mut(&id).filter(|enemy| enemy.alive)?;
        let dealt = amount.max(0.0).min(enemy.health);
        enemy.health -= dealt;
        let killed = enemy.health <= 0.0;
        if killed {
            enemy.alive = false;
        }
        Some(DamageOutcome {
            position: enemy.position,
            dealt,
            killed,
        })
    }

    /// Applies a status effect. Re-applying an active effect refreshes its
    /// duration rather than stacking it.
    pub(crate) fn apply_effect(&mut self, id: EnemyId, effect: StatusEffect) -> bool {
        let Some(enemy) = self.entries.get_mut(&id).filter(|enemy| enemy.alive) else {
            return false;
        };

        match effect {
            StatusEffect::Slow { factor, duration } => enemy.slow.apply(factor, duration),
            StatusEffect::Freeze { duration } => enemy.frozen.apply(duration),
            StatusEffect::Stun { duration } => enemy.stunned.apply(duration),
        }
        true
    }

    /// Detaches the enemy from the live set.
    ///
    /// Only the first call for an identifier yields the enemy, so callers can
    /// key reward or damage crediting off the returned value.
    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        self.entries.remove(&id)
    }

    pub(crate) fn view(&self) -> EnemyView {
        EnemyView::from_snapshots(
            self.entries
                .values()
                .filter(|enemy| enemy.alive)
                .map(Enemy::snapshot)
                .collect(),
        )
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self, id: EnemyId) -> Option<EnemySnapshot> {
        self.get(id).map(Enemy::snapshot)
    }
}

fn scale(value: u32, multiplier: f32) -> u32 {
    let scaled = (value as f32 * multiplier).round();
    if scaled <= 0.0 {
        0
    } else if scaled >= u32::MAX as f32 {
        u32::MAX
    } else {
        scaled as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_path() -> Vec<Vec2> {
        (0..5).map(|x| Vec2::new(x as f32, 0.0)).collect()
    }

    #[test]
    fn create_bakes_difficulty_once() {
        let mut registry = EnemyRegistry::new();
        let path = straight_path();
        let id = registry.create(EnemyKind::Basic, 1.2, SpawnStream::Main, &path);
        let enemy = registry.get(id).expect("enemy");
        assert_eq!(enemy.health, 36.0);
        assert_eq!(enemy.max_health, 36.0);
        assert_eq!(enemy.reward, 12);
        assert_eq!(enemy.damage, 1);
        assert_eq!(enemy.position, path[0]);
        assert_eq!(enemy.path_index, 1);
    }

    #[test]
    fn invalid_multiplier_falls_back_to_base_stats() {
        let mut registry = EnemyRegistry::new();
        let id = registry.create(EnemyKind::Tank, f32::NAN, SpawnStream::Main, &straight_path());
        assert_eq!(registry.get(id).expect("enemy").health, 100.0);
    }

    #[test]
    fn update_moves_along_waypoints_and_reports_end() {
        let mut registry = EnemyRegistry::new();
        let path = straight_path();
        let id = registry.create(EnemyKind::Basic, 1.0, SpawnStream::Main, &path);

        let escaped = registry.update(Duration::from_millis(750), &path);
        assert!(escaped.is_empty());
        let enemy = registry.get(id).expect("enemy");
        assert_eq!(enemy.position, Vec2::new(1.5, 0.0));
        assert_eq!(enemy.path_index, 2);

        let escaped = registry.update(Duration::from_secs(2), &path);
        assert_eq!(escaped, vec![id]);
        assert_eq!(registry.get(id).expect("enemy").position, path[4]);
    }

    #[test]
    fn frozen_enemy_holds_position_for_full_duration() {
        let mut registry = EnemyRegistry::new();
        let path = straight_path();
        let id = registry.create(EnemyKind::Basic, 1.0, SpawnStream::Main, &path);
        assert!(registry.apply_effect(
            id,
            StatusEffect::Freeze {
                duration: Duration::from_secs(1),
            }
        ));

        let _ = registry.update(Duration::from_millis(500), &path);
        let _ = registry.update(Duration::from_millis(500), &path);
        assert_eq!(registry.get(id).expect("enemy").position, path[0]);
        assert!(!registry.snapshot(id).expect("snapshot").frozen);

        let _ = registry.update(Duration::from_millis(500), &path);
        assert_eq!(registry.get(id).expect("enemy").position, path[1]);
    }

    #[test]
    fn reapplied_effects_refresh_without_stacking() {
        let mut registry = EnemyRegistry::new();
        let path = straight_path();
        let id = registry.create(EnemyKind::Basic, 1.0, SpawnStream::Main, &path);
        let stun = StatusEffect::Stun {
            duration: Duration::from_secs(1),
        };

        assert!(registry.apply_effect(id, stun));
        let _ = registry.update(Duration::from_millis(600), &path);
        assert!(registry.apply_effect(id, stun));
        let _ = registry.update(Duration::from_millis(600), &path);
        assert!(registry.snapshot(id).expect("snapshot").stunned);
        let _ = registry.update(Duration::from_millis(400), &path);
        assert!(!registry.snapshot(id).expect("snapshot").stunned);

        assert!(registry.apply_effect(id, stun));
        assert!(registry.apply_effect(
            id,
            StatusEffect::Stun {
                duration: Duration::from_millis(100),
            }
        ));
        let _ = registry.update(Duration::from_millis(500), &path);
        assert!(
            registry.snapshot(id).expect("snapshot").stunned,
            "a shorter re-application must not cut the active stun short"
        );
    }

    #[test]
    fn slow_keeps_stronger_factor_and_expires() {
        let mut registry = EnemyRegistry::new();
        let path = straight_path();
        let id = registry.create(EnemyKind::Basic, 1.0, SpawnStream::Main, &path);

        assert!(registry.apply_effect(
            id,
            StatusEffect::Slow {
                factor: 0.5,
                duration: Duration::from_secs(1),
            }
        ));
        assert!(registry.apply_effect(
            id,
            StatusEffect::Slow {
                factor: 0.8,
                duration: Duration::from_secs(1),
            }
        ));
        assert_eq!(registry.snapshot(id).expect("snapshot").slow_factor, 0.5);

        let _ = registry.update(Duration::from_secs(1), &path);
        assert_eq!(registry.get(id).expect("enemy").position, path[1]);
        assert_eq!(registry.snapshot(id).expect("snapshot").slow_factor, 1.0);
    }

    #[test]
    fn killed_enemy_is_no_longer_queryable_and_removal_happens_once() {
        let mut registry = EnemyRegistry::new();
        let path = straight_path();
        let id = registry.create(EnemyKind::Fast, 1.0, SpawnStream::Main, &path);

        let outcome = registry.apply_damage(id, 15.0).expect("alive");
        assert!(!outcome.killed);
        assert_eq!(outcome.dealt, 15.0);

        let outcome = registry.apply_damage(id, 15.0).expect("alive");
        assert!(outcome.killed);
        assert_eq!(outcome.dealt, 5.0);

        assert!(registry.get(id).is_none());
        assert!(registry.apply_damage(id, 1.0).is_none());
        assert!(registry.view().is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.remove(id).is_some());
        assert!(registry.remove(id).is_none());
    }
}
