//! Base health, money and lifetime statistics.

use serde::Deserialize;

/// Balance reported while unlimited money is engaged.
pub const UNLIMITED_MONEY_BALANCE: u32 = 999_999;

/// Starting conditions for the economy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Base health at the start of a session.
    pub starting_health: u32,
    /// Upper bound for base health.
    pub max_health: u32,
    /// Money available before the first wave.
    pub starting_money: u32,
    /// Skips every funds check. Intended for sandbox and test sessions.
    pub unlimited_money: bool,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_health: 20,
            max_health: 20,
            starting_money: 200,
            unlimited_money: false,
        }
    }
}

/// Health and money ledger owned by the world.
#[derive(Clone, Debug)]
pub struct Economy {
    health: u32,
    max_health: u32,
    money: u32,
    unlimited_money: bool,
    total_kills: u32,
    total_damage_dealt: f64,
}

impl Economy {
    /// Creates a ledger from the provided starting conditions.
    #[must_use]
    pub fn new(config: EconomyConfig) -> Self {
        Self {
            health: config.starting_health.min(config.max_health),
            max_health: config.max_health,
            money: config.starting_money,
            unlimited_money: config.unlimited_money,
            total_kills: 0,
            total_damage_dealt: 0.0,
        }
    }

    /// Remaining base health.
    #[must_use]
    pub fn health(&self) -> u32 {
        self.health
    }

    /// Upper bound for base health.
    #[must_use]
    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Money available for purchases.
    #[must_use]
    pub fn money(&self) -> u32 {
        if self.unlimited_money {
            UNLIMITED_MONEY_BALANCE
        } else {
            self.money
        }
    }

    /// Reports whether unlimited money is engaged.
    #[must_use]
    pub fn has_unlimited_money(&self) -> bool {
        self.unlimited_money
    }

    /// Reports whether the base has no health left.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.health == 0
    }

    /// Number of enemies killed by towers.
    #[must_use]
    pub fn total_kills(&self) -> u32 {
        self.total_kills
    }

    /// Health removed from enemies by towers, excluding overkill.
    #[must_use]
    pub fn total_damage_dealt(&self) -> f64 {
        self.total_damage_dealt
    }

    pub(crate) fn take_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    /// Deducts `amount` when affordable. Returns `false` without changing the
    /// balance otherwise.
    pub(crate) fn spend_money(&mut self, amount: u32) -> bool {
        if self.unlimited_money {
            return true;
        }
        match self.money.checked_sub(amount) {
            Some(remaining) => {
                self.money = remaining;
                true
            }
            None => false,
        }
    }

    pub(crate) fn add_money(&mut self, amount: u32) {
        self.money = self.money.saturating_add(amount);
    }

    pub(crate) fn add_kill(&mut self) {
        self.total_kills = self.total_kills.saturating_add(1);
    }

    pub(crate) fn add_damage_dealt(&mut self, amount: f32) {
        if amount.is_finite() && amount > 0.0 {
            self.total_damage_dealt += f64::from(amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_money_never_overdraws() {
        let mut economy = Economy::new(EconomyConfig::default());
        let requests = [120, 90, 80, 0, 1, 200, 5];
        for amount in requests {
            let before = economy.money();
            let spent = economy.spend_money(amount);
            if spent {
                assert_eq!(economy.money(), before - amount);
            } else {
                assert_eq!(economy.money(), before);
                assert!(before < amount);
            }
        }
        assert_eq!(economy.money(), 200 - 120 - 80 - 0);
    }

    #[test]
    fn take_damage_clamps_at_zero() {
        let mut economy = Economy::new(EconomyConfig::default());
        economy.take_damage(7);
        assert_eq!(economy.health(), 13);
        assert!(!economy.is_defeated());
        economy.take_damage(100);
        assert_eq!(economy.health(), 0);
        assert!(economy.is_defeated());
    }

    #[test]
    fn unlimited_money_always_affords_and_reports_constant() {
        let mut economy = Economy::new(EconomyConfig {
            unlimited_money: true,
            ..EconomyConfig::default()
        });
        assert!(economy.spend_money(u32::MAX));
        assert!(economy.spend_money(5_000_000));
        assert_eq!(economy.money(), UNLIMITED_MONEY_BALANCE);
    }

    #[test]
    fn starting_health_is_clamped_to_maximum() {
        let economy = Economy::new(EconomyConfig {
            starting_health: 50,
            max_health: 30,
            ..EconomyConfig::default()
        });
        assert_eq!(economy.health(), 30);
    }

    #[test]
    fn statistics_accumulate() {
        let mut economy = Economy::new(EconomyConfig::default());
        economy.add_kill();
        economy.add_kill();
        economy.add_damage_dealt(12.5);
        economy.add_damage_dealt(f32::NAN);
        economy.add_money(u32::MAX);
        assert_eq!(economy.total_kills(), 2);
        assert_eq!(economy.total_damage_dealt(), 12.5);
        assert_eq!(economy.money(), u32::MAX);
    }
}
