//! Flat-curve stat systems for tests and local runs.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use runner_core::{BigNumber, RebirthStatId, StatUpgradeId};

use crate::api::{RebirthStatSystem, StatUpgradeSystem};

/// `base + per_level * level`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearStat {
    pub base: f64,
    pub per_level: f64,
}

impl LinearStat {
    pub const fn new(base: f64, per_level: f64) -> Self {
        Self { base, per_level }
    }

    pub fn at(&self, level: u32) -> BigNumber {
        BigNumber::from(self.base + self.per_level * f64::from(level))
    }
}

/// Gold upgrades with linear curves and mutable levels.
#[derive(Debug)]
pub struct FlatStatSystem {
    curves: HashMap<StatUpgradeId, LinearStat>,
    levels: RwLock<HashMap<StatUpgradeId, u32>>,
}

impl FlatStatSystem {
    pub fn new() -> Self {
        let curves = [
            (StatUpgradeId::Attack, LinearStat::new(10.0, 2.0)),
            (StatUpgradeId::Hp, LinearStat::new(100.0, 10.0)),
            (StatUpgradeId::HpRegen, LinearStat::new(1.0, 0.5)),
            (StatUpgradeId::CriticalChance, LinearStat::new(0.05, 0.01)),
            (StatUpgradeId::Knockback, LinearStat::new(1.0, 0.1)),
            (StatUpgradeId::Armor, LinearStat::new(0.0, 1.0)),
        ];
        Self {
            curves: curves.into_iter().collect(),
            levels: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_curve(mut self, id: StatUpgradeId, curve: LinearStat) -> Self {
        self.curves.insert(id, curve);
        self
    }

    pub fn set_level(&self, id: StatUpgradeId, level: u32) {
        self.levels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, level);
    }
}

impl Default for FlatStatSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl StatUpgradeSystem for FlatStatSystem {
    fn current_level(&self, id: StatUpgradeId) -> u32 {
        self.levels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
            .unwrap_or(0)
    }

    fn calculate(&self, id: StatUpgradeId, level: u32) -> BigNumber {
        self.curves
            .get(&id)
            .map_or(BigNumber::ZERO, |curve| curve.at(level))
    }
}

/// Rebirth upgrades with linear curves and mutable levels.
#[derive(Debug)]
pub struct FlatRebirthStats {
    move_speed: LinearStat,
    special_chance: LinearStat,
    levels: RwLock<HashMap<RebirthStatId, u32>>,
}

impl FlatRebirthStats {
    pub fn new(move_speed: LinearStat, special_chance: LinearStat) -> Self {
        Self {
            move_speed,
            special_chance,
            levels: RwLock::new(HashMap::new()),
        }
    }

    pub fn set_level(&self, id: RebirthStatId, level: u32) {
        self.levels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, level);
    }
}

impl Default for FlatRebirthStats {
    fn default() -> Self {
        Self::new(LinearStat::new(2.0, 0.2), LinearStat::new(0.05, 0.01))
    }
}

impl RebirthStatSystem for FlatRebirthStats {
    fn calculate(&self, id: RebirthStatId) -> BigNumber {
        let level = self
            .levels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
            .unwrap_or(0);
        match id {
            RebirthStatId::MoveSpeed => self.move_speed.at(level),
            RebirthStatId::SpecialMonsterChance => self.special_chance.at(level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_feed_the_curve() {
        let stats = FlatStatSystem::new();
        stats.set_level(StatUpgradeId::Attack, 5);
        let level = stats.current_level(StatUpgradeId::Attack);
        assert_eq!(level, 5);
        assert_eq!(
            stats.calculate(StatUpgradeId::Attack, level),
            BigNumber::from(20u32)
        );
    }

    #[test]
    fn rebirth_stats_read_their_own_levels() {
        let stats = FlatRebirthStats::new(LinearStat::new(2.0, 0.5), LinearStat::new(0.0, 1.0));
        stats.set_level(RebirthStatId::MoveSpeed, 2);
        assert_eq!(stats.calculate(RebirthStatId::MoveSpeed), BigNumber::from(3u32));
        assert_eq!(
            stats.calculate(RebirthStatId::SpecialMonsterChance),
            BigNumber::ZERO
        );
    }
}
