use crate::error::ConfigError;
use crate::number::BigNumber;

use super::StatUpgradeId;

/// Typed stat change delivered to a player entity.
///
/// Health and damage stay arbitrary precision. Ratios and speeds are narrowed
/// to `f32` because the player components consume them as floats.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatUpdate {
    Damage(BigNumber),
    MaxHp(BigNumber),
    HpRegen(BigNumber),
    CriticalChance(f32),
    Knockback(f32),
    MoveSpeed(f32),
    SpecialEncounterChance(f32),
}

impl StatUpdate {
    /// Maps a computed upgrade value onto its typed update.
    ///
    /// Stats without a player-facing update yield [`ConfigError::UnmappedStat`].
    pub fn for_stat(id: StatUpgradeId, value: BigNumber) -> Result<Self, ConfigError> {
        let update = match id {
            StatUpgradeId::Attack => StatUpdate::Damage(value),
            StatUpgradeId::Hp => StatUpdate::MaxHp(value),
            StatUpgradeId::HpRegen => StatUpdate::HpRegen(value),
            StatUpgradeId::CriticalChance => StatUpdate::CriticalChance(value.to_f32()),
            StatUpgradeId::Knockback => StatUpdate::Knockback(value.to_f32()),
            StatUpgradeId::MoveSpeed => StatUpdate::MoveSpeed(value.to_f32()),
            StatUpgradeId::SpecialMonsterChance => {
                StatUpdate::SpecialEncounterChance(value.to_f32())
            }
            // TODO: route armor once the player has a defense component.
            StatUpgradeId::Armor | StatUpgradeId::None => {
                return Err(ConfigError::UnmappedStat(id));
            }
        };
        Ok(update)
    }

    /// Stable label for structured logging.
    pub const fn name(&self) -> &'static str {
        match self {
            StatUpdate::Damage(_) => "damage",
            StatUpdate::MaxHp(_) => "max_hp",
            StatUpdate::HpRegen(_) => "hp_regen",
            StatUpdate::CriticalChance(_) => "critical_chance",
            StatUpdate::Knockback(_) => "knockback",
            StatUpdate::MoveSpeed(_) => "move_speed",
            StatUpdate::SpecialEncounterChance(_) => "special_encounter_chance",
        }
    }
}
