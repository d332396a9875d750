/// Every upgradeable stat tracked by the account.
///
/// `None` is a sentinel used by upgrade UIs for empty slots; publishing it is
/// a no-op.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum StatUpgradeId {
    #[default]
    None,
    Attack,
    Hp,
    HpRegen,
    CriticalChance,
    Knockback,
    MoveSpeed,
    SpecialMonsterChance,
    Armor,
}

/// Stats bought with rebirth points. Their value comes from persisted rebirth
/// state, not from a level.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "camelCase")]
pub enum RebirthStatId {
    MoveSpeed,
    SpecialMonsterChance,
}

/// Which upgrade system computes a stat's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatKind {
    Normal,
    Rebirth(RebirthStatId),
}

impl StatUpgradeId {
    /// Classifies the stat, or `None` for the sentinel.
    pub const fn kind(self) -> Option<StatKind> {
        match self {
            StatUpgradeId::None => None,
            StatUpgradeId::MoveSpeed => Some(StatKind::Rebirth(RebirthStatId::MoveSpeed)),
            StatUpgradeId::SpecialMonsterChance => {
                Some(StatKind::Rebirth(RebirthStatId::SpecialMonsterChance))
            }
            StatUpgradeId::Attack
            | StatUpgradeId::Hp
            | StatUpgradeId::HpRegen
            | StatUpgradeId::CriticalChance
            | StatUpgradeId::Knockback
            | StatUpgradeId::Armor => Some(StatKind::Normal),
        }
    }

    /// Human-readable name for upgrade notifications.
    pub const fn label(self) -> &'static str {
        match self {
            StatUpgradeId::None => "None",
            StatUpgradeId::Attack => "Attack",
            StatUpgradeId::Hp => "HP",
            StatUpgradeId::HpRegen => "HP Regen",
            StatUpgradeId::CriticalChance => "Critical Chance",
            StatUpgradeId::Knockback => "Knockback",
            StatUpgradeId::MoveSpeed => "Move Speed",
            StatUpgradeId::SpecialMonsterChance => "Special Monster Chance",
            StatUpgradeId::Armor => "Armor",
        }
    }
}

impl From<RebirthStatId> for StatUpgradeId {
    fn from(id: RebirthStatId) -> Self {
        match id {
            RebirthStatId::MoveSpeed => StatUpgradeId::MoveSpeed,
            RebirthStatId::SpecialMonsterChance => StatUpgradeId::SpecialMonsterChance,
        }
    }
}
