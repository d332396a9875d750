//! Event payloads exchanged between the session and the rest of the game.

use std::sync::Arc;

use runner_core::{BigNumber, SessionConfig, StatUpdate, StatUpgradeId};

use super::bus::{EventBus, Scope};

// ============================================================================
// Progression (published globally)
// ============================================================================

/// Chapter or stage changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterStageChanged {
    pub chapter: u32,
    pub stage: u32,
    /// Highest chapter ever reached, after this change was applied.
    pub highest_chapter: u32,
    /// Raised by a chapter rollover, not by a stage advance or a reset.
    pub is_new_chapter: bool,
    /// The rollover reached a chapter beyond the previous record.
    pub is_new_record: bool,
}

/// Continuous distance signal, published on every distance-loop tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageDistanceChanged {
    /// Distance since the chapter started.
    pub current: f32,
    /// Distance at which the chapter completes.
    pub goal: f32,
}

/// A reset is about to tear the playthrough down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeforeReplay;

/// A fresh playthrough is running and its loops are started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replay;

/// Rebirth is starting. Published with `publish_async`, so subscribers may
/// suspend (for example to play a transition) before the ledger changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebirthBegin {
    pub chapter: u32,
    pub stage: u32,
}

// ============================================================================
// Player entity (published on `Scope::Entity(player)`)
// ============================================================================

/// Session configuration for a freshly spawned player. Sticky.
#[derive(Debug, Clone)]
pub struct PlayerInit(pub Arc<SessionConfig>);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageChanged(pub BigNumber);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxHpChanged(pub BigNumber);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HpRegenChanged(pub BigNumber);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalChanceChanged(pub f32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnockbackChanged(pub f32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveSpeedChanged(pub f32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecialEncounterChanceChanged(pub f32);

/// Generic upgrade notification for UI and analytics.
///
/// Published for every stat push, including ones whose typed update could
/// not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterStatUpgraded {
    pub id: StatUpgradeId,
    pub name: &'static str,
    pub level: u32,
    pub value: BigNumber,
}

/// Publishes the typed event matching `update`.
pub fn publish_stat_update(bus: &EventBus, scope: Scope, update: StatUpdate) {
    match update {
        StatUpdate::Damage(v) => bus.publish(scope, DamageChanged(v)),
        StatUpdate::MaxHp(v) => bus.publish(scope, MaxHpChanged(v)),
        StatUpdate::HpRegen(v) => bus.publish(scope, HpRegenChanged(v)),
        StatUpdate::CriticalChance(v) => bus.publish(scope, CriticalChanceChanged(v)),
        StatUpdate::Knockback(v) => bus.publish(scope, KnockbackChanged(v)),
        StatUpdate::MoveSpeed(v) => bus.publish(scope, MoveSpeedChanged(v)),
        StatUpdate::SpecialEncounterChance(v) => {
            bus.publish(scope, SpecialEncounterChanceChanged(v))
        }
    }
}

// ============================================================================
// Inbound (published globally by other subsystems)
// ============================================================================

/// An encounter died. Carries what the gold formula needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncounterDefeated {
    pub base_gold: BigNumber,
    pub is_one_shot: bool,
    pub is_special: bool,
}

/// The player acknowledged the death screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDiedAcknowledged;

/// An upgrade level changed (purchase, refund, load).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatLevelChanged {
    pub id: StatUpgradeId,
    pub new_level: u32,
}

/// The player confirmed a rebirth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebirthRequested;
