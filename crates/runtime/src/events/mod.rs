//! Typed event bus and the payloads the session exchanges over it.
//!
//! Events are routed by Rust type and [`Scope`]. Progression notifications go
//! out on the global scope; player stat updates go to the player's entity
//! scope so a destroyed player can be cut off with a single `close_scope`.

mod bus;
mod types;

pub use bus::{Event, EventBus, Scope, Subscription, SubscriptionSet};
pub use types::{
    BeforeReplay, ChapterStageChanged, CharacterStatUpgraded, CriticalChanceChanged,
    DamageChanged, EncounterDefeated, HpRegenChanged, KnockbackChanged, MaxHpChanged,
    MoveSpeedChanged, PlayerDiedAcknowledged, PlayerInit, RebirthBegin, RebirthRequested, Replay,
    SpecialEncounterChanceChanged, StageDistanceChanged, StatLevelChanged, publish_stat_update,
};
