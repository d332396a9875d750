//! Collaborators the session drives but does not own.
//!
//! Each trait is the narrow surface the orchestrator needs from a subsystem
//! that lives elsewhere in the game (world, encounter AI, save data, upgrade
//! tables). Implementations use interior mutability and are shared through
//! the [`ServiceRegistry`](super::ServiceRegistry) as `Arc<dyn Trait>`.

use runner_core::{BigNumber, EntityId, Position, RebirthStatId, StatUpgradeId};

/// Owns live encounter instances.
pub trait EncounterManager: Send + Sync {
    /// Encounters currently alive.
    fn active_count(&self) -> usize;

    /// Despawns every live encounter.
    fn clear_all(&self);

    /// Spawns `count` encounters drawn from `encounter_ids` at `at`.
    fn spawn(&self, encounter_ids: &[String], count: u32, at: Position);
}

/// Entity lifecycle and movement for the player character.
pub trait PlayerWorld: Send + Sync {
    fn start_position(&self) -> Position;

    fn spawn_player(&self, at: Position) -> EntityId;

    /// Destroys `player`. Unknown ids are ignored.
    fn destroy(&self, player: EntityId);

    /// Current x of `player`, or `None` once it is gone.
    fn position_x(&self, player: EntityId) -> Option<f32>;

    fn set_movement_frozen(&self, player: EntityId, frozen: bool);
}

/// Persistent account balances.
pub trait AccountContext: Send + Sync {
    fn gold(&self) -> BigNumber;

    fn add_gold(&self, amount: BigNumber);

    fn rebirth_points(&self) -> BigNumber;

    fn add_rebirth_points(&self, amount: BigNumber);

    fn highest_chapter(&self) -> u32;

    fn set_highest_chapter(&self, chapter: u32);

    /// Ends the run: clears run-scoped balances and counts the rebirth.
    /// Rebirth points and the chapter record survive.
    fn rebirth(&self);
}

/// Level-based upgrades bought with gold.
pub trait StatUpgradeSystem: Send + Sync {
    fn current_level(&self, id: StatUpgradeId) -> u32;

    /// Effect of `id` at `level`.
    fn calculate(&self, id: StatUpgradeId, level: u32) -> BigNumber;
}

/// Upgrades bought with rebirth points.
pub trait RebirthStatSystem: Send + Sync {
    /// Effect of `id` from persisted rebirth state.
    fn calculate(&self, id: RebirthStatId) -> BigNumber;
}
