//! Stat upgrade identifiers and the typed updates pushed to the player.
//!
//! Upgrade systems speak in [`StatUpgradeId`]s and [`BigNumber`](crate::BigNumber)
//! values. The player entity only understands a fixed set of typed
//! [`StatUpdate`]s, so this module owns the mapping between the two.
mod ids;
mod update;

pub use ids::{RebirthStatId, StatKind, StatUpgradeId};
pub use update::StatUpdate;
