//! Configuration error taxonomy.
//!
//! Every variant describes authored data the session cannot act on. None of
//! them are fatal: callers report the error and fall back to a no-op (no
//! spawn, no stat update, no award) while the session keeps running.

use thiserror::Error;

use crate::formula::FormulaError;
use crate::number::BigNumber;
use crate::stats::StatUpgradeId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("no encounter configuration for chapter {chapter} (fallback key {fallback:?})")]
    MissingChapter {
        chapter: u32,
        fallback: Option<u32>,
    },

    #[error("stat `{0}` has no player stat event")]
    UnmappedStat(StatUpgradeId),

    #[error("rebirth formula produced non-positive {points} at chapter {chapter}, stage {stage}")]
    NonPositiveRebirthPoints {
        points: BigNumber,
        chapter: u32,
        stage: u32,
    },

    #[error("invalid {name} formula {expression:?}")]
    Formula {
        name: &'static str,
        expression: String,
        #[source]
        source: FormulaError,
    },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
}

impl ConfigError {
    /// Stable label for structured logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingChapter { .. } => "missing_chapter",
            Self::UnmappedStat(_) => "unmapped_stat",
            Self::NonPositiveRebirthPoints { .. } => "non_positive_rebirth_points",
            Self::Formula { .. } => "formula",
            Self::NonPositive { .. } => "non_positive",
        }
    }
}
