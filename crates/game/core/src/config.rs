//! Session configuration and per-chapter encounter data.

use crate::error::ConfigError;
use crate::formula::Formula;
use crate::number::BigNumber;

/// Initial player stats published to every freshly spawned player.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlayerInitStats {
    pub max_hp: BigNumber,
    pub damage: BigNumber,
    pub hp_regen: BigNumber,
    pub armor: BigNumber,
    /// Seconds between regeneration ticks.
    pub hp_regen_cooltime: f32,
    pub knockback: f32,
    /// Probability in `[0, 1]`.
    pub critical_chance: f32,
    pub move_speed: f32,
}

impl Default for PlayerInitStats {
    fn default() -> Self {
        Self {
            max_hp: BigNumber::from(100u32),
            damage: BigNumber::from(10u32),
            hp_regen: BigNumber::from(1u32),
            armor: BigNumber::ZERO,
            hp_regen_cooltime: 1.0,
            knockback: 1.0,
            critical_chance: 0.05,
            move_speed: 2.0,
        }
    }
}

/// Immutable session tuning, created once at startup.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    pub player: PlayerInitStats,
    /// Probability that a spawned encounter is flagged special.
    pub special_encounter_chance: f32,
    /// Distance between consecutive stage thresholds inside a chapter.
    pub stage_distance: f32,
    /// Distance to the first chapter goal; later goals grow by `stage_distance`.
    pub chapter_distance: f32,
    /// Variables: `value`, `stage`, `chapter`.
    pub gold_expression: String,
    /// Variables: `chapter`, `stage`, `conditionChapter`.
    pub rebirth_expression: String,
    /// Minimum chapter required to rebirth.
    pub rebirth_condition_chapter: u32,
    pub one_shot_bonus_multiplier: f32,
    pub special_encounter_bonus_multiplier: f32,
}

impl SessionConfig {
    pub const DEFAULT_STAGE_DISTANCE: f32 = 20.0;
    pub const DEFAULT_CHAPTER_DISTANCE: f32 = 100.0;
    pub const DEFAULT_GOLD_EXPRESSION: &'static str =
        "value * (1 + (stage - 1) * 0.1) * 1.5 ^ (chapter - 1)";
    pub const DEFAULT_REBIRTH_EXPRESSION: &'static str =
        "max(chapter - conditionChapter + 1, 0) * (10 + stage)";

    pub const GOLD_VARIABLES: [&'static str; 3] = ["value", "stage", "chapter"];
    pub const REBIRTH_VARIABLES: [&'static str; 3] = ["chapter", "stage", "conditionChapter"];

    /// Checks values the progression math divides by or compiles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.stage_distance > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "stage_distance",
                value: self.stage_distance,
            });
        }
        if !(self.chapter_distance > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "chapter_distance",
                value: self.chapter_distance,
            });
        }
        check_formula("gold", &self.gold_expression, &Self::GOLD_VARIABLES)?;
        check_formula(
            "rebirth",
            &self.rebirth_expression,
            &Self::REBIRTH_VARIABLES,
        )?;
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player: PlayerInitStats::default(),
            special_encounter_chance: 0.05,
            stage_distance: Self::DEFAULT_STAGE_DISTANCE,
            chapter_distance: Self::DEFAULT_CHAPTER_DISTANCE,
            gold_expression: Self::DEFAULT_GOLD_EXPRESSION.to_owned(),
            rebirth_expression: Self::DEFAULT_REBIRTH_EXPRESSION.to_owned(),
            rebirth_condition_chapter: 3,
            one_shot_bonus_multiplier: 2.0,
            special_encounter_bonus_multiplier: 5.0,
        }
    }
}

fn check_formula(
    name: &'static str,
    expression: &str,
    allowed: &[&str],
) -> Result<(), ConfigError> {
    let formula = Formula::parse(expression).map_err(|source| ConfigError::Formula {
        name,
        expression: expression.to_owned(),
        source,
    })?;
    if let Some(unknown) = formula
        .variables()
        .into_iter()
        .find(|var| !allowed.contains(var))
    {
        return Err(ConfigError::Formula {
            name,
            expression: expression.to_owned(),
            source: crate::formula::FormulaError::UnboundVariable(unknown.to_owned()),
        });
    }
    Ok(())
}

/// Encounter population rules for one chapter.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncounterSetConfig {
    /// Inclusive lower bound of a spawn wave.
    pub min_count: u32,
    /// Exclusive upper bound of a spawn wave.
    pub max_count: u32,
    /// Encounter types eligible in this chapter.
    pub encounter_ids: Vec<String>,
}
