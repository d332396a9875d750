//! Gold and rebirth-point math.
//!
//! Both currencies are computed from formulas authored in [`SessionConfig`].
//! The formulas are parsed once; a malformed formula is kept as its parse
//! error and reported on every award attempt instead of failing construction.

use crate::config::SessionConfig;
use crate::error::ConfigError;
use crate::formula::{Formula, FormulaError};
use crate::number::BigNumber;

/// Reward facts about a defeated encounter.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KillReward {
    pub base_gold: BigNumber,
    /// Defeated by a single damage application.
    pub is_one_shot: bool,
    /// Flagged special when spawned.
    pub is_special: bool,
}

#[derive(Clone, Debug)]
struct CompiledFormula {
    expression: String,
    parsed: Result<Formula, FormulaError>,
}

impl CompiledFormula {
    fn new(expression: &str) -> Self {
        Self {
            expression: expression.to_owned(),
            parsed: Formula::parse(expression),
        }
    }

    fn evaluate(
        &self,
        name: &'static str,
        bindings: &[(&str, BigNumber)],
    ) -> Result<BigNumber, ConfigError> {
        let into_config = |source: FormulaError| ConfigError::Formula {
            name,
            expression: self.expression.clone(),
            source,
        };
        match &self.parsed {
            Ok(formula) => formula.evaluate(bindings).map_err(into_config),
            Err(err) => Err(into_config(err.clone())),
        }
    }
}

/// Economy formulas and bonus multipliers bound for one session.
#[derive(Clone, Debug)]
pub struct Economy {
    gold: CompiledFormula,
    rebirth: CompiledFormula,
    one_shot_bonus: f32,
    special_bonus: f32,
    rebirth_condition_chapter: u32,
}

impl Economy {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            gold: CompiledFormula::new(&config.gold_expression),
            rebirth: CompiledFormula::new(&config.rebirth_expression),
            one_shot_bonus: config.one_shot_bonus_multiplier,
            special_bonus: config.special_encounter_bonus_multiplier,
            rebirth_condition_chapter: config.rebirth_condition_chapter,
        }
    }

    /// Gold for one kill at the given progression.
    ///
    /// The gold formula sees `value`, `stage` and `chapter`. One-shot and
    /// special bonuses multiply the result independently.
    pub fn gold_for_kill(
        &self,
        reward: &KillReward,
        chapter: u32,
        stage: u32,
    ) -> Result<BigNumber, ConfigError> {
        let mut gold = self.gold.evaluate(
            "gold",
            &[
                ("value", reward.base_gold),
                ("stage", BigNumber::from(stage)),
                ("chapter", BigNumber::from(chapter)),
            ],
        )?;
        if reward.is_one_shot {
            gold *= self.one_shot_bonus;
        }
        if reward.is_special {
            gold *= self.special_bonus;
        }
        Ok(gold)
    }

    /// Rebirth points earned by ending the run at `chapter`/`stage`.
    ///
    /// Only strictly positive results are awardable; anything else is
    /// [`ConfigError::NonPositiveRebirthPoints`].
    pub fn rebirth_points(&self, chapter: u32, stage: u32) -> Result<BigNumber, ConfigError> {
        let points = self.rebirth.evaluate(
            "rebirth",
            &[
                ("chapter", BigNumber::from(chapter)),
                ("stage", BigNumber::from(stage)),
                (
                    "conditionChapter",
                    BigNumber::from(self.rebirth_condition_chapter),
                ),
            ],
        )?;
        if !points.is_positive() {
            return Err(ConfigError::NonPositiveRebirthPoints {
                points,
                chapter,
                stage,
            });
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn economy(gold: &str, rebirth: &str) -> Economy {
        Economy::from_config(&SessionConfig {
            gold_expression: gold.into(),
            rebirth_expression: rebirth.into(),
            one_shot_bonus_multiplier: 2.0,
            special_encounter_bonus_multiplier: 3.0,
            rebirth_condition_chapter: 4,
            ..SessionConfig::default()
        })
    }

    fn kill(base: u32, is_one_shot: bool, is_special: bool) -> KillReward {
        KillReward {
            base_gold: BigNumber::from(base),
            is_one_shot,
            is_special,
        }
    }

    #[test]
    fn gold_formula_sees_value_stage_and_chapter() {
        let economy = economy("value * stage + chapter", "1");
        assert_eq!(
            economy.gold_for_kill(&kill(10, false, false), 2, 3),
            Ok(BigNumber::from(32u32))
        );
    }

    #[test]
    fn bonuses_compose_multiplicatively() {
        let economy = economy("value", "1");
        let gold = |one_shot, special| {
            economy
                .gold_for_kill(&kill(10, one_shot, special), 1, 1)
                .unwrap()
        };
        assert_eq!(gold(false, false), BigNumber::from(10u32));
        assert_eq!(gold(true, false), BigNumber::from(20u32));
        assert_eq!(gold(false, true), BigNumber::from(30u32));
        assert_eq!(gold(true, true), BigNumber::from(60u32));
    }

    #[test]
    fn positive_rebirth_constant_is_awarded_exactly() {
        let economy = economy("value", "7");
        assert_eq!(economy.rebirth_points(5, 3), Ok(BigNumber::from(7u32)));
    }

    #[test]
    fn rebirth_formula_sees_condition_chapter() {
        let economy = economy("value", "(chapter - conditionChapter) * 10 + stage");
        assert_eq!(economy.rebirth_points(5, 3), Ok(BigNumber::from(13u32)));
    }

    #[test]
    fn non_positive_rebirth_points_are_rejected() {
        for formula in ["0", "chapter - 10"] {
            let economy = economy("value", formula);
            assert!(matches!(
                economy.rebirth_points(5, 3),
                Err(ConfigError::NonPositiveRebirthPoints {
                    chapter: 5,
                    stage: 3,
                    ..
                })
            ));
        }
    }

    #[test]
    fn malformed_formula_is_reported_per_award() {
        let economy = economy("value *", "1");
        let err = economy
            .gold_for_kill(&kill(1, false, false), 1, 1)
            .unwrap_err();
        assert_eq!(err.kind(), "formula");
        // The other formula still works.
        assert!(economy.rebirth_points(1, 1).is_ok());
    }
}
