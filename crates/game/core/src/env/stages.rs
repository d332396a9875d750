//! Stage oracle for chapter encounter tables.

use crate::config::EncounterSetConfig;
use crate::error::ConfigError;

/// Provides encounter configuration keyed by chapter number.
pub trait StageOracle: Send + Sync {
    /// Returns the encounter set authored for `chapter`, if any.
    fn chapter(&self, chapter: u32) -> Option<EncounterSetConfig>;

    /// Number of chapter keys known to the table.
    fn chapter_count(&self) -> usize;
}

/// Looks up `chapter`, falling back to `(chapter % count) + 1` when the exact
/// key is absent so progression past the authored table loops its content.
pub fn resolve_encounters<S>(stages: &S, chapter: u32) -> Result<EncounterSetConfig, ConfigError>
where
    S: StageOracle + ?Sized,
{
    if let Some(config) = stages.chapter(chapter) {
        return Ok(config);
    }

    let count = u32::try_from(stages.chapter_count()).unwrap_or(u32::MAX);
    if count == 0 {
        return Err(ConfigError::MissingChapter {
            chapter,
            fallback: None,
        });
    }

    let fallback = chapter % count + 1;
    stages
        .chapter(fallback)
        .ok_or(ConfigError::MissingChapter {
            chapter,
            fallback: Some(fallback),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    struct Table(BTreeMap<u32, EncounterSetConfig>);

    impl StageOracle for Table {
        fn chapter(&self, chapter: u32) -> Option<EncounterSetConfig> {
            self.0.get(&chapter).cloned()
        }

        fn chapter_count(&self) -> usize {
            self.0.len()
        }
    }

    fn set(id: &str) -> EncounterSetConfig {
        EncounterSetConfig {
            min_count: 1,
            max_count: 3,
            encounter_ids: vec![id.to_owned()],
        }
    }

    fn table(keys: &[u32]) -> Table {
        Table(keys.iter().map(|&k| (k, set(&format!("c{k}")))).collect())
    }

    #[test]
    fn exact_key_wins() {
        let stages = table(&[1, 2, 3]);
        assert_eq!(resolve_encounters(&stages, 2).unwrap(), set("c2"));
    }

    #[test]
    fn wraps_around_known_chapters() {
        let stages = table(&[1, 2, 3]);
        // 7 % 3 + 1 == 2
        assert_eq!(resolve_encounters(&stages, 7).unwrap(), set("c2"));
        // 6 % 3 + 1 == 1
        assert_eq!(resolve_encounters(&stages, 6).unwrap(), set("c1"));
    }

    #[test]
    fn missing_after_wraparound_is_reported() {
        // Sparse keys: 5 % 2 + 1 == 2, which is not authored.
        let stages = table(&[1, 4]);
        assert_eq!(
            resolve_encounters(&stages, 5),
            Err(ConfigError::MissingChapter {
                chapter: 5,
                fallback: Some(2)
            })
        );
    }

    #[test]
    fn empty_table_has_no_fallback() {
        let stages = table(&[]);
        assert_eq!(
            resolve_encounters(&stages, 1),
            Err(ConfigError::MissingChapter {
                chapter: 1,
                fallback: None
            })
        );
    }
}
