//! Stage oracle implementation for runtime.

use std::collections::BTreeMap;

use runner_core::{EncounterSetConfig, env::StageOracle};

/// Runtime implementation of StageOracle backed by a loaded stage table.
#[derive(Debug, Clone, Default)]
pub struct StageOracleImpl {
    chapters: BTreeMap<u32, EncounterSetConfig>,
}

impl StageOracleImpl {
    pub fn new(chapters: BTreeMap<u32, EncounterSetConfig>) -> Self {
        Self { chapters }
    }

    /// Inserts or replaces one chapter.
    pub fn with_chapter(mut self, chapter: u32, config: EncounterSetConfig) -> Self {
        self.chapters.insert(chapter, config);
        self
    }
}

impl StageOracle for StageOracleImpl {
    fn chapter(&self, chapter: u32) -> Option<EncounterSetConfig> {
        self.chapters.get(&chapter).cloned()
    }

    fn chapter_count(&self) -> usize {
        self.chapters.len()
    }
}

#[cfg(test)]
mod tests {
    use runner_core::resolve_encounters;

    use super::*;

    #[test]
    fn builder_and_wraparound() {
        let set = |ids: &[&str]| EncounterSetConfig {
            min_count: 1,
            max_count: 2,
            encounter_ids: ids.iter().map(|s| s.to_string()).collect(),
        };
        let oracle = StageOracleImpl::default()
            .with_chapter(1, set(&["slime"]))
            .with_chapter(2, set(&["bat"]));

        assert_eq!(oracle.chapter_count(), 2);
        assert_eq!(
            resolve_encounters(&oracle, 5).unwrap().encounter_ids,
            vec!["bat"]
        );
    }
}
