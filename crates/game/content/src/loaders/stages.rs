//! Chapter stage table loader.

use std::collections::BTreeMap;
use std::path::Path;

use runner_core::EncounterSetConfig;

use crate::loaders::{LoadResult, read_file};

/// Encounter sets keyed by chapter number.
pub type StageTable = BTreeMap<u32, EncounterSetConfig>;

/// Loader for stage tables from RON files.
///
/// The file is a map from chapter key to encounter set. Keys are strings so
/// the table reads the same way it is authored:
///
/// ```text
/// {
///     "1": (min_count: 3, max_count: 6, encounter_ids: ["slime", "bat"]),
///     "2": (min_count: 4, max_count: 8, encounter_ids: ["goblin"]),
/// }
/// ```
pub struct StageLoader;

impl StageLoader {
    pub fn load(path: &Path) -> LoadResult<StageTable> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<StageTable> {
        let raw: BTreeMap<String, EncounterSetConfig> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse stage table RON: {}", e))?;

        let mut table = StageTable::new();
        for (key, config) in raw {
            let chapter: u32 = key
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid chapter key {:?}: {}", key, e))?;
            if chapter == 0 {
                anyhow::bail!("Chapter keys start at 1, found {:?}", key);
            }
            if config.encounter_ids.is_empty() {
                anyhow::bail!("Chapter {} has no encounter ids", chapter);
            }
            table.insert(chapter, config);
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_string_keyed_chapters() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
    "1": (min_count: 3, max_count: 6, encounter_ids: ["slime", "bat"]),
    "10": (min_count: 5, max_count: 9, encounter_ids: ["dragon"]),
}}"#
        )
        .unwrap();

        let table = StageLoader::load(file.path()).unwrap();

        assert_eq!(table.keys().copied().collect::<Vec<_>>(), vec![1, 10]);
        assert_eq!(table[&1].encounter_ids, vec!["slime", "bat"]);
        assert_eq!(table[&10].max_count, 9);
    }

    #[test]
    fn rejects_non_numeric_keys() {
        let err = StageLoader::parse(
            r#"{ "first": (min_count: 1, max_count: 2, encounter_ids: ["slime"]) }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid chapter key"));
    }

    #[test]
    fn rejects_chapter_zero() {
        let err =
            StageLoader::parse(r#"{ "0": (min_count: 1, max_count: 2, encounter_ids: ["slime"]) }"#)
                .unwrap_err();
        assert!(err.to_string().contains("start at 1"));
    }
}
