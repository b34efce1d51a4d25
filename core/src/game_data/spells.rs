//! Static spell metadata, bundled with the crate.
//!
//! The table enriches a participant's class label the first time they
//! are seen casting a known spell. It is built once at startup and
//! injected into the parser; tests can swap in their own entries via
//! [`SpellTable::from_entries`].

use hashbrown::HashMap;
use serde::Deserialize;
use thiserror::Error;

const BUNDLED_SPELLS: &str = include_str!("../../data/spells.toml");

#[derive(Debug, Error)]
pub enum SpellDataError {
    #[error("failed to parse spell data")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpellInfo {
    pub name: String,
    /// Class the spell originates from.
    pub class: String,
    /// Action-point cost; bookkeeping for front-ends only.
    pub cost: u8,
}

#[derive(Debug, Deserialize)]
struct SpellFile {
    spell: Vec<SpellInfo>,
}

/// Read-only spell name -> metadata lookup, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct SpellTable {
    by_name: HashMap<String, SpellInfo>,
}

impl SpellTable {
    /// Builds the table from the bundled data file.
    pub fn bundled() -> Result<Self, SpellDataError> {
        Self::from_toml(BUNDLED_SPELLS)
    }

    pub fn from_toml(data: &str) -> Result<Self, SpellDataError> {
        let file: SpellFile = toml::from_str(data)?;
        Ok(Self::from_entries(file.spell))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = SpellInfo>) -> Self {
        let by_name = entries
            .into_iter()
            .map(|info| (info.name.to_lowercase(), info))
            .collect();
        Self { by_name }
    }

    pub fn lookup(&self, spell: &str) -> Option<&SpellInfo> {
        self.by_name.get(&spell.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Summon spells share the client's `Invocation ...` naming.
pub fn is_summon_spell(spell: &str) -> bool {
    spell.starts_with("Invocation")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_data_parses() {
        let table = SpellTable::bundled().unwrap();
        assert!(!table.is_empty());
        let info = table.lookup("Pression").unwrap();
        assert_eq!(info.class, "Iop");
    }

    #[test]
    fn lookup_folds_case() {
        let table = SpellTable::bundled().unwrap();
        assert!(table.lookup("flèche magique").is_some());
        assert!(table.lookup("FLÈCHE MAGIQUE").is_some());
        assert!(table.lookup("Sort Inconnu").is_none());
    }

    #[test]
    fn summon_spells_detected_by_name() {
        assert!(is_summon_spell("Invocation de Bouftou"));
        assert!(!is_summon_spell("Pression"));
    }
}
