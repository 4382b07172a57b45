//! Identifier mapping between legacy demo ids and canonical storage ids
//!
//! The pair set is fixed at process start. Lookups are total: an unknown id
//! passes through [`IdentifierMapper::resolve_canonical`] unchanged, while
//! [`IdentifierMapper::resolve_legacy`] answers `None` so callers can tell
//! "already canonical" apart from "no richer legacy data".

mod table;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{ForkfulError, IdKind, Result};

/// One canonical id and its legacy counterpart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierPair {
    pub canonical: String,
    pub legacy: String,
}

impl IdentifierPair {
    pub fn new(canonical: impl Into<String>, legacy: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
            legacy: legacy.into(),
        }
    }
}

/// Immutable bidirectional lookup table
#[derive(Debug, Clone, Default)]
pub struct IdentifierMapper {
    to_legacy: BTreeMap<String, String>,
    to_canonical: BTreeMap<String, String>,
}

impl IdentifierMapper {
    /// The compiled-in table.
    pub fn builtin() -> Self {
        let mut mapper = Self::default();
        for (canonical, legacy) in table::BUILTIN_PAIRS {
            mapper.to_legacy.insert(canonical.to_string(), legacy.to_string());
            mapper.to_canonical.insert(legacy.to_string(), canonical.to_string());
        }
        mapper
    }

    /// Build a mapper from configuration data.
    ///
    /// Rejects empty tokens and any pair set where a canonical or legacy id
    /// appears twice, so the forward and reverse maps are always exact
    /// inverses.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = IdentifierPair>,
    {
        let mut mapper = Self::default();
        for pair in pairs {
            mapper.insert(pair)?;
        }
        Ok(mapper)
    }

    /// The built-in table extended with `extra` pairs.
    pub fn builtin_with<I>(extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = IdentifierPair>,
    {
        let mut mapper = Self::builtin();
        for pair in extra {
            mapper.insert(pair)?;
        }
        Ok(mapper)
    }

    fn insert(&mut self, pair: IdentifierPair) -> Result<()> {
        if pair.canonical.is_empty() || pair.legacy.is_empty() {
            return Err(ForkfulError::EmptyIdentifier);
        }
        if self.to_legacy.contains_key(&pair.canonical) {
            return Err(ForkfulError::DuplicateIdentifier {
                kind: IdKind::Canonical,
                id: pair.canonical,
            });
        }
        if self.to_canonical.contains_key(&pair.legacy) {
            return Err(ForkfulError::DuplicateIdentifier {
                kind: IdKind::Legacy,
                id: pair.legacy,
            });
        }
        self.to_canonical.insert(pair.legacy.clone(), pair.canonical.clone());
        self.to_legacy.insert(pair.canonical, pair.legacy);
        Ok(())
    }

    /// Legacy id -> canonical id; any other input is returned unchanged.
    pub fn resolve_canonical<'a>(&'a self, id: &'a str) -> &'a str {
        self.to_canonical.get(id).map(String::as_str).unwrap_or(id)
    }

    /// Canonical id -> legacy id, or `None` when no legacy mapping exists.
    pub fn resolve_legacy(&self, canonical_id: &str) -> Option<&str> {
        self.to_legacy.get(canonical_id).map(String::as_str)
    }

    /// True when `id` (legacy or canonical) has a legacy presentation dataset.
    pub fn has_rich_legacy_data(&self, id: &str) -> bool {
        self.to_legacy.contains_key(self.resolve_canonical(id))
    }

    /// Pairs in canonical-id order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.to_legacy
            .iter()
            .map(|(canonical, legacy)| (canonical.as_str(), legacy.as_str()))
    }

    pub fn len(&self) -> usize {
        self.to_legacy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_legacy.is_empty()
    }
}

static GLOBAL: OnceLock<IdentifierMapper> = OnceLock::new();

/// Install the process-wide table. Must happen before the first lookup;
/// there is no re-initialization path.
pub fn install(mapper: IdentifierMapper) -> Result<()> {
    install_into(&GLOBAL, mapper)
}

fn install_into(cell: &OnceLock<IdentifierMapper>, mapper: IdentifierMapper) -> Result<()> {
    let count = mapper.len();
    cell.set(mapper)
        .map_err(|_| ForkfulError::IdentifiersAlreadyInstalled)?;
    tracing::debug!("Installed identifier table with {} pairs", count);
    Ok(())
}

/// The process-wide table, falling back to the built-in pairs.
pub fn global() -> &'static IdentifierMapper {
    GLOBAL.get_or_init(IdentifierMapper::builtin)
}

pub fn resolve_canonical(id: &str) -> String {
    global().resolve_canonical(id).to_string()
}

pub fn resolve_legacy(canonical_id: &str) -> Option<String> {
    global().resolve_legacy(canonical_id).map(str::to_string)
}

pub fn has_rich_legacy_data(id: &str) -> bool {
    global().has_rich_legacy_data(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const YAKOYO_UUID: &str = "8179401a-d2c5-4561-98ae-2010b561d477";

    #[test]
    fn test_yakoyo_mapping() {
        let mapper = IdentifierMapper::builtin();
        assert_eq!(mapper.resolve_canonical("yakoyo-demo"), YAKOYO_UUID);
        assert_eq!(mapper.resolve_legacy(YAKOYO_UUID), Some("yakoyo-demo"));
        assert!(mapper.has_rich_legacy_data(YAKOYO_UUID));
        assert!(mapper.has_rich_legacy_data("yakoyo-demo"));
        assert!(!mapper.has_rich_legacy_data("unknown-id"));
    }

    #[test]
    fn test_free_functions_use_builtin_table() {
        assert_eq!(resolve_canonical("yakoyo-demo"), YAKOYO_UUID);
        assert_eq!(resolve_legacy(YAKOYO_UUID), Some("yakoyo-demo".to_string()));
        assert!(has_rich_legacy_data(YAKOYO_UUID));
        assert!(!has_rich_legacy_data("unknown-id"));
    }

    #[test]
    fn test_builtin_table_is_a_bijection() {
        let pairs = table::BUILTIN_PAIRS
            .iter()
            .map(|(c, l)| IdentifierPair::new(*c, *l));
        let mapper = IdentifierMapper::from_pairs(pairs).unwrap();
        assert_eq!(mapper.len(), table::BUILTIN_PAIRS.len());
    }

    #[test]
    fn test_round_trip_is_stable_for_every_legacy_id() {
        let mapper = IdentifierMapper::builtin();
        for (_, legacy) in mapper.pairs() {
            let canonical = mapper.resolve_canonical(legacy);
            let back = mapper.resolve_legacy(canonical).unwrap();
            assert_eq!(mapper.resolve_canonical(back), canonical);
        }
    }

    #[rstest]
    #[case("unknown-id")]
    #[case("")]
    #[case("00000000-0000-0000-0000-000000000000")]
    #[case("YAKOYO-DEMO")]
    fn test_unknown_ids_pass_through(#[case] id: &str) {
        let mapper = IdentifierMapper::builtin();
        assert_eq!(mapper.resolve_canonical(id), id);
        assert_eq!(mapper.resolve_legacy(id), None);
        assert!(!mapper.has_rich_legacy_data(id));
    }

    #[test]
    fn test_resolve_legacy_does_not_accept_legacy_input() {
        let mapper = IdentifierMapper::builtin();
        assert_eq!(mapper.resolve_legacy("yakoyo-demo"), None);
    }

    #[test]
    fn test_from_pairs_rejects_duplicate_canonical() {
        let err = IdentifierMapper::from_pairs([
            IdentifierPair::new("c-1", "a-demo"),
            IdentifierPair::new("c-1", "b-demo"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ForkfulError::DuplicateIdentifier { kind: IdKind::Canonical, ref id } if id == "c-1"
        ));
    }

    #[test]
    fn test_from_pairs_rejects_duplicate_legacy() {
        let err = IdentifierMapper::from_pairs([
            IdentifierPair::new("c-1", "a-demo"),
            IdentifierPair::new("c-2", "a-demo"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ForkfulError::DuplicateIdentifier { kind: IdKind::Legacy, ref id } if id == "a-demo"
        ));
    }

    #[test]
    fn test_from_pairs_rejects_empty_tokens() {
        let err = IdentifierMapper::from_pairs([IdentifierPair::new("", "a-demo")]).unwrap_err();
        assert!(matches!(err, ForkfulError::EmptyIdentifier));
    }

    #[test]
    fn test_builtin_with_extends_table() {
        let mapper =
            IdentifierMapper::builtin_with([IdentifierPair::new("c-extra", "extra-demo")]).unwrap();
        assert_eq!(mapper.len(), table::BUILTIN_PAIRS.len() + 1);
        assert_eq!(mapper.resolve_canonical("extra-demo"), "c-extra");
        assert!(mapper.has_rich_legacy_data("c-extra"));
        assert_eq!(mapper.resolve_canonical("yakoyo-demo"), YAKOYO_UUID);
    }

    #[test]
    fn test_builtin_with_rejects_collision_with_builtin() {
        let result = IdentifierMapper::builtin_with([IdentifierPair::new("c-new", "yakoyo-demo")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_pairs_sorted_by_canonical() {
        let mapper = IdentifierMapper::from_pairs([
            IdentifierPair::new("b", "b-demo"),
            IdentifierPair::new("a", "a-demo"),
        ])
        .unwrap();
        let pairs: Vec<_> = mapper.pairs().collect();
        assert_eq!(pairs, vec![("a", "a-demo"), ("b", "b-demo")]);
    }

    #[test]
    fn test_install_only_once() {
        let cell = OnceLock::new();
        install_into(&cell, IdentifierMapper::default()).unwrap();
        let err = install_into(&cell, IdentifierMapper::builtin()).unwrap_err();
        assert!(matches!(err, ForkfulError::IdentifiersAlreadyInstalled));
        assert!(cell.get().unwrap().is_empty());
    }

    #[test]
    fn test_mapper_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IdentifierMapper>();
    }
}
