//! `identifiers.toml`: extra legacy/canonical pairs merged over the built-in table
//!
//! ```toml
//! [[pair]]
//! canonical = "8179401a-d2c5-4561-98ae-2010b561d477"
//! legacy = "yakoyo-demo"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids::{IdentifierMapper, IdentifierPair};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifiersFile {
    #[serde(default, rename = "pair")]
    pub pairs: Vec<IdentifierPair>,
}

impl IdentifiersFile {
    pub fn into_mapper(self) -> Result<IdentifierMapper> {
        IdentifierMapper::builtin_with(self.pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let file: IdentifiersFile = toml::from_str(
            "[[pair]]\ncanonical = \"a\"\nlegacy = \"a-demo\"\n\n[[pair]]\ncanonical = \"b\"\nlegacy = \"b-demo\"\n",
        )
        .unwrap();
        assert_eq!(file.pairs.len(), 2);
        assert_eq!(file.pairs[1], IdentifierPair::new("b", "b-demo"));
    }

    #[test]
    fn test_empty_file_is_builtin() {
        let file: IdentifiersFile = toml::from_str("").unwrap();
        let mapper = file.into_mapper().unwrap();
        assert_eq!(mapper.len(), IdentifierMapper::builtin().len());
    }

    #[test]
    fn test_duplicate_pairs_rejected() {
        let file = IdentifiersFile {
            pairs: vec![IdentifierPair::new("x", "x-demo"), IdentifierPair::new("x", "y-demo")],
        };
        assert!(file.into_mapper().is_err());
    }
}
