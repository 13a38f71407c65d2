//! Friendly voice alias table
//!
//! Maps short names like `fable` to canonical voice-spec strings like
//! `en-GB-SoniaNeural-5r+10p`. The table is loaded once at startup from a
//! JSON object file; a missing or malformed file degrades to an empty table
//! and is never fatal.

use std::collections::HashMap;
use std::path::Path;

use tracing::{error, info, warn};

/// Alias -> canonical voice-spec string mapping
#[derive(Debug, Clone, Default)]
pub struct VoiceAliasTable {
    map: HashMap<String, String>,
}

impl VoiceAliasTable {
    /// Create an empty table
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the table from a JSON object file
    ///
    /// A missing file logs a warning, malformed JSON logs an error; both
    /// yield an empty table.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Voice alias file not readable, using empty table");
                return Self::empty();
            },
        };

        match serde_json::from_str::<HashMap<String, String>>(&contents) {
            Ok(map) => {
                info!(path = %path.display(), aliases = map.len(), "Loaded voice aliases");
                Self { map }
            },
            Err(e) => {
                error!(path = %path.display(), error = %e, "Invalid JSON in voice alias file, using empty table");
                Self::empty()
            },
        }
    }

    /// Resolve a voice string through the table
    ///
    /// Exact key match only; unknown strings are returned unchanged.
    #[must_use]
    pub fn resolve<'a>(&'a self, voice: &'a str) -> &'a str {
        self.map.get(voice).map_or(voice, String::as_str)
    }

    /// Number of aliases in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the table has no aliases
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VoiceAliasTable {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            map: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
