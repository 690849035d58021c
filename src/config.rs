//! Journal configuration.
//!
//! Hosts may pass a JSON object with any subset of the fields; the rest
//! fall back to their defaults.
//!
//! ```rust
//! use coffee_journal_core::config::JournalConfig;
//!
//! let config = JournalConfig::from_json(r#"{"max_entries": 25}"#)?;
//! assert_eq!(config.max_entries, 25);
//! assert_eq!(config.payload_key, "coffee-journal-data");
//! # Ok::<(), serde_json::Error>(())
//! ```

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAYLOAD_KEY: &str = "coffee-journal-data";
pub const DEFAULT_VERSION_KEY: &str = "coffee-journal-version";
pub const DEFAULT_MAX_ENTRIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Slot holding the serialized collection.
    pub payload_key: String,
    /// Slot holding the schema version of the payload.
    pub version_key: String,
    /// Cap applied when committing new entries. Storage itself has none.
    pub max_entries: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            payload_key: DEFAULT_PAYLOAD_KEY.to_string(),
            version_key: DEFAULT_VERSION_KEY.to_string(),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl JournalConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
