//! Dotted schema version strings and their ordering.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Schema version written to the version slot on every save.
pub const CURRENT_SCHEMA_VERSION: &str = "2.0.0";

/// Version assumed when the version slot is empty.
pub const UNVERSIONED: &str = "0.0.0";

/// `major.minor.patch`, parsed leniently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SchemaVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SchemaVersion {
    /// Never fails: missing or non-numeric segments read as `0`, and
    /// anything after the third segment is ignored.
    ///
    /// ```rust
    /// use coffee_journal_core::version::SchemaVersion;
    ///
    /// assert_eq!(SchemaVersion::parse("2"), SchemaVersion { major: 2, minor: 0, patch: 0 });
    /// assert_eq!(SchemaVersion::parse("1.x.3"), SchemaVersion { major: 1, minor: 0, patch: 3 });
    /// ```
    pub fn parse(text: &str) -> Self {
        let mut segments = text
            .split('.')
            .map(|segment| segment.trim().parse::<u64>().unwrap_or(0));

        Self {
            major: segments.next().unwrap_or(0),
            minor: segments.next().unwrap_or(0),
            patch: segments.next().unwrap_or(0),
        }
    }

    pub fn current() -> Self {
        Self::parse(CURRENT_SCHEMA_VERSION)
    }
}

impl Display for SchemaVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Orders two version strings segment by segment.
pub fn compare(a: &str, b: &str) -> Ordering {
    SchemaVersion::parse(a).cmp(&SchemaVersion::parse(b))
}

/// True when data written under `stored` predates the current schema.
/// Equal and newer versions both load without migration.
pub fn needs_migration(stored: &str) -> bool {
    compare(stored, CURRENT_SCHEMA_VERSION) == Ordering::Less
}
