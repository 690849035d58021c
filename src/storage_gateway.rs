//! Load, save and clear the journal against a host key-value medium.
//!
//! The gateway keeps two slots in the medium: the payload (a JSON array of
//! [`PersistedCoffee`](crate::journal_model::PersistedCoffee)) and the
//! schema version it was written under. Nothing it does can fail from the
//! caller's point of view: an absent medium, an unreadable payload or a
//! rejected write all degrade to an empty collection or a no-op, and are
//! logged.
//!
//! Callers that need to know *why* a load came back empty use
//! [`StorageGateway::load_outcome`]; writes have `try_*` counterparts.

use std::cell::Cell;

use log::{debug, info, warn};
use serde_json::Value as JsonValue;

use crate::config::JournalConfig;
use crate::error::StorageError;
use crate::journal_model::{Coffee, PersistedCoffee};
use crate::legacy_migrator;
use crate::serializer;
use crate::storage_port::StoragePort;
use crate::version::{self, CURRENT_SCHEMA_VERSION, UNVERSIONED};

/// Lifecycle of a gateway. There is no failure state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Loaded,
    Empty,
}

/// Why [`StorageGateway::load_outcome`] produced no records.
#[derive(Debug, Clone, PartialEq)]
pub enum EmptyReason {
    MediumUnavailable,
    NothingStored,
    ReadFailed(StorageError),
    ParseFailed(StorageError),
}

/// Per-load bookkeeping for records that needed repair or were dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub repaired_timestamps: usize,
    pub skipped_records: usize,
}

/// Detailed result of a load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Empty(EmptyReason),
    Loaded {
        records: Vec<Coffee>,
        report: LoadReport,
    },
    /// Legacy data was upgraded. `persisted` tells whether writing the
    /// upgraded collection back succeeded.
    Migrated {
        records: Vec<Coffee>,
        from_version: String,
        persisted: bool,
    },
}

impl LoadOutcome {
    pub fn into_records(self) -> Vec<Coffee> {
        match self {
            LoadOutcome::Empty(_) => Vec::new(),
            LoadOutcome::Loaded { records, .. } | LoadOutcome::Migrated { records, .. } => records,
        }
    }

    pub fn migrated(&self) -> bool {
        matches!(self, LoadOutcome::Migrated { .. })
    }
}

pub struct StorageGateway<P: StoragePort> {
    medium: Option<P>,
    config: JournalConfig,
    state: Cell<StoreState>,
}

impl<P: StoragePort> StorageGateway<P> {
    pub fn new(medium: P) -> Self {
        Self::with_config(Some(medium), JournalConfig::default())
    }

    /// A gateway with no medium behind it. Every load is empty and every
    /// write is a no-op.
    pub fn detached() -> Self {
        Self::with_config(None, JournalConfig::default())
    }

    pub fn with_config(medium: Option<P>, config: JournalConfig) -> Self {
        Self {
            medium,
            config,
            state: Cell::new(StoreState::Uninitialized),
        }
    }

    pub fn state(&self) -> StoreState {
        self.state.get()
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn has_medium(&self) -> bool {
        self.medium.is_some()
    }

    pub fn medium(&self) -> Option<&P> {
        self.medium.as_ref()
    }

    /// Reads the stored collection, upgrading legacy data on the way.
    pub fn load(&self) -> Vec<Coffee> {
        self.load_outcome().into_records()
    }

    pub fn load_outcome(&self) -> LoadOutcome {
        self.state.set(StoreState::Loaded);

        let Some(medium) = &self.medium else {
            debug!("Load skipped: no storage medium");
            return LoadOutcome::Empty(EmptyReason::MediumUnavailable);
        };

        let raw = match medium.get(&self.config.payload_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return LoadOutcome::Empty(EmptyReason::NothingStored),
            Err(e) => {
                warn!("Error reading journal payload: {e}");
                return LoadOutcome::Empty(EmptyReason::ReadFailed(e));
            }
        };

        let values = match parse_payload(&raw) {
            Ok(values) => values,
            Err(e) => {
                warn!("Error loading journal: {e}");
                return LoadOutcome::Empty(EmptyReason::ParseFailed(e));
            }
        };

        let stored_version = self.stored_version(medium);

        if version::needs_migration(&stored_version) {
            info!(
                "Stored schema {stored_version} predates {CURRENT_SCHEMA_VERSION}, migrating {} entries",
                values.len()
            );
            let records = legacy_migrator::migrate(values);
            let persisted = match self.try_save(&records) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Migrated journal could not be written back: {e}");
                    false
                }
            };
            return LoadOutcome::Migrated {
                records,
                from_version: stored_version,
                persisted,
            };
        }

        let (records, report) = decode_all(values);
        debug!(
            "Loaded {} entries ({} timestamps repaired, {} skipped)",
            records.len(),
            report.repaired_timestamps,
            report.skipped_records
        );
        LoadOutcome::Loaded { records, report }
    }

    /// Writes the collection and the current version marker. Failures are
    /// logged and swallowed.
    pub fn save(&self, records: &[Coffee]) {
        match self.try_save(records) {
            Ok(()) | Err(StorageError::MediumUnavailable(_)) => {}
            Err(e) => warn!("Error saving journal: {e}"),
        }
    }

    pub fn try_save(&self, records: &[Coffee]) -> Result<(), StorageError> {
        let medium = self.require_medium()?;

        let persisted: Vec<PersistedCoffee> = records.iter().map(serializer::to_persisted).collect();
        let payload = serde_json::to_string(&persisted)
            .map_err(|e| StorageError::WriteFailure(format!("Cannot serialize journal: {e}")))?;

        medium.set(&self.config.payload_key, &payload)?;
        medium.set(&self.config.version_key, CURRENT_SCHEMA_VERSION)?;

        self.state.set(StoreState::Loaded);
        debug!("Saved {} entries", records.len());
        Ok(())
    }

    /// Removes both slots. Missing slots and a missing medium are fine.
    pub fn clear(&self) {
        match self.try_clear() {
            Ok(()) | Err(StorageError::MediumUnavailable(_)) => {}
            Err(e) => warn!("Error clearing journal: {e}"),
        }
    }

    pub fn try_clear(&self) -> Result<(), StorageError> {
        self.state.set(StoreState::Empty);
        let medium = self.require_medium()?;

        medium.remove(&self.config.payload_key)?;
        medium.remove(&self.config.version_key)?;

        info!("Journal storage cleared");
        Ok(())
    }

    fn require_medium(&self) -> Result<&P, StorageError> {
        self.medium
            .as_ref()
            .ok_or_else(|| StorageError::MediumUnavailable("no storage medium".to_string()))
    }

    fn stored_version(&self, medium: &P) -> String {
        match medium.get(&self.config.version_key) {
            Ok(Some(version)) => version,
            Ok(None) => UNVERSIONED.to_string(),
            Err(e) => {
                warn!("Error reading schema version, assuming {UNVERSIONED}: {e}");
                UNVERSIONED.to_string()
            }
        }
    }
}

/// The payload must be a JSON array; its elements are inspected later.
fn parse_payload(raw: &str) -> Result<Vec<JsonValue>, StorageError> {
    serde_json::from_str::<Vec<JsonValue>>(raw).map_err(StorageError::from)
}

/// Decodes every element on its own so a damaged record cannot take the
/// rest of the collection down with it.
fn decode_all(values: Vec<JsonValue>) -> (Vec<Coffee>, LoadReport) {
    let mut report = LoadReport::default();
    let mut records = Vec::with_capacity(values.len());

    for (index, value) in values.into_iter().enumerate() {
        match serializer::decode_value(value) {
            Ok((coffee, repaired)) => {
                if repaired {
                    report.repaired_timestamps += 1;
                }
                records.push(coffee);
            }
            Err(e) => {
                warn!("Skipping stored entry {index}: {e}");
                report.skipped_records += 1;
            }
        }
    }

    (records, report)
}
