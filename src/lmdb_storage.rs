//! Durable [`StoragePort`] on top of LMDB.
//!
//! Each journal lives in its own environment directory, `<name>.lmdb`,
//! holding one named database of UTF-8 string slots.

use std::path::{Path, PathBuf};

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info};

use crate::error::StorageError;
use crate::storage_port::StoragePort;

const DATABASE_NAME: &str = "journal";

/// Room for the capped collection plus encoded images.
const MAP_SIZE: usize = 64 * 1024 * 1024;

pub struct LmdbStorage {
    env: Environment,
    db: Database,
    path: PathBuf,
}

impl LmdbStorage {
    /// Opens or creates `<name>.lmdb`.
    ///
    /// ```no_run
    /// use coffee_journal_core::lmdb_storage::LmdbStorage;
    /// use coffee_journal_core::storage_port::StoragePort;
    ///
    /// let storage = LmdbStorage::open("coffee_journal")?;
    /// storage.set("greeting", "hello")?;
    /// assert_eq!(storage.get("greeting")?, Some("hello".to_string()));
    /// # Ok::<(), coffee_journal_core::error::StorageError>(())
    /// ```
    pub fn open(name: &str) -> Result<Self, StorageError> {
        Self::open_at(Path::new(&format!("{name}.lmdb")))
    }

    /// Opens or creates an environment in the given directory.
    pub fn open_at(dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir).map_err(|e| {
            StorageError::MediumUnavailable(format!("Cannot create {}: {e}", dir.display()))
        })?;

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(MAP_SIZE)
            .open(dir)
            .map_err(|e| {
                StorageError::MediumUnavailable(format!("Cannot open LMDB at {}: {e}", dir.display()))
            })?;

        let db = env
            .create_db(Some(DATABASE_NAME), DatabaseFlags::empty())
            .map_err(|e| StorageError::MediumUnavailable(format!("Cannot create database: {e}")))?;

        info!("LMDB storage opened at {}", dir.display());

        Ok(Self {
            env,
            db,
            path: dir.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write<F>(&self, op: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut lmdb::RwTransaction<'_>) -> Result<(), lmdb::Error>,
    {
        let mut txn = self
            .env
            .begin_rw_txn()
            .map_err(|e| StorageError::WriteFailure(format!("Cannot begin transaction: {e}")))?;

        op(&mut txn).map_err(|e| StorageError::WriteFailure(e.to_string()))?;

        txn.commit()
            .map_err(|e| StorageError::WriteFailure(format!("Commit failed: {e}")))
    }
}

impl StoragePort for LmdbStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let txn = self
            .env
            .begin_ro_txn()
            .map_err(|e| StorageError::MediumUnavailable(format!("Cannot begin read: {e}")))?;

        let value = match txn.get(self.db, &key) {
            Ok(bytes) => Some(String::from_utf8(bytes.to_vec()).map_err(|e| {
                StorageError::ParseFailure(format!("Slot '{key}' is not UTF-8: {e}"))
            })?),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(StorageError::MediumUnavailable(e.to_string())),
        };

        txn.abort();
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!("LMDB set '{key}' ({} bytes)", value.len());
        self.write(|txn| txn.put(self.db, &key, &value, WriteFlags::empty()))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.write(|txn| match txn.del(self.db, &key, None) {
            Ok(()) | Err(lmdb::Error::NotFound) => Ok(()),
            Err(e) => Err(e),
        })
    }
}
