//! # Coffee Journal Core
//!
//! Persistence core for a local coffee journal. The library owns the stored
//! representation of journal entries, upgrades data written by earlier schema
//! versions, and keeps every load and save from failing the host application,
//! whether the storage medium is missing, corrupted or full.
//!
//! ## Layers
//!
//! - [`version`]: ordering of dotted schema versions
//! - [`serializer`]: [`journal_model::Coffee`] to and from its stored JSON form
//! - [`legacy_migrator`]: upgrades name-only and single-rating payloads
//! - [`rating`]: the derived average score
//! - [`id_generator`]: unique entry ids
//! - [`storage_gateway`]: load / save / clear over a [`storage_port::StoragePort`]
//! - [`journal_state`]: the in-memory collection and the commit path
//!
//! ## Quick Start
//!
//! ```rust
//! use coffee_journal_core::journal_state::{CoffeeDraft, Journal};
//! use coffee_journal_core::storage_gateway::StorageGateway;
//! use coffee_journal_core::storage_port::MemoryStorage;
//!
//! let mut journal = Journal::open(StorageGateway::new(MemoryStorage::new()));
//! let entry = journal.commit(CoffeeDraft {
//!     name: "Yirgacheffe".into(),
//!     category: "filter".into(),
//!     taste: "9".into(),
//!     aroma: "8".into(),
//!     aftertaste: "7".into(),
//!     overall: "9".into(),
//!     ..Default::default()
//! })?;
//! assert_eq!(entry.average_rating, 8.3);
//! assert_eq!(journal.gateway().load().len(), 1);
//! # Ok::<(), coffee_journal_core::error::DraftError>(())
//! ```
//!
//! ## FFI Functions
//!
//! Hosts that are not written in Rust drive an LMDB-backed journal through
//! C-compatible functions. Each returns a JSON [`AppResponse`] string that
//! must be released with [`journal_free_string`]:
//!
//! - [`journal_open`] / [`journal_open_with_config`] - open a journal
//! - [`journal_load`] - reload and return all entries
//! - [`journal_commit`] - validate and append a draft
//! - [`journal_save`] - replace the stored collection
//! - [`journal_clear`] - remove all stored data
//! - [`journal_new_id`] - a fresh entry id
//! - [`journal_average`] - average of a rating
//! - [`journal_close`] - release the journal

pub mod config;
pub mod error;
pub mod id_generator;
pub mod journal_model;
pub mod journal_state;
pub mod legacy_migrator;
pub mod lmdb_storage;
pub mod rating;
pub mod serializer;
pub mod storage_gateway;
pub mod storage_port;
pub mod version;
mod app_response;

pub use crate::app_response::AppResponse;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};

use crate::config::JournalConfig;
use crate::journal_model::{Coffee, CoffeeRating, PersistedCoffee};
use crate::journal_state::{CoffeeDraft, Journal};
use crate::lmdb_storage::LmdbStorage;
use crate::storage_gateway::StorageGateway;

/// Journal handle passed across the FFI boundary.
pub type JournalState = Journal<LmdbStorage>;

/// Opens the journal stored in `<name>.lmdb` with the default configuration.
///
/// If the LMDB environment cannot be opened the journal still works, but
/// without a storage medium: it starts empty and nothing is persisted.
///
/// # Returns
///
/// A pointer to the journal, or null if `name` is null or not UTF-8.
/// Release it with [`journal_close`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use coffee_journal_core::{journal_close, journal_open};
///
/// let name = CString::new("coffee_journal").unwrap();
/// let journal = journal_open(name.as_ptr());
/// assert!(!journal.is_null());
/// journal_close(journal);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn journal_open(name: *const c_char) -> *mut JournalState {
    open_journal(name, JournalConfig::default())
}

/// Like [`journal_open`], with a JSON [`JournalConfig`]. A null or invalid
/// configuration falls back to the defaults.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn journal_open_with_config(
    name: *const c_char,
    config_json: *const c_char,
) -> *mut JournalState {
    let config = match c_ptr_to_string(config_json, "config") {
        Ok(json) => JournalConfig::from_json(&json).unwrap_or_else(|e| {
            warn!("Invalid journal config, using defaults: {e}");
            JournalConfig::default()
        }),
        Err(error_ptr) => {
            journal_free_string(error_ptr);
            JournalConfig::default()
        }
    };

    open_journal(name, config)
}

fn open_journal(name: *const c_char, config: JournalConfig) -> *mut JournalState {
    if name.is_null() {
        warn!("Null name pointer passed to journal_open");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    let medium = match LmdbStorage::open(name_str) {
        Ok(storage) => Some(storage),
        Err(e) => {
            warn!("Journal '{name_str}' opened without storage: {e}");
            None
        }
    };

    let journal = Journal::open(StorageGateway::with_config(medium, config));
    info!("Journal '{name_str}' ready with {} entries", journal.len());
    Box::into_raw(Box::new(journal))
}

/// Reloads the journal from storage and returns every entry.
///
/// The `Ok` payload is a JSON array of stored-form entries (see
/// [`PersistedCoffee`]). Storage failures produce an empty array, never an
/// error.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn journal_load(state: *mut JournalState) -> *const c_char {
    let journal = match unsafe { state.as_mut() } {
        Some(j) => j,
        None => {
            let error = AppResponse::BadRequest("Null state pointer passed to journal_load".to_string());
            return response_to_c_string(&error);
        }
    };

    let response = match entries_to_json(journal.reload()) {
        Ok(json) => AppResponse::Ok(json),
        Err(e) => AppResponse::from(e),
    };
    response_to_c_string(&response)
}

/// Validates a draft and appends it to the journal.
///
/// # JSON Format
///
/// ```json
/// {
///   "name": "Yirgacheffe",
///   "roastery": "Tim Wendelboe",
///   "category": "filter",
///   "taste": "9", "aroma": "8", "aftertaste": "7", "overall": "9",
///   "notes": "Bright, floral"
/// }
/// ```
///
/// Scores may be strings or numbers. The `Ok` payload is the new entry in
/// stored form; validation failures return `ValidationError`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn journal_commit(state: *mut JournalState, draft_json: *const c_char) -> *const c_char {
    let journal = match unsafe { state.as_mut() } {
        Some(j) => j,
        None => {
            let error = AppResponse::BadRequest("Null state pointer passed to journal_commit".to_string());
            return response_to_c_string(&error);
        }
    };

    let json_str = match c_ptr_to_string(draft_json, "draft") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };

    let draft: CoffeeDraft = match serde_json::from_str(&json_str) {
        Ok(d) => d,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid draft JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    let response = match journal.commit(draft) {
        Ok(coffee) => match serde_json::to_string(&serializer::to_persisted(&coffee)) {
            Ok(json) => AppResponse::Ok(json),
            Err(e) => AppResponse::from(e),
        },
        Err(e) => AppResponse::from(e),
    };
    response_to_c_string(&response)
}

/// Replaces the stored collection with a JSON array of stored-form entries.
///
/// The array is validated as a whole: a malformed element rejects the
/// request and leaves the journal untouched. Any `averageRating` sent by the
/// host is ignored and recomputed from `rating`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn journal_save(state: *mut JournalState, collection_json: *const c_char) -> *const c_char {
    let journal = match unsafe { state.as_mut() } {
        Some(j) => j,
        None => {
            let error = AppResponse::BadRequest("Null state pointer passed to journal_save".to_string());
            return response_to_c_string(&error);
        }
    };

    let json_str = match c_ptr_to_string(collection_json, "collection") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };

    let persisted: Vec<PersistedCoffee> = match serde_json::from_str(&json_str) {
        Ok(p) => p,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid collection JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    let entries: Vec<Coffee> = persisted
        .into_iter()
        .map(|p| {
            let mut coffee = serializer::from_persisted(p);
            coffee.average_rating = coffee.rating.average();
            coffee
        })
        .collect();
    let count = entries.len();
    journal.replace(entries);

    response_to_c_string(&AppResponse::success(format!("Saved {count} entries")))
}

/// Removes all entries and both storage slots.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn journal_clear(state: *mut JournalState) -> *const c_char {
    let journal = match unsafe { state.as_mut() } {
        Some(j) => j,
        None => {
            let error = AppResponse::BadRequest("Null state pointer passed to journal_clear".to_string());
            return response_to_c_string(&error);
        }
    };

    journal.clear();
    response_to_c_string(&AppResponse::success("Journal cleared"))
}

/// Returns a fresh entry id as the `Ok` payload.
#[no_mangle]
pub extern "C" fn journal_new_id() -> *const c_char {
    response_to_c_string(&AppResponse::Ok(id_generator::new_id()))
}

/// Computes the average of a rating given as
/// `{"taste":7,"aroma":8,"aftertaste":9,"overall":10}`. The `Ok` payload is
/// the number as text, e.g. `"8.5"`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn journal_average(rating_json: *const c_char) -> *const c_char {
    let json_str = match c_ptr_to_string(rating_json, "rating") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };

    let response = match serde_json::from_str::<CoffeeRating>(&json_str) {
        Ok(r) => AppResponse::Ok(rating::average(&r).to_string()),
        Err(e) => AppResponse::SerializationError(format!("Invalid rating JSON: {e}")),
    };
    response_to_c_string(&response)
}

/// Releases a journal returned by [`journal_open`]. Null is ignored.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn journal_close(state: *mut JournalState) {
    if state.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(state) });
    info!("Journal closed");
}

/// Releases a string returned by any `journal_*` function. Null is ignored.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn journal_free_string(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr as *mut c_char) });
}

fn entries_to_json(entries: &[Coffee]) -> Result<String, serde_json::Error> {
    let persisted: Vec<PersistedCoffee> = entries.iter().map(serializer::to_persisted).collect();
    serde_json::to_string(&persisted)
}

/// Serializes the response and hands ownership of the C string to the caller.
/// Returns null only if serialization itself fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to an owned `String`, or an error response
/// naming `field_name`.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
