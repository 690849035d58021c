//! The in-memory journal and its creation path.
//!
//! [`Journal`] owns the collection the presentation layer displays. New
//! entries arrive as a [`CoffeeDraft`] of raw form values; committing one
//! validates it, derives the fields the user never edits, and persists the
//! whole collection through the [`StorageGateway`].

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

use crate::error::DraftError;
use crate::id_generator::new_id;
use crate::journal_model::{
    Category, Coffee, CoffeeImages, CoffeeRating, MAX_SCORE, MIN_SCORE, UNKNOWN_ROASTERY,
};
use crate::storage_gateway::StorageGateway;
use crate::storage_port::StoragePort;

/// Raw field values as entered in the form. Scores are text, as typed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoffeeDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roastery: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "raw_field")]
    pub taste: String,
    #[serde(default, deserialize_with = "raw_field")]
    pub aroma: String,
    #[serde(default, deserialize_with = "raw_field")]
    pub aftertaste: String,
    #[serde(default, deserialize_with = "raw_field")]
    pub overall: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub images: Option<CoffeeImages>,
}

impl CoffeeDraft {
    /// Validates the draft and builds a new record from it.
    ///
    /// The id, average and timestamp are generated here; a blank roastery
    /// becomes [`UNKNOWN_ROASTERY`] and blank notes are dropped.
    pub fn into_coffee(self) -> Result<Coffee, DraftError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DraftError::EmptyName);
        }

        let category = self.category.parse::<Category>()?;

        let rating = CoffeeRating {
            taste: parse_score("taste", &self.taste)?,
            aroma: parse_score("aroma", &self.aroma)?,
            aftertaste: parse_score("aftertaste", &self.aftertaste)?,
            overall: parse_score("overall", &self.overall)?,
        };

        let roastery = self
            .roastery
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| UNKNOWN_ROASTERY.to_string());

        let notes = self.notes.filter(|n| !n.trim().is_empty());

        Ok(Coffee {
            id: new_id(),
            name: name.to_string(),
            roastery: Some(roastery),
            category,
            average_rating: rating.average(),
            rating,
            notes,
            images: self.images,
            date_added: Utc::now(),
        })
    }
}

fn parse_score(field: &'static str, raw: &str) -> Result<u8, DraftError> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| DraftError::InvalidScore {
            field,
            value: raw.to_string(),
        })?;

    if !(i64::from(MIN_SCORE)..=i64::from(MAX_SCORE)).contains(&value) {
        return Err(DraftError::ScoreOutOfRange { field, value });
    }

    u8::try_from(value).map_err(|_| DraftError::ScoreOutOfRange { field, value })
}

/// Form hosts send either `"7"` or `7`.
fn raw_field<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match JsonValue::deserialize(deserializer)? {
        JsonValue::String(text) => text,
        JsonValue::Null => String::new(),
        other => other.to_string(),
    })
}

/// The journal a host works with: the loaded collection plus its gateway.
pub struct Journal<P: StoragePort> {
    gateway: StorageGateway<P>,
    entries: Vec<Coffee>,
}

impl<P: StoragePort> Journal<P> {
    /// Loads the stored collection, migrating it if needed.
    pub fn open(gateway: StorageGateway<P>) -> Self {
        let entries = gateway.load();
        info!("Journal opened with {} entries", entries.len());
        Self { gateway, entries }
    }

    pub fn entries(&self) -> &[Coffee] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.gateway.config().max_entries
    }

    pub fn gateway(&self) -> &StorageGateway<P> {
        &self.gateway
    }

    /// Validates `draft`, appends it and saves the collection.
    pub fn commit(&mut self, draft: CoffeeDraft) -> Result<Coffee, DraftError> {
        let coffee = draft.into_coffee()?;

        if self.is_full() {
            return Err(DraftError::JournalFull {
                max: self.gateway.config().max_entries,
            });
        }

        debug!("Committing entry '{}' ({})", coffee.name, coffee.id);
        self.entries.push(coffee.clone());
        self.gateway.save(&self.entries);
        Ok(coffee)
    }

    /// Replaces the collection wholesale and saves it. No cap is applied.
    pub fn replace(&mut self, entries: Vec<Coffee>) {
        self.entries = entries;
        self.gateway.save(&self.entries);
    }

    /// Re-reads the collection from storage.
    pub fn reload(&mut self) -> &[Coffee] {
        self.entries = self.gateway.load();
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.gateway.clear();
    }
}
