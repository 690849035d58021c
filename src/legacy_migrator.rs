//! Upgrades payloads written before the four-criterion schema.
//!
//! Two older shapes exist in the wild: a plain array of coffee names, and an
//! array of objects carrying a single numeric `rating`. Each element is
//! classified into a [`LegacyEntry`] first and only then converted, so every
//! shape is handled by exactly one match arm.

use chrono::Utc;
use log::{info, warn};
use serde_json::{Map, Value as JsonValue};

use crate::id_generator::new_id;
use crate::journal_model::{
    number_text, Category, Coffee, CoffeeRating, MAX_SCORE, MIN_SCORE, NEUTRAL_SCORE,
    UNKNOWN_ROASTERY,
};
use crate::serializer;

/// One element of a legacy payload, after shape detection.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyEntry {
    /// A bare name from the earliest format.
    StringEntry(String),
    /// An object from the single-metric format.
    SingleRatingEntry(SingleRatingEntry),
    /// An object that already has the structured rating.
    CanonicalEntry(JsonValue),
    /// Numbers, booleans, nulls and nested arrays. Dropped.
    Unsupported(JsonValue),
}

/// Fields recovered from a single-metric object. Every field is optional;
/// defaults are applied during conversion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SingleRatingEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    pub rating: Option<f64>,
    pub date_added: Option<String>,
    pub roastery: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

/// Determines which legacy shape an element has.
pub fn classify(value: JsonValue) -> LegacyEntry {
    match value {
        JsonValue::String(name) => LegacyEntry::StringEntry(name),
        JsonValue::Object(fields) => {
            if matches!(fields.get("rating"), Some(JsonValue::Object(_))) {
                LegacyEntry::CanonicalEntry(JsonValue::Object(fields))
            } else {
                LegacyEntry::SingleRatingEntry(single_rating_fields(&fields))
            }
        }
        other => LegacyEntry::Unsupported(other),
    }
}

/// Converts a whole legacy array into canonical records, preserving order.
///
/// Elements that cannot be converted are logged and left out.
pub fn migrate(values: Vec<JsonValue>) -> Vec<Coffee> {
    let total = values.len();
    let mut records = Vec::with_capacity(total);

    for (index, value) in values.into_iter().enumerate() {
        match classify(value) {
            LegacyEntry::StringEntry(name) => records.push(from_name(name, index)),
            LegacyEntry::SingleRatingEntry(entry) => records.push(from_single_rating(entry, index)),
            LegacyEntry::CanonicalEntry(value) => match serializer::decode_value(value) {
                Ok((coffee, _)) => records.push(coffee),
                Err(e) => warn!("Legacy element {index} looks canonical but failed to decode: {e}"),
            },
            LegacyEntry::Unsupported(value) => {
                warn!("Legacy element {index} has an unsupported shape, dropping: {value}");
            }
        }
    }

    info!("Migrated {} of {} legacy entries", records.len(), total);
    records
}

/// A blank name gets the same `"Entry N"` placeholder as single-rating
/// objects without one.
fn from_name(name: String, index: usize) -> Coffee {
    let rating = CoffeeRating::uniform(NEUTRAL_SCORE);
    let name = if name.trim().is_empty() {
        format!("Entry {}", index + 1)
    } else {
        name
    };

    Coffee {
        id: new_id(),
        name,
        roastery: Some(UNKNOWN_ROASTERY.to_string()),
        category: Category::Other,
        average_rating: rating.average(),
        rating,
        notes: None,
        images: None,
        date_added: Utc::now(),
    }
}

fn from_single_rating(entry: SingleRatingEntry, index: usize) -> Coffee {
    let rating = CoffeeRating::uniform(broadcast_score(entry.rating));

    let date_added = serializer::parse_timestamp(entry.date_added.as_deref()).unwrap_or_else(|e| {
        warn!("Legacy element {index}: {e}; using current time");
        Utc::now()
    });

    let category = entry
        .category
        .and_then(|tag| tag.parse::<Category>().ok())
        .unwrap_or(Category::Other);

    Coffee {
        id: entry.id.unwrap_or_else(new_id),
        name: entry.name.unwrap_or_else(|| format!("Entry {}", index + 1)),
        roastery: Some(entry.roastery.unwrap_or_else(|| UNKNOWN_ROASTERY.to_string())),
        category,
        average_rating: rating.average(),
        rating,
        notes: entry.notes,
        images: None,
        date_added,
    }
}

/// Rounds the old scalar into the score range. Missing or non-finite
/// values become the neutral score.
fn broadcast_score(rating: Option<f64>) -> u8 {
    match rating {
        Some(value) if value.is_finite() => {
            value.round().clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE)) as u8
        }
        _ => NEUTRAL_SCORE,
    }
}

fn single_rating_fields(fields: &Map<String, JsonValue>) -> SingleRatingEntry {
    SingleRatingEntry {
        id: fields.get("id").and_then(id_text),
        name: non_blank(fields.get("name")),
        rating: fields.get("rating").and_then(scalar_rating),
        date_added: fields.get("dateAdded").and_then(|value| match value {
            JsonValue::String(text) => Some(text.clone()),
            JsonValue::Number(number) => Some(number_text(number)),
            _ => None,
        }),
        roastery: non_blank(fields.get("roastery")),
        category: non_blank(fields.get("category")),
        notes: non_blank(fields.get("notes")),
    }
}

fn id_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(text) if !text.trim().is_empty() => Some(text.clone()),
        JsonValue::Number(number) => Some(number_text(number)),
        _ => None,
    }
}

fn scalar_rating(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn non_blank(value: Option<&JsonValue>) -> Option<String> {
    match value {
        Some(JsonValue::String(text)) if !text.trim().is_empty() => Some(text.clone()),
        _ => None,
    }
}
