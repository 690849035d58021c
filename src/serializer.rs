//! Conversion between [`Coffee`] and its stored form, [`PersistedCoffee`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use log::warn;
use serde_json::Value as JsonValue;

use crate::error::StorageError;
use crate::journal_model::{Category, Coffee, PersistedCoffee};

/// Replaces the timestamp with its ISO-8601 text; everything else is copied.
pub fn to_persisted(coffee: &Coffee) -> PersistedCoffee {
    PersistedCoffee {
        id: coffee.id.clone(),
        name: coffee.name.clone(),
        roastery: coffee.roastery.clone(),
        category: coffee.category.as_str().to_string(),
        rating: coffee.rating,
        average_rating: Some(coffee.average_rating),
        notes: coffee.notes.clone(),
        images: coffee.images.clone(),
        date_added: Some(format_timestamp(&coffee.date_added)),
    }
}

/// Rebuilds a record from its stored form.
///
/// A missing or unreadable timestamp becomes the current time. A category
/// outside the closed set is kept as [`Category::Unrecognized`], so a later
/// save writes the same tag back. Neither aborts the record.
pub fn from_persisted(persisted: PersistedCoffee) -> Coffee {
    from_persisted_checked(persisted).0
}

/// Like [`from_persisted`], also reporting whether the timestamp was replaced.
pub(crate) fn from_persisted_checked(persisted: PersistedCoffee) -> (Coffee, bool) {
    let (date_added, repaired) = match parse_timestamp(persisted.date_added.as_deref()) {
        Ok(date_added) => (date_added, false),
        Err(e) => {
            warn!("Record '{}': {e}; using current time", persisted.id);
            (Utc::now(), true)
        }
    };

    let category = Category::from_stored(&persisted.category);
    if let Category::Unrecognized(tag) = &category {
        warn!("Record '{}': unrecognized category '{tag}' kept as stored", persisted.id);
    }

    let average_rating = persisted
        .average_rating
        .unwrap_or_else(|| persisted.rating.average());

    let coffee = Coffee {
        id: persisted.id,
        name: persisted.name,
        roastery: persisted.roastery,
        category,
        rating: persisted.rating,
        average_rating,
        notes: persisted.notes,
        images: persisted.images,
        date_added,
    };

    (coffee, repaired)
}

/// Decodes one element of a stored array. Fails only if the element does
/// not have the stored record shape at all.
pub(crate) fn decode_value(value: JsonValue) -> Result<(Coffee, bool), StorageError> {
    let persisted: PersistedCoffee = serde_json::from_value(value)?;
    Ok(from_persisted_checked(persisted))
}

/// Millisecond precision with a `Z` suffix, e.g. `2024-06-10T16:00:00.000Z`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses the timestamp forms older payloads are known to contain.
///
/// Accepted, in order: RFC 3339, a naive date-time (read as UTC), a bare
/// `YYYY-MM-DD` date (midnight UTC), and an integer count of milliseconds
/// since the Unix epoch.
pub fn parse_timestamp(text: Option<&str>) -> Result<DateTime<Utc>, StorageError> {
    let text = match text.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => return Err(StorageError::TimestampInvalid("missing".to_string())),
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    if let Ok(millis) = text.parse::<i64>() {
        if let Some(parsed) = Utc.timestamp_millis_opt(millis).single() {
            return Ok(parsed);
        }
    }

    Err(StorageError::TimestampInvalid(format!("'{text}'")))
}
