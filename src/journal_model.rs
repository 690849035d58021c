//! Data model definitions for journal storage.
//!
//! This module defines the in-memory record, [`Coffee`], and its stored
//! counterpart, [`PersistedCoffee`]. The two differ only in how the
//! timestamp is represented: the in-memory record holds a [`DateTime<Utc>`],
//! the stored record holds the ISO-8601 text that lands in the payload slot.
//!
//! # Stored shape
//!
//! ```json
//! {
//!   "id": "1718035200000a1b2c3d4e5f60718",
//!   "name": "Yirgacheffe",
//!   "roastery": "Tim Wendelboe",
//!   "category": "filter",
//!   "rating": { "taste": 9, "aroma": 8, "aftertaste": 7, "overall": 9 },
//!   "averageRating": 8.3,
//!   "notes": "Bright, floral",
//!   "dateAdded": "2024-06-10T16:00:00.000Z"
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value as JsonValue};

use crate::error::DraftError;

/// Label stored for entries whose roastery was left blank.
pub const UNKNOWN_ROASTERY: &str = "Unknown";

/// Sub-score given to every criterion of a migrated entry that had no rating.
pub const NEUTRAL_SCORE: u8 = 7;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// One journal entry, as the rest of the application sees it.
///
/// Records are built by [`Journal::commit`](crate::journal_state::Journal::commit)
/// or decoded by the serializer; `average_rating` is never edited directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Coffee {
    /// Unique within the store, immutable after creation.
    pub id: String,
    pub name: String,
    pub roastery: Option<String>,
    pub category: Category,
    pub rating: CoffeeRating,
    /// Derived from `rating`, one decimal place.
    pub average_rating: f64,
    pub notes: Option<String>,
    pub images: Option<CoffeeImages>,
    pub date_added: DateTime<Utc>,
}

/// Four-criterion rating. Each score is expected to lie in `[1, 10]`;
/// the creation path enforces that range, storage does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoffeeRating {
    pub taste: u8,
    pub aroma: u8,
    pub aftertaste: u8,
    pub overall: u8,
}

impl CoffeeRating {
    /// A rating with the same score on every criterion.
    ///
    /// ```rust
    /// use coffee_journal_core::journal_model::CoffeeRating;
    ///
    /// let rating = CoffeeRating::uniform(7);
    /// assert_eq!(rating.aftertaste, 7);
    /// assert_eq!(rating.average(), 7.0);
    /// ```
    pub fn uniform(score: u8) -> Self {
        Self {
            taste: score,
            aroma: score,
            aftertaste: score,
            overall: score,
        }
    }

    /// Summary score, see [`crate::rating::average`].
    pub fn average(&self) -> f64 {
        crate::rating::average(self)
    }
}

/// Encoded image references attached to an entry. Opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoffeeImages {
    /// Photo of the package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Photo of the brewed result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

/// Closed set of entry categories.
///
/// `Unrecognized` only comes out of storage: it holds a stored tag outside
/// the set so that saving the record again writes the same tag back. The
/// creation path never produces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Espresso,
    Filter,
    Cappuccino,
    Latte,
    ColdBrew,
    Other,
    Unrecognized(String),
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Espresso,
        Category::Filter,
        Category::Cappuccino,
        Category::Latte,
        Category::ColdBrew,
        Category::Other,
    ];

    /// The tag written to storage.
    pub fn as_str(&self) -> &str {
        match self {
            Category::Espresso => "espresso",
            Category::Filter => "filter",
            Category::Cappuccino => "cappuccino",
            Category::Latte => "latte",
            Category::ColdBrew => "cold_brew",
            Category::Other => "other",
            Category::Unrecognized(tag) => tag,
        }
    }

    /// Reads a stored tag. Tags outside the set are kept verbatim.
    pub fn from_stored(tag: &str) -> Self {
        tag.parse()
            .unwrap_or_else(|_| Category::Unrecognized(tag.to_string()))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DraftError;

    /// Accepts the stored tag in any case; spaces and dashes count as
    /// underscores, so `"Cold Brew"` and `"cold-brew"` both parse. Only the
    /// closed set is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase().replace([' ', '-'], "_");
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == tag)
            .ok_or_else(|| DraftError::UnknownCategory(s.to_string()))
    }
}

/// A record as it appears in the payload slot.
///
/// Field names follow the camelCase convention of the stored JSON. Every
/// field except `date_added` carries the same value as its [`Coffee`]
/// counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCoffee {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roastery: Option<String>,
    #[serde(default = "default_category_tag")]
    pub category: String,
    pub rating: CoffeeRating,
    /// Absent only in hand-edited payloads; the serializer recomputes it then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<CoffeeImages>,
    /// ISO-8601 text. Numbers are kept as their integer text (epoch millis).
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub date_added: Option<String>,
}

fn default_category_tag() -> String {
    Category::Other.as_str().to_string()
}

/// Accepts strings and numbers for the timestamp field; anything else is
/// treated as missing so the record itself still decodes.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::String(text)) => Some(text),
        Some(JsonValue::Number(number)) => Some(number_text(&number)),
        _ => None,
    })
}

/// Decimal text of a JSON number, without a fractional part when the value
/// is integral. `1.7e12` becomes `"1700000000000"`.
pub(crate) fn number_text(number: &Number) -> String {
    if let Some(n) = number.as_u64() {
        return n.to_string();
    }
    if let Some(n) = number.as_i64() {
        return n.to_string();
    }
    match number.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 => {
            format!("{}", f as i64)
        }
        _ => number.to_string(),
    }
}
