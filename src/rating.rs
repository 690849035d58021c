//! Summary score derived from a four-criterion rating.

use crate::journal_model::CoffeeRating;

/// Mean of the four sub-scores, rounded to one decimal place.
///
/// ```rust
/// use coffee_journal_core::journal_model::CoffeeRating;
/// use coffee_journal_core::rating::average;
///
/// let rating = CoffeeRating { taste: 7, aroma: 8, aftertaste: 9, overall: 10 };
/// assert_eq!(average(&rating), 8.5);
/// ```
pub fn average(rating: &CoffeeRating) -> f64 {
    average_of(
        f64::from(rating.taste),
        f64::from(rating.aroma),
        f64::from(rating.aftertaste),
        f64::from(rating.overall),
    )
}

/// Same formula over arbitrary numbers. No range check is applied.
///
/// Rounds half away from zero on the scaled value, so `8.25` becomes `8.3`
/// and `-8.25` becomes `-8.3`.
pub fn average_of(taste: f64, aroma: f64, aftertaste: f64, overall: f64) -> f64 {
    let mean = (taste + aroma + aftertaste + overall) / 4.0;
    (mean * 10.0).round() / 10.0
}
