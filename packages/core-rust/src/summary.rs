//! Per-title average rating aggregation.

use std::collections::BTreeMap;

use crate::types::{BookReview, ReviewSummary};

/// Groups reviews by exact title and averages each group's ratings.
///
/// Rows come back ordered by title. The result does not depend on the
/// order of `reviews`.
#[must_use]
pub fn summarize(reviews: &[BookReview]) -> Vec<ReviewSummary> {
    let mut groups: BTreeMap<&str, (i64, u64)> = BTreeMap::new();
    for review in reviews {
        let (sum, count) = groups.entry(review.title.as_str()).or_insert((0, 0));
        *sum += i64::from(review.rating);
        *count += 1;
    }

    groups
        .into_iter()
        .map(|(title, (sum, count))| ReviewSummary {
            title: title.to_string(),
            rating: rounded_mean(sum, count),
        })
        .collect()
}

/// Mean of `count` ratings summing to `sum`, rounded half-to-even to
/// 2 decimal places.
///
/// Works on the exact rational `sum * 100 / count` so ties are decided on
/// integers, not on the nearest binary float. `count` must be non-zero.
#[must_use]
pub fn rounded_mean(sum: i64, count: u64) -> f64 {
    debug_assert!(count > 0, "mean of an empty group");

    // A group never holds more reviews than fit in an i64.
    #[allow(clippy::cast_possible_wrap)]
    let count = count as i64;
    let scaled = sum * 100;
    let mut hundredths = scaled.div_euclid(count);
    let twice_rem = 2 * scaled.rem_euclid(count);

    if twice_rem > count || (twice_rem == count && hundredths % 2 != 0) {
        hundredths += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let value = hundredths as f64 / 100.0;
    value
}
