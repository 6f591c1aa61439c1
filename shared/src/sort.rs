//! Sort half of the filter/sort pipeline.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::model::Point;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortType {
    #[default]
    Day,
    Time,
    Price,
}

impl SortType {
    pub const ALL: [SortType; 3] = [Self::Day, Self::Time, Self::Price];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Time => "time",
            Self::Price => "price",
        }
    }

    /// Total order: the primary key, then the id.
    #[must_use]
    pub fn compare(self, a: &Point, b: &Point) -> Ordering {
        let primary = match self {
            Self::Day => a.date_from.cmp(&b.date_from),
            Self::Time => b.duration_ms().cmp(&a.duration_ms()),
            Self::Price => a.base_price.cmp(&b.base_price),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

impl fmt::Display for SortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sorted copy of `points`; the input is left untouched.
#[must_use]
pub fn sort_points(sort: SortType, points: &[Point]) -> Vec<Point> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| sort.compare(a, b));
    sorted
}
