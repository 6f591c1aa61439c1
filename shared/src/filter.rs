//! Filter half of the filter/sort pipeline.
//!
//! Filters are pure: they never mutate their input and always evaluate
//! against one caller-supplied `now`, so a point sitting on a boundary
//! cannot flicker between buckets within a single pass.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Point, UnixTimeMs};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    #[default]
    Everything,
    Future,
    Present,
    Past,
}

impl FilterType {
    pub const ALL: [FilterType; 4] = [Self::Everything, Self::Future, Self::Present, Self::Past];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Everything => "everything",
            Self::Future => "future",
            Self::Present => "present",
            Self::Past => "past",
        }
    }

    #[must_use]
    pub fn matches(self, point: &Point, now: UnixTimeMs) -> bool {
        match self {
            Self::Everything => true,
            Self::Future => point.is_future(now),
            Self::Present => point.is_present(now),
            Self::Past => point.is_past(now),
        }
    }

    /// Text shown when nothing survives this filter.
    #[must_use]
    pub const fn empty_message(self) -> &'static str {
        match self {
            Self::Everything => "Click New Event to create your first point",
            Self::Future => "There are no future events now",
            Self::Present => "There are no present events now",
            Self::Past => "There are no past events now",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order-preserving subsequence of `points` accepted by `filter`.
#[must_use]
pub fn filter_points(filter: FilterType, points: &[Point], now: UnixTimeMs) -> Vec<Point> {
    points
        .iter()
        .filter(|point| filter.matches(point, now))
        .cloned()
        .collect()
}

/// Number of points each filter would keep, in `FilterType::ALL` order.
#[must_use]
pub fn filter_counts(points: &[Point], now: UnixTimeMs) -> Vec<(FilterType, usize)> {
    FilterType::ALL
        .iter()
        .map(|filter| {
            let count = points.iter().filter(|p| filter.matches(p, now)).count();
            (*filter, count)
        })
        .collect()
}
