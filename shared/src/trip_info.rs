//! Trip summary shown above the filters.

use crate::format::format_day;
use crate::model::Point;
use crate::sort::{sort_points, SortType};
use crate::store::Catalog;
use crate::view::TripInfo;

const ROUTE_SEPARATOR: &str = " — ";
const MAX_LISTED_STOPS: usize = 3;

/// Summary of the whole trip, or `None` for an empty trip.
#[must_use]
pub fn summarize(points: &[Point], catalog: &Catalog) -> Option<TripInfo> {
    let ordered = sort_points(SortType::Day, points);
    let first = ordered.first()?;
    let last_end = ordered.iter().map(|p| p.date_to).max()?;

    let names: Vec<String> = ordered
        .iter()
        .filter_map(|p| p.destination.as_ref())
        .filter_map(|id| catalog.destination(id))
        .map(|d| d.name)
        .collect();
    let title = if names.len() > MAX_LISTED_STOPS {
        let head = names.first().map_or("", String::as_str);
        let tail = names.last().map_or("", String::as_str);
        format!("{head}{ROUTE_SEPARATOR}...{ROUTE_SEPARATOR}{tail}")
    } else {
        names.join(ROUTE_SEPARATOR)
    };

    let total_cost = ordered
        .iter()
        .map(|p| {
            let offers: u64 = catalog
                .selected_offers(p)
                .iter()
                .map(|o| u64::from(o.price))
                .sum();
            u64::from(p.base_price) + offers
        })
        .sum();

    Some(TripInfo {
        title,
        dates: format!("{}{ROUTE_SEPARATOR}{}", format_day(first.date_from), format_day(last_end)),
        total_cost,
    })
}
