use serde::{Deserialize, Serialize};

use crate::filter::FilterType;
use crate::model::{Point, PointId};
use crate::sort::SortType;

/// Blast radius of a model mutation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    /// One point changed; list membership and order are unaffected.
    Patch,
    /// Membership or order changed; current sort and filter stay valid.
    Minor,
    /// Filter or sort affecting change; rebuild and reset the sort.
    Major,
    /// Initial load completed.
    Init,
}

impl UpdateType {
    /// Scope for replacing `before` with `after`. Dates, price and the favorite
    /// flag feed filtering or ordering, so touching any of them is `Minor`.
    #[must_use]
    pub fn for_edit(before: &Point, after: &Point) -> Self {
        let reorders = before.date_from != after.date_from
            || before.date_to != after.date_to
            || before.base_price != after.base_price
            || before.is_favorite != after.is_favorite;
        if reorders {
            Self::Minor
        } else {
            Self::Patch
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    AddPoint,
    UpdatePoint,
    DeletePoint,
}

/// A mutation a presenter asks the dispatcher to carry out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Intent {
    pub action: UserAction,
    pub scope: UpdateType,
    pub point: Point,
}

impl Intent {
    #[must_use]
    pub fn new(action: UserAction, scope: UpdateType, point: Point) -> Self {
        Self { action, scope, point }
    }
}

/// User triggers delivered by the shell. Large variants are boxed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    OpenEdit { id: PointId },
    CloseEdit { id: PointId },
    SubmitEdit(Box<Point>),
    DeletePoint { id: PointId },
    ToggleFavorite { id: PointId },
    EscapePressed,
    SortChanged { sort: SortType },
    FilterChanged { filter: FilterType },
    NewPointRequested,
    SubmitNewPoint(Box<Point>),
    CancelNewPoint,
}
