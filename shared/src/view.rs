//! Render-ready view models and the surface they are attached to.
//!
//! The core never produces markup. It builds serde view models, and tells a
//! [`Surface`] where to attach, replace or detach them. Shells diff the
//! models into whatever widget tree they own.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::filter::FilterType;
use crate::format::{format_day, format_duration, format_form_datetime, format_time};
use crate::model::{Picture, Point, PointId, PointType};
use crate::sort::SortType;
use crate::store::Catalog;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferLine {
    pub title: String,
    pub price: u32,
}

/// Read view of one point.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PointCard {
    pub id: PointId,
    pub kind: PointType,
    pub title: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub duration: String,
    pub base_price: u32,
    pub offers: Vec<OfferLine>,
    pub is_favorite: bool,
}

impl PointCard {
    /// Resolves references against `catalog`. A missing destination leaves the
    /// type alone as the title; unknown offer ids are skipped.
    #[must_use]
    pub fn build(point: &Point, catalog: &Catalog) -> Self {
        let title = match point.destination.as_ref().and_then(|id| catalog.destination(id)) {
            Some(destination) => format!("{} {}", point.kind.label(), destination.name),
            None => point.kind.label(),
        };
        let offers = catalog
            .selected_offers(point)
            .into_iter()
            .map(|offer| OfferLine {
                title: offer.title,
                price: offer.price,
            })
            .collect();

        Self {
            id: point.id.clone(),
            kind: point.kind,
            title,
            day: format_day(point.date_from),
            start_time: format_time(point.date_from),
            end_time: format_time(point.date_to),
            duration: format_duration(point.duration_ms()),
            base_price: point.base_price,
            offers,
            is_favorite: point.is_favorite,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DestinationInfo {
    pub name: String,
    pub description: String,
    pub pictures: Vec<Picture>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferChoice {
    pub id: String,
    pub title: String,
    pub price: u32,
    pub checked: bool,
}

/// Busy flags of an edit form.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormState {
    pub is_saving: bool,
    pub is_deleting: bool,
    pub is_disabled: bool,
}

impl FormState {
    pub const IDLE: Self = Self {
        is_saving: false,
        is_deleting: false,
        is_disabled: false,
    };

    pub const SAVING: Self = Self {
        is_saving: true,
        is_deleting: false,
        is_disabled: true,
    };

    pub const DELETING: Self = Self {
        is_saving: false,
        is_deleting: true,
        is_disabled: true,
    };
}

/// Edit view of one point, also used for creation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PointForm {
    pub id: PointId,
    pub is_new: bool,
    pub kind: PointType,
    pub types: Vec<PointType>,
    pub destination: Option<DestinationInfo>,
    pub destination_names: Vec<String>,
    pub date_from: String,
    pub date_to: String,
    pub base_price: u32,
    pub offers: Vec<OfferChoice>,
    pub state: FormState,
    pub submit_label: String,
    pub reset_label: String,
}

impl PointForm {
    #[must_use]
    pub fn build(point: &Point, catalog: &Catalog, is_new: bool, state: FormState) -> Self {
        let destination = point
            .destination
            .as_ref()
            .and_then(|id| catalog.destination(id))
            .map(|d| DestinationInfo {
                name: d.name,
                description: d.description,
                pictures: d.pictures,
            });
        let offers = catalog
            .offers_for(point.kind)
            .map(|group| {
                group
                    .offers
                    .into_iter()
                    .map(|offer| OfferChoice {
                        checked: point.offers.contains(&offer.id),
                        id: offer.id.0,
                        title: offer.title,
                        price: offer.price,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let submit_label = if state.is_saving { "Saving..." } else { "Save" };
        let reset_label = match (is_new, state.is_deleting) {
            (true, _) => "Cancel",
            (false, true) => "Deleting...",
            (false, false) => "Delete",
        };

        Self {
            id: point.id.clone(),
            is_new,
            kind: point.kind,
            types: PointType::ALL.to_vec(),
            destination,
            destination_names: catalog.destination_names(),
            date_from: format_form_datetime(point.date_from),
            date_to: format_form_datetime(point.date_to),
            base_price: point.base_price,
            offers,
            state,
            submit_label: submit_label.to_string(),
            reset_label: reset_label.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortItem {
    pub sort: SortType,
    pub checked: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortBar {
    pub items: Vec<SortItem>,
}

impl SortBar {
    #[must_use]
    pub fn new(current: SortType) -> Self {
        Self {
            items: SortType::ALL
                .iter()
                .map(|sort| SortItem {
                    sort: *sort,
                    checked: *sort == current,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterItem {
    pub filter: FilterType,
    pub count: usize,
    pub checked: bool,
    pub disabled: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterBar {
    pub items: Vec<FilterItem>,
}

impl FilterBar {
    #[must_use]
    pub fn new(counts: &[(FilterType, usize)], current: FilterType) -> Self {
        Self {
            items: counts
                .iter()
                .map(|(filter, count)| FilterItem {
                    filter: *filter,
                    count: *count,
                    checked: *filter == current,
                    disabled: *count == 0,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TripInfo {
    pub title: String,
    pub dates: String,
    pub total_cost: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    Loading,
    Empty { filter: FilterType },
    LoadFailed,
}

impl Message {
    #[must_use]
    pub const fn text(&self) -> &'static str {
        match self {
            Self::Loading => "Loading...",
            Self::Empty { filter } => filter.empty_message(),
            Self::LoadFailed => "Failed to load latest route information",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewNode {
    Card(PointCard),
    Form(PointForm),
    SortBar(SortBar),
    FilterBar(FilterBar),
    TripInfo(TripInfo),
    Message(Message),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Filters,
    TripInfo,
    Sort,
    List,
    Message,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    Start,
    End,
}

/// Opaque reference to an attached view.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewHandle(pub u64);

/// Where views live. `replace` keeps the slot so siblings never move.
pub trait Surface {
    fn mount(&mut self, region: Region, position: Position, node: ViewNode) -> ViewHandle;
    fn replace(&mut self, handle: ViewHandle, node: ViewNode);
    fn unmount(&mut self, handle: ViewHandle);
    /// Transient error decoration on an attached view.
    fn shake(&mut self, handle: ViewHandle);
}

/// In-memory surface keeping slot order per region.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    next: u64,
    slots: BTreeMap<Region, Vec<ViewHandle>>,
    nodes: HashMap<ViewHandle, ViewNode>,
    shakes: Vec<ViewHandle>,
}

impl HeadlessSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn node(&self, handle: ViewHandle) -> Option<&ViewNode> {
        self.nodes.get(&handle)
    }

    /// Nodes of `region`, first slot first.
    #[must_use]
    pub fn nodes_in(&self, region: Region) -> Vec<&ViewNode> {
        self.slots
            .get(&region)
            .map(|handles| handles.iter().filter_map(|h| self.nodes.get(h)).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn handles_in(&self, region: Region) -> Vec<ViewHandle> {
        self.slots.get(&region).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn mounted_count(&self) -> usize {
        self.nodes.len()
    }

    /// Ids shown in the list, read views and edit forms alike.
    #[must_use]
    pub fn list_ids(&self) -> Vec<PointId> {
        self.nodes_in(Region::List)
            .into_iter()
            .map(|node| match node {
                ViewNode::Card(card) => card.id.clone(),
                ViewNode::Form(form) => form.id.clone(),
                _ => PointId::new(""),
            })
            .collect()
    }

    #[must_use]
    pub fn cards(&self) -> Vec<&PointCard> {
        self.nodes_in(Region::List)
            .into_iter()
            .filter_map(|node| match node {
                ViewNode::Card(card) => Some(card),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn forms(&self) -> Vec<&PointForm> {
        self.nodes_in(Region::List)
            .into_iter()
            .filter_map(|node| match node {
                ViewNode::Form(form) => Some(form),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn message(&self) -> Option<&Message> {
        self.nodes_in(Region::Message).into_iter().find_map(|node| match node {
            ViewNode::Message(message) => Some(message),
            _ => None,
        })
    }

    #[must_use]
    pub fn sort_bar(&self) -> Option<&SortBar> {
        self.nodes_in(Region::Sort).into_iter().find_map(|node| match node {
            ViewNode::SortBar(bar) => Some(bar),
            _ => None,
        })
    }

    #[must_use]
    pub fn filter_bar(&self) -> Option<&FilterBar> {
        self.nodes_in(Region::Filters).into_iter().find_map(|node| match node {
            ViewNode::FilterBar(bar) => Some(bar),
            _ => None,
        })
    }

    #[must_use]
    pub fn trip_info(&self) -> Option<&TripInfo> {
        self.nodes_in(Region::TripInfo).into_iter().find_map(|node| match node {
            ViewNode::TripInfo(info) => Some(info),
            _ => None,
        })
    }

    /// Every handle that has been shaken, oldest first.
    #[must_use]
    pub fn shakes(&self) -> &[ViewHandle] {
        &self.shakes
    }
}

impl Surface for HeadlessSurface {
    fn mount(&mut self, region: Region, position: Position, node: ViewNode) -> ViewHandle {
        self.next += 1;
        let handle = ViewHandle(self.next);
        let slots = self.slots.entry(region).or_default();
        match position {
            Position::Start => slots.insert(0, handle),
            Position::End => slots.push(handle),
        }
        self.nodes.insert(handle, node);
        handle
    }

    fn replace(&mut self, handle: ViewHandle, node: ViewNode) {
        match self.nodes.get_mut(&handle) {
            Some(slot) => *slot = node,
            None => warn!(handle = handle.0, "replace on a detached view"),
        }
    }

    fn unmount(&mut self, handle: ViewHandle) {
        if self.nodes.remove(&handle).is_some() {
            for slots in self.slots.values_mut() {
                slots.retain(|h| *h != handle);
            }
        }
    }

    fn shake(&mut self, handle: ViewHandle) {
        if self.nodes.contains_key(&handle) {
            self.shakes.push(handle);
        }
    }
}
