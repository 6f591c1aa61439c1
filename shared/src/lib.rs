// lib.rs - headless trip planner core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod backend;
pub mod blocker;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod format;
pub mod model;
pub mod presenter;
pub mod sort;
pub mod store;
pub mod trip_info;
pub mod view;

pub use backend::{MemoryPointsApi, PointsApi};
#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
pub use backend::SqlitePointsApi;
pub use blocker::{BlockGuard, BlockerLimits, UiBlocker};
pub use config::PresenterConfig;
pub use error::{ApiError, ConfigError, ValidationError};
pub use event::{Event, Intent, UpdateType, UserAction};
pub use filter::FilterType;
pub use model::{
    Destination, DestinationId, Offer, OfferGroup, OfferId, Picture, Point, PointId, PointType,
    UnixTimeMs,
};
pub use presenter::{
    DispatchOutcome, EventSender, HeaderPresenter, ListPresenter, Mode, NewPointPresenter,
    PointPresenter,
};
pub use sort::SortType;
pub use store::{Catalog, ModelChange, TripModels};
pub use view::{HeadlessSurface, Surface, ViewNode};
