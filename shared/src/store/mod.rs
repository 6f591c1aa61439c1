//! Models the presenters observe.
//!
//! Each model owns its state behind a lock and publishes owned
//! [`ModelChange`] snapshots over unbounded channels. Subscribers drain their
//! receiver when it suits them, so a notification never re-enters a
//! presenter mid-update.

mod catalog;
mod filter;
mod points;

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::backend::PointsApi;
use crate::event::UpdateType;
use crate::model::Point;

pub use self::catalog::{Catalog, DestinationsModel, OffersModel};
pub use self::filter::FilterModel;
pub use self::points::PointsModel;

/// Owned notification handed to subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelChange {
    pub scope: UpdateType,
    pub point: Option<Point>,
}

pub type ChangeSender = mpsc::UnboundedSender<ModelChange>;
pub type ChangeReceiver = mpsc::UnboundedReceiver<ModelChange>;

/// Explicit subscriber list.
#[derive(Debug, Default)]
pub struct Observable {
    subscribers: Mutex<Vec<ChangeSender>>,
}

impl Observable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, sender: ChangeSender) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
    }

    #[must_use]
    pub fn subscribe(&self) -> ChangeReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.attach(tx);
        rx
    }

    /// Sends a snapshot to every live subscriber; closed ones are dropped.
    pub fn notify(&self, scope: UpdateType, point: Option<&Point>) {
        let change = ModelChange {
            scope,
            point: point.cloned(),
        };
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Every model a trip screen needs, shared by the presenters.
#[derive(Clone)]
pub struct TripModels {
    pub points: Arc<PointsModel>,
    pub filter: Arc<FilterModel>,
    pub destinations: Arc<DestinationsModel>,
    pub offers: Arc<OffersModel>,
}

impl TripModels {
    #[must_use]
    pub fn new(api: Arc<dyn PointsApi>) -> Self {
        Self {
            points: Arc::new(PointsModel::new(api)),
            filter: Arc::new(FilterModel::new()),
            destinations: Arc::new(DestinationsModel::default()),
            offers: Arc::new(OffersModel::default()),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Catalog {
        Catalog::new(Arc::clone(&self.destinations), Arc::clone(&self.offers))
    }

    /// Sends changes of both observed models to one channel.
    pub fn attach(&self, sender: &ChangeSender) {
        self.points.attach(sender.clone());
        self.filter.attach(sender.clone());
    }

    /// Loads both catalogs concurrently, then the points. A catalog failure
    /// fails the whole load; `Init` is emitted either way.
    pub async fn load(&self) {
        let api = self.points.api();
        let (destinations, offers) = tokio::join!(
            self.destinations.init(api.as_ref()),
            self.offers.init(api.as_ref())
        );
        if let Err(e) = destinations.and(offers) {
            warn!(error = %e, code = e.code(), "reference data failed to load");
            self.points.fail_init(&e);
            return;
        }
        self.points.init().await;
        info!(points = self.points.points().len(), "trip models loaded");
    }
}
