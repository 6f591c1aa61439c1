use std::sync::{Arc, PoisonError, RwLock};

use crate::backend::PointsApi;
use crate::error::ApiError;
use crate::model::{Destination, DestinationId, Offer, OfferGroup, Point, PointType};

/// Read-only destination reference data.
#[derive(Debug, Default)]
pub struct DestinationsModel {
    destinations: RwLock<Vec<Destination>>,
}

impl DestinationsModel {
    #[must_use]
    pub fn with(destinations: Vec<Destination>) -> Self {
        Self {
            destinations: RwLock::new(destinations),
        }
    }

    pub async fn init(&self, api: &dyn PointsApi) -> Result<(), ApiError> {
        let loaded = api.destinations().await?;
        *self.destinations.write().unwrap_or_else(PoisonError::into_inner) = loaded;
        Ok(())
    }

    #[must_use]
    pub fn all(&self) -> Vec<Destination> {
        self.destinations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn by_id(&self, id: &DestinationId) -> Option<Destination> {
        self.destinations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|d| &d.id == id)
            .cloned()
    }
}

/// Read-only offer reference data, grouped by point type.
#[derive(Debug, Default)]
pub struct OffersModel {
    groups: RwLock<Vec<OfferGroup>>,
}

impl OffersModel {
    #[must_use]
    pub fn with(groups: Vec<OfferGroup>) -> Self {
        Self {
            groups: RwLock::new(groups),
        }
    }

    pub async fn init(&self, api: &dyn PointsApi) -> Result<(), ApiError> {
        let loaded = api.offers().await?;
        *self.groups.write().unwrap_or_else(PoisonError::into_inner) = loaded;
        Ok(())
    }

    #[must_use]
    pub fn by_type(&self, kind: PointType) -> Option<OfferGroup> {
        self.groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|g| g.kind == kind)
            .cloned()
    }
}

/// Render-time lookups over both catalogs.
#[derive(Clone, Debug)]
pub struct Catalog {
    destinations: Arc<DestinationsModel>,
    offers: Arc<OffersModel>,
}

impl Catalog {
    #[must_use]
    pub fn new(destinations: Arc<DestinationsModel>, offers: Arc<OffersModel>) -> Self {
        Self { destinations, offers }
    }

    #[must_use]
    pub fn destination(&self, id: &DestinationId) -> Option<Destination> {
        self.destinations.by_id(id)
    }

    #[must_use]
    pub fn destination_names(&self) -> Vec<String> {
        self.destinations.all().into_iter().map(|d| d.name).collect()
    }

    #[must_use]
    pub fn offers_for(&self, kind: PointType) -> Option<OfferGroup> {
        self.offers.by_type(kind)
    }

    /// Offers `point` selected, in selection order. Unknown ids are skipped.
    #[must_use]
    pub fn selected_offers(&self, point: &Point) -> Vec<Offer> {
        let Some(group) = self.offers_for(point.kind) else {
            return Vec::new();
        };
        point
            .offers
            .iter()
            .filter_map(|id| group.offers.iter().find(|o| &o.id == id).cloned())
            .collect()
    }
}
