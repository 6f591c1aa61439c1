use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, info, instrument, warn};

use super::{ChangeReceiver, ChangeSender, Observable};
use crate::backend::PointsApi;
use crate::error::ApiError;
use crate::event::UpdateType;
use crate::model::{Point, PointId};

/// Authoritative point list. Local state changes only after the backend
/// confirms, and every confirmed change is published with its scope.
pub struct PointsModel {
    api: Arc<dyn PointsApi>,
    points: RwLock<Vec<Point>>,
    load_failed: AtomicBool,
    observers: Observable,
}

impl PointsModel {
    #[must_use]
    pub fn new(api: Arc<dyn PointsApi>) -> Self {
        Self {
            api,
            points: RwLock::new(Vec::new()),
            load_failed: AtomicBool::new(false),
            observers: Observable::new(),
        }
    }

    #[must_use]
    pub fn api(&self) -> Arc<dyn PointsApi> {
        Arc::clone(&self.api)
    }

    pub fn attach(&self, sender: ChangeSender) {
        self.observers.attach(sender);
    }

    #[must_use]
    pub fn subscribe(&self) -> ChangeReceiver {
        self.observers.subscribe()
    }

    /// Snapshot of the current list.
    #[must_use]
    pub fn points(&self) -> Vec<Point> {
        self.points
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn point(&self, id: &PointId) -> Option<Point> {
        self.points
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| &p.id == id)
            .cloned()
    }

    #[must_use]
    pub fn load_failed(&self) -> bool {
        self.load_failed.load(Ordering::SeqCst)
    }

    fn contains(&self, id: &PointId) -> bool {
        self.points
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|p| &p.id == id)
    }

    /// Loads the list. A failed load leaves it empty; `Init` is emitted either way.
    #[instrument(skip(self))]
    pub async fn init(&self) {
        match self.api.points().await {
            Ok(points) => {
                info!(count = points.len(), "points loaded");
                *self.points.write().unwrap_or_else(PoisonError::into_inner) = points;
                self.load_failed.store(false, Ordering::SeqCst);
                self.observers.notify(UpdateType::Init, None);
            }
            Err(e) => self.fail_init(&e),
        }
    }

    pub(crate) fn fail_init(&self, cause: &ApiError) {
        error!(error = %cause, code = cause.code(), "initial load failed");
        self.points.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.load_failed.store(true, Ordering::SeqCst);
        self.observers.notify(UpdateType::Init, None);
    }

    /// Persists a new point and prepends the stored copy.
    #[instrument(skip(self, point))]
    pub async fn add_point(&self, scope: UpdateType, point: &Point) -> Result<Point, ApiError> {
        let created = self.api.add_point(point).await.map_err(|e| {
            warn!(error = %e, "add rejected");
            e
        })?;
        self.points
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, created.clone());
        self.observers.notify(scope, Some(&created));
        Ok(created)
    }

    #[instrument(skip(self, point), fields(id = %point.id))]
    pub async fn update_point(&self, scope: UpdateType, point: &Point) -> Result<Point, ApiError> {
        if !self.contains(&point.id) {
            return Err(ApiError::NotFound(point.id.clone()));
        }
        let updated = self.api.update_point(point).await.map_err(|e| {
            warn!(error = %e, "update rejected");
            e
        })?;
        {
            let mut points = self.points.write().unwrap_or_else(PoisonError::into_inner);
            match points.iter_mut().find(|p| p.id == updated.id) {
                Some(slot) => *slot = updated.clone(),
                None => return Err(ApiError::NotFound(updated.id.clone())),
            }
        }
        self.observers.notify(scope, Some(&updated));
        Ok(updated)
    }

    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn delete_point(&self, scope: UpdateType, id: &PointId) -> Result<(), ApiError> {
        if !self.contains(id) {
            return Err(ApiError::NotFound(id.clone()));
        }
        self.api.delete_point(id).await.map_err(|e| {
            warn!(error = %e, "delete rejected");
            e
        })?;
        self.points
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|p| &p.id != id);
        self.observers.notify(scope, None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryPointsApi;
    use crate::model::{DestinationId, UnixTimeMs};

    fn point(id: &str, price: u32) -> Point {
        let mut p = Point::blank(UnixTimeMs(0));
        p.id = PointId::new(id);
        p.base_price = price;
        p.destination = Some(DestinationId::new("d"));
        p
    }

    fn model(points: Vec<Point>) -> PointsModel {
        PointsModel::new(Arc::new(MemoryPointsApi::new(points, vec![], vec![])))
    }

    struct DownApi;

    #[async_trait::async_trait]
    impl PointsApi for DownApi {
        async fn points(&self) -> Result<Vec<Point>, ApiError> {
            Err(ApiError::Network("offline".into()))
        }
        async fn destinations(&self) -> Result<Vec<crate::model::Destination>, ApiError> {
            Err(ApiError::Network("offline".into()))
        }
        async fn offers(&self) -> Result<Vec<crate::model::OfferGroup>, ApiError> {
            Err(ApiError::Network("offline".into()))
        }
        async fn add_point(&self, _: &Point) -> Result<Point, ApiError> {
            Err(ApiError::Network("offline".into()))
        }
        async fn update_point(&self, _: &Point) -> Result<Point, ApiError> {
            Err(ApiError::Network("offline".into()))
        }
        async fn delete_point(&self, _: &PointId) -> Result<(), ApiError> {
            Err(ApiError::Network("offline".into()))
        }
    }

    #[tokio::test]
    async fn init_emits_init_with_snapshot() {
        let model = model(vec![point("a", 1)]);
        let mut rx = model.subscribe();
        model.init().await;
        assert_eq!(rx.try_recv().unwrap().scope, UpdateType::Init);
        assert_eq!(model.points().len(), 1);
        assert!(!model.load_failed());
    }

    #[tokio::test]
    async fn failed_init_still_emits_init() {
        let model = PointsModel::new(Arc::new(DownApi));
        let mut rx = model.subscribe();
        model.init().await;
        assert_eq!(rx.try_recv().unwrap().scope, UpdateType::Init);
        assert!(model.points().is_empty());
        assert!(model.load_failed());
    }

    #[tokio::test]
    async fn add_prepends_and_notifies() {
        let model = model(vec![point("a", 1)]);
        model.init().await;
        let mut rx = model.subscribe();

        let created = model.add_point(UpdateType::Minor, &point("draft", 5)).await.unwrap();

        assert_eq!(model.points()[0].id, created.id);
        let change = rx.try_recv().unwrap();
        assert_eq!(change.scope, UpdateType::Minor);
        assert_eq!(change.point, Some(created));
    }

    #[tokio::test]
    async fn update_replaces_and_keeps_id() {
        let model = model(vec![point("a", 1), point("b", 2)]);
        model.init().await;
        let updated = model.update_point(UpdateType::Minor, &point("a", 50)).await.unwrap();
        assert_eq!(updated.id, PointId::new("a"));
        assert_eq!(model.point(&PointId::new("a")).unwrap().base_price, 50);
    }

    #[tokio::test]
    async fn unknown_ids_never_reach_the_backend() {
        let model = model(vec![]);
        let mut rx = model.subscribe();
        assert!(matches!(
            model.update_point(UpdateType::Patch, &point("x", 0)).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            model.delete_point(UpdateType::Minor, &PointId::new("x")).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn rejected_mutation_leaves_state_untouched() {
        let model = PointsModel::new(Arc::new(DownApi));
        *model.points.write().unwrap() = vec![point("a", 1)];
        let mut rx = model.subscribe();

        assert!(model.update_point(UpdateType::Minor, &point("a", 9)).await.is_err());
        assert!(model.delete_point(UpdateType::Minor, &PointId::new("a")).await.is_err());

        assert_eq!(model.points(), vec![point("a", 1)]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn delete_notifies_without_point() {
        let model = model(vec![point("a", 1)]);
        model.init().await;
        let mut rx = model.subscribe();
        model.delete_point(UpdateType::Minor, &PointId::new("a")).await.unwrap();
        let change = rx.try_recv().unwrap();
        assert_eq!(change, super::super::ModelChange { scope: UpdateType::Minor, point: None });
        assert!(model.points().is_empty());
    }
}
