use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::PointsApi;
use crate::error::ApiError;
use crate::model::{Destination, OfferGroup, Point, PointId};

#[derive(Debug, Default)]
struct MemoryState {
    points: Vec<Point>,
    destinations: Vec<Destination>,
    offers: Vec<OfferGroup>,
}

/// In-process backend. Created points get a fresh UUID.
#[derive(Debug, Default)]
pub struct MemoryPointsApi {
    state: Mutex<MemoryState>,
}

impl MemoryPointsApi {
    #[must_use]
    pub fn new(points: Vec<Point>, destinations: Vec<Destination>, offers: Vec<OfferGroup>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                points,
                destinations,
                offers,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of what the backend currently holds.
    #[must_use]
    pub fn stored_points(&self) -> Vec<Point> {
        self.lock().points.clone()
    }
}

#[async_trait::async_trait]
impl PointsApi for MemoryPointsApi {
    async fn points(&self) -> Result<Vec<Point>, ApiError> {
        Ok(self.lock().points.clone())
    }

    async fn destinations(&self) -> Result<Vec<Destination>, ApiError> {
        Ok(self.lock().destinations.clone())
    }

    async fn offers(&self) -> Result<Vec<OfferGroup>, ApiError> {
        Ok(self.lock().offers.clone())
    }

    async fn add_point(&self, point: &Point) -> Result<Point, ApiError> {
        let mut created = point.clone();
        created.id = PointId::generate();
        debug!(id = %created.id, "memory backend stored new point");
        self.lock().points.push(created.clone());
        Ok(created)
    }

    async fn update_point(&self, point: &Point) -> Result<Point, ApiError> {
        let mut state = self.lock();
        let slot = state
            .points
            .iter_mut()
            .find(|p| p.id == point.id)
            .ok_or_else(|| ApiError::NotFound(point.id.clone()))?;
        *slot = point.clone();
        Ok(point.clone())
    }

    async fn delete_point(&self, id: &PointId) -> Result<(), ApiError> {
        let mut state = self.lock();
        let before = state.points.len();
        state.points.retain(|p| &p.id != id);
        if state.points.len() == before {
            return Err(ApiError::NotFound(id.clone()));
        }
        Ok(())
    }
}
