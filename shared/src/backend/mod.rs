//! Backend seams the core depends on.
//!
//! The core never talks to a transport directly: everything goes through
//! [`PointsApi`], which a shell implements over HTTP, local storage, or
//! whatever it has. Two implementations ship with the crate.

mod memory;
pub mod wire;

#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
mod sqlite;

use crate::error::ApiError;
use crate::model::{Destination, OfferGroup, Point, PointId};

pub use self::memory::MemoryPointsApi;

#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
pub use self::sqlite::SqlitePointsApi;

/// Remote-backed persistence for points and their reference data.
///
/// Every call resolves on confirmed persistence or rejects with an
/// [`ApiError`] carrying no partial state.
#[async_trait::async_trait]
pub trait PointsApi: Send + Sync {
    async fn points(&self) -> Result<Vec<Point>, ApiError>;
    async fn destinations(&self) -> Result<Vec<Destination>, ApiError>;
    async fn offers(&self) -> Result<Vec<OfferGroup>, ApiError>;

    /// Persists a new point. The backend assigns the id of the returned point.
    async fn add_point(&self, point: &Point) -> Result<Point, ApiError>;
    async fn update_point(&self, point: &Point) -> Result<Point, ApiError>;
    async fn delete_point(&self, id: &PointId) -> Result<(), ApiError>;
}
