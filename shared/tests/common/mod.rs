#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use trip_shared::{
    ApiError, Destination, DestinationId, HeadlessSurface, ListPresenter, MemoryPointsApi, Offer,
    OfferGroup, OfferId, Point, PointId, PointType, PointsApi, PresenterConfig, TripModels,
    UnixTimeMs,
};

/// 2019-03-18 00:00 UTC
pub const MAR_18: u64 = 1_552_867_200_000;
/// Between A (day 1) and B (day 3).
pub const NOW: u64 = MAR_18 + 2 * UnixTimeMs::DAY;

pub fn now() -> UnixTimeMs {
    UnixTimeMs(NOW)
}

/// Backend wrapper with switchable failures and latency.
pub struct FailableApi {
    inner: MemoryPointsApi,
    fail_writes: AtomicBool,
    fail_loads: AtomicBool,
    delay_ms: AtomicU64,
}

impl FailableApi {
    pub fn new(inner: MemoryPointsApi) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            fail_loads: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, ms: u64) {
        self.delay_ms.store(ms, Ordering::SeqCst);
    }

    pub fn stored_points(&self) -> Vec<Point> {
        self.inner.stored_points()
    }

    async fn write_gate(&self) -> Result<(), ApiError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ApiError::Network("Injected failure".into()));
        }
        Ok(())
    }

    fn load_gate(&self) -> Result<(), ApiError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(ApiError::Server {
                status: 503,
                message: "Injected failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PointsApi for FailableApi {
    async fn points(&self) -> Result<Vec<Point>, ApiError> {
        self.load_gate()?;
        self.inner.points().await
    }

    async fn destinations(&self) -> Result<Vec<Destination>, ApiError> {
        self.load_gate()?;
        self.inner.destinations().await
    }

    async fn offers(&self) -> Result<Vec<OfferGroup>, ApiError> {
        self.load_gate()?;
        self.inner.offers().await
    }

    async fn add_point(&self, point: &Point) -> Result<Point, ApiError> {
        self.write_gate().await?;
        self.inner.add_point(point).await
    }

    async fn update_point(&self, point: &Point) -> Result<Point, ApiError> {
        self.write_gate().await?;
        self.inner.update_point(point).await
    }

    async fn delete_point(&self, id: &PointId) -> Result<(), ApiError> {
        self.write_gate().await?;
        self.inner.delete_point(id).await
    }
}

pub fn destinations() -> Vec<Destination> {
    [("d-1", "Amsterdam"), ("d-2", "Geneva"), ("d-3", "Chamonix")]
        .iter()
        .map(|(id, name)| Destination {
            id: DestinationId::new(*id),
            name: (*name).into(),
            description: format!("{name} is lovely"),
            pictures: vec![],
        })
        .collect()
}

pub fn offers() -> Vec<OfferGroup> {
    vec![OfferGroup {
        kind: PointType::Taxi,
        offers: vec![Offer {
            id: OfferId::new("o-1"),
            title: "Order Uber".into(),
            price: 20,
        }],
    }]
}

pub fn point(id: &str, day: u64, hours: u64, price: u32, destination: &str) -> Point {
    let from = MAR_18 + day * UnixTimeMs::DAY;
    Point {
        id: PointId::new(id),
        kind: PointType::Taxi,
        date_from: UnixTimeMs(from),
        date_to: UnixTimeMs(from + hours * UnixTimeMs::HOUR),
        base_price: price,
        destination: Some(DestinationId::new(destination)),
        offers: vec![],
        is_favorite: false,
    }
}

/// A on day 1 for 100, B on day 3 for 50.
pub fn trip() -> Vec<Point> {
    vec![point("a", 1, 2, 100, "d-1"), point("b", 3, 1, 50, "d-2")]
}

pub struct Fixture {
    pub api: Arc<FailableApi>,
    pub models: TripModels,
}

impl Fixture {
    pub fn new(points: Vec<Point>) -> Self {
        let api = Arc::new(FailableApi::new(MemoryPointsApi::new(
            points,
            destinations(),
            offers(),
        )));
        let models = TripModels::new(api.clone());
        Self { api, models }
    }

    pub fn list(&self) -> ListPresenter<HeadlessSurface> {
        ListPresenter::new(
            PresenterConfig::default(),
            HeadlessSurface::new(),
            self.models.clone(),
            || {},
        )
        .with_clock(now)
    }
}

/// Loaded list showing `points`.
pub async fn loaded(points: Vec<Point>) -> (Fixture, ListPresenter<HeadlessSurface>) {
    let fixture = Fixture::new(points);
    let mut list = fixture.list();
    list.initialize();
    fixture.models.load().await;
    list.process_changes();
    (fixture, list)
}

pub fn ids(list: &ListPresenter<HeadlessSurface>) -> Vec<String> {
    list.surface()
        .list_ids()
        .into_iter()
        .map(|id| id.as_str().to_string())
        .collect()
}
