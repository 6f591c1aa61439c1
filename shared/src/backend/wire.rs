//! Server payload shape and its adaptation to and from [`Point`].

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::model::{DestinationId, OfferId, Point, PointId, PointType, UnixTimeMs};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WirePoint {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PointType,
    pub date_from: u64,
    pub date_to: u64,
    pub base_price: u32,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub offers: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl From<&Point> for WirePoint {
    fn from(point: &Point) -> Self {
        Self {
            id: point.id.0.clone(),
            kind: point.kind,
            date_from: point.date_from.0,
            date_to: point.date_to.0,
            base_price: point.base_price,
            destination: point.destination.as_ref().map(|d| d.0.clone()),
            offers: point.offers.iter().map(|o| o.0.clone()).collect(),
            is_favorite: point.is_favorite,
        }
    }
}

impl From<WirePoint> for Point {
    fn from(wire: WirePoint) -> Self {
        Self {
            id: PointId(wire.id),
            kind: wire.kind,
            date_from: UnixTimeMs(wire.date_from),
            date_to: UnixTimeMs(wire.date_to),
            base_price: wire.base_price,
            destination: wire.destination.filter(|d| !d.is_empty()).map(DestinationId),
            offers: wire.offers.into_iter().map(OfferId).collect(),
            is_favorite: wire.is_favorite,
        }
    }
}

pub fn encode_point(point: &Point) -> Result<String, ApiError> {
    Ok(serde_json::to_string(&WirePoint::from(point))?)
}

pub fn decode_point(raw: &str) -> Result<Point, ApiError> {
    let wire: WirePoint = serde_json::from_str(raw)?;
    Ok(wire.into())
}
