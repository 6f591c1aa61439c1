use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::error::ValidationError;

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(PointId);
typed_id!(DestinationId);
typed_id!(OfferId);

impl PointId {
    const DRAFT: &'static str = "draft";

    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Placeholder id carried by a point the backend has not assigned an id to yet.
    #[must_use]
    pub fn draft() -> Self {
        Self(Self::DRAFT.to_string())
    }

    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.0 == Self::DRAFT
    }
}

/// Explicit timestamp unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    pub const MINUTE: u64 = 60 * 1000;
    pub const HOUR: u64 = 60 * Self::MINUTE;
    pub const DAY: u64 = 24 * Self::HOUR;

    #[must_use]
    pub fn now() -> Self {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self(ms)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PointType {
    Taxi,
    Bus,
    Train,
    Ship,
    Drive,
    #[default]
    Flight,
    CheckIn,
    Sightseeing,
    Restaurant,
}

impl PointType {
    pub const ALL: [PointType; 9] = [
        Self::Taxi,
        Self::Bus,
        Self::Train,
        Self::Ship,
        Self::Drive,
        Self::Flight,
        Self::CheckIn,
        Self::Sightseeing,
        Self::Restaurant,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Taxi => "taxi",
            Self::Bus => "bus",
            Self::Train => "train",
            Self::Ship => "ship",
            Self::Drive => "drive",
            Self::Flight => "flight",
            Self::CheckIn => "check-in",
            Self::Sightseeing => "sightseeing",
            Self::Restaurant => "restaurant",
        }
    }

    /// Capitalised label used in card titles ("Check-in Geneva").
    #[must_use]
    pub fn label(self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for PointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stop of the trip. Presenters only ever hold snapshots of it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub id: PointId,
    #[serde(rename = "type")]
    pub kind: PointType,
    pub date_from: UnixTimeMs,
    pub date_to: UnixTimeMs,
    pub base_price: u32,
    pub destination: Option<DestinationId>,
    pub offers: Vec<OfferId>,
    pub is_favorite: bool,
}

impl Point {
    /// Empty template the creation form starts from.
    #[must_use]
    pub fn blank(now: UnixTimeMs) -> Self {
        Self {
            id: PointId::draft(),
            kind: PointType::default(),
            date_from: now,
            date_to: now,
            base_price: 0,
            destination: None,
            offers: Vec::new(),
            is_favorite: false,
        }
    }

    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.date_to.0.saturating_sub(self.date_from.0)
    }

    #[must_use]
    pub fn is_future(&self, now: UnixTimeMs) -> bool {
        self.date_from > now
    }

    #[must_use]
    pub fn is_present(&self, now: UnixTimeMs) -> bool {
        self.date_from <= now && now <= self.date_to
    }

    #[must_use]
    pub fn is_past(&self, now: UnixTimeMs) -> bool {
        self.date_to < now
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.destination.is_none() {
            return Err(ValidationError::MissingDestination);
        }
        if self.date_to < self.date_from {
            return Err(ValidationError::InvertedDates {
                from: self.date_from.0,
                to: self.date_to.0,
            });
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Picture {
    pub src: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    pub id: DestinationId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub pictures: Vec<Picture>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Offer {
    pub id: OfferId,
    pub title: String,
    pub price: u32,
}

/// Offers available for one point type.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OfferGroup {
    #[serde(rename = "type")]
    pub kind: PointType,
    pub offers: Vec<Offer>,
}
