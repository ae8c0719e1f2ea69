use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Provider order: longitude first.
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    #[default]
    Functional,
    NonFunctional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(default, alias = "_id", alias = "containerId")]
    pub id: Option<String>,
    #[serde(rename = "containerType", default)]
    pub kind: String,
    pub fill_level: f64,
    pub capacity: f64,
    #[serde(rename = "containerStatus", default)]
    pub status: ContainerStatus,
}

impl Container {
    /// Raw fill ratio, not clamped: an overfilled container reports more than 1.0.
    pub fn fill_ratio(&self) -> f64 {
        if self.capacity > 0.0 {
            self.fill_level / self.capacity
        } else if self.fill_level > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }

    pub fn is_functional(&self) -> bool {
        self.status == ContainerStatus::Functional
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupPoint {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "locationLatitude")]
    pub lat: f64,
    #[serde(rename = "locationLongitude")]
    pub lng: f64,
    #[serde(rename = "locationName", default)]
    pub address: String,
    #[serde(default)]
    pub containers: Vec<Container>,
}

impl PickupPoint {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// One turn-by-turn step, copied field-for-field from the routing provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub distance: f64,
    pub sign: i32,
    pub text: String,
    pub time: u64,
    #[serde(default, alias = "street_name")]
    pub street_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl RouteStatus {
    pub fn label(self) -> &'static str {
        match self {
            RouteStatus::Planned => "Planned",
            RouteStatus::InProgress => "In Progress",
            RouteStatus::Completed => "Completed",
            RouteStatus::Cancelled => "Cancelled",
        }
    }
}

/// A computed route that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRoute {
    pub route_date: DateTime<Utc>,
    pub total_distance: f64,
    pub total_time: u64,
    pub encoded_polyline: String,
    pub pick_up_point_ids: Vec<String>,
    pub instructions: Vec<Instruction>,
    pub status: RouteStatus,
}

/// A route as returned by the persistence service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRoute {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_route_date")]
    pub route_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_distance: Option<f64>,
    #[serde(default)]
    pub total_time: Option<u64>,
    #[serde(default)]
    pub encoded_polyline: Option<String>,
    #[serde(default)]
    pub pick_up_point_ids: Vec<String>,
    #[serde(default)]
    pub pick_up_points: Vec<PickupPoint>,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
    #[serde(default)]
    pub status: Option<RouteStatus>,
}

/// Accepts RFC 3339 timestamps as well as the backend's zone-less
/// `LocalDateTime` form, which is read as UTC.
pub fn parse_route_date(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc()))
}

fn optional_route_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| parse_route_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupPointsEnvelope {
    #[serde(default)]
    pub pickuppoints: Vec<PickupPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEnvelope {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub route: Option<PersistedRoute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesEnvelope {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub routes: Vec<PersistedRoute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub status: Option<u16>,
    pub message: String,
}
