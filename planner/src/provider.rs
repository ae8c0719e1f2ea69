//! Routing provider request building, response parsing and the HTTP client.
//!
//! The provider solves the visiting order itself (`optimize: true`); this
//! module only shapes the waypoint list and maps the first returned path.

use std::{future::Future, time::Duration};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::{GeoPoint, Instruction};

use crate::error::{PlannerError, Result};

pub const VEHICLE: &str = "car";

/// Provider request body. Coordinates are `[lng, lat]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub points: Vec<[f64; 2]>,
    pub vehicle: String,
    pub optimize: bool,
}

impl ProviderRequest {
    pub fn waypoint_count(&self) -> usize {
        self.points.len()
    }
}

/// Waypoints ordered `[depot, ...urgent]`.
pub fn build_request(depot: GeoPoint, urgent: &[GeoPoint]) -> ProviderRequest {
    let points = std::iter::once(depot)
        .chain(urgent.iter().copied())
        .map(GeoPoint::to_lng_lat)
        .collect();

    ProviderRequest {
        points,
        vehicle: VEHICLE.to_string(),
        optimize: true,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderResponse {
    #[serde(default)]
    pub paths: Vec<ProviderPath>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderPath {
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub time: u64,
    pub points: Option<String>,
    #[serde(default)]
    pub instructions: Vec<ProviderInstruction>,
    /// Visiting order chosen by the provider, as indices into the request's
    /// waypoint list.
    #[serde(default)]
    pub points_order: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderInstruction {
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub sign: i32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub time: u64,
    #[serde(default)]
    pub street_name: String,
}

impl From<ProviderInstruction> for Instruction {
    fn from(raw: ProviderInstruction) -> Self {
        Instruction {
            distance: raw.distance,
            sign: raw.sign,
            text: raw.text,
            time: raw.time,
            street_name: raw.street_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub distance_meters: f64,
    pub time_millis: u64,
    pub encoded_polyline: String,
    pub instructions: Vec<Instruction>,
    pub waypoint_order: Option<Vec<usize>>,
}

impl RouteResult {
    /// Indices (into the urgent point list) in the order the route visits
    /// them. Falls back to request order when the provider gave none or the
    /// one it gave does not cover every point.
    pub fn visiting_order(&self, urgent_count: usize) -> Vec<usize> {
        let fallback = || (0..urgent_count).collect();
        let Some(order) = &self.waypoint_order else {
            return fallback();
        };

        // provider indices include the depot at position 0
        let mut visits: Vec<usize> = order
            .iter()
            .filter(|&&index| index > 0 && index <= urgent_count)
            .map(|index| index - 1)
            .collect();
        let mut seen = vec![false; urgent_count];
        visits.retain(|&index| !std::mem::replace(&mut seen[index], true));

        if visits.len() == urgent_count {
            visits
        } else {
            fallback()
        }
    }
}

/// Takes the first path; instructions are copied without unit conversion.
pub fn parse_response(response: ProviderResponse) -> Result<RouteResult> {
    let path = response
        .paths
        .into_iter()
        .next()
        .ok_or(PlannerError::NoRouteFound)?;
    let encoded_polyline = path.points.ok_or(PlannerError::NoRouteFound)?;

    Ok(RouteResult {
        distance_meters: path.distance,
        time_millis: path.time,
        encoded_polyline,
        instructions: path.instructions.into_iter().map(Instruction::from).collect(),
        waypoint_order: path.points_order,
    })
}

pub trait RoutingProvider: Send + Sync + 'static {
    fn route(&self, request: &ProviderRequest) -> impl Future<Output = Result<RouteResult>> + Send;
}

#[derive(Debug, Clone, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct GraphHopperClient {
    client: Client,
    url: String,
    key: Option<String>,
    timeout: Duration,
}

impl GraphHopperClient {
    pub fn new(client: Client, url: impl Into<String>, key: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            key,
            timeout,
        }
    }

    async fn send(&self, request: &ProviderRequest) -> Result<RouteResult> {
        let mut builder = self.client.post(&self.url).timeout(self.timeout).json(request);
        if let Some(key) = &self.key {
            builder = builder.query(&[("key", key)]);
        }

        let response = builder.send().await.map_err(|err| self.classify(err))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorBody>(&body)
                .map(|parsed| parsed.message)
                .unwrap_or(body);
            return Err(PlannerError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ProviderResponse = response.json().await.map_err(|err| self.classify(err))?;
        parse_response(parsed)
    }

    fn classify(&self, err: reqwest::Error) -> PlannerError {
        if err.is_timeout() {
            PlannerError::Timeout(self.timeout)
        } else {
            PlannerError::Network(err)
        }
    }
}

impl RoutingProvider for GraphHopperClient {
    async fn route(&self, request: &ProviderRequest) -> Result<RouteResult> {
        tracing::debug!(waypoints = request.waypoint_count(), "requesting optimized route");
        self.send(request).await
    }
}
