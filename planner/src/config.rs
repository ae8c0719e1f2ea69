//! Runtime configuration, read from the environment with sensible defaults.

use std::time::Duration;

use shared::GeoPoint;

use crate::error::{PlannerError, Result};

pub const DEFAULT_API_ROOT: &str = "http://localhost:8082/api";
pub const DEFAULT_PROVIDER_URL: &str = "https://graphhopper.com/api/1/route";
pub const DEFAULT_POLL_SECS: u64 = 30;
pub const DEFAULT_ROUTE_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;

/// Fixed start and end of every computed route.
#[derive(Debug, Clone, PartialEq)]
pub struct Depot {
    pub location: GeoPoint,
    pub name: String,
}

impl Default for Depot {
    fn default() -> Self {
        Self {
            location: GeoPoint::new(35.77799, 10.82617),
            name: "Central Depot - Monastir".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub api_root: String,
    pub provider_url: String,
    pub provider_key: Option<String>,
    pub depot: Depot,
    /// `None` disables periodic reloads.
    pub poll_interval: Option<Duration>,
    pub route_timeout: Duration,
    pub backend_timeout: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            provider_key: None,
            depot: Depot::default(),
            poll_interval: poll_interval_from_secs(DEFAULT_POLL_SECS),
            route_timeout: Duration::from_secs(DEFAULT_ROUTE_TIMEOUT_SECS),
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
        }
    }
}

impl PlannerConfig {
    /// Build a configuration from process environment variables.
    ///
    /// Recognised variables: `PLANNER_API_ROOT`, `GRAPHHOPPER_URL`,
    /// `GRAPHHOPPER_KEY`, `PLANNER_DEPOT_LAT`, `PLANNER_DEPOT_LNG`,
    /// `PLANNER_DEPOT_NAME`, `PLANNER_POLL_SECS`, `PLANNER_ROUTE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(root) = lookup("PLANNER_API_ROOT") {
            config.api_root = root;
        }
        if let Some(url) = lookup("GRAPHHOPPER_URL") {
            config.provider_url = url;
        }
        config.provider_key = lookup("GRAPHHOPPER_KEY").filter(|key| !key.trim().is_empty());

        if let Some(lat) = lookup("PLANNER_DEPOT_LAT") {
            config.depot.location.lat = parse_number("PLANNER_DEPOT_LAT", &lat)?;
        }
        if let Some(lng) = lookup("PLANNER_DEPOT_LNG") {
            config.depot.location.lng = parse_number("PLANNER_DEPOT_LNG", &lng)?;
        }
        if let Some(name) = lookup("PLANNER_DEPOT_NAME") {
            config.depot.name = name;
        }
        if let Some(secs) = lookup("PLANNER_POLL_SECS") {
            config.poll_interval = poll_interval_from_secs(parse_number("PLANNER_POLL_SECS", &secs)?);
        }
        if let Some(secs) = lookup("PLANNER_ROUTE_TIMEOUT_SECS") {
            config.route_timeout = Duration::from_secs(parse_number("PLANNER_ROUTE_TIMEOUT_SECS", &secs)?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let GeoPoint { lat, lng } = self.depot.location;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(PlannerError::Config(format!(
                "depot coordinates out of range: ({lat}, {lng})"
            )));
        }
        if self.api_root.trim().is_empty() {
            return Err(PlannerError::Config("API root must not be empty".into()));
        }
        if self.route_timeout.is_zero() {
            return Err(PlannerError::Config("route timeout must be positive".into()));
        }
        Ok(())
    }

    /// Base API URL without a trailing slash.
    pub fn api_root(&self) -> &str {
        self.api_root.trim_end_matches('/')
    }
}

/// Zero disables polling.
pub fn poll_interval_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| PlannerError::Config(format!("{key} has an invalid value: {raw:?}")))
}
