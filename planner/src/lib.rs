pub mod backend;
pub mod classify;
pub mod config;
pub mod draft;
pub mod duplicate;
pub mod error;
pub mod format;
pub mod map;
pub mod notice;
pub mod polyline;
pub mod provider;
pub mod runtime;
pub mod session;

use std::sync::Arc;

use reqwest::Client;

use crate::backend::BackendClient;
use crate::config::PlannerConfig;
use crate::map::SceneSurface;
use crate::provider::GraphHopperClient;
use crate::runtime::{Runtime, Services};
use crate::session::Session;

pub use crate::error::{PlannerError, Result};

pub type LiveRuntime<S = SceneSurface> = Runtime<S, GraphHopperClient, BackendClient>;

/// Wire a runtime against the live provider and backend described by `config`.
pub fn connect<S: map::MapSurface>(config: &PlannerConfig, surface: S) -> Result<LiveRuntime<S>> {
    config.validate()?;
    if config.provider_key.is_none() {
        tracing::warn!("GRAPHHOPPER_KEY is not set, route requests will likely be rejected");
    }

    let client = Client::builder().build()?;
    let provider = GraphHopperClient::new(
        client.clone(),
        config.provider_url.clone(),
        config.provider_key.clone(),
        config.route_timeout,
    );
    let backend = BackendClient::new(client, config.api_root(), config.backend_timeout);
    let services = Services::new(Arc::new(provider), Arc::new(backend), config.route_timeout);

    Ok(Runtime::new(Session::new(surface, config.depot.clone()), services))
}
