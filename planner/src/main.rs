use std::time::Duration;

use clap::Parser;
use planner::{
    backend::RouteStore,
    config::{poll_interval_from_secs, PlannerConfig},
    connect,
    map::SceneSurface,
    session::Msg,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Headless collection route planner: classify pickup points, optimize and save routes"
)]
struct Args {
    /// Backend API root (overrides PLANNER_API_ROOT)
    #[arg(long)]
    api_root: Option<String>,

    /// Routing provider endpoint (overrides GRAPHHOPPER_URL)
    #[arg(long)]
    provider_url: Option<String>,

    #[arg(long)]
    depot_lat: Option<f64>,
    #[arg(long)]
    depot_lng: Option<f64>,

    /// Reload interval in seconds, 0 disables polling
    #[arg(long)]
    poll_secs: Option<u64>,

    /// Route request timeout in seconds
    #[arg(long)]
    route_timeout_secs: Option<u64>,

    /// Compute a single route and exit
    #[arg(long)]
    once: bool,

    /// Save the computed route (with --once)
    #[arg(long, requires = "once")]
    save: bool,

    /// Display a saved route by id and exit
    #[arg(long, conflicts_with = "once")]
    view: Option<String>,

    /// List saved routes before starting
    #[arg(long)]
    list: bool,
}

impl Args {
    fn apply(&self, config: &mut PlannerConfig) {
        if let Some(root) = &self.api_root {
            config.api_root = root.clone();
        }
        if let Some(url) = &self.provider_url {
            config.provider_url = url.clone();
        }
        if let Some(lat) = self.depot_lat {
            config.depot.location.lat = lat;
        }
        if let Some(lng) = self.depot_lng {
            config.depot.location.lng = lng;
        }
        if let Some(secs) = self.poll_secs {
            config.poll_interval = poll_interval_from_secs(secs);
        }
        if let Some(secs) = self.route_timeout_secs {
            config.route_timeout = Duration::from_secs(secs);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planner=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = PlannerConfig::from_env()?;
    args.apply(&mut config);

    let mut runtime = connect(&config, SceneSurface::new())?;
    tracing::info!(
        api = config.api_root(),
        depot = %config.depot.name,
        "planner connected"
    );

    if args.list {
        match runtime.services().backend().list().await {
            Ok(routes) => {
                for route in &routes {
                    tracing::info!(
                        id = %route.id,
                        status = route.status.map(|status| status.label()).unwrap_or("-"),
                        points = route.pick_up_point_ids.len(),
                        "saved route"
                    );
                }
                tracing::info!("{} saved route(s)", routes.len());
            }
            Err(err) => tracing::warn!(error = %err, "could not list saved routes"),
        }
    }

    if let Some(id) = args.view {
        runtime.dispatch(Msg::ViewRoute(id));
        runtime.settle().await;
        runtime.log_notices();
        log_scene(&runtime);
        return Ok(());
    }

    if args.once {
        runtime.dispatch(Msg::Reload);
        runtime.settle().await;
        if args.save {
            runtime.dispatch(Msg::SaveRoute);
            runtime.settle().await;
        }
        runtime.log_notices();
        log_scene(&runtime);
        return Ok(());
    }

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };
    runtime.run(config.poll_interval, shutdown).await;
    log_scene(&runtime);
    Ok(())
}

fn log_scene(runtime: &planner::LiveRuntime) {
    let session = runtime.session();
    let summary = session.pipeline().surface().summary();
    tracing::info!(
        points = session.points().len(),
        markers = summary.markers,
        polylines = summary.polylines,
        phase = ?session.state().phase(),
        duplicate = ?session.duplicate(),
        "map scene"
    );
    if let Some(draft) = session.state().draft() {
        tracing::info!(
            stops = draft.pick_up_point_ids.len(),
            distance = %planner::format::format_distance(draft.total_distance),
            duration = %planner::format::format_duration(draft.total_time),
            "unsaved route"
        );
    }
}
