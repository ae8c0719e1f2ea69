//! Event-driven core of the route planner.
//!
//! [`Session::update`] applies one [`Msg`] and returns the [`Command`]s the
//! runtime has to execute. It never performs I/O itself, which keeps the
//! whole planning flow testable without a network.

use chrono::Utc;
use shared::{GeoPoint, PersistedRoute, PickupPoint, RouteEnvelope};

use crate::{
    classify::partition,
    config::Depot,
    draft::{draft_from_result, Applied, DraftPhase, DraftRouteState, Generation},
    duplicate::{DuplicateCheckResult, DuplicateVerdict},
    error::{PlannerError, Result},
    map::{MapRenderPipeline, MapSurface, RouteOverlay, StyleTier},
    notice::Notice,
    polyline,
    provider::{build_request, ProviderRequest, RouteResult},
};

pub const SERVER_UNAVAILABLE: &str = "Server unavailable";

#[derive(Debug)]
pub enum Msg {
    Reload,
    /// Reload triggered by the poll timer; silent when rejected.
    Poll,
    PickupPointsFetched {
        generation: Generation,
        result: Result<Vec<PickupPoint>>,
    },
    RouteFetched {
        generation: Generation,
        result: Result<RouteResult>,
    },
    DuplicateChecked {
        generation: Generation,
        verdict: DuplicateVerdict,
    },
    SaveRoute,
    RouteSaved {
        generation: Generation,
        result: Result<RouteEnvelope>,
    },
    DiscardRoute,
    ViewRoute(String),
    ViewedRouteFetched {
        ticket: u64,
        result: Result<PersistedRoute>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchPickupPoints { generation: Generation },
    RequestRoute { generation: Generation, request: ProviderRequest },
    CheckDuplicate { generation: Generation, ids: Vec<String> },
    SaveDraft { generation: Generation, draft: shared::DraftRoute },
    FetchRoute { ticket: u64, id: String },
}

pub struct Session<S> {
    depot: Depot,
    points: Vec<PickupPoint>,
    // urgent points the in-flight route request was built from, request order
    stops: Vec<(String, GeoPoint)>,
    state: DraftRouteState,
    pipeline: MapRenderPipeline<S>,
    viewed: Option<PersistedRoute>,
    view_ticket: u64,
    notices: Vec<Notice>,
}

impl<S: MapSurface> Session<S> {
    pub fn new(surface: S, depot: Depot) -> Self {
        let mut pipeline = MapRenderPipeline::new(surface, depot.clone());
        pipeline.install_base();
        Self {
            depot,
            points: Vec::new(),
            stops: Vec::new(),
            state: DraftRouteState::new(),
            pipeline,
            viewed: None,
            view_ticket: 0,
            notices: Vec::new(),
        }
    }

    pub fn points(&self) -> &[PickupPoint] {
        &self.points
    }

    pub fn state(&self) -> &DraftRouteState {
        &self.state
    }

    pub fn pipeline(&self) -> &MapRenderPipeline<S> {
        &self.pipeline
    }

    pub fn viewed(&self) -> Option<&PersistedRoute> {
        self.viewed.as_ref()
    }

    pub fn has_optimized_route(&self) -> bool {
        self.state.has_optimized_route()
    }

    /// Save is offered whenever a computed draft exists.
    pub fn can_save(&self) -> bool {
        self.state.draft().is_some()
            && !matches!(self.state.phase(), DraftPhase::Saving | DraftPhase::Computing)
    }

    pub fn duplicate(&self) -> DuplicateCheckResult {
        self.state.duplicate()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::Reload => self.reload(true),
            Msg::Poll => self.reload(false),
            Msg::PickupPointsFetched { generation, result } => self.points_fetched(generation, result),
            Msg::RouteFetched { generation, result } => self.route_fetched(generation, result),
            Msg::DuplicateChecked { generation, verdict } => {
                self.duplicate_checked(generation, verdict);
                Vec::new()
            }
            Msg::SaveRoute => self.save(),
            Msg::RouteSaved { generation, result } => {
                self.route_saved(generation, result);
                Vec::new()
            }
            Msg::DiscardRoute => {
                self.discard();
                Vec::new()
            }
            Msg::ViewRoute(id) => {
                self.view_ticket += 1;
                vec![Command::FetchRoute {
                    ticket: self.view_ticket,
                    id,
                }]
            }
            Msg::ViewedRouteFetched { ticket, result } => {
                self.viewed_route_fetched(ticket, result);
                Vec::new()
            }
        }
    }

    fn reload(&mut self, requested: bool) -> Vec<Command> {
        let generation = match self.state.begin_recompute() {
            Ok(generation) => generation,
            Err(err) => {
                tracing::info!(requested, "reload skipped: {err}");
                if requested {
                    self.notices.push(Notice::from(&err));
                }
                return Vec::new();
            }
        };
        self.stops.clear();
        self.pipeline.clear_route();
        tracing::debug!(generation = generation.value(), "reloading pickup points");
        vec![Command::FetchPickupPoints { generation }]
    }

    fn points_fetched(&mut self, generation: Generation, result: Result<Vec<PickupPoint>>) -> Vec<Command> {
        if generation != self.state.generation() {
            tracing::debug!(generation = generation.value(), "dropping stale pickup points");
            return Vec::new();
        }

        let points = match result {
            Ok(points) => points,
            Err(err) => {
                tracing::error!(error = %err, "failed to load pickup points");
                self.pipeline.show_message(SERVER_UNAVAILABLE);
                self.notices.push(Notice::from(&err));
                return Vec::new();
            }
        };

        self.pipeline.render_points(&points);
        self.points = points;

        let classified = partition(&self.points);
        if !classified.has_urgent() {
            tracing::info!(points = self.points.len(), "no urgent pickup points, nothing to route");
            self.pipeline.center_on_depot();
            return Vec::new();
        }

        self.stops = classified
            .urgent
            .iter()
            .map(|point| (point.id.clone(), point.location()))
            .collect();
        let locations: Vec<GeoPoint> = self.stops.iter().map(|(_, location)| *location).collect();
        let request = build_request(self.depot.location, &locations);

        if self.state.start_computing(generation) != Applied::Accepted {
            return Vec::new();
        }
        tracing::info!(urgent = self.stops.len(), "requesting optimized route");
        vec![Command::RequestRoute { generation, request }]
    }

    fn route_fetched(&mut self, generation: Generation, result: Result<RouteResult>) -> Vec<Command> {
        if generation != self.state.generation() {
            tracing::debug!(generation = generation.value(), "dropping stale route result");
            return Vec::new();
        }

        let computed = result.and_then(|route| {
            let path = polyline::decode(&route.encoded_polyline)?;
            Ok((route, path))
        });
        let (route, path) = match computed {
            Ok(computed) => computed,
            Err(err) => {
                self.state.route_failed(generation);
                self.report_route_failure(&err);
                return Vec::new();
            }
        };

        let ids = self.stops.iter().map(|(id, _)| id.clone()).collect();
        let draft = draft_from_result(&route, ids, Utc::now());
        if self.state.route_computed(generation, draft) != Applied::Accepted {
            return Vec::new();
        }

        let stops = route
            .visiting_order(self.stops.len())
            .into_iter()
            .map(|index| self.stops[index].1)
            .collect();
        self.pipeline.render_route(RouteOverlay {
            path,
            stops,
            tier: StyleTier::Draft,
            distance_meters: route.distance_meters,
            time_millis: route.time_millis,
        });
        tracing::info!(
            distance_m = route.distance_meters,
            time_ms = route.time_millis,
            "optimized route ready"
        );

        match self.state.begin_duplicate_check(generation) {
            Some(ids) => vec![Command::CheckDuplicate { generation, ids }],
            None => Vec::new(),
        }
    }

    fn report_route_failure(&mut self, err: &PlannerError) {
        if err.is_no_route() {
            tracing::warn!(error = %err, "provider returned no route");
        } else {
            tracing::error!(error = %err, "route computation failed");
        }
        self.notices.push(Notice::from(err));
    }

    fn duplicate_checked(&mut self, generation: Generation, verdict: DuplicateVerdict) {
        match self.state.duplicate_checked(generation, verdict.result) {
            Applied::Accepted => self.notices.extend(verdict.notice),
            Applied::Stale => tracing::debug!(generation = generation.value(), "dropping stale duplicate verdict"),
            Applied::Unexpected => tracing::warn!(phase = ?self.state.phase(), "duplicate verdict not expected"),
        }
    }

    fn save(&mut self) -> Vec<Command> {
        match self.state.begin_save() {
            Ok((generation, draft)) => {
                tracing::info!(points = draft.pick_up_point_ids.len(), "saving route");
                vec![Command::SaveDraft { generation, draft }]
            }
            Err(err) => {
                tracing::warn!("save rejected: {err}");
                self.notices.push(Notice::from(&err));
                Vec::new()
            }
        }
    }

    fn route_saved(&mut self, generation: Generation, result: Result<RouteEnvelope>) {
        match result {
            Ok(envelope) => {
                if self.state.save_succeeded(generation) == Applied::Accepted {
                    let message = if envelope.message.is_empty() {
                        "Route saved".to_string()
                    } else {
                        envelope.message
                    };
                    tracing::info!(id = ?envelope.route.as_ref().map(|route| &route.id), "route saved");
                    self.notices.push(Notice::success("Route Saved", message));
                }
            }
            Err(err) => {
                if self.state.save_failed(generation) == Applied::Accepted {
                    tracing::error!(error = %err, "failed to save route");
                    self.notices.push(Notice::error("Error saving route", err.to_string()));
                }
            }
        }
    }

    fn discard(&mut self) {
        if let Err(err) = self.state.discard() {
            self.notices.push(Notice::from(&err));
            return;
        }
        self.stops.clear();
        if self.pipeline.shown_route() == Some(StyleTier::Draft) {
            self.pipeline.clear_route();
        }
    }

    fn viewed_route_fetched(&mut self, ticket: u64, result: Result<PersistedRoute>) {
        if ticket != self.view_ticket {
            tracing::debug!(ticket, "dropping superseded route view");
            return;
        }

        let shown = result.and_then(|route| {
            let encoded = route.encoded_polyline.as_deref().ok_or(PlannerError::NoRouteFound)?;
            let path = polyline::decode(encoded)?;
            Ok((route, path))
        });
        let (route, path) = match shown {
            Ok(shown) => shown,
            Err(err) => {
                tracing::error!(error = %err, "cannot display saved route");
                self.notices.push(Notice::from(&err));
                return;
            }
        };

        let stops = self.stops_of(&route);
        self.pipeline.render_route(RouteOverlay {
            path,
            stops,
            tier: StyleTier::Historical,
            distance_meters: route.total_distance.unwrap_or_default(),
            time_millis: route.total_time.unwrap_or_default(),
        });
        tracing::info!(id = %route.id, "showing saved route");
        self.viewed = Some(route);
    }

    /// Stops of a saved route: embedded points when present, otherwise the
    /// ids looked up among the loaded points.
    fn stops_of(&self, route: &PersistedRoute) -> Vec<GeoPoint> {
        if !route.pick_up_points.is_empty() {
            return route.pick_up_points.iter().map(PickupPoint::location).collect();
        }
        route
            .pick_up_point_ids
            .iter()
            .filter_map(|id| self.points.iter().find(|point| &point.id == id))
            .map(PickupPoint::location)
            .collect()
    }
}
