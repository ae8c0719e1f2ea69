#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

pub const TWO_POINTS: &str = "_p~iF~ps|U_ulLnnqC";

pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Routing provider stand-in recording every request it receives.
#[derive(Clone, Default)]
pub struct MockProvider {
    pub calls: Arc<Mutex<Vec<(HashMap<String, String>, Value)>>>,
    pub delay: Option<Duration>,
    pub status: Option<StatusCode>,
}

impl MockProvider {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub async fn start(self) -> String {
        let app = Router::new()
            .route("/route", post(provider_route))
            .with_state(self);
        format!("{}/route", serve(app).await)
    }

    pub fn calls(&self) -> Vec<(HashMap<String, String>, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

async fn provider_route(
    State(mock): State<MockProvider>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let waypoints = body["points"].as_array().map(Vec::len).unwrap_or(0);
    mock.calls.lock().unwrap().push((query, body));
    if let Some(delay) = mock.delay {
        tokio::time::sleep(delay).await;
    }
    if let Some(status) = mock.status {
        return (status, Json(json!({"message": "Wrong credentials"})));
    }

    // visit the urgent points in reverse request order
    let mut order: Vec<usize> = (1..waypoints).rev().collect();
    order.insert(0, 0);
    (
        StatusCode::OK,
        Json(json!({
            "paths": [{
                "distance": 5234.7,
                "time": 812345,
                "points": TWO_POINTS,
                "points_order": order,
                "instructions": [
                    {"distance": 120.5, "sign": 0, "text": "Continue onto Avenue de la République", "time": 20000, "street_name": "Avenue de la République"},
                    {"distance": 0.0, "sign": 4, "text": "Arrive at destination", "time": 0, "street_name": ""}
                ]
            }]
        })),
    )
}

/// Collection backend stand-in.
#[derive(Clone)]
pub struct MockBackend {
    pub points: Arc<Mutex<Value>>,
    pub point_loads: Arc<AtomicUsize>,
    pub duplicate_status: Arc<Mutex<StatusCode>>,
    pub create_status: Arc<Mutex<StatusCode>>,
    pub created: Arc<Mutex<Vec<Value>>>,
    pub duplicate_checks: Arc<Mutex<Vec<Value>>>,
}

impl MockBackend {
    pub fn with_points(points: Value) -> Self {
        Self {
            points: Arc::new(Mutex::new(points)),
            point_loads: Arc::new(AtomicUsize::new(0)),
            duplicate_status: Arc::new(Mutex::new(StatusCode::OK)),
            create_status: Arc::new(Mutex::new(StatusCode::CREATED)),
            created: Arc::new(Mutex::new(Vec::new())),
            duplicate_checks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_duplicate_status(&self, status: StatusCode) {
        *self.duplicate_status.lock().unwrap() = status;
    }

    pub fn set_create_status(&self, status: StatusCode) {
        *self.create_status.lock().unwrap() = status;
    }

    pub fn loads(&self) -> usize {
        self.point_loads.load(Ordering::SeqCst)
    }

    /// Returns the API root.
    pub async fn start(self) -> String {
        let app = Router::new()
            .route("/api/public/pickuppoints", get(list_points))
            .route("/api/public/routes", post(create_route).get(list_routes))
            .route("/api/public/routes/check-duplicate", post(check_duplicate))
            .route("/api/public/routes/:id", get(route_by_id))
            .with_state(self);
        format!("{}/api", serve(app).await)
    }
}

async fn list_points(State(mock): State<MockBackend>) -> Json<Value> {
    mock.point_loads.fetch_add(1, Ordering::SeqCst);
    let points = mock.points.lock().unwrap().clone();
    Json(json!({ "pickuppoints": points }))
}

async fn check_duplicate(State(mock): State<MockBackend>, Json(ids): Json<Value>) -> impl IntoResponse {
    mock.duplicate_checks.lock().unwrap().push(ids);
    let status = *mock.duplicate_status.lock().unwrap();
    let body = if status == StatusCode::OK {
        json!({"message": "No duplicate route"})
    } else if status == StatusCode::CONFLICT {
        json!({"status": 409, "message": "Route already exists"})
    } else {
        json!({"message": "Internal error"})
    };
    (status, Json(body))
}

async fn create_route(State(mock): State<MockBackend>, Json(draft): Json<Value>) -> impl IntoResponse {
    let status = *mock.create_status.lock().unwrap();
    if !status.is_success() {
        return (status, Json(json!({"status": status.as_u16(), "message": "Invalid pickup points"})));
    }
    mock.created.lock().unwrap().push(draft.clone());
    let mut route = draft;
    route["id"] = json!("r-new");
    (
        status,
        Json(json!({"message": "Route created successfully", "route": route})),
    )
}

async fn list_routes() -> Json<Value> {
    Json(json!({
        "message": "ok",
        "routes": [saved_route("r-1")]
    }))
}

async fn route_by_id(Path(id): Path<String>) -> impl IntoResponse {
    if id == "r-1" {
        (StatusCode::OK, Json(json!({"message": "ok", "route": saved_route("r-1")})))
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"message": "Route not found"})))
    }
}

pub fn saved_route(id: &str) -> Value {
    json!({
        "id": id,
        "routeDate": "2025-12-04T08:30:00",
        "totalDistance": 3100.0,
        "totalTime": 420000,
        "encodedPolyline": TWO_POINTS,
        "pickUpPointIds": ["pp-full"],
        "pickUpPoints": [
            {"id": "pp-full", "locationLatitude": 35.781, "locationLongitude": 10.829, "locationName": "Rue de la Plage"}
        ],
        "status": "completed"
    })
}

pub fn container(id: &str, fill: f64, status: &str) -> Value {
    json!({
        "containerId": id,
        "containerType": "plastic",
        "fillLevel": fill,
        "capacity": 100.0,
        "containerStatus": status
    })
}

pub fn point(id: &str, lat: f64, lng: f64, containers: Vec<Value>) -> Value {
    json!({
        "_id": id,
        "locationLatitude": lat,
        "locationLongitude": lng,
        "locationName": format!("Point {id}"),
        "containers": containers
    })
}

/// One full point, one broken point, one normal point.
pub fn mixed_points() -> Value {
    json!([
        point("pp-full", 35.781, 10.829, vec![container("c1", 85.0, "functional")]),
        point("pp-broken", 35.772, 10.821, vec![container("c2", 5.0, "non_functional")]),
        point("pp-ok", 35.775, 10.835, vec![container("c3", 20.0, "functional")]),
    ])
}
