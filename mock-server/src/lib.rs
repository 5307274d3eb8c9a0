//! A stand-in for `graph.facebook.com` covering the places endpoints.
//!
//! Requests must carry `Authorization: OAuth <token>` with the token the app
//! was built with; anything else gets a 401 and the Graph invalid-token error
//! body. Checkins and places are seeded from `test-vectors/`; checkins posted
//! to `/me/feed` are kept in memory for the lifetime of the app.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info, warn};

const SEED_CHECKINS: &str = include_str!("../../test-vectors/checkins.json");
const SEED_PLACES: &str = include_str!("../../test-vectors/places-list.json");

/// The user that `me` resolves to.
pub const ME_ID: &str = "738140579";
pub const ME_NAME: &str = "Craig Walls";

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug)]
struct Store {
    /// Checkins in creation order, newest first.
    checkins: Vec<Value>,
    places: Vec<Value>,
    next_id: u64,
}

impl Store {
    fn seeded() -> Self {
        Self {
            checkins: data(SEED_CHECKINS),
            places: data(SEED_PLACES),
            next_id: 10_150_500_000_000_000,
        }
    }

    fn place(&self, id: &str) -> Option<&Value> {
        self.places.iter().find(|p| p["id"] == id)
    }
}

fn data(raw: &str) -> Vec<Value> {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| v.get("data").and_then(Value::as_array).cloned())
        .unwrap_or_default()
}

#[derive(Clone)]
struct AppState {
    token: Arc<str>,
    store: Arc<RwLock<Store>>,
}

pub fn app(token: &str) -> Router {
    let state = AppState {
        token: Arc::from(token),
        store: Arc::new(RwLock::new(Store::seeded())),
    };
    Router::new()
        .route("/search", get(search))
        .route("/{id}/feed", post(create_checkin))
        .route("/{id}", get(get_object))
        .route("/{id}/posts", get(list_checkins))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

/// A Graph API error response.
fn graph_error(status: StatusCode, kind: &str, code: u32, message: &str) -> Response {
    let body = json!({ "error": { "message": message, "type": kind, "code": code } });
    (status, Json(body)).into_response()
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = format!("OAuth {}", state.token);
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        warn!(uri = %request.uri(), "rejecting request without a valid access token");
        return graph_error(
            StatusCode::UNAUTHORIZED,
            "OAuthException",
            190,
            "Invalid OAuth access token.",
        );
    }
    next.run(request).await
}

#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub with: Option<String>,
}

fn default_limit() -> usize {
    25
}

async fn list_checkins(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PostsQuery>,
) -> Response {
    let user = if id == "me" { ME_ID.to_string() } else { id };
    let store = state.store.read().await;
    let page: Vec<Value> = store
        .checkins
        .iter()
        .filter(|c| c["from"]["id"] == user.as_str() || is_tagged(c, &user))
        .filter(|c| query.with.as_deref() != Some("location") || c.get("place").is_some())
        .skip(query.offset)
        .take(query.limit)
        .cloned()
        .collect();
    debug!(%user, offset = query.offset, limit = query.limit, count = page.len(), "listing checkins");
    Json(json!({ "data": page })).into_response()
}

fn is_tagged(checkin: &Value, user: &str) -> bool {
    match &checkin["tags"] {
        Value::Object(map) => map
            .values()
            .flat_map(|v| match v {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .any(|t| t["id"] == user),
        _ => false,
    }
}

async fn get_object(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let store = state.store.read().await;
    let found = store
        .checkins
        .iter()
        .find(|c| c["id"] == id.as_str())
        .or_else(|| store.place(&id));
    match found {
        Some(object) => Json(object.clone()).into_response(),
        None => graph_error(
            StatusCode::NOT_FOUND,
            "GraphMethodException",
            100,
            "Unsupported get request.",
        ),
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckinForm {
    pub place: Option<String>,
    pub coordinates: Option<String>,
    pub message: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoordinatesForm {
    latitude: String,
    longitude: String,
}

async fn create_checkin(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Form(form): Form<CheckinForm>,
) -> Response {
    if user != "me" && user != ME_ID {
        return graph_error(
            StatusCode::FORBIDDEN,
            "OAuthException",
            200,
            "(#200) The user hasn't authorized the application to perform this action",
        );
    }
    let Some(place_id) = form.place.filter(|p| !p.is_empty()) else {
        return graph_error(StatusCode::BAD_REQUEST, "OAuthException", 100, "(#100) A place is required");
    };
    let coordinates = form
        .coordinates
        .as_deref()
        .and_then(|c| serde_json::from_str::<CoordinatesForm>(c).ok())
        .and_then(|c| Some((c.latitude.parse::<f64>().ok()?, c.longitude.parse::<f64>().ok()?)));
    let Some((latitude, longitude)) = coordinates else {
        return graph_error(
            StatusCode::BAD_REQUEST,
            "OAuthException",
            160,
            "(#160) Invalid coordinates",
        );
    };

    let mut store = state.store.write().await;
    let Some(place) = store.place(&place_id).cloned() else {
        return graph_error(StatusCode::BAD_REQUEST, "OAuthException", 100, "(#100) Invalid place id");
    };

    let id = store.next_id.to_string();
    store.next_id += 1;
    let mut checkin = json!({
        "id": id,
        "from": { "id": ME_ID, "name": ME_NAME },
        "place": place,
        "coordinates": { "latitude": latitude, "longitude": longitude },
        "type": "checkin",
    });
    if let Some(message) = form.message {
        checkin["message"] = Value::String(message);
    }
    if let Some(tags) = form.tags.filter(|t| !t.is_empty()) {
        let data: Vec<Value> = tags.split(',').map(|t| json!({ "id": t })).collect();
        checkin["tags"] = json!({ "data": data });
    }
    store.checkins.insert(0, checkin);
    info!(%id, %place_id, "created checkin");
    Json(json!({ "id": id })).into_response()
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub center: Option<String>,
    pub distance: Option<f64>,
}

async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Response {
    if query.kind.as_deref() != Some("place") {
        return graph_error(
            StatusCode::BAD_REQUEST,
            "OAuthException",
            100,
            "(#100) Unsupported search type",
        );
    }
    let center = match query.center.as_deref().map(parse_center) {
        Some(Some(center)) => Some(center),
        Some(None) => {
            return graph_error(StatusCode::BAD_REQUEST, "OAuthException", 100, "(#100) Invalid center")
        }
        None => None,
    };
    let needle = query.q.unwrap_or_default().to_lowercase();

    let store = state.store.read().await;
    let data: Vec<&Value> = store
        .places
        .iter()
        .filter(|p| {
            needle
                .split_whitespace()
                .all(|word| p["name"].as_str().is_some_and(|n| n.to_lowercase().contains(word)))
        })
        .filter(|p| match (center, query.distance) {
            (Some(center), Some(distance)) => within(p, center, distance),
            _ => true,
        })
        .collect();
    Json(json!({ "data": data })).into_response()
}

fn parse_center(center: &str) -> Option<(f64, f64)> {
    let (lat, lon) = center.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

fn within(place: &Value, center: (f64, f64), distance: f64) -> bool {
    let location = &place["location"];
    match (location["latitude"].as_f64(), location["longitude"].as_f64()) {
        (Some(lat), Some(lon)) => haversine_meters(center, (lat, lon)) <= distance,
        _ => false,
    }
}

/// Great-circle distance between two `(latitude, longitude)` points.
pub fn haversine_meters(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lat2) = (a.0.to_radians(), b.0.to_radians());
    let dlat = (b.0 - a.0).to_radians();
    let dlon = (b.1 - a.1).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_data_loads() {
        let store = Store::seeded();
        assert_eq!(store.checkins.len(), 2);
        assert_eq!(store.places.len(), 2);
        assert!(store.place("117723491586638").is_some());
    }

    #[test]
    fn haversine_of_same_point_is_zero() {
        assert!(haversine_meters((33.0, -96.7), (33.0, -96.7)).abs() < 1e-6);
    }

    #[test]
    fn haversine_matches_known_distance() {
        // One degree of latitude is about 111.2 km.
        let d = haversine_meters((0.0, 0.0), (1.0, 0.0));
        assert!((d - 111_195.0).abs() < 100.0, "{d}");
    }

    #[test]
    fn parse_center_requires_two_numbers() {
        assert_eq!(parse_center("33.05,-96.74"), Some((33.05, -96.74)));
        assert_eq!(parse_center("33.05"), None);
        assert_eq!(parse_center("north,south"), None);
    }

    #[test]
    fn tagged_user_matches_connection_and_keyed_tags() {
        let keyed = json!({ "tags": { "0": { "id": "1" } } });
        let connection = json!({ "tags": { "data": [{ "id": "2" }] } });
        assert!(is_tagged(&keyed, "1"));
        assert!(is_tagged(&connection, "2"));
        assert!(!is_tagged(&connection, "1"));
    }
}
