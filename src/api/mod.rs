pub mod error;
pub mod legend;
pub mod lines;
pub mod stations;
pub mod train_stops;
pub mod trains;

pub use error::{ApiError, ErrorResponse};

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
}

pub fn router(pool: SqlitePool) -> Router {
    Router::new()
        .route("/", any(dispatch))
        .with_state(AppState { pool })
}

/// Query parameters recognized across the whole surface. The frontend sends
/// everything as strings, so ids are parsed here rather than by serde.
#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    /// Resource selector; empty when absent.
    #[serde(default)]
    pub path: String,
    pub schedule_id: Option<String>,
    pub train_id: Option<String>,
    pub id: Option<String>,
}

/// The five resource kinds reachable through the `path` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Lines,
    Stations,
    Trains,
    TrainStops,
    Legend,
}

impl Resource {
    fn from_path(path: &str) -> Option<Self> {
        match path {
            "lines" => Some(Self::Lines),
            "stations" => Some(Self::Stations),
            "trains" => Some(Self::Trains),
            "train_stops" => Some(Self::TrainStops),
            "legend" => Some(Self::Legend),
            _ => None,
        }
    }
}

/// Methods the surface supports. Anything else is 405 before routing.
#[derive(Debug, Clone, Copy)]
enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    fn from_method(method: &Method) -> Option<Self> {
        if *method == Method::GET {
            Some(Self::Get)
        } else if *method == Method::POST {
            Some(Self::Post)
        } else if *method == Method::PUT {
            Some(Self::Put)
        } else if *method == Method::DELETE {
            Some(Self::Delete)
        } else {
            None
        }
    }
}

/// Status plus the JSON payload a handler produced; the envelope is stamped
/// on in exactly one place.
pub(crate) type Reply = (StatusCode, serde_json::Value);

/// Single entry point for the whole API: the resource is carried in the
/// `path` query parameter, mirroring the function-URL contract the frontend
/// was written against.
#[utoipa::path(
    method(get, post, put, delete),
    path = "/",
    params(
        ("path" = String, Query, description = "Resource kind: lines | stations | trains | train_stops | legend"),
        ("schedule_id" = Option<String>, Query, description = "Schedule filter for trains and legend, default 1"),
        ("train_id" = Option<String>, Query, description = "Optional train filter for train_stops"),
        ("id" = Option<String>, Query, description = "Target row id for DELETE"),
    ),
    responses(
        (status = 200, description = "List, update, or delete result"),
        (status = 201, description = "Created row"),
        (status = 400, description = "Validation failure or malformed body", body = ErrorResponse),
        (status = 404, description = "Unknown resource or no matching row", body = ErrorResponse),
        (status = 405, description = "Unsupported method", body = ErrorResponse),
        (status = 409, description = "Relational constraint violation", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    ),
    tag = "graph"
)]
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    Query(params): Query<QueryParams>,
    body: String,
) -> Response {
    if method == Method::OPTIONS {
        return preflight();
    }

    let Some(verb) = Verb::from_method(&method) else {
        return ApiError::MethodNotAllowed.into_response();
    };
    let Some(resource) = Resource::from_path(&params.path) else {
        return ApiError::UnknownRoute.into_response();
    };

    match route(&state.pool, verb, resource, &params, &body).await {
        Ok((status, payload)) => respond(status, &payload),
        Err(err) => err.into_response(),
    }
}

/// The route table. Total over (verb, resource); pairs the surface does not
/// expose (legend create/delete) fall through to 404 without a storage call.
async fn route(
    pool: &SqlitePool,
    verb: Verb,
    resource: Resource,
    params: &QueryParams,
    body: &str,
) -> Result<Reply, ApiError> {
    match (verb, resource) {
        (Verb::Get, Resource::Lines) => lines::list(pool).await,
        (Verb::Get, Resource::Stations) => stations::list(pool).await,
        (Verb::Get, Resource::Trains) => trains::list(pool, params).await,
        (Verb::Get, Resource::TrainStops) => train_stops::list(pool, params).await,
        (Verb::Get, Resource::Legend) => legend::list(pool, params).await,

        (Verb::Post, Resource::Lines) => lines::create(pool, body).await,
        (Verb::Post, Resource::Stations) => stations::create(pool, body).await,
        (Verb::Post, Resource::Trains) => trains::create(pool, body).await,
        (Verb::Post, Resource::TrainStops) => train_stops::create(pool, body).await,
        (Verb::Post, Resource::Legend) => Err(ApiError::UnknownRoute),

        (Verb::Put, Resource::Lines) => lines::update(pool, body).await,
        (Verb::Put, Resource::Stations) => stations::update(pool, body).await,
        (Verb::Put, Resource::Trains) => trains::update(pool, body).await,
        (Verb::Put, Resource::TrainStops) => train_stops::update(pool, body).await,
        (Verb::Put, Resource::Legend) => legend::update(pool, body).await,

        (Verb::Delete, Resource::Lines) => lines::delete(pool, params).await,
        (Verb::Delete, Resource::Stations) => stations::delete(pool, params).await,
        (Verb::Delete, Resource::Trains) => trains::delete(pool, params).await,
        (Verb::Delete, Resource::TrainStops) => train_stops::delete(pool, params).await,
        (Verb::Delete, Resource::Legend) => Err(ApiError::UnknownRoute),
    }
}

/// OPTIONS short-circuits with the fixed preflight header set and never
/// touches storage.
fn preflight() -> Response {
    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
    response
}

/// The one place responses are built: JSON body plus the open CORS header.
pub(crate) fn respond<T: Serialize>(status: StatusCode, payload: &T) -> Response {
    let mut response = (status, Json(payload)).into_response();
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

pub(crate) fn reply<T: Serialize>(status: StatusCode, payload: &T) -> Result<Reply, ApiError> {
    Ok((status, serde_json::to_value(payload)?))
}

/// Decode a JSON request body into the expected payload shape.
pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::BadJson(e.to_string()))
}

/// Updates are keyed by an `id` field the client must supply.
pub(crate) fn require_body_id(id: Option<i64>) -> Result<i64, ApiError> {
    let id = id.ok_or_else(|| ApiError::Validation("ID is required".to_string()))?;
    crate::validate::positive_id(id, "id")?;
    Ok(id)
}

/// Deletes are keyed by an `id` query parameter.
pub(crate) fn require_query_id(params: &QueryParams) -> Result<i64, ApiError> {
    let raw = params
        .id
        .as_deref()
        .ok_or_else(|| ApiError::Validation("ID is required".to_string()))?;
    let id = parse_int_param(raw, "id")?;
    crate::validate::positive_id(id, "id")?;
    Ok(id)
}

/// `schedule_id` arrives as a string and defaults to the first schedule.
pub(crate) fn schedule_id_param(params: &QueryParams) -> Result<i64, ApiError> {
    match params.schedule_id.as_deref() {
        None => Ok(1),
        Some(raw) => parse_int_param(raw, "schedule_id"),
    }
}

pub(crate) fn train_id_param(params: &QueryParams) -> Result<Option<i64>, ApiError> {
    params
        .train_id
        .as_deref()
        .map(|raw| parse_int_param(raw, "train_id"))
        .transpose()
}

fn parse_int_param(raw: &str, field: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("{field} must be an integer")))
}

#[cfg(test)]
pub(crate) mod testutil {
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    /// Fresh in-memory database with the migration set applied. A single
    /// connection, otherwise each pooled connection would see its own
    /// empty memory store.
    pub async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        pool
    }

    /// Query params carrying only an `id`, as a DELETE request would.
    pub fn id_params(id: i64) -> super::QueryParams {
        super::QueryParams {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    /// Seed one line and return its id.
    pub async fn seed_line(pool: &SqlitePool, name: &str) -> i64 {
        let body = serde_json::json!({ "name": name }).to_string();
        let (_, row) = super::lines::create(pool, &body).await.expect("seed line");
        row["id"].as_i64().unwrap()
    }

    /// Seed one station and return its id.
    pub async fn seed_station(pool: &SqlitePool, name: &str, position: i64) -> i64 {
        let body = serde_json::json!({
            "name": name,
            "position": position,
            "distance_km": position as f64 * 10.0,
        })
        .to_string();
        let (_, row) = super::stations::create(pool, &body)
            .await
            .expect("seed station");
        row["id"].as_i64().unwrap()
    }

    /// Seed one train between two stations and return its id.
    pub async fn seed_train(
        pool: &SqlitePool,
        schedule_id: i64,
        number: &str,
        from: i64,
        to: i64,
    ) -> i64 {
        let body = serde_json::json!({
            "schedule_id": schedule_id,
            "number": number,
            "type": "passenger",
            "departure_station_id": from,
            "arrival_station_id": to,
            "departure_time": 480,
            "arrival_time": 540,
            "color": "#0EA5E9",
        })
        .to_string();
        let (_, row) = super::trains::create(pool, &body).await.expect("seed train");
        row["id"].as_i64().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn send(
        pool: sqlx::SqlitePool,
        method: &str,
        uri: &str,
        body: &str,
    ) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let app = router(pool);
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, value)
    }

    #[tokio::test]
    async fn options_returns_preflight_headers_and_empty_body() {
        let pool = testutil::pool().await;
        let app = router(pool);
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/?path=lines")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(
            headers["access-control-allow-methods"],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");
        assert_eq!(headers["access-control-max-age"], "86400");

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn unknown_path_is_404_for_every_supported_method() {
        for method in ["GET", "POST", "PUT", "DELETE"] {
            let pool = testutil::pool().await;
            let (status, _, body) = send(pool, method, "/?path=signals", "{}").await;
            assert_eq!(status, StatusCode::NOT_FOUND, "method {method}");
            assert_eq!(body["error"], "Not found");
        }
    }

    #[tokio::test]
    async fn missing_path_parameter_is_404() {
        let pool = testutil::pool().await;
        let (status, _, body) = send(pool, "GET", "/", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }

    #[tokio::test]
    async fn unsupported_method_is_405() {
        let pool = testutil::pool().await;
        let (status, _, body) = send(pool, "PATCH", "/?path=lines", "{}").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn every_response_carries_the_open_cors_header() {
        let pool = testutil::pool().await;
        let (_, headers, _) = send(pool.clone(), "GET", "/?path=lines", "").await;
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert!(headers["content-type"]
            .to_str()
            .unwrap()
            .starts_with("application/json"));

        // Errors share the same envelope.
        let (_, headers, _) = send(pool, "GET", "/?path=nope", "").await;
        assert_eq!(headers["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn create_round_trip_over_the_router() {
        let pool = testutil::pool().await;
        let (status, _, body) = send(
            pool.clone(),
            "POST",
            "/?path=lines",
            r##"{"name":"Main line","color":"#112233"}"##,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Main line");

        let (status, _, body) = send(pool, "GET", "/?path=lines", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_json_body_is_400() {
        let pool = testutil::pool().await;
        let (status, _, body) = send(pool, "POST", "/?path=lines", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn delete_without_id_is_400() {
        let pool = testutil::pool().await;
        let (status, _, body) = send(pool, "DELETE", "/?path=lines", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ID is required");
    }

    #[tokio::test]
    async fn garbage_query_id_is_400() {
        let pool = testutil::pool().await;
        let (status, _, body) = send(pool, "DELETE", "/?path=trains&id=abc", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "id must be an integer");
    }
}
