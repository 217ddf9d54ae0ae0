use axum::http::StatusCode;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;

use super::error::ApiError;
use super::{
    parse_body, reply, require_body_id, require_query_id, train_id_param, QueryParams, Reply,
};
use crate::validate;

/// An intermediate call of a train at a station. One row per
/// (train, station); writing the pair again replaces the times.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TrainStop {
    pub id: i64,
    pub train_id: i64,
    pub station_id: i64,
    pub arrival_time: i64,
    pub departure_time: i64,
    /// Minutes the train waits at the station.
    pub stop_duration: i64,
    pub created_at: NaiveDateTime,
}

/// Stop list view joined with the station for display on the graph.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TrainStopWithStation {
    pub id: i64,
    pub train_id: i64,
    pub station_id: i64,
    pub arrival_time: i64,
    pub departure_time: i64,
    pub stop_duration: i64,
    pub created_at: NaiveDateTime,
    pub station_name: String,
    pub distance_km: f64,
    pub position: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTrainStop {
    pub train_id: i64,
    pub station_id: i64,
    pub arrival_time: i64,
    pub departure_time: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTrainStop {
    pub id: Option<i64>,
    pub arrival_time: i64,
    pub departure_time: i64,
}

const STOP_COLUMNS: &str = "id, train_id, station_id, arrival_time, departure_time, \
                            departure_time - arrival_time AS stop_duration, created_at";

pub async fn list(pool: &SqlitePool, params: &QueryParams) -> Result<Reply, ApiError> {
    let select = "SELECT ts.id, ts.train_id, ts.station_id, ts.arrival_time, \
                  ts.departure_time, ts.departure_time - ts.arrival_time AS stop_duration, \
                  ts.created_at, s.name AS station_name, s.distance_km, s.position \
                  FROM train_stops ts JOIN stations s ON ts.station_id = s.id";

    let rows: Vec<TrainStopWithStation> = match train_id_param(params)? {
        Some(train_id) => {
            sqlx::query_as(&format!(
                "{select} WHERE ts.train_id = ? ORDER BY ts.arrival_time"
            ))
            .bind(train_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(&format!("{select} ORDER BY ts.train_id, ts.arrival_time"))
                .fetch_all(pool)
                .await?
        }
    };
    reply(StatusCode::OK, &rows)
}

/// Upsert: a second write for the same (train, station) pair overwrites the
/// times instead of adding a duplicate row.
pub async fn create(pool: &SqlitePool, body: &str) -> Result<Reply, ApiError> {
    let payload: CreateTrainStop = parse_body(body)?;
    validate::positive_id(payload.train_id, "train_id")?;
    validate::positive_id(payload.station_id, "station_id")?;

    let row: TrainStop = sqlx::query_as(&format!(
        "INSERT INTO train_stops (train_id, station_id, arrival_time, departure_time) \
         VALUES (?, ?, ?, ?) \
         ON CONFLICT (train_id, station_id) DO UPDATE SET \
         arrival_time = excluded.arrival_time, departure_time = excluded.departure_time \
         RETURNING {STOP_COLUMNS}"
    ))
    .bind(payload.train_id)
    .bind(payload.station_id)
    .bind(payload.arrival_time)
    .bind(payload.departure_time)
    .fetch_one(pool)
    .await?;
    reply(StatusCode::CREATED, &row)
}

pub async fn update(pool: &SqlitePool, body: &str) -> Result<Reply, ApiError> {
    let payload: UpdateTrainStop = parse_body(body)?;
    let id = require_body_id(payload.id)?;

    let row: Option<TrainStop> = sqlx::query_as(&format!(
        "UPDATE train_stops SET arrival_time = ?, departure_time = ? \
         WHERE id = ? RETURNING {STOP_COLUMNS}"
    ))
    .bind(payload.arrival_time)
    .bind(payload.departure_time)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => reply(StatusCode::OK, &row),
        None => Err(ApiError::NotFound("Train stop")),
    }
}

pub async fn delete(pool: &SqlitePool, params: &QueryParams) -> Result<Reply, ApiError> {
    let id = require_query_id(params)?;
    let deleted: Option<i64> =
        sqlx::query_scalar("DELETE FROM train_stops WHERE id = ? RETURNING id")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    match deleted {
        Some(id) => reply(StatusCode::OK, &serde_json::json!({ "success": true, "id": id })),
        None => Err(ApiError::NotFound("Train stop")),
    }
}
