use axum::http::StatusCode;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;

use super::error::ApiError;
use super::{parse_body, reply, require_body_id, require_query_id, QueryParams, Reply};
use crate::validate;

/// A point along a line with a display position and distance marker.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Station {
    pub id: i64,
    pub name: String,
    pub position: i64,
    pub distance_km: f64,
    pub line_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

/// Station list view, left-joined with its line for display.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StationWithLine {
    pub id: i64,
    pub name: String,
    pub position: i64,
    pub distance_km: f64,
    pub line_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub line_name: Option<String>,
    pub line_color: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStation {
    pub name: String,
    pub position: Option<i64>,
    pub distance_km: Option<f64>,
    pub line_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStation {
    pub id: Option<i64>,
    pub name: String,
    pub position: i64,
    pub distance_km: f64,
    pub line_id: Option<i64>,
}

pub async fn list(pool: &SqlitePool) -> Result<Reply, ApiError> {
    let rows: Vec<StationWithLine> = sqlx::query_as(
        "SELECT s.id, s.name, s.position, s.distance_km, s.line_id, s.created_at, \
                l.name AS line_name, l.color AS line_color \
         FROM stations s \
         LEFT JOIN lines l ON s.line_id = l.id \
         ORDER BY s.position",
    )
    .fetch_all(pool)
    .await?;
    reply(StatusCode::OK, &rows)
}

pub async fn create(pool: &SqlitePool, body: &str) -> Result<Reply, ApiError> {
    let payload: CreateStation = parse_body(body)?;
    validate::require_text(&payload.name, "name", 100)?;
    let position = payload.position.unwrap_or(0);
    validate::non_negative_int(position, "position")?;
    let distance_km = payload.distance_km.unwrap_or(0.0);
    validate::non_negative(distance_km, "distance_km")?;
    if let Some(line_id) = payload.line_id {
        validate::positive_id(line_id, "line_id")?;
    }

    let row: Station = sqlx::query_as(
        "INSERT INTO stations (name, position, distance_km, line_id) \
         VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(&payload.name)
    .bind(position)
    .bind(distance_km)
    .bind(payload.line_id)
    .fetch_one(pool)
    .await?;
    reply(StatusCode::CREATED, &row)
}

pub async fn update(pool: &SqlitePool, body: &str) -> Result<Reply, ApiError> {
    let payload: UpdateStation = parse_body(body)?;
    let id = require_body_id(payload.id)?;
    validate::require_text(&payload.name, "name", 100)?;
    validate::non_negative_int(payload.position, "position")?;
    validate::non_negative(payload.distance_km, "distance_km")?;
    if let Some(line_id) = payload.line_id {
        validate::positive_id(line_id, "line_id")?;
    }

    let row: Option<Station> = sqlx::query_as(
        "UPDATE stations SET name = ?, position = ?, distance_km = ?, line_id = ? \
         WHERE id = ? RETURNING *",
    )
    .bind(&payload.name)
    .bind(payload.position)
    .bind(payload.distance_km)
    .bind(payload.line_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => reply(StatusCode::OK, &row),
        None => Err(ApiError::NotFound("Station")),
    }
}

/// A station drags its schedule entries with it: stops made here, stops of
/// trains that start or end here, those trains, then the station. One
/// transaction, so an interruption cannot leave orphaned rows.
pub async fn delete(pool: &SqlitePool, params: &QueryParams) -> Result<Reply, ApiError> {
    let id = require_query_id(params)?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM train_stops WHERE station_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "DELETE FROM train_stops WHERE train_id IN \
         (SELECT id FROM trains WHERE departure_station_id = ? OR arrival_station_id = ?)",
    )
    .bind(id)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM trains WHERE departure_station_id = ? OR arrival_station_id = ?")
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let deleted: Option<i64> = sqlx::query_scalar("DELETE FROM stations WHERE id = ? RETURNING id")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(deleted) = deleted else {
        return Err(ApiError::NotFound("Station"));
    };
    tx.commit().await?;
    reply(
        StatusCode::OK,
        &serde_json::json!({ "success": true, "id": deleted }),
    )
}
