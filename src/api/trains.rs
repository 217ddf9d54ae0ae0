use axum::http::StatusCode;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;

use super::error::ApiError;
use super::{
    parse_body, reply, require_body_id, require_query_id, schedule_id_param, QueryParams, Reply,
};
use crate::validate::{self, TrainType};

pub const DEFAULT_LINE_STYLE: &str = "solid";
pub const DEFAULT_LINE_WIDTH: f64 = 2.5;

/// A scheduled service between two stations, with its drawing style.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Train {
    pub id: i64,
    pub schedule_id: i64,
    pub number: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub train_type: TrainType,
    pub departure_station_id: i64,
    pub arrival_station_id: i64,
    /// Minutes since midnight.
    pub departure_time: i64,
    pub arrival_time: i64,
    pub color: String,
    pub line_style: String,
    pub line_width: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTrain {
    pub schedule_id: Option<i64>,
    pub number: String,
    #[serde(rename = "type")]
    pub train_type: TrainType,
    pub departure_station_id: i64,
    pub arrival_station_id: i64,
    pub departure_time: i64,
    pub arrival_time: i64,
    pub color: String,
    pub line_style: Option<String>,
    pub line_width: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTrain {
    pub id: Option<i64>,
    pub number: String,
    #[serde(rename = "type")]
    pub train_type: TrainType,
    pub departure_station_id: i64,
    pub arrival_station_id: i64,
    pub departure_time: i64,
    pub arrival_time: i64,
    pub color: String,
    pub line_style: Option<String>,
    pub line_width: Option<f64>,
}

fn check_common(
    number: &str,
    departure_station_id: i64,
    arrival_station_id: i64,
    departure_time: i64,
    arrival_time: i64,
    color: &str,
    line_width: f64,
) -> Result<(), ApiError> {
    validate::require_text(number, "number", 50)?;
    validate::positive_id(departure_station_id, "departure_station_id")?;
    validate::positive_id(arrival_station_id, "arrival_station_id")?;
    validate::minutes_of_day(departure_time, "departure_time")?;
    validate::minutes_of_day(arrival_time, "arrival_time")?;
    validate::hex_color(color, "color")?;
    validate::line_width(line_width, "line_width")?;
    Ok(())
}

pub async fn list(pool: &SqlitePool, params: &QueryParams) -> Result<Reply, ApiError> {
    let schedule_id = schedule_id_param(params)?;
    let rows: Vec<Train> = sqlx::query_as("SELECT * FROM trains WHERE schedule_id = ? ORDER BY id")
        .bind(schedule_id)
        .fetch_all(pool)
        .await?;
    reply(StatusCode::OK, &rows)
}

pub async fn create(pool: &SqlitePool, body: &str) -> Result<Reply, ApiError> {
    let payload: CreateTrain = parse_body(body)?;
    let schedule_id = payload.schedule_id.unwrap_or(1);
    validate::positive_id(schedule_id, "schedule_id")?;
    let line_style = payload
        .line_style
        .unwrap_or_else(|| DEFAULT_LINE_STYLE.to_string());
    let line_width = payload.line_width.unwrap_or(DEFAULT_LINE_WIDTH);
    check_common(
        &payload.number,
        payload.departure_station_id,
        payload.arrival_station_id,
        payload.departure_time,
        payload.arrival_time,
        &payload.color,
        line_width,
    )?;

    let row: Train = sqlx::query_as(
        "INSERT INTO trains (schedule_id, number, type, departure_station_id, \
         arrival_station_id, departure_time, arrival_time, color, line_style, line_width) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(schedule_id)
    .bind(&payload.number)
    .bind(payload.train_type)
    .bind(payload.departure_station_id)
    .bind(payload.arrival_station_id)
    .bind(payload.departure_time)
    .bind(payload.arrival_time)
    .bind(&payload.color)
    .bind(&line_style)
    .bind(line_width)
    .fetch_one(pool)
    .await?;
    reply(StatusCode::CREATED, &row)
}

pub async fn update(pool: &SqlitePool, body: &str) -> Result<Reply, ApiError> {
    let payload: UpdateTrain = parse_body(body)?;
    let id = require_body_id(payload.id)?;
    let line_style = payload
        .line_style
        .unwrap_or_else(|| DEFAULT_LINE_STYLE.to_string());
    let line_width = payload.line_width.unwrap_or(DEFAULT_LINE_WIDTH);
    check_common(
        &payload.number,
        payload.departure_station_id,
        payload.arrival_station_id,
        payload.departure_time,
        payload.arrival_time,
        &payload.color,
        line_width,
    )?;

    let row: Option<Train> = sqlx::query_as(
        "UPDATE trains SET number = ?, type = ?, departure_station_id = ?, \
         arrival_station_id = ?, departure_time = ?, arrival_time = ?, color = ?, \
         line_style = ?, line_width = ? WHERE id = ? RETURNING *",
    )
    .bind(&payload.number)
    .bind(payload.train_type)
    .bind(payload.departure_station_id)
    .bind(payload.arrival_station_id)
    .bind(payload.departure_time)
    .bind(payload.arrival_time)
    .bind(&payload.color)
    .bind(&line_style)
    .bind(line_width)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => reply(StatusCode::OK, &row),
        None => Err(ApiError::NotFound("Train")),
    }
}

/// A train takes its stops with it, in one transaction.
pub async fn delete(pool: &SqlitePool, params: &QueryParams) -> Result<Reply, ApiError> {
    let id = require_query_id(params)?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM train_stops WHERE train_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let deleted: Option<i64> = sqlx::query_scalar("DELETE FROM trains WHERE id = ? RETURNING id")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(deleted) = deleted else {
        return Err(ApiError::NotFound("Train"));
    };
    tx.commit().await?;
    reply(
        StatusCode::OK,
        &serde_json::json!({ "success": true, "id": deleted }),
    )
}
