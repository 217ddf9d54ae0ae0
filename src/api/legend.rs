use axum::http::StatusCode;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;

use super::error::ApiError;
use super::{parse_body, reply, require_body_id, schedule_id_param, QueryParams, Reply};
use crate::validate::{self, TrainType};

/// A styling entry shown alongside the graph, one per train class. Legend
/// rows are seeded with their schedule and only ever edited in place.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LegendItem {
    pub id: i64,
    pub schedule_id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub item_type: TrainType,
    pub label: String,
    pub color: String,
    pub dashed: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLegendItem {
    pub id: Option<i64>,
    pub label: String,
    pub color: String,
    pub dashed: bool,
}

pub async fn list(pool: &SqlitePool, params: &QueryParams) -> Result<Reply, ApiError> {
    let schedule_id = schedule_id_param(params)?;
    let rows: Vec<LegendItem> =
        sqlx::query_as("SELECT * FROM legend_items WHERE schedule_id = ? ORDER BY id")
            .bind(schedule_id)
            .fetch_all(pool)
            .await?;
    reply(StatusCode::OK, &rows)
}

pub async fn update(pool: &SqlitePool, body: &str) -> Result<Reply, ApiError> {
    let payload: UpdateLegendItem = parse_body(body)?;
    let id = require_body_id(payload.id)?;
    validate::require_text(&payload.label, "label", 100)?;
    validate::hex_color(&payload.color, "color")?;

    let row: Option<LegendItem> = sqlx::query_as(
        "UPDATE legend_items SET label = ?, color = ?, dashed = ? WHERE id = ? RETURNING *",
    )
    .bind(&payload.label)
    .bind(&payload.color)
    .bind(payload.dashed)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    match row {
        Some(row) => reply(StatusCode::OK, &row),
        None => Err(ApiError::NotFound("Legend item")),
    }
}
