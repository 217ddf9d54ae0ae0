use axum::http::StatusCode;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use utoipa::ToSchema;

use super::error::ApiError;
use super::{parse_body, reply, require_body_id, require_query_id, QueryParams, Reply};
use crate::validate;

/// Color assigned to a line when the client does not pick one.
pub const DEFAULT_COLOR: &str = "#0EA5E9";

/// A named, colored rail route grouping stations.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Line {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLine {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLine {
    pub id: Option<i64>,
    pub name: String,
    pub color: String,
}

pub async fn list(pool: &SqlitePool) -> Result<Reply, ApiError> {
    let rows: Vec<Line> = sqlx::query_as("SELECT * FROM lines ORDER BY id")
        .fetch_all(pool)
        .await?;
    reply(StatusCode::OK, &rows)
}

pub async fn create(pool: &SqlitePool, body: &str) -> Result<Reply, ApiError> {
    let payload: CreateLine = parse_body(body)?;
    validate::require_text(&payload.name, "name", 100)?;
    let color = payload.color.unwrap_or_else(|| DEFAULT_COLOR.to_string());
    validate::hex_color(&color, "color")?;

    let row: Line = sqlx::query_as("INSERT INTO lines (name, color) VALUES (?, ?) RETURNING *")
        .bind(&payload.name)
        .bind(&color)
        .fetch_one(pool)
        .await?;
    reply(StatusCode::CREATED, &row)
}

pub async fn update(pool: &SqlitePool, body: &str) -> Result<Reply, ApiError> {
    let payload: UpdateLine = parse_body(body)?;
    let id = require_body_id(payload.id)?;
    validate::require_text(&payload.name, "name", 100)?;
    validate::hex_color(&payload.color, "color")?;

    let row: Option<Line> =
        sqlx::query_as("UPDATE lines SET name = ?, color = ? WHERE id = ? RETURNING *")
            .bind(&payload.name)
            .bind(&payload.color)
            .bind(id)
            .fetch_optional(pool)
            .await?;
    match row {
        Some(row) => reply(StatusCode::OK, &row),
        None => Err(ApiError::NotFound("Line")),
    }
}

pub async fn delete(pool: &SqlitePool, params: &QueryParams) -> Result<Reply, ApiError> {
    let id = require_query_id(params)?;
    let deleted: Option<i64> = sqlx::query_scalar("DELETE FROM lines WHERE id = ? RETURNING id")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match deleted {
        Some(id) => reply(StatusCode::OK, &serde_json::json!({ "success": true, "id": id })),
        None => Err(ApiError::NotFound("Line")),
    }
}
