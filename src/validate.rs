//! Field-level validation for create and update payloads.
//!
//! Every helper names the offending field in its message; the caller turns
//! the error into a 400 response without touching storage.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::ApiError;

/// Train classes drawn on the graph. Also keys the legend entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TrainType {
    Freight,
    Passenger,
    Service,
}

/// Non-empty text no longer than `max_len` characters.
pub fn require_text(value: &str, field: &str, max_len: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(ApiError::Validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}

/// `#` followed by exactly six hex digits.
pub fn hex_color(value: &str, field: &str) -> Result<(), ApiError> {
    let mut chars = value.chars();
    let well_formed = chars.next() == Some('#')
        && value.len() == 7
        && chars.all(|c| c.is_ascii_hexdigit());
    if well_formed {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "{field} must be a hex color like #0EA5E9"
        )))
    }
}

/// Minutes since midnight; 1440 itself is allowed so a day-spanning train
/// can end exactly at the right edge of the graph.
pub fn minutes_of_day(value: i64, field: &str) -> Result<(), ApiError> {
    if (0..=1440).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "{field} must be between 0 and 1440"
        )))
    }
}

pub fn positive_id(value: i64, field: &str) -> Result<(), ApiError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "{field} must be a positive integer"
        )))
    }
}

pub fn non_negative_int(value: i64, field: &str) -> Result<(), ApiError> {
    if value >= 0 {
        Ok(())
    } else {
        Err(ApiError::Validation(format!("{field} must not be negative")))
    }
}

pub fn non_negative(value: f64, field: &str) -> Result<(), ApiError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ApiError::Validation(format!("{field} must not be negative")))
    }
}

/// Stroke width of a train path on the graph.
pub fn line_width(value: f64, field: &str) -> Result<(), ApiError> {
    if (0.5..=10.0).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "{field} must be between 0.5 and 10"
        )))
    }
}
