use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::AppState;
use crate::error::AppError;
use crate::utils::validate_currency_code;

use super::model::{self, UpdateCacheResponse};

#[derive(Debug, Deserialize)]
pub struct UpdateCacheParams {
    pub base_currency: String,
    pub target_currency: String,
    pub rate: f64,
    pub ttl: Option<i64>,
}

/// PATCH /cache/update
#[axum::debug_handler]
pub async fn update_cache(
    State(state): State<AppState>,
    Query(params): Query<UpdateCacheParams>,
) -> Result<Json<UpdateCacheResponse>, AppError> {
    let base = validate_currency_code(&params.base_currency)?;
    let target = validate_currency_code(&params.target_currency)?;

    if !params.rate.is_finite() || params.rate < 0.0 {
        return Err(AppError::Validation(format!(
            "rate must be a non-negative number, got {}",
            params.rate
        )));
    }
    if let Some(ttl) = params.ttl {
        if ttl < 0 {
            return Err(AppError::Validation(format!(
                "ttl must not be negative, got {}",
                ttl
            )));
        }
    }

    let response =
        model::update_cache(state.store.as_ref(), base, target, params.rate, params.ttl).await?;

    Ok(Json(response))
}
