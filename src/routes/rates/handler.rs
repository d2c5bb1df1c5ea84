use axum::{
    Json,
    extract::{Path, State},
};

use crate::AppState;
use crate::error::AppError;
use crate::utils::{parse_target_list, validate_currency_code};

use super::model::{self, ExchangeRateResponse};

/// GET /exchange-rate/{base}/{targets}
///
/// `targets` may be a single code or a comma-joined list.
#[axum::debug_handler]
pub async fn get_exchange_rate(
    State(state): State<AppState>,
    Path((base, targets)): Path<(String, String)>,
) -> Result<Json<ExchangeRateResponse>, AppError> {
    let base = validate_currency_code(&base)?;
    let targets = parse_target_list(&targets)?;

    let response = model::get_exchange_rate(
        state.provider.as_ref(),
        state.store.as_ref(),
        state.config.default_ttl_secs,
        base,
        targets,
    )
    .await?;

    Ok(Json(response))
}
