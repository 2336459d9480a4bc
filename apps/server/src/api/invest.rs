use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    invest_command::{parse_investment_command, validate_purchase, InvestmentCommand, PurchaseResult},
    main_lib::AppState,
};
use axum::{extract::rejection::JsonRejection, routing::post, Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParseInvestmentBody {
    message: String,
    #[schema(value_type = f64)]
    cash_balance: Decimal,
}

#[derive(Serialize)]
pub struct ParseInvestmentResponse {
    command: Option<InvestmentCommand>,
    purchase: Option<PurchaseResult>,
}

#[utoipa::path(
    post,
    path = "/api/invest/parse",
    request_body = ParseInvestmentBody,
    responses((status = 200, description = "Recognized command and funds check, both null when none"), (status = 400, description = "Invalid body"))
)]
pub async fn parse_investment(
    payload: Result<Json<ParseInvestmentBody>, JsonRejection>,
) -> ApiResult<Json<ParseInvestmentResponse>> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message required".to_string()));
    }

    let command = parse_investment_command(&body.message);
    let purchase = command.as_ref().map(|command| {
        let result = validate_purchase(command, body.cash_balance, chrono::Utc::now().date_naive());
        tracing::info!(
            "Investment command detected: {} x{} (approved: {})",
            command.symbol,
            command.shares,
            result.success
        );
        result
    });

    Ok(Json(ParseInvestmentResponse { command, purchase }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/invest/parse", post(parse_investment))
}
