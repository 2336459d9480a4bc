use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use finverse_market_data::{CacheStats, Quote};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

const SYMBOLS_REQUIRED: &str = "symbols array required";

#[derive(Deserialize, ToSchema)]
pub struct SymbolsBody {
    symbols: Vec<String>,
}

/// Trim and uppercase a caller-supplied symbol.
fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        None
    } else {
        Some(symbol.to_uppercase())
    }
}

#[utoipa::path(
    get,
    path = "/api/stocks/{symbol}",
    params(("symbol" = String, Path, description = "Ticker symbol")),
    responses((status = 200, description = "Quote"), (status = 400, description = "Blank symbol"))
)]
pub async fn get_stock_price(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Quote>> {
    let symbol = normalize_symbol(&symbol)
        .ok_or_else(|| ApiError::BadRequest("Symbol parameter required".to_string()))?;
    Ok(Json(state.quote_gateway.get_quote(&symbol).await))
}

#[utoipa::path(
    post,
    path = "/api/stocks",
    request_body = SymbolsBody,
    responses((status = 200, description = "Quotes in request order"), (status = 400, description = "Missing or invalid symbols"))
)]
pub async fn get_stock_prices(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SymbolsBody>, JsonRejection>,
) -> ApiResult<Json<Vec<Quote>>> {
    let Json(body) = payload.map_err(|_| ApiError::BadRequest(SYMBOLS_REQUIRED.to_string()))?;
    if body.symbols.is_empty() {
        return Err(ApiError::BadRequest(SYMBOLS_REQUIRED.to_string()));
    }

    let symbols = body
        .symbols
        .iter()
        .map(|s| normalize_symbol(s))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| ApiError::BadRequest("symbols must not contain blank entries".to_string()))?;

    Ok(Json(state.quote_gateway.get_quotes(&symbols).await))
}

#[utoipa::path(get, path = "/api/stocks-cache/stats", responses((status = 200, description = "Cache size and symbols")))]
pub async fn get_cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(state.quote_gateway.cache_stats())
}

#[utoipa::path(post, path = "/api/stocks-cache/clear", responses((status = 200, description = "Acknowledgement")))]
pub async fn clear_stock_cache(State(state): State<Arc<AppState>>) -> Json<Value> {
    if !state.cache_clear_enabled {
        tracing::info!("Cache clear requested while disabled, ignoring");
        return Json(json!({ "message": "Cache clear endpoint (admin only)" }));
    }
    state.quote_gateway.clear_cache();
    Json(json!({ "message": "Stock price cache cleared" }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stocks", post(get_stock_prices))
        .route("/stocks/{symbol}", get(get_stock_price))
        .route("/stocks-cache/stats", get(get_cache_stats))
        .route("/stocks-cache/clear", post(clear_stock_cache))
}
