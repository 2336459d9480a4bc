use std::sync::Arc;

use crate::{config::Config, error::ApiError, main_lib::AppState};
use axum::{routing::get, Json, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

mod invest;
mod stocks;

#[utoipa::path(get, path = "/api/healthz", responses((status = 200, description = "Health")))]
pub async fn healthz() -> &'static str {
    "ok"
}

#[utoipa::path(get, path = "/api/readyz", responses((status = 200, description = "Ready")))]
pub async fn readyz() -> &'static str {
    "ok"
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound
}

#[derive(OpenApi)]
#[openapi(
    paths(
        healthz,
        readyz,
        stocks::get_stock_price,
        stocks::get_stock_prices,
        stocks::get_cache_stats,
        stocks::clear_stock_cache,
        invest::parse_investment
    ),
    components(schemas(stocks::SymbolsBody, invest::ParseInvestmentBody)),
    tags((name = "finverse"))
)]
pub struct ApiDoc;

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let openapi = ApiDoc::openapi();

    let api = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/openapi.json", get(|| async { Json(openapi) }))
        .merge(stocks::router())
        .merge(invest::router())
        .fallback(api_not_found);

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        // Outermost layer runs first: the id must be set before it is propagated
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}
