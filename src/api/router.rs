use super::{AppState, handlers};
use axum::Router;
use axum::routing::{get, post};

/// Builds the dashboard router: read-only market views plus the order and
/// wallet entry points.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/market", get(handlers::get_market))
        .route("/orderbook", get(handlers::get_order_book))
        .route("/spread", get(handlers::get_spread))
        .route("/trades", get(handlers::get_trades))
        .route("/series", get(handlers::get_series))
        .route("/snapshot", get(handlers::get_snapshot))
        .route("/events", get(handlers::events))
        .route("/orders/buy", post(handlers::place_buy_order))
        .route("/orders/sell", post(handlers::place_sell_order))
        .route("/wallet", get(handlers::get_wallet))
        .route("/wallet/connect", post(handlers::connect_wallet))
        .route("/wallet/refresh", post(handlers::refresh_wallet))
        .with_state(state)
}
