use super::AppState;
use super::models::{OrderRequest, SpreadResponse};
use crate::config::Config;
use crate::errors::OrderError;
use crate::models::{
    MarketSnapshot, MarketState, OrderBookView, OrderConfirmation, PricePoint, Trade, WalletView,
};
use axum::extract::State;
use axum::response::Json;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;

/// GET /health — simple liveness check
pub async fn health() -> &'static str {
    "OK"
}

/// GET /config: token, network, limits and refresh settings
pub async fn get_config(State(state): State<AppState>) -> Json<Config> {
    Json(Config::clone(&state.config))
}

/// GET /market
pub async fn get_market(State(state): State<AppState>) -> Json<MarketState> {
    Json(state.store.market_state())
}

/// GET /orderbook: asks cheapest first, bids highest first
pub async fn get_order_book(State(state): State<AppState>) -> Json<OrderBookView> {
    Json(state.store.order_books())
}

/// GET /spread: `null` when one side of the book is empty
pub async fn get_spread(State(state): State<AppState>) -> Json<SpreadResponse> {
    Json(SpreadResponse {
        spread: state.store.spread(),
    })
}

/// GET /trades: oldest first
pub async fn get_trades(State(state): State<AppState>) -> Json<Vec<Trade>> {
    Json(state.store.trade_history())
}

/// GET /series
pub async fn get_series(State(state): State<AppState>) -> Json<Vec<PricePoint>> {
    Json(state.store.price_series())
}

/// GET /snapshot: everything a dashboard refresh needs
pub async fn get_snapshot(State(state): State<AppState>) -> Json<MarketSnapshot> {
    Json(state.store.snapshot())
}

/// GET /events: server-sent stream of market changes
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.store.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match Event::default().event(event.name()).json_data(&event) {
                    Ok(sse) => return Some((Ok(sse), rx)),
                    Err(e) => tracing::warn!("dropping unserialisable event: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("event subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// POST /orders/buy
pub async fn place_buy_order(
    State(state): State<AppState>,
    Json(req): Json<OrderRequest>,
) -> Result<Json<OrderConfirmation>, OrderError> {
    let confirmation = state.store.place_buy_order(req.price, req.quantity).await?;
    Ok(Json(confirmation))
}

/// POST /orders/sell
pub async fn place_sell_order(
    State(state): State<AppState>,
    Json(req): Json<OrderRequest>,
) -> Result<Json<OrderConfirmation>, OrderError> {
    let confirmation = state.store.place_sell_order(req.price, req.quantity).await?;
    Ok(Json(confirmation))
}

/// GET /wallet: `null` until a wallet is connected
pub async fn get_wallet(State(state): State<AppState>) -> Json<Option<WalletView>> {
    Json(state.store.wallet())
}

/// POST /wallet/connect
pub async fn connect_wallet(State(state): State<AppState>) -> Json<WalletView> {
    Json(state.store.connect_identity())
}

/// POST /wallet/refresh
pub async fn refresh_wallet(
    State(state): State<AppState>,
) -> Result<Json<WalletView>, OrderError> {
    state
        .store
        .refresh_balance()
        .map(Json)
        .ok_or(OrderError::NotConnected)
}

#[cfg(test)]
mod tests {
    use super::super::{AppState, router};
    use crate::clock::VirtualClock;
    use crate::config::Config;
    use crate::contract::{ContractCall, ContractGateway, Receipt};
    use crate::errors::OrderError;
    use crate::market::MarketStore;
    use crate::market::store::tests::virtual_store;
    use async_trait::async_trait;
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use chrono::{Local, TimeZone};
    use futures_util::StreamExt;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app_with_store(store: MarketStore) -> Router {
        router::build(AppState {
            store,
            config: Arc::new(Config::default()),
        })
    }

    fn app() -> Router {
        let (store, _clock) = virtual_store();
        app_with_store(store)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn order_book_is_sorted_for_display() {
        let (status, json) = send(&app(), "GET", "/orderbook", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["sell_orders"][0]["price"], "1.22");
        assert_eq!(json["buy_orders"][0]["price"], "1.21");
        assert_eq!(json["spread"], "0.01");
    }

    #[tokio::test]
    async fn config_exposes_limits() {
        let (_, json) = send(&app(), "GET", "/config", None).await;
        assert_eq!(json["token"]["symbol"], "ACT");
        assert_eq!(json["limits"]["price_decimals"], 2);
        assert_eq!(json["ui"]["refresh_interval"], 5000);
    }

    #[tokio::test]
    async fn buy_without_wallet_is_unauthorized() {
        let (status, json) = send(
            &app(),
            "POST",
            "/orders/buy",
            Some(r#"{"price": "1.20", "quantity": 10}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "not_connected");
        assert!(json["message"].as_str().unwrap().contains("wallet"));
    }

    #[rstest]
    #[case("/orders/buy", r#"{"price": "1.234", "quantity": 10}"#, StatusCode::UNPROCESSABLE_ENTITY, "invalid_precision")]
    #[case("/orders/buy", r#"{"price": 1.234, "quantity": 10}"#, StatusCode::UNPROCESSABLE_ENTITY, "invalid_precision")]
    #[case("/orders/buy", r#"{"quantity": 10}"#, StatusCode::UNPROCESSABLE_ENTITY, "missing_fields")]
    #[case("/orders/buy", r#"{"price": "", "quantity": 10}"#, StatusCode::UNPROCESSABLE_ENTITY, "missing_fields")]
    #[case("/orders/buy", r#"{"price": "abc", "quantity": 10}"#, StatusCode::UNPROCESSABLE_ENTITY, "missing_fields")]
    #[case("/orders/buy", r#"{"price": "1.20", "quantity": ""}"#, StatusCode::UNPROCESSABLE_ENTITY, "missing_fields")]
    #[case("/orders/sell", r#"{"price": "1.20", "quantity": -5}"#, StatusCode::UNPROCESSABLE_ENTITY, "missing_fields")]
    #[case("/orders/sell", r#"{"price": "1.20", "quantity": 2.5}"#, StatusCode::UNPROCESSABLE_ENTITY, "missing_fields")]
    #[case("/orders/sell", r#"{"price": "1.20", "quantity": 5000}"#, StatusCode::CONFLICT, "insufficient_balance")]
    #[tokio::test]
    async fn rejected_orders_map_to_status(
        #[case] uri: &str,
        #[case] body: &str,
        #[case] expected: StatusCode,
        #[case] kind: &str,
    ) {
        let app = app();
        let (status, _) = send(&app, "POST", "/wallet/connect", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = send(&app, "POST", uri, Some(body)).await;
        assert_eq!(status, expected);
        assert_eq!(json["error"], kind);
    }

    #[tokio::test]
    async fn connect_then_refresh_returns_demo_wallet() {
        let app = app();
        let (status, _) = send(&app, "POST", "/wallet/refresh", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, json) = send(&app, "POST", "/wallet/connect", None).await;
        assert_eq!(json["identity"], "tz1...SimulatedAddress");
        assert_eq!(json["balance"]["token_balance"], "1000");

        let (status, json) = send(&app, "POST", "/wallet/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["balance"]["native_balance"], "5.50");
        assert_eq!(json["portfolio_value"], "1205.50");
    }

    #[tokio::test]
    async fn snapshot_has_full_series() {
        let (_, json) = send(&app(), "GET", "/snapshot", None).await;
        assert_eq!(json["price_series"].as_array().unwrap().len(), 24);
        assert_eq!(json["trades"].as_array().unwrap().len(), 5);
        assert!(json["wallet"].is_null());
    }

    #[tokio::test]
    async fn events_stream_carries_ticks() {
        let (store, _clock) = virtual_store();
        let app = app_with_store(store.clone());

        let response = app
            .oneshot(Request::builder().uri("/events").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/event-stream");

        // the handler has subscribed by now
        store.advance_tick();

        let mut body = response.into_body().into_data_stream();
        let mut text = String::new();
        while !text.contains("\n\n") {
            let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
                .await
                .expect("no event within 5s")
                .expect("stream ended")
                .unwrap();
            text.push_str(std::str::from_utf8(&chunk).unwrap());
        }

        assert!(text.contains("event: tick"), "{text}");
        assert!(text.contains(r#""type":"tick""#), "{text}");
    }

    struct RejectingContract;

    #[async_trait]
    impl ContractGateway for RejectingContract {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        async fn submit(&self, _call: &ContractCall) -> Result<Receipt, OrderError> {
            Err(OrderError::SubmissionFailed("node refused the operation".into()))
        }
    }

    #[tokio::test]
    async fn failed_submission_is_bad_gateway() {
        let start = Local.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap();
        let store = MarketStore::with_rng(
            &Config::default(),
            Arc::new(VirtualClock::new(start)),
            Arc::new(RejectingContract),
            StdRng::seed_from_u64(7),
        );
        let app = app_with_store(store);
        send(&app, "POST", "/wallet/connect", None).await;

        let (status, json) = send(
            &app,
            "POST",
            "/orders/buy",
            Some(r#"{"price": "1.20", "quantity": 10}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"], "submission_failed");
        assert!(json["message"].as_str().unwrap().contains("node refused"));
    }
}
