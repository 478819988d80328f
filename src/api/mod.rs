pub mod handlers;
pub mod models;
pub mod router;

use crate::config::Config;
use crate::market::MarketStore;
use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: MarketStore,
    pub config: Arc<Config>,
}

pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    pub fn new(store: MarketStore, config: Config) -> Self {
        Self {
            state: AppState {
                store,
                config: Arc::new(config),
            },
        }
    }

    /// Binds the server to the configured port and starts serving.
    pub async fn run(self) -> anyhow::Result<()> {
        // installs the global recorder, so only done once per process
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        let app = router::build(self.state.clone())
            .route("/metrics", get(move || async move { metric_handle.render() }))
            .layer(prometheus_layer)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http());
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.api_port));

        tracing::info!("API server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
