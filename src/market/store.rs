use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tokio::sync::broadcast;

use super::{MarketEngine, PRICE_SERIES_CAPACITY, seed};
use crate::clock::{Clock, minute_label};
use crate::config::Config;
use crate::contract::{ContractCall, ContractGateway};
use crate::errors::OrderError;
use crate::models::{
    MarketEvent, MarketSnapshot, MarketState, OrderBookView, OrderConfirmation,
    PricePoint, Side, Trade, WalletView,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

struct Inner {
    engine: MarketEngine,
    rng: StdRng,
}

/// Shared handle to the market. Clones are cheap and all point at the same
/// engine; every mutation goes through the lock, which is never held across
/// an await.
#[derive(Clone)]
pub struct MarketStore {
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<MarketEvent>,
    clock: Arc<dyn Clock>,
    gateway: Arc<dyn ContractGateway>,
    submission_timeout: Duration,
    depth: usize,
}

impl MarketStore {
    pub fn new(config: &Config, clock: Arc<dyn Clock>, gateway: Arc<dyn ContractGateway>) -> Self {
        Self::with_rng(config, clock, gateway, StdRng::from_entropy())
    }

    /// Same as [`MarketStore::new`] with a caller-chosen RNG, for
    /// reproducible runs.
    pub fn with_rng(
        config: &Config,
        clock: Arc<dyn Clock>,
        gateway: Arc<dyn ContractGateway>,
        mut rng: StdRng,
    ) -> Self {
        let series = seed::price_series(&mut rng, clock.now(), PRICE_SERIES_CAPACITY);
        let engine = MarketEngine::seeded(
            series,
            config.limits.price_decimals,
            config.ui.max_trade_history,
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(Mutex::new(Inner { engine, rng })),
            events,
            clock,
            gateway,
            submission_timeout: config.simulation.submission_timeout,
            depth: config.ui.max_orderbook_orders,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: MarketEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// One simulation step. Publishes a `tick` event.
    pub fn advance_tick(&self) {
        let label = minute_label(self.clock.now());
        let (point, market) = {
            let mut guard = self.inner.lock();
            let Inner { engine, rng } = &mut *guard;
            engine.advance_tick(rng, label);
            let point = engine.last_price_point().cloned();
            (point, engine.market_state().clone())
        };

        metrics::counter!("market_ticks_total").increment(1);
        if let Some(price) = market.current_price.to_f64() {
            metrics::gauge!("market_current_price").set(price);
        }

        if let Some(point) = point {
            tracing::debug!("tick {} price={}", point.label, market.current_price);
            self.publish(MarketEvent::Tick { point, market });
        }
    }

    pub async fn place_buy_order(
        &self,
        price: Option<Decimal>,
        quantity: Option<u64>,
    ) -> Result<OrderConfirmation, OrderError> {
        self.place_order(Side::Buy, price, quantity).await
    }

    pub async fn place_sell_order(
        &self,
        price: Option<Decimal>,
        quantity: Option<u64>,
    ) -> Result<OrderConfirmation, OrderError> {
        self.place_order(Side::Sell, price, quantity).await
    }

    async fn place_order(
        &self,
        side: Side,
        price: Option<Decimal>,
        quantity: Option<u64>,
    ) -> Result<OrderConfirmation, OrderError> {
        let result = self.submit_order(side, price, quantity).await;

        match &result {
            Ok(confirmation) => {
                metrics::counter!("orders_submitted_total", "side" => side.as_str()).increment(1);
                tracing::info!(
                    "{} order confirmed: {} @ {} (total {})",
                    side.as_str(),
                    confirmation.quantity,
                    confirmation.price,
                    confirmation.total
                );
                self.publish(MarketEvent::OrderConfirmed(confirmation.clone()));
            }
            Err(e) => {
                metrics::counter!("orders_rejected_total", "reason" => e.kind()).increment(1);
                tracing::warn!("{} order rejected: {}", side.as_str(), e);
            }
        }

        result
    }

    async fn submit_order(
        &self,
        side: Side,
        price: Option<Decimal>,
        quantity: Option<u64>,
    ) -> Result<OrderConfirmation, OrderError> {
        let order = self.inner.lock().engine.validate_order(side, price, quantity)?;
        let call = ContractCall::for_order(side, &order)?;
        let submitted_at = self.clock.now();

        tracing::info!(
            "placing {} order via {}: {} @ {}",
            side.as_str(),
            self.gateway.name(),
            order.quantity(),
            order.price()
        );

        let receipt = tokio::select! {
            receipt = self.gateway.submit(&call) => receipt?,
            _ = self.clock.sleep(self.submission_timeout) => {
                return Err(OrderError::Timeout(self.submission_timeout));
            }
        };

        Ok(OrderConfirmation {
            side,
            price: order.price(),
            quantity: order.quantity(),
            total: order.total(),
            price_mutez: call.price_mutez,
            amount_mutez: call.amount_mutez,
            submitted_at,
            confirmed_at: receipt.confirmed_at,
        })
    }

    /// Connects the demo wallet. The returned view is the same one the
    /// `wallet_connected` event carries.
    pub fn connect_identity(&self) -> WalletView {
        let wallet = self.inner.lock().engine.connect_identity();

        tracing::info!("wallet connected: {}", wallet.identity.0);
        self.publish(MarketEvent::WalletConnected(wallet.clone()));
        wallet
    }

    /// `None` when no wallet is connected.
    pub fn refresh_balance(&self) -> Option<WalletView> {
        let wallet = {
            let guard = self.inner.lock();
            guard.engine.refresh_balance()?;
            guard.engine.wallet()?
        };

        tracing::debug!("balance refreshed for {}", wallet.identity.0);
        self.publish(MarketEvent::BalanceRefreshed(wallet.clone()));
        Some(wallet)
    }

    pub fn wallet(&self) -> Option<WalletView> {
        self.inner.lock().engine.wallet()
    }

    pub fn market_state(&self) -> MarketState {
        self.inner.lock().engine.market_state().clone()
    }

    pub fn order_books(&self) -> OrderBookView {
        self.inner.lock().engine.order_book(self.depth)
    }

    pub fn trade_history(&self) -> Vec<Trade> {
        self.inner.lock().engine.trade_history()
    }

    pub fn spread(&self) -> Option<Decimal> {
        self.inner.lock().engine.compute_spread()
    }

    pub fn price_series(&self) -> Vec<PricePoint> {
        self.inner.lock().engine.price_series()
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        self.inner.lock().engine.snapshot(self.depth)
    }
}
