use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// One point of the price chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub label: String,
    pub price: Decimal,
}

/// A resting order. `total` is derived from price and quantity on
/// construction and cannot be set on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    price: Decimal,
    quantity: u64,
    total: Decimal,
}

impl Order {
    /// Returns `None` if `price * quantity` overflows.
    pub fn new(price: Decimal, quantity: u64) -> Option<Self> {
        let total = price.checked_mul(Decimal::from(quantity))?;
        Some(Self {
            price,
            quantity,
            total,
        })
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn total(&self) -> Decimal {
        self.total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub time: String,
    pub side: Side,
    pub price: Decimal,
    pub quantity: u64,
    pub total: Decimal,
}

impl Trade {
    pub fn new(time: impl Into<String>, side: Side, price: Decimal, quantity: u64) -> Self {
        Self {
            time: time.into(),
            side,
            price,
            quantity,
            total: price * Decimal::from(quantity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketState {
    pub current_price: Decimal,
    pub price_change: Decimal,
    pub price_change_percent: Decimal,
    pub volume_24h: u64,
    pub high_price: Decimal,
    pub low_price: Decimal,
    pub total_supply: u64,
    pub circulating_supply: u64,
    pub market_cap: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserBalance {
    pub token_balance: Decimal,
    pub native_balance: Decimal,
}

/// Address of the connected wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Identity(pub String);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletView {
    pub identity: Identity,
    pub balance: UserBalance,
    pub portfolio_value: Decimal,
}

/// Returned once the contract has confirmed a submitted order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderConfirmation {
    pub side: Side,
    pub price: Decimal,
    pub quantity: u64,
    pub total: Decimal,
    pub price_mutez: u64,
    pub amount_mutez: u64,
    pub submitted_at: DateTime<Local>,
    pub confirmed_at: DateTime<Local>,
}

/// Both sides of the book in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBookView {
    pub sell_orders: Vec<Order>,
    pub buy_orders: Vec<Order>,
    pub spread: Option<Decimal>,
}

/// Everything the dashboard draws on a refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub market: MarketState,
    pub order_book: OrderBookView,
    pub trades: Vec<Trade>,
    pub price_series: Vec<PricePoint>,
    pub wallet: Option<WalletView>,
}

/// Change notifications pushed to subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    Tick {
        point: PricePoint,
        market: MarketState,
    },
    OrderConfirmed(OrderConfirmation),
    WalletConnected(WalletView),
    BalanceRefreshed(WalletView),
}

impl MarketEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MarketEvent::Tick { .. } => "tick",
            MarketEvent::OrderConfirmed(_) => "order_confirmed",
            MarketEvent::WalletConnected(_) => "wallet_connected",
            MarketEvent::BalanceRefreshed(_) => "balance_refreshed",
        }
    }
}
