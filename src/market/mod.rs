pub mod history;
pub mod seed;
pub mod store;
pub mod ticker;

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::errors::OrderError;
use crate::models::{
    Identity, MarketSnapshot, MarketState, Order, OrderBookView, PricePoint, Side, Trade,
    UserBalance, WalletView,
};
use crate::orderbook::OrderBook;
use history::BoundedHistory;
pub use store::MarketStore;
pub use ticker::Ticker;

/// Prices never go below this.
pub const PRICE_FLOOR: Decimal = dec!(0.01);

/// Chart window length.
pub const PRICE_SERIES_CAPACITY: usize = 24;

// Tick perturbation is drawn from ±TICK_STEPS units of 10^-TICK_SCALE,
// i.e. ±0.0100.
const TICK_STEPS: i64 = 100;
const TICK_SCALE: u32 = 4;

/// True if `price` has no more than `max_decimals` significant fractional
/// digits. Trailing zeros do not count, so `1.20` passes with 2.
pub fn is_valid_price(price: Decimal, max_decimals: u32) -> bool {
    price.normalize().scale() <= max_decimals
}

#[derive(Debug, Clone)]
struct Wallet {
    identity: Identity,
    balance: UserBalance,
}

/// In-memory market: price, chart, book, trades and the connected wallet.
/// All methods are synchronous; [`MarketStore`] owns one of these and
/// drives it from the ticker and the order path.
#[derive(Debug, Clone)]
pub struct MarketEngine {
    state: MarketState,
    reference_price: Decimal,
    price_decimals: u32,
    book: OrderBook,
    series: BoundedHistory<PricePoint>,
    trades: BoundedHistory<Trade>,
    wallet: Option<Wallet>,
}

impl MarketEngine {
    /// Empty market with the given starting state. The reference price
    /// for `price_change` is the starting `current_price`.
    pub fn new(state: MarketState, price_decimals: u32, max_trade_history: usize) -> Self {
        Self {
            reference_price: state.current_price,
            state,
            price_decimals,
            book: OrderBook::new(),
            series: BoundedHistory::new(PRICE_SERIES_CAPACITY),
            trades: BoundedHistory::new(max_trade_history),
            wallet: None,
        }
    }

    /// The demo market the dashboard opens on.
    pub fn seeded(series: Vec<PricePoint>, price_decimals: u32, max_trade_history: usize) -> Self {
        let mut engine = Self::new(seed::market_state(), price_decimals, max_trade_history);
        engine.reference_price = seed::REFERENCE_PRICE;

        for order in seed::buy_orders() {
            engine.add_order(Side::Buy, order);
        }
        for order in seed::sell_orders() {
            engine.add_order(Side::Sell, order);
        }
        for trade in seed::trades() {
            engine.record_trade(trade);
        }
        for point in series {
            engine.series.push(point);
        }
        engine
    }

    /// Moves the price by a random step in ±0.01, clamped to the floor,
    /// and appends the new price to the chart under `label`.
    pub fn advance_tick<R: Rng + ?Sized>(&mut self, rng: &mut R, label: String) {
        let variation = Decimal::new(rng.gen_range(-TICK_STEPS..=TICK_STEPS), TICK_SCALE);
        self.apply_price(self.state.current_price + variation, label);
    }

    fn apply_price(&mut self, price: Decimal, label: String) {
        let state = &mut self.state;
        state.current_price = price.max(PRICE_FLOOR);
        state.price_change = state.current_price - self.reference_price;
        state.price_change_percent = if self.reference_price.is_zero() {
            Decimal::ZERO
        } else {
            state.price_change / self.reference_price * dec!(100)
        };
        state.high_price = state.high_price.max(state.current_price);
        state.low_price = state.low_price.min(state.current_price);

        self.series.push(PricePoint {
            label,
            price: state.current_price.round_dp(2),
        });
    }

    /// Checks an order request against the current wallet. Nothing is
    /// mutated; on success the caller gets the order to submit.
    pub fn validate_order(
        &self,
        side: Side,
        price: Option<Decimal>,
        quantity: Option<u64>,
    ) -> Result<Order, OrderError> {
        let (price, quantity) = match (price, quantity) {
            (Some(p), Some(q)) if p > Decimal::ZERO && q > 0 => (p, q),
            _ => return Err(OrderError::MissingFields),
        };

        let wallet = self.wallet.as_ref().ok_or(OrderError::NotConnected)?;

        if !is_valid_price(price, self.price_decimals) {
            return Err(OrderError::InvalidPrecision {
                max_decimals: self.price_decimals,
            });
        }

        if side == Side::Sell && Decimal::from(quantity) > wallet.balance.token_balance {
            return Err(OrderError::InsufficientBalance {
                requested: quantity,
                available: wallet.balance.token_balance,
            });
        }

        Order::new(price, quantity).ok_or(OrderError::AmountOverflow)
    }

    /// Best sell minus best buy, `None` if either side is empty.
    pub fn compute_spread(&self) -> Option<Decimal> {
        self.book.spread()
    }

    pub fn sorted_sell_orders(&self) -> Vec<Order> {
        self.book.sorted_asks()
    }

    pub fn sorted_buy_orders(&self) -> Vec<Order> {
        self.book.sorted_bids()
    }

    /// Both sides sorted for display, each truncated to `depth` levels.
    pub fn order_book(&self, depth: usize) -> OrderBookView {
        let mut sell_orders = self.sorted_sell_orders();
        let mut buy_orders = self.sorted_buy_orders();
        sell_orders.truncate(depth);
        buy_orders.truncate(depth);

        OrderBookView {
            sell_orders,
            buy_orders,
            spread: self.compute_spread(),
        }
    }

    pub fn add_order(&mut self, side: Side, order: Order) {
        match side {
            Side::Buy => self.book.add_bid(order),
            Side::Sell => self.book.add_ask(order),
        }
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    /// Connects the demo wallet, resets it to the demo balance and returns
    /// the resulting view.
    pub fn connect_identity(&mut self) -> WalletView {
        if self.wallet.is_some() {
            tracing::debug!("wallet reconnected, balances reset to demo values");
        }
        let wallet = Wallet {
            identity: Identity(seed::DEMO_IDENTITY.to_string()),
            balance: seed::demo_balance(),
        };
        let view = self.view_of(&wallet);
        self.wallet = Some(wallet);
        view
    }

    /// Balance of the connected wallet. There is no ledger behind the demo
    /// wallet, so this reads back what `connect_identity` assigned.
    pub fn refresh_balance(&self) -> Option<UserBalance> {
        self.wallet.as_ref().map(|w| w.balance.clone())
    }

    /// Tokens valued at the current price plus native balance.
    pub fn portfolio_value(&self) -> Option<Decimal> {
        self.wallet.as_ref().map(|w| self.view_of(w).portfolio_value)
    }

    pub fn wallet(&self) -> Option<WalletView> {
        self.wallet.as_ref().map(|w| self.view_of(w))
    }

    fn view_of(&self, wallet: &Wallet) -> WalletView {
        WalletView {
            identity: wallet.identity.clone(),
            balance: wallet.balance.clone(),
            portfolio_value: wallet.balance.token_balance * self.state.current_price
                + wallet.balance.native_balance,
        }
    }

    pub fn market_state(&self) -> &MarketState {
        &self.state
    }

    pub fn trade_history(&self) -> Vec<Trade> {
        self.trades.to_vec()
    }

    pub fn price_series(&self) -> Vec<PricePoint> {
        self.series.to_vec()
    }

    pub fn last_price_point(&self) -> Option<&PricePoint> {
        self.series.last()
    }

    pub fn snapshot(&self, depth: usize) -> MarketSnapshot {
        MarketSnapshot {
            market: self.state.clone(),
            order_book: self.order_book(depth),
            trades: self.trade_history(),
            price_series: self.price_series(),
            wallet: self.wallet(),
        }
    }
}
