//! Demo data the market starts with.

use chrono::{DateTime, Local, TimeDelta};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::clock::minute_label;
use crate::models::{MarketState, Order, PricePoint, Side, Trade, UserBalance};

pub const REFERENCE_PRICE: Decimal = dec!(1.20);

pub const DEMO_IDENTITY: &str = "tz1...SimulatedAddress";

pub fn demo_balance() -> UserBalance {
    UserBalance {
        token_balance: dec!(1000),
        native_balance: dec!(5.50),
    }
}

pub fn market_state() -> MarketState {
    MarketState {
        current_price: dec!(1.20),
        price_change: dec!(0.05),
        price_change_percent: dec!(4.35),
        volume_24h: 15_432,
        high_price: dec!(1.25),
        low_price: dec!(1.15),
        total_supply: 1_000_000,
        circulating_supply: 750_000,
        market_cap: 900_000,
    }
}

const BUY_LEVELS: [(Decimal, u64); 5] = [
    (dec!(1.21), 150),
    (dec!(1.20), 300),
    (dec!(1.19), 200),
    (dec!(1.18), 500),
    (dec!(1.17), 100),
];

const SELL_LEVELS: [(Decimal, u64); 5] = [
    (dec!(1.22), 100),
    (dec!(1.23), 250),
    (dec!(1.24), 180),
    (dec!(1.25), 400),
    (dec!(1.26), 75),
];

pub fn buy_orders() -> Vec<Order> {
    levels(&BUY_LEVELS)
}

pub fn sell_orders() -> Vec<Order> {
    levels(&SELL_LEVELS)
}

fn levels(levels: &[(Decimal, u64)]) -> Vec<Order> {
    levels
        .iter()
        .filter_map(|&(price, quantity)| Order::new(price, quantity))
        .collect()
}

/// Oldest first.
pub fn trades() -> Vec<Trade> {
    vec![
        Trade::new("14:28:47", Side::Buy, dec!(1.22), 25),
        Trade::new("14:29:33", Side::Sell, dec!(1.18), 200),
        Trade::new("14:30:18", Side::Buy, dec!(1.21), 75),
        Trade::new("14:31:42", Side::Sell, dec!(1.19), 100),
        Trade::new("14:32:15", Side::Buy, dec!(1.20), 50),
    ]
}

/// `points` hourly samples ending at `now`, each within ±0.05 of the
/// reference price.
pub fn price_series<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Local>,
    points: usize,
) -> Vec<PricePoint> {
    (0..points)
        .rev()
        .map(|hours_ago| {
            let at = now - TimeDelta::hours(hours_ago as i64);
            let cents = rng.gen_range(-5..=5);
            PricePoint {
                label: minute_label(at),
                price: REFERENCE_PRICE + Decimal::new(cents, 2),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn seeded_series_is_hourly_and_near_reference() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = Local.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap();
        let series = price_series(&mut rng, now, 24);

        assert_eq!(series.len(), 24);
        assert_eq!(series.last().unwrap().label, "14:30");
        assert_eq!(series.first().unwrap().label, "15:30");
        for point in &series {
            assert!(point.price >= dec!(1.15) && point.price <= dec!(1.25));
            assert!(point.price.scale() <= 2);
        }
    }

    #[test]
    fn seeded_orders_are_consistent() {
        let buys = buy_orders();
        assert_eq!(buys.len(), 5);
        assert_eq!(buys[0].total(), dec!(181.5));
        assert_eq!(sell_orders()[1].total(), dec!(307.5));
    }
}
