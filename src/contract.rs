use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::clock::Clock;
use crate::errors::OrderError;
use crate::models::{Order, Side};

const MUTEZ_PER_TEZ: Decimal = dec!(1000000);

/// Contract entrypoint an order is submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entrypoint {
    PlaceBuyOrder,
    PlaceSellOrder,
}

impl Entrypoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entrypoint::PlaceBuyOrder => "place_buy_order",
            Entrypoint::PlaceSellOrder => "place_sell_order",
        }
    }
}

/// Parameters of a single contract call, in the contract's own units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub entrypoint: Entrypoint,
    pub price_mutez: u64,
    pub quantity: u64,
    /// Native currency attached to the call. Buys escrow the full total,
    /// sells attach nothing.
    pub amount_mutez: u64,
}

impl ContractCall {
    pub fn for_order(side: Side, order: &Order) -> Result<Self, OrderError> {
        let price_mutez = to_mutez(order.price())?;
        let (entrypoint, amount_mutez) = match side {
            Side::Buy => (Entrypoint::PlaceBuyOrder, to_mutez(order.total())?),
            Side::Sell => (Entrypoint::PlaceSellOrder, 0),
        };

        Ok(Self {
            entrypoint,
            price_mutez,
            quantity: order.quantity(),
            amount_mutez,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub confirmed_at: DateTime<Local>,
}

/// Converts tez to mutez, rounding half away from zero.
pub fn to_mutez(tez: Decimal) -> Result<u64, OrderError> {
    tez.checked_mul(MUTEZ_PER_TEZ)
        .map(|m| m.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|m| m.to_u64())
        .ok_or(OrderError::AmountOverflow)
}

#[async_trait]
pub trait ContractGateway: Send + Sync {
    fn name(&self) -> &'static str;

    /// Submits the call and resolves once it is confirmed.
    async fn submit(&self, call: &ContractCall) -> Result<Receipt, OrderError>;
}

/// Stand-in for the deployed contract: waits a fixed delay, then confirms.
pub struct SimulatedContract {
    address: String,
    delay: Duration,
    clock: Arc<dyn Clock>,
}

impl SimulatedContract {
    pub fn new(address: impl Into<String>, delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            address: address.into(),
            delay,
            clock,
        }
    }
}

#[async_trait]
impl ContractGateway for SimulatedContract {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn submit(&self, call: &ContractCall) -> Result<Receipt, OrderError> {
        tracing::debug!(
            "[{}] {} -> {}: price={} mutez quantity={} amount={} mutez",
            self.name(),
            call.entrypoint.as_str(),
            self.address,
            call.price_mutez,
            call.quantity,
            call.amount_mutez
        );

        self.clock.sleep(self.delay).await;

        Ok(Receipt {
            confirmed_at: self.clock.now(),
        })
    }
}
