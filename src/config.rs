use std::env;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::errors::ConfigError;

#[derive(Debug, Clone, Serialize)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc: String,
    pub contract_address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// Order bounds shown to the dashboard. Only `price_decimals` is enforced
/// by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct LimitsConfig {
    pub min_order_quantity: u64,
    pub max_order_quantity: u64,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub price_decimals: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct UiConfig {
    #[serde(with = "millis")]
    pub refresh_interval: Duration,
    #[serde(with = "millis")]
    pub chart_update_interval: Duration,
    pub max_orderbook_orders: usize,
    pub max_trade_history: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationConfig {
    #[serde(with = "millis")]
    pub confirmation_delay: Duration,
    #[serde(with = "millis")]
    pub submission_timeout: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub api_port: u16,
    pub network: NetworkConfig,
    pub token: TokenConfig,
    pub limits: LimitsConfig,
    pub ui: UiConfig,
    pub simulation: SimulationConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, falling back to the
    /// demo defaults for anything unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            api_port: parse(&lookup, "API_PORT", 3000)?,
            network: NetworkConfig {
                name: string("NETWORK_NAME", "ghostnet"),
                rpc: string("NETWORK_RPC", "https://ghostnet.smartpy.io"),
                contract_address: string("CONTRACT_ADDRESS", "KT1..."),
            },
            token: TokenConfig {
                name: string("TOKEN_NAME", "ActionChain Token"),
                symbol: string("TOKEN_SYMBOL", "ACT"),
                decimals: parse(&lookup, "TOKEN_DECIMALS", 6)?,
            },
            limits: LimitsConfig {
                min_order_quantity: parse(&lookup, "MIN_ORDER_QUANTITY", 1)?,
                max_order_quantity: parse(&lookup, "MAX_ORDER_QUANTITY", 1_000_000)?,
                min_price: parse(&lookup, "MIN_PRICE", dec!(0.01))?,
                max_price: parse(&lookup, "MAX_PRICE", dec!(1000))?,
                price_decimals: parse(&lookup, "PRICE_DECIMALS", 2)?,
            },
            ui: UiConfig {
                refresh_interval: parse_millis(&lookup, "REFRESH_INTERVAL_MS", 5_000)?,
                chart_update_interval: parse_millis(&lookup, "CHART_UPDATE_INTERVAL_MS", 30_000)?,
                max_orderbook_orders: parse(&lookup, "MAX_ORDERBOOK_ORDERS", 10)?,
                max_trade_history: parse(&lookup, "MAX_TRADE_HISTORY", 50)?,
            },
            simulation: SimulationConfig {
                confirmation_delay: parse_millis(&lookup, "CONFIRMATION_DELAY_MS", 1_500)?,
                submission_timeout: parse_millis(&lookup, "SUBMISSION_TIMEOUT_MS", 30_000)?,
            },
        };

        if config.ui.refresh_interval.is_zero() {
            return Err(ConfigError::Zero("REFRESH_INTERVAL_MS"));
        }
        if config.ui.max_trade_history == 0 {
            return Err(ConfigError::Zero("MAX_TRADE_HISTORY"));
        }
        if config.simulation.submission_timeout.is_zero() {
            return Err(ConfigError::Zero("SUBMISSION_TIMEOUT_MS"));
        }

        Ok(config)
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        // every key has a valid fallback, so an empty lookup cannot fail
        Self::from_lookup(|_| None).unwrap_or_else(|e| unreachable!("default config: {e}"))
    }
}

fn parse<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn parse_millis<F>(lookup: &F, key: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse(lookup, key, default).map(Duration::from_millis)
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_demo_dashboard() {
        let config = Config::default();
        assert_eq!(config.api_port, 3000);
        assert_eq!(config.token.symbol, "ACT");
        assert_eq!(config.token.decimals, 6);
        assert_eq!(config.limits.price_decimals, 2);
        assert_eq!(config.limits.min_price, dec!(0.01));
        assert_eq!(config.ui.refresh_interval, Duration::from_secs(5));
        assert_eq!(config.ui.max_trade_history, 50);
        assert_eq!(config.simulation.confirmation_delay, Duration::from_millis(1500));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("API_PORT", "8080"),
            ("TOKEN_SYMBOL", "XYZ"),
            ("MAX_PRICE", "250.5"),
            ("CONFIRMATION_DELAY_MS", " 10 "),
        ]))
        .unwrap();

        assert_eq!(config.api_port, 8080);
        assert_eq!(config.token.symbol, "XYZ");
        assert_eq!(config.limits.max_price, dec!(250.5));
        assert_eq!(config.simulation.confirmation_delay, Duration::from_millis(10));
    }

    #[test]
    fn malformed_value_names_the_key() {
        let err = Config::from_lookup(lookup_from(&[("API_PORT", "70000")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "API_PORT", .. }));
    }

    #[test]
    fn zero_refresh_interval_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("REFRESH_INTERVAL_MS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Zero("REFRESH_INTERVAL_MS")));
    }

    #[test]
    fn zero_submission_timeout_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SUBMISSION_TIMEOUT_MS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Zero("SUBMISSION_TIMEOUT_MS")));
    }
}
