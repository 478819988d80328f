use crate::errors::OrderError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Body of POST /orders/buy and /orders/sell. Form fields arrive as strings
/// or numbers; anything absent, empty or unparseable becomes `None` so the
/// order path answers with `missing_fields`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderRequest {
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<u64>,
}

fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
    let price = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    };
    Ok(price)
}

fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let quantity = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        // negative and fractional numbers fall through as_u64
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    };
    Ok(quantity)
}

/// Response for GET /spread
#[derive(Serialize)]
pub struct SpreadResponse {
    pub spread: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let status = match &self {
            OrderError::MissingFields
            | OrderError::InvalidPrecision { .. }
            | OrderError::AmountOverflow => StatusCode::UNPROCESSABLE_ENTITY,
            OrderError::NotConnected => StatusCode::UNAUTHORIZED,
            OrderError::InsufficientBalance { .. } => StatusCode::CONFLICT,
            OrderError::SubmissionFailed(_) => StatusCode::BAD_GATEWAY,
            OrderError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        };
        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn parse(body: &str) -> OrderRequest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn accepts_strings_and_numbers() {
        let req = parse(r#"{"price": " 1.25 ", "quantity": "10"}"#);
        assert_eq!(req.price, Some(dec!(1.25)));
        assert_eq!(req.quantity, Some(10));

        let req = parse(r#"{"price": 1.234, "quantity": 7}"#);
        assert_eq!(req.price, Some(dec!(1.234)));
        assert_eq!(req.quantity, Some(7));
    }

    #[rstest]
    #[case(r#"{}"#)]
    #[case(r#"{"price": "", "quantity": ""}"#)]
    #[case(r#"{"price": "abc", "quantity": "ten"}"#)]
    #[case(r#"{"price": null, "quantity": -5}"#)]
    #[case(r#"{"price": true, "quantity": 2.5}"#)]
    #[case(r#"{"price": [1], "quantity": {"n": 1}}"#)]
    fn unusable_fields_become_none(#[case] body: &str) {
        let req = parse(body);
        assert_eq!(req.price, None);
        assert_eq!(req.quantity, None);
    }
}
