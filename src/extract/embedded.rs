//! Analytics payload embedded in product pages
//!
//! Product pages carry a JSON object in the `value` attribute of
//! `<input id="pdp-gtm-data">`. It is the authoritative source for price,
//! currency and product id. Values are carried over as published, `null`
//! included; only unparseable JSON or a missing path is an error.

use crate::extract::record::Price;
use crate::extract::ExtractError;
use serde_json::Value;

const CURRENCY_PATH: &str = "/ecommerce/currencyCode";
const PRICE_PATH: &str = "/ecommerce/detail/products/0/price";
const ID_PATH: &str = "/ecommerce/detail/products/0/id";

/// The fields read from the embedded payload
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedProduct {
    pub currency: Option<String>,
    pub price: Price,
    pub id: Option<String>,
}

impl EmbeddedProduct {
    /// Parses the raw attribute value
    ///
    /// Malformed JSON or a missing path is a [`ExtractError::Parse`]; there
    /// is no fallback source for these fields.
    pub fn parse(raw: &str) -> Result<Self, ExtractError> {
        let payload: Value = serde_json::from_str(raw)
            .map_err(|e| ExtractError::Parse(format!("malformed product payload: {}", e)))?;

        let currency = text_value(lookup(&payload, CURRENCY_PATH)?);

        let price = match lookup(&payload, PRICE_PATH)? {
            Value::Number(n) => Price::Amount(n.clone()),
            Value::String(s) => Price::Label(s.clone()),
            other => Price::Other(other.clone()),
        };

        let id = text_value(lookup(&payload, ID_PATH)?);

        Ok(Self {
            currency,
            price,
            id,
        })
    }
}

fn lookup<'a>(payload: &'a Value, path: &str) -> Result<&'a Value, ExtractError> {
    payload
        .pointer(path)
        .ok_or_else(|| ExtractError::Parse(format!("product payload has no {}", path)))
}

/// Strings as they are, `null` as `None`, anything else as its JSON text
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
