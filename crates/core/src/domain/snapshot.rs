use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Wire and prompt rendering of a field the market data source could not supply.
pub const NOT_AVAILABLE: &str = "N/A";

/// A market data field that is either known or explicitly unavailable.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum<T> {
    Known(T),
    Unavailable,
}

impl<T> From<Option<T>> for Datum<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Datum::Unavailable, Datum::Known)
    }
}

impl<T: fmt::Display> fmt::Display for Datum<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Known(v) => v.fmt(f),
            Datum::Unavailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl<T: Serialize> Serialize for Datum<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Datum::Known(v) => v.serialize(serializer),
            Datum::Unavailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Datum<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.is_null() || value.as_str() == Some(NOT_AVAILABLE) {
            return Ok(Datum::Unavailable);
        }
        T::deserialize(value).map(Datum::Known).map_err(D::Error::custom)
    }
}

/// Fixed-shape market data record consumed by every agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub current_price: Datum<f64>,
    pub pe_ratio: Datum<f64>,
    pub market_cap: Datum<f64>,
    pub company_name: String,
    pub sector: Datum<String>,
    pub industry: Datum<String>,
}

impl StockSnapshot {
    /// The record used when nothing could be fetched. The company name falls back to the ticker.
    pub fn unavailable(ticker: &str) -> Self {
        Self {
            current_price: Datum::Unavailable,
            pe_ratio: Datum::Unavailable,
            market_cap: Datum::Unavailable,
            company_name: ticker.to_string(),
            sector: Datum::Unavailable,
            industry: Datum::Unavailable,
        }
    }

    /// Market cap with thousands separators, or `N/A`.
    pub fn market_cap_display(&self) -> String {
        match self.market_cap {
            Datum::Known(cap) => group_thousands(cap),
            Datum::Unavailable => NOT_AVAILABLE.to_string(),
        }
    }
}

fn group_thousands(value: f64) -> String {
    if !value.is_finite() || value.fract() != 0.0 {
        return value.to_string();
    }

    let digits = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
