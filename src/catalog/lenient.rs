//! Forgiving field decoders for scraped product data
//!
//! Scrapers copy values out of JSON-LD and page markup, so a price may arrive
//! as `19.99` or `"$19.99"`, a review count as `"1,204"`, and any field as
//! `null`. These helpers accept whatever shape is usable and fall back to the
//! empty value otherwise.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

use super::Product;

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // First numeric run: "$1,999.00" -> 1999.0, "4.5 out of 5" -> 4.5
        Value::String(s) => {
            let digits: String = s
                .trim_start_matches(|c: char| !(c.is_ascii_digit() || c == '-'))
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',' || *c == '-')
                .filter(|c| *c != ',')
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn plain_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// String, number, or null as text
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(plain_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(plain_text(Value::deserialize(deserializer)?).filter(|s| !s.is_empty()))
}

pub fn float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?))
}

/// Non-negative whole count; thousands separators are ignored
pub fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if let Some(n) = value.as_u64() {
        return Ok(Some(n));
    }
    Ok(number(&value)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.trunc() as u64))
}

/// Array of strings; non-string items are dropped and null is empty
pub fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(plain_text).collect(),
        Value::String(s) => vec![s],
        _ => Vec::new(),
    })
}

/// Key/value table with scalar values rendered as text
pub fn table<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(key, value)| plain_text(value).map(|v| (key, v)))
            .collect(),
        _ => BTreeMap::new(),
    })
}

/// Any value that fails to decode as `T` becomes `None`
pub fn or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

fn decode_products(value: Value) -> Vec<Product> {
    let Value::Array(items) = value else {
        if !value.is_null() {
            tracing::warn!("Expected a product list, got {}", value);
        }
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Product>(item) {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::warn!("Skipping undecodable product: {}", e);
                None
            }
        })
        .collect()
}

/// Product list that keeps every decodable item
pub fn products<'de, D>(deserializer: D) -> Result<Vec<Product>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(decode_products(Value::deserialize(deserializer)?))
}

/// As [`products`], for keys whose presence matters
pub fn product_patch<'de, D>(deserializer: D) -> Result<Option<Vec<Product>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(decode_products(Value::deserialize(deserializer)?)))
}
