use super::models::{ContractCandidate, RawContract, SkipReason};
use chrono::NaiveDate;
use serde_json::Value;

const STRIKE_KEYS: &[&str] = &["strike_price", "strike"];
const EXPIRATION_KEYS: &[&str] = &["expiration_date", "expiration"];
const OPEN_INTEREST_KEYS: &[&str] = &["open_interest", "oi"];

/// Nested quote blocks searched for a bid, in order
const QUOTE_KEYS: &[&str] = &["last_quote", "last_quote_detail"];
const BID_KEYS: &[&str] = &["bid", "bid_price", "p_bid"];

/// Turn a provider contract into candidate fields, or say why it was skipped
pub fn normalize(raw: &RawContract, today: NaiveDate) -> Result<ContractCandidate, SkipReason> {
    let strike_value = raw.field(STRIKE_KEYS).ok_or(SkipReason::MissingStrike)?;
    let expiration_value = raw.field(EXPIRATION_KEYS).ok_or(SkipReason::MissingExpiration)?;
    let oi_value = raw.field(OPEN_INTEREST_KEYS).ok_or(SkipReason::MissingOpenInterest)?;

    let strike = as_f64(strike_value).ok_or(SkipReason::UnparsableStrike)?;
    let open_interest = as_open_interest(oi_value).ok_or(SkipReason::UnparsableOpenInterest)?;
    let expiration = expiration_value
        .as_str()
        .and_then(parse_expiration)
        .ok_or(SkipReason::UnparsableExpiration)?;

    let dte = calculate_days_to_expiry(expiration, today);
    if dte < 0 {
        return Err(SkipReason::Expired);
    }

    let bid = extract_bid(raw).ok_or(SkipReason::NoBid)?;

    Ok(ContractCandidate {
        strike,
        expiration,
        dte,
        open_interest,
        bid,
    })
}

/// First positive bid found under the known quote blocks and aliases
pub fn extract_bid(raw: &RawContract) -> Option<f64> {
    QUOTE_KEYS
        .iter()
        .filter_map(|key| raw.0.get(*key))
        .filter(|quote| quote.is_object())
        .flat_map(|quote| BID_KEYS.iter().filter_map(move |key| quote.get(*key)))
        .filter_map(as_f64)
        .find(|bid| *bid > 0.0)
}

/// Parse the first ten characters as YYYY-MM-DD
pub fn parse_expiration(text: &str) -> Option<NaiveDate> {
    let head: String = text.chars().take(10).collect();
    NaiveDate::parse_from_str(&head, "%Y-%m-%d").ok()
}

/// Whole days from `today` until `expiration` (negative once expired)
pub fn calculate_days_to_expiry(expiration: NaiveDate, today: NaiveDate) -> i64 {
    (expiration - today).num_days()
}

/// Numbers and numeric strings; anything non-finite is rejected
fn as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Integer count; fractional values truncate, negatives are rejected
fn as_open_interest(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let parsed = as_f64(value)?;
    if parsed < 0.0 {
        return None;
    }
    Some(parsed.trunc() as u64)
}
