//! Payload normalization
//!
//! Pure conversions from provider JSON into canonical shapes. Every function
//! here is total: missing or malformed fields fall back to safe defaults and
//! nothing performs I/O.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use shared::models::{CachedCall, CustomerFragment, Order, OrderItem, OrderStatus, Platform};
use std::str::FromStr;

pub const DEFAULT_CURRENCY: &str = "GBP";

/// Country code applied to national-format numbers (leading `0`)
const DEFAULT_COUNTRY_CODE: &str = "44";

/// Build a canonical [`Order`] from a webhook order payload.
///
/// `now` becomes the ingestion timestamp.
pub fn normalize_order(raw: &Value, account_id: &str, location_id: &str, now: i64) -> Order {
    let customer = extract_customer_fragment(raw, account_id);

    let (total_cents, total_currency) = money_field(raw, &["total_price", "total"]);
    let (tax_cents, tax_currency) = money_field(raw, &["tax_amount", "total_tax"]);

    let currency = str_field(raw, &["currency"])
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .or(total_currency)
        .or(tax_currency)
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let status = str_field(raw, &["status"])
        .map(OrderStatus::parse_lenient)
        .unwrap_or(OrderStatus::New);

    let platform = detect_platform(str_field(raw, &["service_type_ref", "channel"]));

    Order {
        id: id_field(raw, "id").unwrap_or_default(),
        account_id: account_id.to_string(),
        location_id: location_id.to_string(),
        platform,
        status,
        customer_name: customer.name,
        customer_phone: customer.phone,
        customer_address: customer.address,
        customer_postcode: customer.postcode,
        customer_city: customer.city,
        total_cents,
        tax_cents,
        currency,
        items: normalize_items(raw),
        created_at: timestamp_field(raw, "created_at"),
        updated_at: timestamp_field(raw, "updated_at"),
        ingested_at: now,
    }
}

/// Customer details of an order payload, phone in E.164
pub fn extract_customer_fragment(raw: &Value, account_id: &str) -> CustomerFragment {
    let customer = raw.get("customer").unwrap_or(&Value::Null);

    let name = match str_field(customer, &["name"]).map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => join_parts(customer, &["first_name", "last_name"], " "),
    };

    let address = match str_field(customer, &["address"]).map(str::trim) {
        Some(address) if !address.is_empty() => address.to_string(),
        _ => join_parts(customer, &["address_1", "address_2"], ", "),
    };

    CustomerFragment {
        account_id: account_id.to_string(),
        phone: str_field(customer, &["phone_number", "phone"])
            .map(normalize_phone)
            .unwrap_or_default(),
        name,
        address,
        postcode: trimmed(customer, &["postcode", "postal_code"]),
        city: trimmed(customer, &["city"]),
    }
}

/// Normalize a phone number to E.164, assuming UK for national numbers.
///
/// Returns an empty string when the input has no digits.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return String::new();
    }

    if trimmed.starts_with('+') {
        format!("+{digits}")
    } else if let Some(rest) = digits.strip_prefix("00") {
        format!("+{rest}")
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("+{DEFAULT_COUNTRY_CODE}{rest}")
    } else {
        // Bare international digits, including `44…` (12 digits)
        format!("+{digits}")
    }
}

/// Map a channel/service-type reference onto a [`Platform`]
pub fn detect_platform(reference: Option<&str>) -> Platform {
    let Some(reference) = reference else {
        return Platform::Unknown;
    };
    let key: String = reference
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    match key.as_str() {
        "ubereats" | "uber" => Platform::UberEats,
        "deliveroo" => Platform::Deliveroo,
        "justeat" => Platform::JustEat,
        "phone" | "telephone" => Platform::Phone,
        _ => Platform::Unknown,
    }
}

/// Build a [`CachedCall`] from a call-platform record. `None` without an id.
pub fn normalize_call(raw: &Value, account_id: &str, now: i64) -> Option<CachedCall> {
    let id = id_field(raw, "id").filter(|id| !id.is_empty())?;
    let artifact = raw.get("artifact").unwrap_or(&Value::Null);

    let phone_number = raw
        .pointer("/customer/number")
        .or_else(|| raw.pointer("/phoneNumber/number"))
        .and_then(Value::as_str)
        .map(normalize_phone)
        .filter(|p| !p.is_empty());

    let started_at = timestamp_field(raw, "startedAt");
    let ended_at = timestamp_field(raw, "endedAt");

    let duration_seconds = raw
        .get("duration")
        .or_else(|| raw.get("durationSeconds"))
        .and_then(lenient_i64)
        .or_else(|| match (started_at, ended_at) {
            (Some(start), Some(end)) if end >= start => Some((end - start + 500) / 1000),
            _ => None,
        })
        .filter(|d| *d >= 0);

    Some(CachedCall {
        id,
        account_id: account_id.to_string(),
        phone_number,
        duration_seconds,
        status: str_field(raw, &["status"])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
            .to_string(),
        outcome: non_empty(raw.get("endedReason")),
        transcript: non_empty(raw.get("transcript")).or_else(|| non_empty(artifact.get("transcript"))),
        recording_url: non_empty(raw.get("recordingUrl"))
            .or_else(|| non_empty(artifact.get("recordingUrl"))),
        cost_cents: raw.get("cost").and_then(call_cost_cents),
        call_at: started_at.or_else(|| timestamp_field(raw, "createdAt")),
        cached_at: now,
    })
}

/// Call cost in major units → minor units. Negative or non-numeric → `None`.
pub fn call_cost_cents(value: &Value) -> Option<i64> {
    let major = match value {
        Value::Number(n) => n.as_f64().and_then(Decimal::from_f64)?,
        Value::String(s) => Decimal::from_str(s.trim()).ok()?,
        _ => return None,
    };
    if major.is_sign_negative() && !major.is_zero() {
        return None;
    }
    major_to_minor(major)
}

/// Monetary value → (minor units, currency when the value carried one).
///
/// - JSON number: minor units, rounded half-up
/// - `"12.50 GBP"`: major units with currency suffix, converted exactly
/// - bare numeric string: minor units, as a number would be
/// - anything else: 0
pub fn money_to_minor(value: &Value) -> (i64, Option<String>) {
    match value {
        Value::Number(n) => (number_to_minor(n), None),
        Value::String(s) => parse_money_string(s),
        _ => (0, None),
    }
}

fn number_to_minor(n: &serde_json::Number) -> i64 {
    if let Some(i) = n.as_i64() {
        return i;
    }
    n.as_f64()
        .and_then(Decimal::from_f64)
        .and_then(|d| d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero).to_i64())
        .unwrap_or(0)
}

fn parse_money_string(raw: &str) -> (i64, Option<String>) {
    let mut parts = raw.split_whitespace();
    let Some(amount) = parts.next().and_then(|a| Decimal::from_str(a).ok()) else {
        return (0, None);
    };

    let currency = parts
        .next()
        .filter(|c| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
        .map(str::to_ascii_uppercase);

    match currency {
        Some(currency) => (major_to_minor(amount).unwrap_or(0), Some(currency)),
        None => (
            amount
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
                .unwrap_or(0),
            None,
        ),
    }
}

fn major_to_minor(major: Decimal) -> Option<i64> {
    major
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

fn normalize_items(raw: &Value) -> Vec<OrderItem> {
    let Some(items) = raw.get("items").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| OrderItem {
            name: trimmed(item, &["name", "product_name"]),
            quantity: item.get("quantity").and_then(lenient_i64).unwrap_or(1),
            unit_price: first_present(item, &["price", "unit_price"])
                .map(|v| money_to_minor(v).0)
                .unwrap_or(0),
        })
        .collect()
}

// ── field helpers ──────────────────────────────────────────────────

fn first_present<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn str_field<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

fn trimmed(obj: &Value, keys: &[&str]) -> String {
    str_field(obj, keys).map(str::trim).unwrap_or_default().to_string()
}

fn join_parts(obj: &Value, keys: &[&str], sep: &str) -> String {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts string or numeric ids
pub(crate) fn id_field(obj: &Value, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integers from numbers or numeric strings (`"2"`), rounding fractions
fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => Decimal::from_str(s.trim())
            .ok()
            .and_then(|d| d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero).to_i64()),
        _ => None,
    }
}

/// RFC 3339 string or epoch milliseconds
fn timestamp_field(obj: &Value, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Value::String(s) => shared::util::parse_rfc3339_millis(s),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

fn money_field(obj: &Value, keys: &[&str]) -> (i64, Option<String>) {
    first_present(obj, keys)
        .map(money_to_minor)
        .unwrap_or((0, None))
}
