//! Backend record shapes and the normalized order view-model.
//!
//! The CMS custom-field bag (`acf`) is loosely typed: a text field may come
//! back as a number, an unset field as `""`, `false` or `null`, and an id as a
//! numeric string. The deserializers here accept all of those and map "unset"
//! to `None` so the join only ever deals with real values.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Shown wherever a text field has no value.
pub const PLACEHOLDER: &str = "—";

pub const DEFAULT_TOTAL_PRICE: &str = "0.00";

pub const UNKNOWN_CAMP: &str = "Unknown Camp";

// ---------------------------------------------------------------------------
// Lenient field helpers
// ---------------------------------------------------------------------------

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn scalar_to_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().filter(|id| *id != 0),
        Value::String(s) => s.trim().parse::<u64>().ok().filter(|id| *id != 0),
        _ => None,
    }
}

fn scalar_to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        _ => false,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(scalar_to_bool).unwrap_or(false))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_id))
}

// ---------------------------------------------------------------------------
// Id references
// ---------------------------------------------------------------------------

/// A foreign-key field that the CMS returns either as one id or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum IdRef {
    Single(u64),
    Multiple(Vec<u64>),
}

impl IdRef {
    /// All referenced ids, in backend order.
    pub fn ids(&self) -> Vec<u64> {
        match self {
            IdRef::Single(id) => vec![*id],
            IdRef::Multiple(ids) => ids.clone(),
        }
    }

    pub fn first(&self) -> Option<u64> {
        match self {
            IdRef::Single(id) => Some(*id),
            IdRef::Multiple(ids) => ids.first().copied(),
        }
    }

    fn from_value(value: &Value) -> Option<IdRef> {
        match value {
            Value::Array(items) => {
                // Relationship fields may hold full post objects instead of ids.
                let ids = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Object(obj) => obj
                            .get("ID")
                            .or_else(|| obj.get("id"))
                            .and_then(scalar_to_id),
                        other => scalar_to_id(other),
                    })
                    .collect();
                Some(IdRef::Multiple(ids))
            }
            other => scalar_to_id(other).map(IdRef::Single),
        }
    }
}

impl<'de> Deserialize<'de> for IdRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        IdRef::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid id reference: {value}")))
    }
}

fn lenient_id_ref<'de, D>(deserializer: D) -> Result<Option<IdRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(IdRef::from_value))
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

fn lenient_rendered<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    // `title` is `{ "rendered": "..." }` on reads but may be a plain string
    // in write echoes.
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Object(obj)) => obj.get("rendered").and_then(scalar_to_string),
        Some(other) => scalar_to_string(&other),
        None => None,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFields {
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub room_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pickup_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub payment_confirmed: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub total_price: Option<String>,
    #[serde(
        default,
        rename = "Special_Instructions",
        alias = "special_instructions",
        deserialize_with = "lenient_string"
    )]
    pub special_instructions: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_id_ref")]
    pub service_id: Option<IdRef>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub slot_id: Option<u64>,
    #[serde(default, rename = "camp_name", deserialize_with = "lenient_id_ref")]
    pub camp: Option<IdRef>,
}

fn lenient_fields<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    // An empty field group is serialized as `[]` or `false`.
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(v @ Value::Object(_)) => serde_json::from_value(v).map_err(serde::de::Error::custom),
        _ => Ok(T::default()),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOrder {
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_rendered")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_fields")]
    pub acf: OrderFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceFields {
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub slug: Option<String>,
    /// Media id or URL.
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawService {
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_rendered")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_fields")]
    pub acf: ServiceFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotFields {
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPickupSlot {
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_rendered")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_fields")]
    pub acf: SlotFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCamp {
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_rendered")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPaymentMethod {
    pub id: u64,
    #[serde(default, deserialize_with = "lenient_rendered")]
    pub title: Option<String>,
}

// ---------------------------------------------------------------------------
// Normalized order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Other(s) => s,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, OrderStatus::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }

    /// Neither completed nor cancelled.
    pub fn is_pending(&self) -> bool {
        !self.is_completed() && !self.is_cancelled()
    }
}

impl From<&str> for OrderStatus {
    fn from(s: &str) -> Self {
        match s.trim() {
            "" | "pending" => OrderStatus::Pending,
            "completed" => OrderStatus::Completed,
            "cancelled" => OrderStatus::Cancelled,
            other => OrderStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        OrderStatus::from(s.as_str())
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderService {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickupSlot {
    pub id: u64,
    pub title: String,
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedOrder {
    pub id: u64,
    pub title: String,
    pub customer_name: String,
    pub room_number: String,
    pub pickup_method: String,
    pub payment_confirmed: bool,
    pub total_price: String,
    pub special_instructions: String,
    pub order_status: OrderStatus,
    pub order_timestamp: String,
    pub camp_name: String,
    pub services: Vec<OrderService>,
    pub pickup_slot: Option<PickupSlot>,
}

impl NormalizedOrder {
    /// `total_price` as a number; unparseable prices count as zero.
    pub fn price(&self) -> f64 {
        parse_price(&self.total_price)
    }
}

pub(crate) fn parse_price(raw: &str) -> f64 {
    let trimmed = raw.trim().trim_start_matches('$');
    // Accept a numeric prefix the way a lenient float parse would ("12.5 AUD").
    let end = trimmed
        .char_indices()
        .find(|(i, c)| {
            !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+')))
        })
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
