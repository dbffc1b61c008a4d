use serde::{Deserialize, Deserializer, Serialize};

/// One supermarket block of the upstream feed. Products stay as raw JSON so that each one can
/// be decoded (or rejected) on its own.
#[derive(Debug, Deserialize)]
pub struct SupermarketEntry {
    #[serde(default, alias = "store", deserialize_with = "text_or_absent")]
    pub supermarket: Option<String>,
    #[serde(default, rename = "updatedAt", deserialize_with = "lenient_text")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub products: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PromoProduct {
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub quantity: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub old_price: Option<f64>,
    #[serde(deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(alias = "imageUrl", deserialize_with = "lenient_text")]
    pub pic_url: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub valid_from: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub valid_until: Option<String>,
}

/// Accepts JSON numbers and numeric strings (`"2,49"` included); anything else reads as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(number)) => number.as_f64(),
        Some(serde_json::Value::String(text)) => text.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
    .filter(|number: &f64| number.is_finite()))
}

/// Only a JSON string counts; any other value reads as absent.
fn text_or_absent<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => Some(text),
        _ => None,
    })
}

/// Strings as-is, numbers and booleans as their JSON text; arrays, objects and null read as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => Some(text),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        Some(serde_json::Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

/// A promotional product with its store attached and its discount precomputed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatPromoProduct {
    pub name: String,
    pub quantity: String,
    pub price: f64,
    pub old_price: f64,
    pub category: String,
    pub pic_url: String,
    pub valid_from: String,
    pub valid_until: String,
    pub store: String,
    pub discount: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOut {
    pub fetched_at: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<FlatPromoProduct>>,
}

/// A shopping-list item as sent by the list screen, including any price estimate saved earlier.
#[derive(Debug, Clone, Deserialize)]
pub struct ListItemIn {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub estimated_price_min: Option<f64>,
    #[serde(default)]
    pub estimated_price_max: Option<f64>,
    #[serde(default)]
    pub estimated_store: Option<String>,
    #[serde(default)]
    pub price_confidence: Option<String>,
    #[serde(default)]
    pub price_estimated_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DealsPayload {
    pub items: Vec<ListItemIn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("high") => Confidence::High,
            Some("medium") => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DealOutcome {
    #[serde(rename_all = "camelCase")]
    Deal {
        store: String,
        promo_name: String,
        price: f64,
        old_price: f64,
        discount: i32,
        valid_until: String,
        pic_url: String,
        score: f64,
    },
    #[serde(rename_all = "camelCase")]
    Estimated {
        estimated_price_min: f64,
        estimated_price_max: f64,
        estimated_store: Option<String>,
        confidence: Confidence,
        price_estimated_at: String,
    },
    NoDeal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealResult {
    pub item_id: String,
    pub item_name: String,
    #[serde(flatten)]
    pub outcome: DealOutcome,
}

#[derive(Debug, Serialize)]
pub struct DealsResponse {
    pub results: Vec<DealResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchPayload {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDealResult {
    pub store: String,
    pub promo_name: String,
    pub price: f64,
    pub old_price: f64,
    pub discount: i32,
    pub valid_until: String,
    pub pic_url: String,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub deals: Vec<SearchDealResult>,
    pub query: String,
}
