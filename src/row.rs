// 🧩 Row Model - one line item of a build
//
// A row is four pieces of text, exactly as the user typed them. Its position
// is its index in the build list and is never stored.
//
// Parsing is lenient on the way in (numbers, booleans and null are accepted
// for any text field) and the price is only interpreted when totals are
// computed. Nothing here ever rejects a malformed price.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::categories::CategoryRegistry;

// ============================================================================
// BUILD ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildRow {
    /// Category name; unknown names are kept verbatim
    #[serde(default = "default_category", deserialize_with = "category_text")]
    pub category: String,

    /// Product name (may contain newlines)
    #[serde(default, deserialize_with = "lenient_text")]
    pub product: String,

    /// Raw price text; see [`BuildRow::price_value`]
    #[serde(default, deserialize_with = "lenient_text")]
    pub price: String,

    /// Where the part is bought
    #[serde(default, deserialize_with = "lenient_text")]
    pub source: String,
}

fn default_category() -> String {
    CategoryRegistry::standard().default_category().to_string()
}

impl Default for BuildRow {
    fn default() -> Self {
        BuildRow::new(None, None, None, None)
    }
}

impl BuildRow {
    /// Create a row, defaulting the category to the registry's first entry
    /// and every other field to empty
    pub fn new(
        category: Option<&str>,
        product: Option<&str>,
        price: Option<&str>,
        source: Option<&str>,
    ) -> Self {
        BuildRow {
            category: category
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .unwrap_or_else(default_category),
            product: product.unwrap_or_default().to_string(),
            price: price.unwrap_or_default().to_string(),
            source: source.unwrap_or_default().to_string(),
        }
    }

    /// Empty row for a category
    pub fn for_category(category: &str) -> Self {
        BuildRow::new(Some(category), None, None, None)
    }

    pub fn with_product(mut self, product: &str) -> Self {
        self.product = product.to_string();
        self
    }

    pub fn with_price(mut self, price: &str) -> Self {
        self.price = price.to_string();
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    /// Price as a number for totals.
    ///
    /// Empty, non-numeric, non-finite and negative prices count as 0.
    pub fn price_value(&self) -> f64 {
        self.price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(0.0)
    }

    /// False when a non-empty price would be ignored by totals
    pub fn price_is_valid(&self) -> bool {
        let price = self.price.trim();
        price.is_empty()
            || price
                .parse::<f64>()
                .map_or(false, |v| v.is_finite() && v >= 0.0)
    }

    /// True when both product and price are empty (skipped in summaries)
    pub fn is_blank(&self) -> bool {
        self.product.trim().is_empty() && self.price.trim().is_empty()
    }

    pub fn field(&self, field: RowField) -> &str {
        match field {
            RowField::Category => &self.category,
            RowField::Product => &self.product,
            RowField::Price => &self.price,
            RowField::Source => &self.source,
        }
    }

    /// An empty category falls back to the default, as in [`BuildRow::new`]
    pub fn set_field(&mut self, field: RowField, value: &str) {
        let slot = match field {
            RowField::Category if value.is_empty() => {
                self.category = default_category();
                return;
            }
            RowField::Category => &mut self.category,
            RowField::Product => &mut self.product,
            RowField::Price => &mut self.price,
            RowField::Source => &mut self.source,
        };
        *slot = value.to_string();
    }
}

// ============================================================================
// ROW FIELD
// ============================================================================

/// Editable columns of a row, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowField {
    Category,
    Product,
    Price,
    Source,
}

impl RowField {
    pub const ALL: [RowField; 4] = [
        RowField::Category,
        RowField::Product,
        RowField::Price,
        RowField::Source,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RowField::Category => "Category",
            RowField::Product => "Product",
            RowField::Price => "Price",
            RowField::Source => "Source",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            RowField::Category => RowField::Product,
            RowField::Product => RowField::Price,
            RowField::Price => RowField::Source,
            RowField::Source => RowField::Category,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            RowField::Category => RowField::Source,
            RowField::Product => RowField::Category,
            RowField::Price => RowField::Product,
            RowField::Source => RowField::Price,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        RowField::ALL
            .into_iter()
            .find(|f| f.label().eq_ignore_ascii_case(name))
    }
}

// ============================================================================
// LENIENT FIELD PARSING
// ============================================================================

fn value_to_text(value: Value) -> Result<String, String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(_) => Err("expected text, found an array".to_string()),
        Value::Object(_) => Err("expected text, found an object".to_string()),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    value_to_text(Value::deserialize(deserializer)?).map_err(de::Error::custom)
}

fn category_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let text = lenient_text(deserializer)?;
    if text.is_empty() {
        Ok(default_category())
    } else {
        Ok(text)
    }
}
