use crate::config::CURRENCY_CODE;
use serde::{Deserialize, Serialize};

/// One denormalized catalog record. `description` is never null (empty
/// string when absent), while `thumbnail` stays null when no image
/// exists; `variants` and `images` are always present as lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A sellable variant as serialized in the catalog. An absent price is
/// null, never zero; the currency is the fixed policy code either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: i64,
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub stock: u32,
}

impl Product {
    /// Cheapest present variant price; 0 when no variant carries one.
    /// Used as the denormalized `base_price` by both re-import paths.
    pub fn base_price(&self) -> i64 {
        self.variants
            .iter()
            .filter_map(|v| v.price)
            .min()
            .unwrap_or(0)
    }
}

fn default_active() -> bool {
    true
}

fn default_currency() -> String {
    CURRENCY_CODE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_price_serializes_as_null() {
        let variant = Variant {
            id: 7,
            name: "S".to_string(),
            sku: "SKU-7".to_string(),
            price: None,
            currency: CURRENCY_CODE.to_string(),
            stock: 1,
        };
        let json = serde_json::to_value(&variant).unwrap();
        assert!(json["price"].is_null());
    }

    #[test]
    fn deserialize_tolerates_missing_optional_fields() {
        let json = r#"{"id": 1, "title": "T", "slug": "t"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.description, "");
        assert_eq!(product.thumbnail, None);
        assert!(product.active);
        assert!(product.variants.is_empty());
        assert!(product.images.is_empty());
    }

    #[test]
    fn deserialize_variant_defaults_currency() {
        let json = r#"{"id": 7, "name": "S", "sku": "SKU-7"}"#;
        let variant: Variant = serde_json::from_str(json).unwrap();
        assert_eq!(variant.currency, CURRENCY_CODE);
        assert_eq!(variant.price, None);
        assert_eq!(variant.stock, 0);
    }
}
