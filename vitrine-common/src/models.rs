//! Catalog product shape shared by every Vitrine service

use serde::{Deserialize, Serialize};

/// Size label used when a product lists no sizes
pub const DEFAULT_SIZE: &str = "Único";

/// Catalog product as returned to callers
///
/// Every field is always present on the wire. Optional fields serialize as
/// `null` rather than being omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product identifier (unique within a store)
    pub id: String,
    /// Display name
    pub name: String,
    /// Unit price, never negative
    #[serde(default)]
    pub price: f64,
    /// Primary product image
    #[serde(default)]
    pub image_url: Option<String>,
    /// Catalog category
    #[serde(default)]
    pub category: Option<String>,
    /// Available sizes, never empty
    #[serde(default = "default_sizes")]
    pub sizes: Vec<String>,
    /// Available colors, possibly empty
    #[serde(default)]
    pub colors: Vec<String>,
    /// Discount in percent (0-100)
    #[serde(default)]
    pub discount_percent: f64,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
}

fn default_sizes() -> Vec<String> {
    vec![DEFAULT_SIZE.to_string()]
}

impl Product {
    /// Create a product with every optional field at its default
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: 0.0,
            image_url: None,
            category: None,
            sizes: default_sizes(),
            colors: Vec::new(),
            discount_percent: 0.0,
            description: None,
        }
    }

    /// Set the product image
    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_product_has_defaults() {
        let product = Product::new("p1", "Vestido");
        assert_eq!(product.price, 0.0);
        assert_eq!(product.sizes, vec!["Único".to_string()]);
        assert!(product.colors.is_empty());
        assert_eq!(product.discount_percent, 0.0);
    }

    #[test]
    fn test_optional_fields_serialize_as_null() {
        let value = serde_json::to_value(Product::new("p1", "Vestido")).unwrap();
        let obj = value.as_object().unwrap();

        for key in ["imageUrl", "category", "description"] {
            assert!(obj.contains_key(key), "missing key {}", key);
            assert!(obj[key].is_null());
        }
        assert_eq!(value["discountPercent"], json!(0.0));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let product: Product = serde_json::from_value(json!({"id": "p2", "name": "Cinto"})).unwrap();
        assert_eq!(product.sizes, vec!["Único".to_string()]);
        assert!(product.image_url.is_none());
    }
}
