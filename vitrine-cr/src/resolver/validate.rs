//! Output validation
//!
//! Maps raw product-like records onto [`Product`], filling type-correct
//! defaults for anything missing or invalid. Records carrying neither an id
//! nor a name are dropped individually; the rest of the batch survives.

use super::fields::{self, as_text, first, first_string};
use serde_json::Value;
use vitrine_common::models::DEFAULT_SIZE;
use vitrine_common::Product;

/// Name used when a record has an id but no name
pub const UNNAMED_PRODUCT: &str = "Produto";

/// Parse a price from a number or a localized string (`"R$ 1.299,90"`)
///
/// Negative, non-finite or unparseable values become 0.
pub fn parse_price(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_decimal_text(s),
        _ => None,
    };
    match parsed {
        Some(p) if p.is_finite() && p >= 0.0 => p,
        _ => 0.0,
    }
}

fn parse_decimal_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    // With both separators the last one is the decimal mark
    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if is_thousands_grouping(&cleaned, ',') => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(_)) if is_thousands_grouping(&cleaned, '.') => cleaned.replace('.', ""),
        _ => cleaned,
    };
    normalized.parse().ok()
}

/// A lone separator is a thousands mark when it repeats or is followed by
/// exactly three digits ("1.299", "1.299.000")
fn is_thousands_grouping(text: &str, separator: char) -> bool {
    let mut groups = text.split(separator);
    let Some(lead) = groups.next() else {
        return false;
    };
    let rest: Vec<&str> = groups.collect();
    let lead_digits = lead.trim_start_matches('-');
    !lead_digits.is_empty()
        && lead_digits.len() <= 3
        && !rest.is_empty()
        && rest.iter().all(|group| group.len() == 3)
        && (rest.len() > 1 || separator == '.')
}

/// String list from an array (strings or numbers) or a comma-separated string
fn string_list(value: Option<&Value>) -> Vec<String> {
    let mut items: Vec<String> = match value {
        Some(Value::Array(values)) => values.iter().filter_map(as_text).collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
    items
}

fn image_url(obj: &Value) -> Option<String> {
    first_string(obj, fields::PRODUCT_IMAGE).or_else(|| {
        fields::PRODUCT_IMAGE_LISTS
            .iter()
            .filter_map(|key| obj.get(*key))
            .filter_map(Value::as_array)
            .find_map(|images| images.iter().find_map(as_text))
    })
}

fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Map one raw record; `None` when it has neither id nor name
pub fn normalize_product(raw: &Value) -> Option<Product> {
    if !raw.is_object() {
        return None;
    }

    let id = first_string(raw, fields::PRODUCT_ID);
    let name = first_string(raw, fields::PRODUCT_NAME);
    let (id, name) = match (id, name) {
        (None, None) => return None,
        (Some(id), Some(name)) => (id, name),
        (Some(id), None) => (id, UNNAMED_PRODUCT.to_string()),
        (None, Some(name)) => {
            let id = slug(&name);
            (if id.is_empty() { name.clone() } else { id }, name)
        }
    };

    let mut sizes = string_list(first(raw, fields::PRODUCT_SIZES));
    if sizes.is_empty() {
        sizes.push(DEFAULT_SIZE.to_string());
    }

    let discount_percent = parse_price(first(raw, fields::PRODUCT_DISCOUNT)).min(100.0);

    Some(Product {
        id,
        name,
        price: parse_price(first(raw, fields::PRODUCT_PRICE)),
        image_url: image_url(raw),
        category: first_string(raw, fields::PRODUCT_CATEGORY),
        sizes,
        colors: string_list(first(raw, fields::PRODUCT_COLORS)),
        discount_percent,
        description: first_string(raw, fields::PRODUCT_DESCRIPTION),
    })
}

/// Map a batch, dropping invalid records and duplicate ids (first wins)
pub fn normalize_products(raw: &[Value]) -> Vec<Product> {
    let mut products: Vec<Product> = Vec::with_capacity(raw.len());
    for record in raw {
        match normalize_product(record) {
            Some(product) if products.iter().any(|p| p.id == product.id) => {
                tracing::debug!(product_id = %product.id, "Dropping duplicate product");
            }
            Some(product) => products.push(product),
            None => {
                tracing::debug!("Dropping product record without id or name");
            }
        }
    }
    products
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_portuguese_record() {
        let product = normalize_product(&json!({"id": "p1", "nome": "Vestido", "preco": 199.9})).unwrap();

        assert_eq!(product.id, "p1");
        assert_eq!(product.name, "Vestido");
        assert_eq!(product.price, 199.9);
        assert_eq!(product.sizes, vec!["Único"]);
        assert!(product.colors.is_empty());
        assert_eq!(product.discount_percent, 0.0);
        assert!(product.image_url.is_none());
    }

    #[test]
    fn test_full_english_record() {
        let product = normalize_product(&json!({
            "id": "p2",
            "name": "Cinto",
            "price": "49.5",
            "imageUrl": "https://cdn/cinto.png",
            "category": "Acessórios",
            "sizes": ["P", "M", "M"],
            "colors": "preto, marrom",
            "discountPercent": 10,
            "description": "Couro"
        }))
        .unwrap();

        assert_eq!(product.price, 49.5);
        assert_eq!(product.image_url.as_deref(), Some("https://cdn/cinto.png"));
        assert_eq!(product.category.as_deref(), Some("Acessórios"));
        assert_eq!(product.sizes, vec!["P", "M"]);
        assert_eq!(product.colors, vec!["preto", "marrom"]);
        assert_eq!(product.discount_percent, 10.0);
        assert_eq!(product.description.as_deref(), Some("Couro"));
    }

    #[test]
    fn test_price_parsing() {
        assert_eq!(parse_price(Some(&json!("R$ 199,90"))), 199.9);
        assert_eq!(parse_price(Some(&json!("1.299,90"))), 1299.9);
        assert_eq!(parse_price(Some(&json!("1,299.90"))), 1299.9);
        assert_eq!(parse_price(Some(&json!("R$ 1.299"))), 1299.0);
        assert_eq!(parse_price(Some(&json!("1.299.000"))), 1299000.0);
        assert_eq!(parse_price(Some(&json!("19.90"))), 19.9);
        assert_eq!(parse_price(Some(&json!("0.5"))), 0.5);
        assert_eq!(parse_price(Some(&json!("1,299,000"))), 1299000.0);
        assert_eq!(parse_price(Some(&json!("1,299"))), 1.299);
        assert_eq!(parse_price(Some(&json!(-5))), 0.0);
        assert_eq!(parse_price(Some(&json!("grátis"))), 0.0);
        assert_eq!(parse_price(Some(&json!(null))), 0.0);
        assert_eq!(parse_price(None), 0.0);
    }

    #[test]
    fn test_image_from_list() {
        let product = normalize_product(&json!({"id": "p3", "imagens": ["", "https://cdn/a.png"]})).unwrap();
        assert_eq!(product.image_url.as_deref(), Some("https://cdn/a.png"));
        assert_eq!(product.name, UNNAMED_PRODUCT);
    }

    #[test]
    fn test_missing_id_uses_name_slug() {
        let product = normalize_product(&json!({"nome": "Vestido Longo Azul"})).unwrap();
        assert_eq!(product.id, "vestido-longo-azul");
    }

    #[test]
    fn test_discount_clamped() {
        let product = normalize_product(&json!({"id": "p4", "desconto": 250})).unwrap();
        assert_eq!(product.discount_percent, 100.0);
    }

    #[test]
    fn test_batch_drops_invalid_and_duplicates() {
        let raw = vec![
            json!({"id": "p1", "nome": "Vestido"}),
            json!({"preco": 10}),
            json!("p9"),
            json!({"id": "p1", "nome": "Outro"}),
            json!({"id": "p2", "nome": "Cinto"}),
        ];
        let products = normalize_products(&raw);
        let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();

        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(products[0].name, "Vestido");
    }
}
