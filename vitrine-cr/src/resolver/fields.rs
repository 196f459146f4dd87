//! Field synonym tables and typed views over raw documents
//!
//! The stored records went through several schema revisions, so the same
//! attribute appears under different keys. Each table lists the accepted
//! keys in lookup order; the first present, non-empty key wins.

use crate::store::Document;
use serde_json::Value;

pub const PRODUCT_ID: &[&str] = &["id", "productId", "produtoId", "_id"];
pub const PRODUCT_NAME: &[&str] = &["name", "nome", "title", "titulo", "productName", "produtoNome"];
pub const PRODUCT_PRICE: &[&str] = &["price", "preco", "valor"];
pub const PRODUCT_IMAGE: &[&str] = &["imageUrl", "imagemUrl", "image", "imagem", "foto", "fotoUrl", "thumbnail"];
pub const PRODUCT_IMAGE_LISTS: &[&str] = &["images", "imagens"];
pub const PRODUCT_CATEGORY: &[&str] = &["category", "categoria"];
pub const PRODUCT_SIZES: &[&str] = &["sizes", "tamanhos"];
pub const PRODUCT_COLORS: &[&str] = &["colors", "cores"];
pub const PRODUCT_DISCOUNT: &[&str] = &["discountPercent", "desconto", "descontoPercentual", "discount"];
pub const PRODUCT_DESCRIPTION: &[&str] = &["description", "descricao"];

pub const EMBEDDED_PRODUCTS: &[&str] = &["products", "produtos", "items"];
pub const PRODUCT_ID_LISTS: &[&str] = &["productIds", "produtoIds", "registeredProductIds"];
pub const RECORD_IMAGES: &[&str] = &[
    "imageUrl",
    "generatedImageUrl",
    "resultImageUrl",
    "imagemUrl",
    "outputUrl",
    "url",
];
pub const COMPOSITION_REF: &[&str] = &["compositionId", "composicaoId"];
/// Owner fields on legacy flat records, in precedence order
pub const RECORD_OWNER: &[&str] = &["storeId", "lojaId"];
pub const FAVORITE_PRODUCT_NAME: &[&str] = &["produtoNome", "productName", "nome", "name"];

/// First present, non-null value among `keys`
pub fn first<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null())
}

/// First non-blank string among `keys`; numbers are accepted and stringified
pub fn first_string(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|key| obj.get(*key)).find_map(as_text)
}

/// Non-blank text form of a string or number value
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Id of a product reference given either as a bare id or as an object
fn reference_id(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => first_string(value, PRODUCT_ID),
        other => as_text(other),
    }
}

/// Product references extracted from a composition or job record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductRefs {
    /// Embedded product-like objects
    pub embedded: Vec<Value>,
    /// Bare product ids, in record order, without duplicates
    pub ids: Vec<String>,
}

impl ProductRefs {
    /// Collect embedded products and id lists from a record
    ///
    /// Bare strings inside an embedded list are treated as ids.
    pub fn from_record(body: &Value) -> Self {
        let mut refs = ProductRefs::default();

        for key in EMBEDDED_PRODUCTS {
            if let Some(Value::Array(items)) = body.get(*key) {
                for item in items {
                    match item {
                        Value::Object(_) => refs.embedded.push(item.clone()),
                        other => {
                            if let Some(id) = as_text(other) {
                                refs.push_id(id);
                            }
                        }
                    }
                }
                if !refs.embedded.is_empty() {
                    break;
                }
            }
        }

        for key in PRODUCT_ID_LISTS {
            if let Some(Value::Array(items)) = body.get(*key) {
                for item in items {
                    if let Some(id) = reference_id(item) {
                        refs.push_id(id);
                    }
                }
            }
        }

        refs
    }

    fn push_id(&mut self, id: String) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }
}

/// Every image URL a record carries
pub fn record_image_urls(body: &Value) -> Vec<&str> {
    RECORD_IMAGES
        .iter()
        .filter_map(|key| body.get(*key))
        .filter_map(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Composition record
#[derive(Debug, Clone)]
pub struct Composition {
    pub id: String,
    pub refs: ProductRefs,
    pub image_urls: Vec<String>,
}

impl From<&Document> for Composition {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            refs: ProductRefs::from_record(&doc.body),
            image_urls: record_image_urls(&doc.body).into_iter().map(str::to_string).collect(),
        }
    }
}

/// Generation job record
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub id: String,
    pub composition_id: Option<String>,
    pub refs: ProductRefs,
    pub image_urls: Vec<String>,
}

impl From<&Document> for GenerationJob {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            composition_id: first_string(&doc.body, COMPOSITION_REF),
            refs: ProductRefs::from_record(&doc.body),
            image_urls: record_image_urls(&doc.body).into_iter().map(str::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_string_skips_blank() {
        let obj = json!({"name": "  ", "nome": "Vestido"});
        assert_eq!(first_string(&obj, PRODUCT_NAME), Some("Vestido".to_string()));
    }

    #[test]
    fn test_first_string_accepts_numbers() {
        let obj = json!({"id": 42});
        assert_eq!(first_string(&obj, PRODUCT_ID), Some("42".to_string()));
    }

    #[test]
    fn test_refs_embedded_and_ids() {
        let body = json!({
            "products": [{"id": "p1", "nome": "Vestido"}, "p2"],
            "productIds": ["p2", "p3"],
            "registeredProductIds": [{"id": "p4"}]
        });
        let refs = ProductRefs::from_record(&body);

        assert_eq!(refs.embedded.len(), 1);
        assert_eq!(refs.ids, vec!["p2", "p3", "p4"]);
    }

    #[test]
    fn test_refs_empty_record() {
        let refs = ProductRefs::from_record(&json!({"imageUrl": "x.png"}));
        assert_eq!(refs, ProductRefs::default());
    }

    #[test]
    fn test_record_image_urls() {
        let body = json!({"imageUrl": "a.png", "generatedImageUrl": "", "url": "b.png", "outputUrl": 3});
        assert_eq!(record_image_urls(&body), vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_job_view() {
        let doc = Document {
            id: "j1".to_string(),
            body: json!({"composicaoId": "c1", "imageUrl": "x.png"}),
        };
        let job = GenerationJob::from(&doc);
        assert_eq!(job.composition_id.as_deref(), Some("c1"));
        assert_eq!(job.image_urls, vec!["x.png"]);
        assert!(job.refs.embedded.is_empty());
    }
}
