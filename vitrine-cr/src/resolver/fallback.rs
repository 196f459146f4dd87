//! Fallback synthesis
//!
//! When no strategy finds real products, the caller still gets something to
//! render: placeholder products named after a favorite-record hint (split on
//! `+` when it lists several items) or a generic name, carrying the image
//! hint so the artifact is never shown blank.

use vitrine_common::Product;

/// Name used when no hint is available
pub const GENERIC_PLACEHOLDER_NAME: &str = "Produto da composição";

/// Separator joining several product names in one hint
pub const MULTI_ITEM_SEPARATOR: char = '+';

/// Split a name hint into individual item names
pub fn split_name_hint(hint: &str) -> Vec<String> {
    hint.split(MULTI_ITEM_SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build placeholder products for a composition
///
/// Always returns at least one product.
pub fn synthesize(
    composition_id: &str,
    name_hint: Option<&str>,
    image_url_hint: Option<&str>,
) -> Vec<Product> {
    let mut names = name_hint.map(split_name_hint).unwrap_or_default();
    if names.is_empty() {
        names.push(GENERIC_PLACEHOLDER_NAME.to_string());
    }

    let image_url = image_url_hint
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            Product::new(format!("{}-fallback-{}", composition_id, index + 1), name)
                .with_image_url(image_url.clone())
        })
        .collect()
}
