//! Catalog decoding: raw `products/{category}` bodies into [`Product`]s.

use stockview_core::Product;

use crate::error::DecodeError;
use crate::types::CatalogItem;

/// Decodes one catalog response body, preserving upstream order.
///
/// Every element must carry the full product shape; a single malformed
/// element fails the whole catalog. Any `availability` in the input is
/// discarded.
///
/// # Errors
///
/// Returns [`DecodeError::Json`] if the body is not JSON or any element does
/// not match the product shape.
pub fn decode_catalog(body: &[u8]) -> Result<Vec<Product>, DecodeError> {
    let items: Vec<CatalogItem> =
        serde_json::from_slice(body).map_err(|e| DecodeError::Json {
            context: "catalog".to_owned(),
            source: e,
        })?;

    Ok(items.into_iter().map(into_product).collect())
}

fn into_product(item: CatalogItem) -> Product {
    Product {
        id: item.id,
        kind: item.kind,
        name: item.name,
        colors: item.colors,
        price: item.price,
        manufacturer_name: item.manufacturer,
        availability: None,
    }
}
