//! Text and JSON rendering of reconciled pages.

use std::fmt::Write as _;

use serde_json::json;
use stockview_core::Product;
use stockview_engine::Reconciliation;

const MISSING: &str = "-";

/// Renders a page as fixed-width text with a one-line header and footer.
pub(crate) fn page_table(category: &str, page: &Reconciliation) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{category}: page {} of {} ({} products)",
        page.page, page.total_page_count, page.total_items
    );
    if page.items.is_empty() {
        out.push_str("  (no products on this page)\n");
        return out;
    }

    let id_width = column_width(&page.items, |p| p.id.len(), "ID");
    let name_width = column_width(&page.items, |p| p.name.len(), "NAME");
    let maker_width = column_width(&page.items, |p| p.manufacturer_name.len(), "MANUFACTURER");
    let _ = writeln!(
        out,
        "  {:<id_width$}  {:<name_width$}  {:<maker_width$}  {:>8}  {:<14}  COLORS",
        "ID", "NAME", "MANUFACTURER", "PRICE", "AVAILABILITY"
    );
    for product in &page.items {
        let _ = writeln!(
            out,
            "  {:<id_width$}  {:<name_width$}  {:<maker_width$}  {:>8.2}  {:<14}  {}",
            product.id,
            product.name,
            product.manufacturer_name,
            product.price,
            product.availability.as_deref().unwrap_or(MISSING),
            product.colors.join(", ")
        );
    }
    out
}

/// Renders a page as a JSON document. Products keep their upstream field
/// names; `availability` is omitted when unknown.
pub(crate) fn page_json(category: &str, page: &Reconciliation) -> serde_json::Value {
    let failures: Vec<serde_json::Value> = page
        .manufacturer_failures
        .iter()
        .map(|failure| {
            json!({
                "manufacturer": failure.manufacturer(),
                "error": failure.to_string(),
            })
        })
        .collect();
    json!({
        "category": category,
        "page": page.page,
        "totalPageCount": page.total_page_count,
        "totalItems": page.total_items,
        "items": page.items,
        "manufacturerFailures": failures,
    })
}

fn column_width(items: &[Product], len: impl Fn(&Product) -> usize, header: &str) -> usize {
    items.iter().map(len).max().unwrap_or(0).max(header.len())
}
