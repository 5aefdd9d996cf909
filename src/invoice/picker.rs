//! Catalog search used by the invoice editor's product picker.

use crate::Product;

use super::Invoice;

/// Case-insensitive substring match over product name or SKU. An empty or
/// whitespace-only query matches nothing (the picker starts blank and only
/// shows results once the user types). Catalog order is preserved.
pub fn search<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Vec::new();
    }
    products
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&q) || p.sku.to_lowercase().contains(&q))
        .collect()
}

/// Picks a search result into the invoice: appends a pre-filled row and
/// returns its id. The row is a snapshot; later catalog edits do not
/// propagate into it.
pub fn pick(invoice: &mut Invoice, product: &Product) -> String {
    invoice.add_product(product)
}
