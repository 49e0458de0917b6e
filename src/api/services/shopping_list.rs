//! Shopping list rendering.

use crate::storage::shopping_cart::ShoppingListItem;

/// Filename offered in the Content-Disposition header of the download.
pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.txt";

/// Render aggregated cart items as the plain-text download body, one
/// ingredient per line.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "{} ({}) - {}",
                item.name, item.measurement_unit, item.total_amount
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
