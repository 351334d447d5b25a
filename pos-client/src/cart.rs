//! Cart state owned by a POS session
//!
//! An explicit value owned by its session, never a process-wide
//! singleton, so issuance stays testable without a UI attached.

use shared::models::LineItem;

/// In-progress cart at one terminal.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line; merges into an existing line for the same product at
    /// the same unit price.
    pub fn add(&mut self, item: LineItem) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id && i.unit_price == item.unit_price)
        {
            existing.quantity += item.quantity;
        } else {
            self.items.push(item);
        }
    }

    /// Remove every line for the given product. Returns whether anything
    /// was removed.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Cart total in whole rupees
    pub fn total(&self) -> i64 {
        self.items.iter().map(LineItem::line_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: &str, unit_price: i64, quantity: u32) -> LineItem {
        LineItem {
            product_id: product_id.to_string(),
            name: format!("Product {product_id}"),
            unit_price,
            quantity,
            is_combo: false,
        }
    }

    #[test]
    fn add_merges_same_product_same_price() {
        let mut cart = Cart::new();
        cart.add(line("7", 150, 1));
        cart.add(line("7", 150, 2));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total(), 450);
    }

    #[test]
    fn add_keeps_distinct_prices_separate() {
        let mut cart = Cart::new();
        cart.add(line("7", 150, 1));
        cart.add(line("7", 120, 1));
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.total(), 270);
    }

    #[test]
    fn remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(line("7", 150, 1));
        cart.add(line("9", 80, 1));
        assert!(cart.remove("7"));
        assert!(!cart.remove("7"));
        assert_eq!(cart.items().len(), 1);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0);
    }
}
