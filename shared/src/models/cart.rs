//! Cart line items — POS input to ticket issuance

use serde::{Deserialize, Serialize};

/// One cart line as rung up at the terminal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product reference (catalog code)
    pub product_id: String,
    pub name: String,
    /// Price per unit in whole rupees
    pub unit_price: i64,
    pub quantity: u32,
    /// True for multi-ride combo passes, which fan out into fixed-value
    /// ride coupons at issuance
    pub is_combo: bool,
}

impl LineItem {
    /// Line total (`unit_price x quantity`)
    pub fn line_total(&self) -> i64 {
        self.unit_price * self.quantity as i64
    }
}
