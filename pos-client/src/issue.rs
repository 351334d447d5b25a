//! Ticket Issuance Engine
//!
//! Turns a cart into one master accounting record plus the individually
//! redeemable sub-tickets that get printed. Pure apart from ID and
//! timestamp generation; persistence is the store's and sync manager's
//! job. That purity is what makes reissue-on-reprint safe: a reprint
//! re-runs issuance under a fresh master ID instead of resending the
//! original, so every physical slip stays traceable to one issuance.

use serde::{Deserialize, Serialize};
use shared::TicketingConfig;
use shared::models::{LineItem, PaymentMode, Ticket, TicketItem, TicketStatus};
use thiserror::Error;

/// Issuance-time context denormalized onto every ticket of the batch.
#[derive(Debug, Clone)]
pub struct IssueContext {
    /// Customer phone, loyalty correlation only
    pub mobile: Option<String>,
    pub payment_mode: PaymentMode,
    /// Operator identity (`created_by` on the tickets)
    pub operator: String,
}

/// One issued batch: the master accounting record plus its sub-tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedBatch {
    pub master: Ticket,
    pub sub_tickets: Vec<Ticket>,
}

impl IssuedBatch {
    /// All tickets in persistence order, master first.
    pub fn tickets(&self) -> Vec<Ticket> {
        let mut all = Vec::with_capacity(1 + self.sub_tickets.len());
        all.push(self.master.clone());
        all.extend(self.sub_tickets.iter().cloned());
        all
    }

    pub fn master_id(&self) -> &str {
        &self.master.id
    }

    pub fn len(&self) -> usize {
        1 + self.sub_tickets.len()
    }

    pub fn find(&self, id: &str) -> Option<&Ticket> {
        if self.master.id == id {
            return Some(&self.master);
        }
        self.sub_tickets.iter().find(|t| t.id == id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IssueError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("line item {product_id}: quantity must be at least 1")]
    ZeroQuantity { product_id: String },

    #[error("line item {product_id}: negative unit price")]
    NegativePrice { product_id: String },
}

/// Expand a cart into the exact ticket set to persist and print.
///
/// The master carries the full cart snapshot and the sale total; each
/// sub-ticket admits one ride/entry. Combo lines fan out into
/// `quantity x combo_multiplier` coupons at the fixed face value,
/// intentionally not a slice of the combo's purchase price.
pub fn issue(
    cart: &[LineItem],
    ctx: &IssueContext,
    cfg: &TicketingConfig,
) -> Result<IssuedBatch, IssueError> {
    if cart.is_empty() {
        return Err(IssueError::EmptyCart);
    }
    for line in cart {
        if line.quantity < 1 {
            return Err(IssueError::ZeroQuantity {
                product_id: line.product_id.clone(),
            });
        }
        if line.unit_price < 0 {
            return Err(IssueError::NegativePrice {
                product_id: line.product_id.clone(),
            });
        }
    }

    let master_id = shared::util::txn_id();
    // One timestamp for the whole batch
    let created_at = shared::util::now_millis();
    let date = shared::util::venue_date_string(created_at, cfg.timezone);

    let items: Vec<TicketItem> = cart
        .iter()
        .map(|line| TicketItem {
            id: line.product_id.clone(),
            name: line.name.clone(),
            price: line.unit_price,
            quantity: line.quantity,
        })
        .collect();

    let master = Ticket {
        id: master_id.clone(),
        amount: cart.iter().map(LineItem::line_total).sum(),
        date,
        items,
        status: TicketStatus::Valid,
        mobile: ctx.mobile.clone(),
        payment_mode: ctx.payment_mode,
        created_by: ctx.operator.clone(),
        created_at,
        used_at: None,
        parent_id: None,
        is_coupon: false,
    };

    // One running index across the whole cart (line-item order, then
    // per-unit order) so sub-ticket IDs within a master can never
    // collide, whatever the line mix, and a reprint reproduces the same
    // shape under a fresh master ID.
    let mut sub_tickets = Vec::new();
    let mut index = 0u32;
    for line in cart {
        let snapshot = vec![TicketItem {
            id: line.product_id.clone(),
            name: line.name.clone(),
            price: line.unit_price,
            quantity: 1,
        }];
        if line.is_combo {
            for _ in 0..line.quantity * cfg.combo_multiplier {
                index += 1;
                sub_tickets.push(sub_ticket(
                    &master,
                    format!("{master_id}-C{index}"),
                    cfg.coupon_face_value,
                    snapshot.clone(),
                    true,
                ));
            }
        } else {
            for _ in 0..line.quantity {
                index += 1;
                sub_tickets.push(sub_ticket(
                    &master,
                    format!("{master_id}-R{index}"),
                    line.unit_price,
                    snapshot.clone(),
                    false,
                ));
            }
        }
    }

    Ok(IssuedBatch {
        master,
        sub_tickets,
    })
}

fn sub_ticket(
    master: &Ticket,
    id: String,
    amount: i64,
    items: Vec<TicketItem>,
    is_coupon: bool,
) -> Ticket {
    Ticket {
        id,
        amount,
        date: master.date.clone(),
        items,
        status: TicketStatus::Valid,
        mobile: master.mobile.clone(),
        payment_mode: master.payment_mode,
        created_by: master.created_by.clone(),
        created_at: master.created_at,
        used_at: None,
        parent_id: Some(master.id.clone()),
        is_coupon,
    }
}
