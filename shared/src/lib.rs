//! Shared types for the venue ticketing stack.
//!
//! Domain models, the venue ticketing configuration and small helpers
//! used by both the POS terminal client and the gate server.

pub mod config;
pub mod models;
pub mod util;

pub use config::TicketingConfig;
pub use models::{LineItem, PaymentMode, Ticket, TicketItem, TicketStatus, scan_ticket_id};
