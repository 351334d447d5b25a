//! Domain Models

mod cart;
mod ticket;

pub use cart::LineItem;
pub use ticket::{PaymentMode, Ticket, TicketItem, TicketStatus, scan_ticket_id};
