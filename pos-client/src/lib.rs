//! POS Client — terminal-side ticketing library
//!
//! Expands a cart into printable tickets, persists them to the gate
//! server, and degrades to a durable offline queue when the network is
//! down. Printing never waits on persistence; the queue replays once
//! connectivity returns.

pub mod cart;
pub mod config;
pub mod error;
pub mod issue;
pub mod queue;
pub mod session;
pub mod store;
pub mod sync;

pub use cart::Cart;
pub use config::ClientConfig;
pub use error::{StoreError, StoreResult};
pub use issue::{IssueContext, IssueError, IssuedBatch, issue};
pub use queue::{OfflineQueue, PendingBatch, QueueError, QueueResult};
pub use session::{CheckoutOutcome, Persistence, PosSession, ScanOutcome};
pub use store::{BulkCreateResponse, DenyReason, HttpTicketStore, TicketStore, VerifyResponse};
pub use sync::{FlushOutcome, SyncManager};

#[cfg(test)]
pub(crate) mod testing;
