//! Ticket store access — the seam between the terminal and the gate server
//!
//! Everything the terminal needs from the store goes through the
//! [`TicketStore`] trait; production uses the HTTP implementation, tests
//! swap in an in-memory one with failure injection.

mod http;

pub use http::HttpTicketStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::Ticket;

use crate::error::StoreResult;

/// Bulk create acknowledgement. `duplicates` were already present on the
/// store: idempotent success for offline replays, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCreateResponse {
    pub inserted: u64,
    pub duplicates: u64,
}

/// Why a redemption was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    AlreadyUsed,
    Expired,
    Invalid,
}

/// Redemption result as reported by the store.
#[derive(Debug, Clone)]
pub enum VerifyResponse {
    /// Ticket admitted; the store flipped it to `used`.
    Verified { ticket: Ticket },
    /// Terminal state, entry refused. `ticket` carries `usedAt` for the
    /// operator display where available.
    Denied {
        reason: DenyReason,
        message: String,
        ticket: Option<Ticket>,
    },
    /// Unknown to the store, possibly an offline issuance that has not
    /// synced yet; the session falls back to its local echo.
    NotFound,
}

/// Gate-server ticket store operations used by the terminal.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Bulk-persist a batch. Duplicate IDs count as success.
    async fn create_many(&self, tickets: &[Ticket]) -> StoreResult<BulkCreateResponse>;

    async fn get(&self, id: &str) -> StoreResult<Option<Ticket>>;

    /// Run the single-use redemption state machine for one ticket ID.
    async fn verify(&self, id: &str) -> StoreResult<VerifyResponse>;
}
