//! POS session — terminal-scoped state for checkout and scanning
//!
//! Owns the cart, the issuance context and a bounded local echo of
//! recently issued batches. The echo is lower-trust than the store: it is
//! consulted only when the store cannot answer (not found, or
//! unreachable), and a store-confirmed terminal state is never
//! overridden by it.

use shared::TicketingConfig;
use shared::models::{PaymentMode, Ticket, TicketStatus, scan_ticket_id};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cart::Cart;
use crate::error::StoreError;
use crate::issue::{IssueContext, IssueError, IssuedBatch, issue};
use crate::store::{DenyReason, TicketStore, VerifyResponse};
use crate::sync::SyncManager;

/// Recent batches kept for reprint lookups and the verification fallback
const ECHO_CAPACITY: usize = 32;

/// Reissue attempts before accepting a colliding batch as synced
const MAX_ISSUE_ATTEMPTS: u32 = 3;

/// Internal result of one persistence attempt.
enum PersistAttempt {
    Synced,
    /// Fresh batch reported as duplicate: an ID collision
    Collision,
    Queued,
}

/// How the issued batch reached (or failed to reach) the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Store confirmed the batch at issuance time.
    Synced,
    /// Persistence failed or timed out; the batch rides the offline queue.
    Queued,
}

/// Checkout result: the batch goes to the printer either way.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub batch: IssuedBatch,
    pub persistence: Persistence,
}

/// Scan verdict for the entrance UI. Every variant is terminal; no
/// ambiguous state reaches the operator.
#[derive(Debug)]
pub enum ScanOutcome {
    /// Entry granted. `unsynced` marks a provisional confirmation served
    /// from the local echo before the store has the ticket.
    Admitted { ticket: Ticket, unsynced: bool },
    /// Entry refused with the specific reason (and `usedAt` where known).
    Denied {
        reason: DenyReason,
        message: String,
        ticket: Option<Ticket>,
    },
    /// Unknown to both the store and the local echo.
    NotFound,
    /// Store unreachable and no local echo: entry stays blocked.
    Unavailable(StoreError),
}

/// One terminal's session state. An explicit value handed to the call
/// site, never a process-wide singleton.
pub struct PosSession {
    operator: String,
    config: TicketingConfig,
    store: Arc<dyn TicketStore>,
    sync: Arc<SyncManager>,
    persist_timeout: Duration,
    cart: Cart,
    recent: Mutex<VecDeque<IssuedBatch>>,
    /// Provisionally redeemed IDs (echo-admitted before the store knew
    /// the ticket); blocks a second provisional admission at this
    /// terminal.
    redeemed_locally: Mutex<HashSet<String>>,
}

impl PosSession {
    pub fn new(
        operator: impl Into<String>,
        config: TicketingConfig,
        store: Arc<dyn TicketStore>,
        sync: Arc<SyncManager>,
        persist_timeout: Duration,
    ) -> Self {
        Self {
            operator: operator.into(),
            config,
            store,
            sync,
            persist_timeout,
            cart: Cart::new(),
            recent: Mutex::new(VecDeque::new()),
            redeemed_locally: Mutex::new(HashSet::new()),
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn sync(&self) -> &Arc<SyncManager> {
        &self.sync
    }

    /// Batches still waiting to reach the store (operator display).
    pub fn pending_sync_count(&self) -> u64 {
        self.sync.pending_count().unwrap_or(0)
    }

    /// Issue the cart and hand the batch to the printing path. Printing
    /// never waits on the network: persistence gets one short-deadline
    /// attempt, then the batch rides the offline queue.
    ///
    /// A fresh batch that the store reports as (partly) duplicate means
    /// an ID collision with an existing ticket; the batch is reissued
    /// under a fresh master ID and retried, never treated as fatal.
    pub async fn checkout(
        &mut self,
        mobile: Option<String>,
        payment_mode: PaymentMode,
    ) -> Result<CheckoutOutcome, IssueError> {
        let ctx = IssueContext {
            mobile,
            payment_mode,
            operator: self.operator.clone(),
        };

        let mut batch = issue(self.cart.items(), &ctx, &self.config)?;
        let mut attempt = 1;
        let persistence = loop {
            match self.persist(&batch).await {
                PersistAttempt::Collision if attempt < MAX_ISSUE_ATTEMPTS => {
                    tracing::warn!(
                        master_id = %batch.master_id(),
                        attempt,
                        "Duplicate ID on fresh batch, reissuing"
                    );
                    batch = issue(self.cart.items(), &ctx, &self.config)?;
                    attempt += 1;
                }
                PersistAttempt::Synced | PersistAttempt::Collision => {
                    break Persistence::Synced;
                }
                PersistAttempt::Queued => break Persistence::Queued,
            }
        };

        self.cart.clear();
        self.remember(batch.clone());

        Ok(CheckoutOutcome { batch, persistence })
    }

    async fn persist(&self, batch: &IssuedBatch) -> PersistAttempt {
        let tickets = batch.tickets();
        match tokio::time::timeout(self.persist_timeout, self.store.create_many(&tickets)).await {
            Ok(Ok(ack)) if ack.duplicates > 0 => PersistAttempt::Collision,
            Ok(Ok(_)) => PersistAttempt::Synced,
            Ok(Err(e)) => {
                tracing::warn!(master_id = %batch.master_id(), error = %e, "Persistence failed, queuing batch");
                self.enqueue_or_log(batch, &tickets);
                PersistAttempt::Queued
            }
            Err(_) => {
                // The request may still land server-side after the
                // deadline; the store's duplicate tolerance makes the
                // replay harmless.
                tracing::warn!(master_id = %batch.master_id(), "Persistence timed out, queuing batch");
                self.enqueue_or_log(batch, &tickets);
                PersistAttempt::Queued
            }
        }
    }

    fn enqueue_or_log(&self, batch: &IssuedBatch, tickets: &[Ticket]) {
        if let Err(e) = self.sync.enqueue(batch.master_id(), tickets) {
            tracing::error!(master_id = %batch.master_id(), error = %e, "Failed to queue batch offline");
        }
    }

    fn remember(&self, batch: IssuedBatch) {
        let mut recent = self.recent.lock().expect("echo cache lock poisoned");
        if recent.len() == ECHO_CAPACITY {
            recent.pop_front();
        }
        recent.push_back(batch);
    }

    fn echo_lookup(&self, id: &str) -> Option<Ticket> {
        let recent = self.recent.lock().expect("echo cache lock poisoned");
        recent
            .iter()
            .rev()
            .find_map(|batch| batch.find(id).cloned())
    }

    /// Verify a scanned QR payload (raw ID or `{"id": ...}` JSON).
    pub async fn verify_scan(&self, payload: &str) -> ScanOutcome {
        let Some(id) = scan_ticket_id(payload) else {
            return ScanOutcome::NotFound;
        };

        match self.store.verify(&id).await {
            Ok(VerifyResponse::Verified { ticket }) => ScanOutcome::Admitted {
                ticket,
                unsynced: false,
            },
            Ok(VerifyResponse::Denied {
                reason,
                message,
                ticket,
            }) => ScanOutcome::Denied {
                reason,
                message,
                ticket,
            },
            Ok(VerifyResponse::NotFound) => self.provisional(&id),
            Err(e) => {
                // Bounded-timeout failure path: the echo can still admit a
                // just-issued ticket; anything else stays blocked.
                match self.provisional(&id) {
                    ScanOutcome::NotFound => ScanOutcome::Unavailable(e),
                    outcome => outcome,
                }
            }
        }
    }

    /// Provisional admission from the local echo, bridging the gap until
    /// the offline queue lands. The echoed confirmation is flagged
    /// `unsynced` so the operator knows it is not store-confirmed yet.
    fn provisional(&self, id: &str) -> ScanOutcome {
        let Some(ticket) = self.echo_lookup(id) else {
            return ScanOutcome::NotFound;
        };

        {
            let mut redeemed = self
                .redeemed_locally
                .lock()
                .expect("redeemed set lock poisoned");
            if !redeemed.insert(id.to_string()) {
                let mut shown = ticket.clone();
                shown.status = TicketStatus::Used;
                return ScanOutcome::Denied {
                    reason: DenyReason::AlreadyUsed,
                    message: "Ticket already used (pending sync)".to_string(),
                    ticket: Some(shown),
                };
            }
        }

        // Best-effort background flush so the store catches up; the queue
        // still holds the pristine batch.
        let sync = self.sync.clone();
        tokio::spawn(async move {
            let _ = sync.flush().await;
        });

        let mut shown = ticket;
        shown.status = TicketStatus::Used;
        shown.used_at = Some(shared::util::now_millis());
        ScanOutcome::Admitted {
            ticket: shown,
            unsynced: true,
        }
    }
}
