//! Test doubles shared by the unit tests

use async_trait::async_trait;
use shared::models::{Ticket, TicketStatus};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::error::{StoreError, StoreResult};
use crate::store::{BulkCreateResponse, DenyReason, TicketStore, VerifyResponse};

/// In-memory [`TicketStore`] with failure injection. Mirrors the gate
/// server's contract: duplicate-tolerant bulk insert, single-use verify.
pub struct MemoryTicketStore {
    tickets: Mutex<BTreeMap<String, Ticket>>,
    fail_transport: AtomicBool,
    fail_rejected: AtomicBool,
    duplicate_next: AtomicBool,
    gate: Mutex<Option<Arc<Semaphore>>>,
    inflight: AtomicUsize,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self {
            tickets: Mutex::new(BTreeMap::new()),
            fail_transport: AtomicBool::new(false),
            fail_rejected: AtomicBool::new(false),
            duplicate_next: AtomicBool::new(false),
            gate: Mutex::new(None),
            inflight: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.tickets.lock().unwrap().len()
    }

    pub fn get_ticket(&self, id: &str) -> Option<Ticket> {
        self.tickets.lock().unwrap().get(id).cloned()
    }

    pub fn fail_transport(&self, on: bool) {
        self.fail_transport.store(on, Ordering::SeqCst);
    }

    pub fn fail_rejected(&self, on: bool) {
        self.fail_rejected.store(on, Ordering::SeqCst);
    }

    /// Make the next `create_many` report the whole batch as duplicate
    /// without storing anything (simulates an ID collision).
    pub fn duplicate_next_create(&self) {
        self.duplicate_next.store(true, Ordering::SeqCst);
    }

    /// Park subsequent `create_many` calls until a permit is added to the
    /// returned semaphore.
    pub fn hold_creates(&self) -> Arc<Semaphore> {
        let sem = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(sem.clone());
        sem
    }

    /// Wait until at least one store call is parked on the gate.
    pub async fn wait_for_inflight(&self) {
        while self.inflight.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    fn check_fail(&self) -> Result<(), StoreError> {
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(StoreError::Transport(
                "simulated connection failure".to_string(),
            ));
        }
        if self.fail_rejected.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected {
                status: 400,
                message: "simulated malformed batch".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn create_many(&self, tickets: &[Ticket]) -> StoreResult<BulkCreateResponse> {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            self.inflight.fetch_add(1, Ordering::SeqCst);
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
            self.inflight.fetch_sub(1, Ordering::SeqCst);
        }

        self.check_fail()?;

        if self.duplicate_next.swap(false, Ordering::SeqCst) {
            return Ok(BulkCreateResponse {
                inserted: 0,
                duplicates: tickets.len() as u64,
            });
        }

        let mut map = self.tickets.lock().unwrap();
        let mut inserted = 0u64;
        let mut duplicates = 0u64;
        for ticket in tickets {
            if map.contains_key(&ticket.id) {
                duplicates += 1;
            } else {
                map.insert(ticket.id.clone(), ticket.clone());
                inserted += 1;
            }
        }
        Ok(BulkCreateResponse {
            inserted,
            duplicates,
        })
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Ticket>> {
        self.check_fail()?;
        Ok(self.get_ticket(id))
    }

    async fn verify(&self, id: &str) -> StoreResult<VerifyResponse> {
        self.check_fail()?;

        let mut map = self.tickets.lock().unwrap();
        let Some(ticket) = map.get_mut(id) else {
            return Ok(VerifyResponse::NotFound);
        };
        match ticket.status {
            TicketStatus::Used => Ok(VerifyResponse::Denied {
                reason: DenyReason::AlreadyUsed,
                message: "Ticket already used".to_string(),
                ticket: Some(ticket.clone()),
            }),
            TicketStatus::Invalid => Ok(VerifyResponse::Denied {
                reason: DenyReason::Invalid,
                message: "Ticket invalid".to_string(),
                ticket: Some(ticket.clone()),
            }),
            TicketStatus::Valid => {
                ticket.status = TicketStatus::Used;
                ticket.used_at = Some(shared::util::now_millis());
                Ok(VerifyResponse::Verified {
                    ticket: ticket.clone(),
                })
            }
        }
    }
}
