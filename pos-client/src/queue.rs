//! redb-based durable offline queue
//!
//! When issuance-time persistence fails, the full batch (master plus all
//! sub-tickets) lands here and is replayed by the sync manager once
//! connectivity returns.
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `pending_batches` | master ticket ID | JSON-serialized `Vec<Ticket>` |
//!
//! redb commits with `Durability::Immediate`, so an enqueued batch
//! survives power loss on the terminal: the printed tickets in the
//! customer's hand always have a durable counterpart.

use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use shared::models::Ticket;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

const PENDING_BATCHES_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("pending_batches");

/// Queue storage errors
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type QueueResult<T> = Result<T, QueueError>;

/// A queued batch awaiting replay, keyed by its master ticket ID.
#[derive(Debug, Clone)]
pub struct PendingBatch {
    pub master_id: String,
    pub tickets: Vec<Ticket>,
}

/// Offline queue backed by redb
#[derive(Clone)]
pub struct OfflineQueue {
    db: Arc<Database>,
}

impl OfflineQueue {
    /// Open or create the queue database at the given path.
    pub fn open(path: impl AsRef<Path>) -> QueueResult<Self> {
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PENDING_BATCHES_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory queue (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> QueueResult<Self> {
        let db =
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PENDING_BATCHES_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Append a batch under its master ID. Re-enqueueing the same batch
    /// overwrites in place, so a retried checkout cannot double it.
    pub fn enqueue(&self, master_id: &str, tickets: &[Ticket]) -> QueueResult<()> {
        let value = serde_json::to_vec(tickets)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PENDING_BATCHES_TABLE)?;
            table.insert(master_id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// All pending batches in key order.
    pub fn pending(&self) -> QueueResult<Vec<PendingBatch>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PENDING_BATCHES_TABLE)?;

        let mut batches = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            let tickets: Vec<Ticket> = serde_json::from_slice(value.value())?;
            batches.push(PendingBatch {
                master_id: key.value().to_string(),
                tickets,
            });
        }
        Ok(batches)
    }

    /// Remove batches after a confirmed sync (or a poison-pill discard).
    pub fn remove(&self, master_ids: &[String]) -> QueueResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PENDING_BATCHES_TABLE)?;
            for id in master_ids {
                table.remove(id.as_str())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    pub fn contains(&self, master_id: &str) -> QueueResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PENDING_BATCHES_TABLE)?;
        Ok(table.get(master_id)?.is_some())
    }

    /// Number of batches waiting to reach the store.
    pub fn len(&self) -> QueueResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PENDING_BATCHES_TABLE)?;
        Ok(table.len()?)
    }

    pub fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{IssueContext, issue};
    use shared::TicketingConfig;
    use shared::models::{LineItem, PaymentMode};

    fn sample_batch() -> (String, Vec<Ticket>) {
        let cart = [LineItem {
            product_id: "7".to_string(),
            name: "Bumper Cars".to_string(),
            unit_price: 150,
            quantity: 2,
            is_combo: false,
        }];
        let ctx = IssueContext {
            mobile: None,
            payment_mode: PaymentMode::Cash,
            operator: "counter-1".to_string(),
        };
        let batch = issue(&cart, &ctx, &TicketingConfig::default()).unwrap();
        (batch.master_id().to_string(), batch.tickets())
    }

    #[test]
    fn enqueue_pending_remove_roundtrip() {
        let queue = OfflineQueue::open_in_memory().unwrap();
        assert!(queue.is_empty().unwrap());

        let (master_id, tickets) = sample_batch();
        queue.enqueue(&master_id, &tickets).unwrap();

        assert_eq!(queue.len().unwrap(), 1);
        assert!(queue.contains(&master_id).unwrap());

        let pending = queue.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].master_id, master_id);
        assert_eq!(pending[0].tickets.len(), 3);
        assert_eq!(pending[0].tickets[0].id, master_id);

        queue.remove(&[master_id.clone()]).unwrap();
        assert!(queue.is_empty().unwrap());
        assert!(!queue.contains(&master_id).unwrap());
    }

    #[test]
    fn re_enqueue_overwrites_instead_of_duplicating() {
        let queue = OfflineQueue::open_in_memory().unwrap();
        let (master_id, tickets) = sample_batch();

        queue.enqueue(&master_id, &tickets).unwrap();
        queue.enqueue(&master_id, &tickets).unwrap();

        assert_eq!(queue.len().unwrap(), 1);
    }

    #[test]
    fn queue_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.redb");
        let (master_id, tickets) = sample_batch();

        {
            let queue = OfflineQueue::open(&path).unwrap();
            queue.enqueue(&master_id, &tickets).unwrap();
        }

        let queue = OfflineQueue::open(&path).unwrap();
        let pending = queue.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].master_id, master_id);
    }
}
