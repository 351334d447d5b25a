//! Ticket Repository
//!
//! Tickets are written once at issuance (or offline replay), flipped once
//! by redemption, and otherwise immutable. The bulk insert path treats
//! duplicate IDs as "already synced" so queue replays stay idempotent;
//! the single insert path rejects them.

use super::{RepoError, RepoResult};
use shared::models::{PaymentMode, Ticket, TicketItem, TicketStatus};
use sqlx::SqlitePool;

const TICKET_SELECT: &str = "SELECT id, amount, date, items, status, mobile, payment_mode, created_by, created_at, used_at, parent_id, is_coupon FROM ticket";

const TICKET_INSERT: &str = "INSERT INTO ticket (id, amount, date, items, status, mobile, payment_mode, created_by, created_at, used_at, parent_id, is_coupon) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

const TICKET_INSERT_OR_IGNORE: &str = "INSERT OR IGNORE INTO ticket (id, amount, date, items, status, mobile, payment_mode, created_by, created_at, used_at, parent_id, is_coupon) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

/// Flat row shape; `items` holds the JSON snapshot.
#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: String,
    amount: i64,
    date: String,
    items: String,
    status: String,
    mobile: Option<String>,
    payment_mode: String,
    created_by: String,
    created_at: i64,
    used_at: Option<i64>,
    parent_id: Option<String>,
    is_coupon: bool,
}

impl TicketRow {
    fn into_ticket(self) -> RepoResult<Ticket> {
        let items: Vec<TicketItem> = serde_json::from_str(&self.items).map_err(|e| {
            RepoError::Database(format!("Corrupt items snapshot for {}: {e}", self.id))
        })?;
        let status = TicketStatus::parse(&self.status)
            .ok_or_else(|| RepoError::Database(format!("Unknown ticket status '{}'", self.status)))?;
        let payment_mode = PaymentMode::parse(&self.payment_mode).ok_or_else(|| {
            RepoError::Database(format!("Unknown payment mode '{}'", self.payment_mode))
        })?;
        Ok(Ticket {
            id: self.id,
            amount: self.amount,
            date: self.date,
            items,
            status,
            mobile: self.mobile,
            payment_mode,
            created_by: self.created_by,
            created_at: self.created_at,
            used_at: self.used_at,
            parent_id: self.parent_id,
            is_coupon: self.is_coupon,
        })
    }
}

fn items_json(ticket: &Ticket) -> RepoResult<String> {
    serde_json::to_string(&ticket.items)
        .map_err(|e| RepoError::Validation(format!("Unserializable items snapshot: {e}")))
}

/// Report for one bulk insert. `duplicates` were already present:
/// idempotent success, not an error.
#[derive(Debug, Clone)]
pub struct BulkInsertReport {
    /// IDs actually written by this call (drives loyalty accrual)
    pub inserted_ids: Vec<String>,
    pub duplicates: u64,
}

impl BulkInsertReport {
    pub fn inserted(&self) -> u64 {
        self.inserted_ids.len() as u64
    }

    pub fn was_inserted(&self, id: &str) -> bool {
        self.inserted_ids.iter().any(|i| i == id)
    }
}

/// Outcome of a compare-and-set transition attempt.
#[derive(Debug)]
pub enum TransitionOutcome {
    Applied(Ticket),
    /// The ticket was not in `valid` (or does not exist); caller re-reads
    /// for the reason.
    Conflict,
}

/// Insert a single ticket; a duplicate ID is rejected, not overwritten.
pub async fn create(pool: &SqlitePool, ticket: &Ticket) -> RepoResult<()> {
    let items = items_json(ticket)?;
    let result = sqlx::query(TICKET_INSERT)
        .bind(&ticket.id)
        .bind(ticket.amount)
        .bind(&ticket.date)
        .bind(&items)
        .bind(ticket.status.as_str())
        .bind(&ticket.mobile)
        .bind(ticket.payment_mode.as_str())
        .bind(&ticket.created_by)
        .bind(ticket.created_at)
        .bind(ticket.used_at)
        .bind(&ticket.parent_id)
        .bind(ticket.is_coupon)
        .execute(pool)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) => match RepoError::from(e) {
            RepoError::Duplicate(_) => Err(RepoError::Duplicate(format!(
                "Ticket {} already exists",
                ticket.id
            ))),
            other => Err(other),
        },
    }
}

/// Bulk insert in one transaction. Duplicates are counted and skipped so
/// an offline replay of an already-synced batch reports success.
pub async fn create_many(pool: &SqlitePool, tickets: &[Ticket]) -> RepoResult<BulkInsertReport> {
    let mut tx = pool.begin().await?;

    let mut inserted_ids = Vec::new();
    let mut duplicates = 0u64;
    for ticket in tickets {
        let items = items_json(ticket)?;
        let rows = sqlx::query(TICKET_INSERT_OR_IGNORE)
            .bind(&ticket.id)
            .bind(ticket.amount)
            .bind(&ticket.date)
            .bind(&items)
            .bind(ticket.status.as_str())
            .bind(&ticket.mobile)
            .bind(ticket.payment_mode.as_str())
            .bind(&ticket.created_by)
            .bind(ticket.created_at)
            .bind(ticket.used_at)
            .bind(&ticket.parent_id)
            .bind(ticket.is_coupon)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if rows == 0 {
            duplicates += 1;
        } else {
            inserted_ids.push(ticket.id.clone());
        }
    }

    tx.commit().await?;

    Ok(BulkInsertReport {
        inserted_ids,
        duplicates,
    })
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Ticket>> {
    let row = sqlx::query_as::<_, TicketRow>(&format!("{TICKET_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(TicketRow::into_ticket).transpose()
}

/// Atomic status compare-and-set: `valid -> used | invalid`. A single
/// UPDATE statement, so two scanners racing on the same ID serialize in
/// SQLite and exactly one of them applies.
pub async fn transition(
    pool: &SqlitePool,
    id: &str,
    to: TicketStatus,
    used_at: Option<i64>,
) -> RepoResult<TransitionOutcome> {
    if to == TicketStatus::Valid {
        return Err(RepoError::Validation(
            "valid is not a transition target".to_string(),
        ));
    }

    let rows = sqlx::query(
        "UPDATE ticket SET status = ?1, used_at = COALESCE(?2, used_at) WHERE id = ?3 AND status = 'valid'",
    )
    .bind(to.as_str())
    .bind(used_at)
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();

    if rows == 0 {
        return Ok(TransitionOutcome::Conflict);
    }

    let ticket = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Ticket {id} vanished after transition")))?;
    Ok(TransitionOutcome::Applied(ticket))
}

/// Administrative wipe. Privileged callers only.
pub async fn delete_all(pool: &SqlitePool) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM ticket")
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ticket")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
