//! Redemption Verifier — single-use ticket state machine
//!
//! States: `valid`, `used`, `invalid` (both terminal), plus the logical
//! non-state "not found". Transitions: `valid -> used` on admission,
//! `valid -> invalid` on calendar-day expiry. The decisive step is a
//! one-statement compare-and-set in SQLite, so two scanners racing on
//! the same QR yield exactly one success.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono_tz::Tz;
use shared::models::{Ticket, TicketStatus};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::repository::ticket::{self, TransitionOutcome};
use crate::db::repository::RepoError;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// Never existed in this store, possibly an offline issuance whose
    /// sync has not landed; callers fall back to their local echo before
    /// declaring the ticket bad.
    #[error("Ticket not found: {0}")]
    NotFound(String),

    #[error("Ticket already used")]
    AlreadyUsed { ticket: Ticket },

    /// Issued on an earlier calendar day (venue time)
    #[error("Ticket expired")]
    Expired { ticket: Ticket },

    #[error("Ticket invalid")]
    Invalid { ticket: Ticket },

    #[error(transparent)]
    Repo(#[from] RepoError),
}

fn deny_response(message: &str, reason: &str, ticket: &Ticket) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "message": message,
            "reason": reason,
            "ticket": ticket,
        })),
    )
        .into_response()
}

impl IntoResponse for VerifyError {
    fn into_response(self) -> Response {
        match self {
            VerifyError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "message": "Ticket not found",
                    "id": id,
                })),
            )
                .into_response(),
            VerifyError::AlreadyUsed { ticket } => {
                deny_response("Ticket already used", "already_used", &ticket)
            }
            VerifyError::Expired { ticket } => {
                deny_response("Ticket expired", "expired", &ticket)
            }
            VerifyError::Invalid { ticket } => {
                deny_response("Ticket invalid", "invalid", &ticket)
            }
            VerifyError::Repo(e) => crate::utils::AppError::from(e).into_response(),
        }
    }
}

/// Run the redemption state machine for one ticket ID.
///
/// Order matters: `used` is reported before expiry so a same-day reuse
/// shows the prior `usedAt`; expiry invalidates before the stale-state
/// check so yesterday's tickets read as expired, not merely invalid.
pub async fn verify(pool: &SqlitePool, tz: Tz, id: &str) -> Result<Ticket, VerifyError> {
    let ticket = ticket::find_by_id(pool, id)
        .await?
        .ok_or_else(|| VerifyError::NotFound(id.to_string()))?;

    if ticket.status == TicketStatus::Used {
        return Err(VerifyError::AlreadyUsed { ticket });
    }

    // Same-day rule: calendar date in the venue timezone, not a rolling
    // 24h window.
    let issued_on = shared::util::venue_date(ticket.created_at, tz);
    if issued_on != shared::util::venue_today(tz) {
        let expired = match ticket::transition(pool, id, TicketStatus::Invalid, None).await? {
            TransitionOutcome::Applied(t) => t,
            // Already out of `valid` (earlier expiry check); keep what we read
            TransitionOutcome::Conflict => ticket,
        };
        return Err(VerifyError::Expired { ticket: expired });
    }

    if ticket.status == TicketStatus::Invalid {
        return Err(VerifyError::Invalid { ticket });
    }

    let now = shared::util::now_millis();
    match ticket::transition(pool, id, TicketStatus::Used, Some(now)).await? {
        TransitionOutcome::Applied(ticket) => Ok(ticket),
        TransitionOutcome::Conflict => {
            // Lost the race; report the terminal state that won
            let current = ticket::find_by_id(pool, id)
                .await?
                .ok_or_else(|| VerifyError::NotFound(id.to_string()))?;
            match current.status {
                TicketStatus::Used => Err(VerifyError::AlreadyUsed { ticket: current }),
                TicketStatus::Invalid => Err(VerifyError::Invalid { ticket: current }),
                TicketStatus::Valid => Err(VerifyError::Repo(RepoError::Database(format!(
                    "Transition conflict but ticket {id} still valid"
                )))),
            }
        }
    }
}
