//! Ticket API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentOperator;
use crate::core::ServerState;
use crate::db::repository::ticket::BulkInsertReport;
use crate::db::repository::{member, ticket};
use crate::redemption::{self, VerifyError};
use crate::utils::{AppError, AppResult};
use shared::models::{Ticket, scan_ticket_id};

/// POST /api/tickets accepts one ticket object or a whole batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CreatePayload {
    Batch(Vec<Ticket>),
    Single(Box<Ticket>),
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub inserted: u64,
    pub duplicates: u64,
}

fn validate_ticket(ticket: &Ticket) -> AppResult<()> {
    if ticket.id.trim().is_empty() {
        return Err(AppError::Validation("Ticket id must not be empty".into()));
    }
    if ticket.amount < 0 {
        return Err(AppError::Validation(format!(
            "Ticket {} has a negative amount",
            ticket.id
        )));
    }
    if ticket.created_by.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "Ticket {} is missing createdBy",
            ticket.id
        )));
    }
    Ok(())
}

/// POST /api/tickets - persist an issuance batch (or single ticket).
/// Duplicate IDs report success so offline replays stay idempotent.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreatePayload>,
) -> AppResult<(StatusCode, Json<CreateResponse>)> {
    let tickets: Vec<Ticket> = match payload {
        CreatePayload::Batch(tickets) => tickets,
        CreatePayload::Single(ticket) => vec![*ticket],
    };
    if tickets.is_empty() {
        return Err(AppError::Validation("Empty ticket batch".into()));
    }
    for ticket in &tickets {
        validate_ticket(ticket)?;
    }

    let report = ticket::create_many(&state.pool, &tickets).await?;

    accrue_loyalty(&state, &tickets, &report).await;

    tracing::info!(
        inserted = report.inserted(),
        duplicates = report.duplicates,
        "Ticket batch persisted"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateResponse {
            inserted: report.inserted(),
            duplicates: report.duplicates,
        }),
    ))
}

/// Loyalty trigger: masters that actually landed in this call accrue
/// points for their mobile. Replay duplicates are skipped, so a batch
/// syncing twice can never double-count. Accrual failure is logged only;
/// the tickets are already persisted and must not be rolled back over
/// bookkeeping.
async fn accrue_loyalty(state: &ServerState, tickets: &[Ticket], report: &BulkInsertReport) {
    for ticket in tickets {
        if !ticket.is_master() || ticket.is_coupon {
            continue;
        }
        let Some(mobile) = &ticket.mobile else {
            continue;
        };
        if !report.was_inserted(&ticket.id) {
            continue;
        }
        match member::accrue(&state.pool, mobile, ticket.amount).await {
            Ok(points) => {
                tracing::debug!(ticket_id = %ticket.id, points, "Loyalty points accrued");
            }
            Err(e) => {
                tracing::error!(ticket_id = %ticket.id, error = %e, "Loyalty accrual failed");
            }
        }
    }
}

/// GET /api/tickets/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Ticket>> {
    let ticket = ticket::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ticket {id}")))?;
    Ok(Json(ticket))
}

/// POST /api/tickets/{id}/verify - single-use redemption. The path
/// segment may be a raw ID or the URL-encoded QR JSON wrapper.
pub async fn verify(
    State(state): State<ServerState>,
    Path(raw): Path<String>,
) -> Result<Json<Ticket>, VerifyError> {
    let id = scan_ticket_id(&raw).unwrap_or_else(|| raw.clone());
    let ticket = redemption::verify(&state.pool, state.venue_tz(), &id).await?;
    Ok(Json(ticket))
}

/// DELETE /api/tickets/clear-all - administrative wipe
pub async fn clear_all(
    State(state): State<ServerState>,
    Extension(operator): Extension<CurrentOperator>,
) -> AppResult<Json<serde_json::Value>> {
    let deleted = ticket::delete_all(&state.pool).await?;
    tracing::warn!(deleted, operator = %operator.0, "Ticket store wiped");
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
