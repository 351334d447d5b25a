//! Ticket API Routes

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::auth::require_operator;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tickets", routes())
}

fn routes() -> Router<ServerState> {
    // Issuance and verification: open to the terminals
    let open_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/verify", post(handler::verify));

    // Administrative wipe: requires an operator identity
    let manage_routes = Router::new()
        .route("/clear-all", delete(handler::clear_all))
        .layer(middleware::from_fn(require_operator));

    open_routes.merge(manage_routes)
}
