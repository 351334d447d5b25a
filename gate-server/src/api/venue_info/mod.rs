//! Venue Info Routes
//!
//! Exposes the venue-configured ticketing constants so terminals pick
//! them up from one place instead of duplicating literals.

use axum::{Json, Router, extract::State, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/venue-info", get(venue_info))
}

async fn venue_info(State(state): State<ServerState>) -> Json<serde_json::Value> {
    let ticketing = &state.config.ticketing;
    Json(serde_json::json!({
        "comboMultiplier": ticketing.combo_multiplier,
        "couponFaceValue": ticketing.coupon_face_value,
        "timezone": ticketing.timezone.name(),
    }))
}
