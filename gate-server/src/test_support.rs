//! Test fixtures shared by the unit tests

use pos_client::{IssueContext, IssuedBatch, issue};
use shared::TicketingConfig;
use shared::models::{LineItem, PaymentMode};
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::db::DbService;

/// Fresh file-backed pool with migrations applied. Keep the `TempDir`
/// alive for the duration of the test.
pub(crate) async fn test_pool() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("create tempdir");
    let path = dir.path().join("test.db");
    let db = DbService::new(&path.to_string_lossy())
        .await
        .expect("initialize test database");
    (db.pool, dir)
}

/// Issue a batch through the real engine: `(product_id, unit_price,
/// quantity, is_combo)` per line.
pub(crate) fn sample_batch(
    lines: &[(&str, i64, u32, bool)],
    mobile: Option<&str>,
) -> IssuedBatch {
    let cart: Vec<LineItem> = lines
        .iter()
        .map(|(id, price, quantity, is_combo)| LineItem {
            product_id: id.to_string(),
            name: format!("Ride {id}"),
            unit_price: *price,
            quantity: *quantity,
            is_combo: *is_combo,
        })
        .collect();
    let ctx = IssueContext {
        mobile: mobile.map(String::from),
        payment_mode: PaymentMode::Cash,
        operator: "counter-1".to_string(),
    };
    issue(&cart, &ctx, &TicketingConfig::default()).expect("issue sample batch")
}
