//! Member Repository — loyalty accrual trigger
//!
//! Bookkeeping beyond the trigger (tiers, point redemption) lives in the
//! membership collaborator; this table only accumulates what ticket
//! persistence reports. Accrual happens when a master ticket actually
//! lands (not on a replay duplicate), so the offline queue's durability
//! carries over to loyalty and double-counting is impossible.

use super::RepoResult;
use sqlx::SqlitePool;

/// One point per this many rupees of master-ticket value
pub const POINTS_PER_RUPEES: i64 = 10;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Member {
    pub mobile: String,
    pub points_balance: i64,
    pub total_spent: i64,
    pub visits: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Accrue loyalty for one persisted master ticket (upsert by mobile).
/// Returns the points awarded.
pub async fn accrue(pool: &SqlitePool, mobile: &str, amount: i64) -> RepoResult<i64> {
    let points = amount / POINTS_PER_RUPEES;
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO member (mobile, points_balance, total_spent, visits, created_at, updated_at) VALUES (?1, ?2, ?3, 1, ?4, ?4)
         ON CONFLICT(mobile) DO UPDATE SET points_balance = points_balance + ?2, total_spent = total_spent + ?3, visits = visits + 1, updated_at = ?4",
    )
    .bind(mobile)
    .bind(points)
    .bind(amount)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(points)
}

pub async fn find_by_mobile(pool: &SqlitePool, mobile: &str) -> RepoResult<Option<Member>> {
    let member = sqlx::query_as::<_, Member>(
        "SELECT mobile, points_balance, total_spent, visits, created_at, updated_at FROM member WHERE mobile = ?",
    )
    .bind(mobile)
    .fetch_optional(pool)
    .await?;
    Ok(member)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_pool;

    #[tokio::test]
    async fn accrue_upserts_by_mobile() {
        let (pool, _dir) = test_pool().await;

        assert_eq!(accrue(&pool, "9876543210", 300).await.unwrap(), 30);
        let member = find_by_mobile(&pool, "9876543210")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(member.points_balance, 30);
        assert_eq!(member.total_spent, 300);
        assert_eq!(member.visits, 1);

        assert_eq!(accrue(&pool, "9876543210", 500).await.unwrap(), 50);
        let member = find_by_mobile(&pool, "9876543210")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(member.points_balance, 80);
        assert_eq!(member.total_spent, 800);
        assert_eq!(member.visits, 2);

        assert!(find_by_mobile(&pool, "0000000000").await.unwrap().is_none());
    }
}
