use chrono::{DateTime, Utc};
use log::trace;
use serde_json::Value;
use sqlx::SqliteConnection;

use crate::db_types::{Actor, AuditEntry, OrderId};

pub const TARGET_ORDER: &str = "order";
pub const TARGET_PRODUCT: &str = "product";

/// Appends an entry to the audit log. Call this on the same transaction as the change being recorded.
pub async fn record(
    actor: &Actor,
    action: &str,
    target_type: &str,
    target_id: i64,
    metadata: Value,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO audit_log (actor, action, target_type, target_id, metadata, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)"#,
    )
    .bind(actor.to_string())
    .bind(action)
    .bind(target_type)
    .bind(target_id)
    .bind(metadata.to_string())
    .bind(now)
    .execute(conn)
    .await?;
    trace!("🗃️ Audit: {actor} {action} {target_type} #{target_id}");
    Ok(())
}

pub async fn fetch_for_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<AuditEntry>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM audit_log WHERE target_type = $1 AND target_id = $2 ORDER BY id ASC")
        .bind(TARGET_ORDER)
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(entries)
}
