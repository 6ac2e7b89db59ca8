use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Credential, NewCredential, OrderId, ProductId, UserId};

pub async fn insert_credential(
    product_id: ProductId,
    credential: NewCredential,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Credential, sqlx::Error> {
    let credential: Credential = sqlx::query_as(
        r#"INSERT INTO credentials (product_id, username, password, notes, status, created_at)
        VALUES ($1, $2, $3, $4, 'available', $5)
        RETURNING *"#,
    )
    .bind(product_id)
    .bind(credential.username)
    .bind(credential.password)
    .bind(credential.notes)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Credential {} added to the pool for product {product_id}", credential.id);
    Ok(credential)
}

/// Binds the oldest available credential for `product_id` to the given order.
///
/// The selection and the status change happen in a single statement, and the outer `status = 'available'` guard means
/// a credential can never be claimed twice. Returns `None` if the pool for the product is empty.
pub(crate) async fn claim_available(
    product_id: ProductId,
    order_id: OrderId,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Credential>, sqlx::Error> {
    let credential = sqlx::query_as(
        r#"UPDATE credentials SET status = 'released', assigned_order_id = $1, released_at = $2
        WHERE id = (
            SELECT id FROM credentials WHERE product_id = $3 AND status = 'available' ORDER BY id ASC LIMIT 1
        ) AND status = 'available'
        RETURNING *"#,
    )
    .bind(order_id)
    .bind(now)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(credential)
}

pub async fn count_available(product_id: ProductId, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM credentials WHERE product_id = $1 AND status = 'available'")
            .bind(product_id)
            .fetch_one(conn)
            .await?;
    Ok(count)
}

/// All credentials released against orders belonging to `user_id`, oldest release first.
pub async fn fetch_released_for_user(
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Credential>, sqlx::Error> {
    let credentials = sqlx::query_as(
        r#"SELECT credentials.* FROM credentials
        JOIN orders ON credentials.assigned_order_id = orders.id
        WHERE orders.user_id = $1 AND credentials.status = 'released'
        ORDER BY credentials.released_at ASC, credentials.id ASC"#,
    )
    .bind(user_id.as_str())
    .fetch_all(conn)
    .await?;
    Ok(credentials)
}
