use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{AddressId, DepositAddress, NewDepositAddress};

pub async fn insert_address(
    address: NewDepositAddress,
    conn: &mut SqliteConnection,
) -> Result<DepositAddress, sqlx::Error> {
    let address = sqlx::query_as(
        r#"INSERT INTO deposit_addresses (currency, network, address, label, active, created_at)
        VALUES ($1, $2, $3, $4, TRUE, $5)
        RETURNING *;"#,
    )
    .bind(address.currency)
    .bind(address.network)
    .bind(address.address)
    .bind(address.label)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(address)
}

/// Active addresses, oldest first. The order matters: the first address for a currency is the one shown to buyers.
pub async fn fetch_active_addresses(conn: &mut SqliteConnection) -> Result<Vec<DepositAddress>, sqlx::Error> {
    let addresses =
        sqlx::query_as("SELECT * FROM deposit_addresses WHERE active = TRUE ORDER BY id ASC").fetch_all(conn).await?;
    Ok(addresses)
}

pub async fn set_active(
    id: AddressId,
    active: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<DepositAddress>, sqlx::Error> {
    let address = sqlx::query_as("UPDATE deposit_addresses SET active = $1 WHERE id = $2 RETURNING *")
        .bind(active)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(address)
}
