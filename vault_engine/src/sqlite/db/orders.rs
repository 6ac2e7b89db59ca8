use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, UserId},
    market_api::order_objects::OrderQueryFilter,
};

/// Inserts a new reservation into the database using the given connection. The order is always created with status
/// `awaiting_payment` and a quantity of one.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                product_id,
                quantity,
                currency,
                total_usd,
                amount_crypto,
                deposit_address_id,
                status,
                created_at,
                reserved_until,
                updated_at
            ) VALUES ($1, $2, 1, $3, $4, $5, $6, 'awaiting_payment', $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(order.user_id)
    .bind(order.product_id)
    .bind(order.currency)
    .bind(order.total_usd)
    .bind(order.amount_crypto)
    .bind(order.deposit_address_id)
    .bind(order.created_at)
    .bind(order.reserved_until)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order {} inserted for {}", order.id, order.user_id);
    Ok(order)
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_orders_for_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY id ASC")
        .bind(user_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by id, i.e. by creation, in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(product_id) = query.product_id {
        where_clause.push("product_id = ");
        where_clause.push_bind_unseparated(product_id);
    }
    if let Some(currency) = query.currency {
        where_clause.push("currency = ");
        where_clause.push_bind_unseparated(currency);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        let mut first = true;
        for status in statuses {
            if !first {
                where_clause.push_unseparated(", ");
            }
            first = false;
            where_clause.push_bind_unseparated(status);
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY id ASC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {:?}", orders.len());
    Ok(orders)
}

/// Compare-and-set on the order status. The update only happens if the stored status is still `from`.
///
/// Returns `None` if the order does not exist or its status has changed.
pub(crate) async fn update_order_status(
    id: OrderId,
    from: OrderStatusType,
    to: OrderStatusType,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4 RETURNING *")
        .bind(to)
        .bind(now)
        .bind(id)
        .bind(from)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Moves a `paid` or `verified` order to `released`, returning the previous status alongside the updated order.
///
/// Returns `None` if the order does not exist or is in any other status.
pub(crate) async fn mark_released(
    id: OrderId,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<(OrderStatusType, Order)>, sqlx::Error> {
    // A no-op write rather than a SELECT, so that the transaction takes the write lock before reading anything.
    // RETURNING only sees the new row, so this is also where the previous status comes from.
    let previous: Option<(OrderStatusType,)> =
        sqlx::query_as("UPDATE orders SET updated_at = updated_at WHERE id = $1 RETURNING status")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    let order: Option<Order> = sqlx::query_as(
        "UPDATE orders SET status = 'released', updated_at = $1 WHERE id = $2 AND status IN ('paid', 'verified') \
         RETURNING *",
    )
    .bind(now)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(previous.zip(order).map(|((status,), order)| (status, order)))
}
