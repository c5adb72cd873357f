use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType, Paise, UserId},
    traits::{OrderManagementError, PaymentConfirmation},
};

/// An `orders` row, before its items are attached.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: OrderId,
    pub customer_id: UserId,
    pub customer_name: String,
    pub customer_email: String,
    pub total: Paise,
    pub currency: String,
    pub status: OrderStatusType,
    pub payment_method: String,
    pub is_paid: bool,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    pub fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            items,
            total: self.total,
            currency: self.currency,
            delivered: self.status == OrderStatusType::Delivered,
            status: self.status,
            payment_method: self.payment_method,
            is_paid: self.is_paid,
            gateway_order_id: self.gateway_order_id,
            gateway_payment_id: self.gateway_payment_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    #[sqlx(flatten)]
    item: OrderItem,
}

/// Inserts a new `Pending` order and its items using the given connection. This is not atomic. Embed the call inside a
/// transaction, passing `&mut *tx` as the connection, so that an order is never visible without its items.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderManagementError> {
    if order.items.is_empty() {
        return Err(OrderManagementError::InvalidInput("An order must contain at least one item".into()));
    }
    let row: OrderRow = sqlx::query_as(
        r#"
            INSERT INTO orders (
                customer_id,
                customer_name,
                customer_email,
                total,
                currency,
                status,
                payment_method,
                is_paid,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, $8, $8)
            RETURNING *;
        "#,
    )
    .bind(&order.customer.id)
    .bind(&order.customer.name)
    .bind(&order.customer.email)
    .bind(order.total)
    .bind(&order.currency)
    .bind(OrderStatusType::Pending)
    .bind(&order.payment_method)
    .bind(order.created_at)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    for (position, item) in order.items.iter().enumerate() {
        sqlx::query(
            r#"
                INSERT INTO order_items (order_id, position, product_id, name, unit_price, quantity, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7);
            "#,
        )
        .bind(row.id)
        .bind(i64::try_from(position).map_err(|e| OrderManagementError::InvalidInput(e.to_string()))?)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.unit_price)
        .bind(item.quantity)
        .bind(item.line_total)
        .execute(&mut *conn)
        .await?;
    }
    let count = order.items.len();
    debug!("📦️ Order {} for {} saved with {count} items, totalling {}", row.id, row.customer_id, row.total);
    Ok(row.into_order(order.items))
}

pub async fn fetch_order_row(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<OrderRow>, sqlx::Error> {
    let row = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_all(conn).await?.into_iter().next();
    Ok(row)
}

pub async fn fetch_items(id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as(
        r#"
            SELECT product_id, name, unit_price, quantity, line_total
            FROM order_items WHERE order_id = $1 ORDER BY position;
        "#,
    )
    .bind(id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let Some(row) = fetch_order_row(id, &mut *conn).await? else {
        return Ok(None);
    };
    let items = fetch_items(id, conn).await?;
    Ok(Some(row.into_order(items)))
}

/// Fetches orders, newest first, for a single customer or (with `None`) for everyone. Items are loaded with one extra
/// query rather than one per order.
pub async fn fetch_orders(
    customer_id: Option<&UserId>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let rows: Vec<OrderRow> = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE $1 IS NULL OR customer_id = $1
            ORDER BY created_at DESC, id DESC;
        "#,
    )
    .bind(customer_id)
    .fetch_all(&mut *conn)
    .await?;
    let items: Vec<OrderItemRow> = sqlx::query_as(
        r#"
            SELECT i.order_id, i.product_id, i.name, i.unit_price, i.quantity, i.line_total
            FROM order_items i JOIN orders o ON o.id = i.order_id
            WHERE $1 IS NULL OR o.customer_id = $1
            ORDER BY i.order_id, i.position;
        "#,
    )
    .bind(customer_id)
    .fetch_all(conn)
    .await?;
    let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::with_capacity(rows.len());
    for row in items {
        items_by_order.entry(row.order_id).or_default().push(row.item);
    }
    trace!("📦️ Fetched {} orders", rows.len());
    let orders = rows
        .into_iter()
        .map(|row| {
            let items = items_by_order.remove(&row.id).unwrap_or_default();
            row.into_order(items)
        })
        .collect();
    Ok(orders)
}

/// Attaches the gateway's order reference to a `Pending` order that does not have one yet.
pub async fn bind_gateway_order(
    id: OrderId,
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRow>, sqlx::Error> {
    let row = sqlx::query_as(
        r#"
            UPDATE orders SET gateway_order_id = $2, updated_at = $3
            WHERE id = $1 AND status = 'Pending' AND gateway_order_id IS NULL
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(gateway_order_id)
    .bind(Utc::now())
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(row)
}

/// Records the payment on an unpaid order, provided the gateway order reference matches. A `Pending` order moves to
/// `Paid`. An order that was delivered before it was paid stays `Delivered`.
///
/// The `is_paid` guard lives in the `WHERE` clause, so of any number of concurrent callers exactly one gets the row
/// back. Everyone else gets `None`.
pub async fn mark_paid(
    id: OrderId,
    confirmation: &PaymentConfirmation,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRow>, sqlx::Error> {
    let row = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = CASE status WHEN 'Pending' THEN 'Paid' ELSE status END,
                is_paid = TRUE,
                gateway_payment_id = $3,
                updated_at = $4
            WHERE id = $1 AND is_paid = FALSE AND gateway_order_id = $2
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(&confirmation.gateway_order_id)
    .bind(&confirmation.gateway_payment_id)
    .bind(Utc::now())
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(row)
}

/// Moves a `Paid` order (or, if `allow_unpaid` is set, a `Pending` one) to `Delivered`.
pub async fn mark_delivered(
    id: OrderId,
    allow_unpaid: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderRow>, sqlx::Error> {
    let row = sqlx::query_as(
        r#"
            UPDATE orders SET status = 'Delivered', updated_at = $3
            WHERE id = $1 AND (status = 'Paid' OR ($2 AND status = 'Pending'))
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(allow_unpaid)
    .bind(Utc::now())
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(row)
}
