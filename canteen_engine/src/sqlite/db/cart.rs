use chrono::Utc;
use log::{debug, trace};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{CartEntry, CartLine, Paise, ProductId, UserId},
    sqlite::db::products,
    traits::CartError,
};

/// Merges `quantity` units into the user's cart line for the product, creating the line if needed.
///
/// The merge and the stock ceiling check happen in one upsert statement:
/// * a new line is only inserted if the product exists and has at least `quantity` in stock,
/// * an existing line is only updated if `existing + quantity` is still within stock.
///
/// When nothing is written, the failure is diagnosed afterwards (missing product vs. insufficient stock). That read is
/// only used for the error message.
pub async fn add_to_cart(
    user: &UserId,
    product: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartLine, CartError> {
    let line: Option<CartLine> = sqlx::query_as(
        r#"
            INSERT INTO cart_lines (user_id, product_id, quantity, created_at, updated_at)
            SELECT $1, p.id, $3, $4, $4 FROM products p WHERE p.id = $2 AND p.quantity >= $3
            ON CONFLICT (user_id, product_id) DO UPDATE
                SET quantity = cart_lines.quantity + excluded.quantity, updated_at = excluded.updated_at
                WHERE cart_lines.quantity + excluded.quantity <=
                    (SELECT quantity FROM products WHERE id = excluded.product_id)
            RETURNING user_id, product_id, quantity, updated_at;
        "#,
    )
    .bind(user)
    .bind(product)
    .bind(quantity)
    .bind(Utc::now())
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .next();
    match line {
        Some(line) => {
            trace!("🛒️ {user} now has {} of product {product} in their cart", line.quantity);
            Ok(line)
        },
        None => {
            let available =
                products::stock_level(product, &mut *conn).await?.ok_or(CartError::ProductNotFound(product))?;
            let existing = fetch_line(user, product, conn).await?.map(|l| l.quantity).unwrap_or(0);
            debug!("🛒️ Cannot add {quantity} of product {product} for {user}. In cart: {existing}. Stock: {available}");
            let requested = existing.saturating_add(quantity);
            Err(CartError::InsufficientStock { product_id: product, requested, available })
        },
    }
}

/// Sets the line to exactly `quantity`, provided the line exists and `quantity` is within the current stock.
pub async fn set_quantity(
    user: &UserId,
    product: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartLine, CartError> {
    let line: Option<CartLine> = sqlx::query_as(
        r#"
            UPDATE cart_lines SET quantity = $3, updated_at = $4
            WHERE user_id = $1 AND product_id = $2
                AND $3 <= (SELECT quantity FROM products WHERE id = $2)
            RETURNING user_id, product_id, quantity, updated_at;
        "#,
    )
    .bind(user)
    .bind(product)
    .bind(quantity)
    .bind(Utc::now())
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .next();
    if let Some(line) = line {
        trace!("🛒️ {user} set product {product} to {quantity} in their cart");
        return Ok(line);
    }
    if fetch_line(user, product, &mut *conn).await?.is_none() {
        return Err(CartError::LineNotFound { user_id: user.clone(), product_id: product });
    }
    let available = products::stock_level(product, conn).await?.ok_or(CartError::ProductNotFound(product))?;
    Err(CartError::InsufficientStock { product_id: product, requested: quantity, available })
}

/// Returns `false` if there was no such line.
pub async fn remove_line(user: &UserId, product: ProductId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1 AND product_id = $2")
        .bind(user)
        .bind(product)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_line(
    user: &UserId,
    product: ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<CartLine>, sqlx::Error> {
    let line = sqlx::query_as(
        "SELECT user_id, product_id, quantity, updated_at FROM cart_lines WHERE user_id = $1 AND product_id = $2",
    )
    .bind(user)
    .bind(product)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(line)
}

#[derive(Debug, FromRow)]
struct CartRow {
    product_id: ProductId,
    quantity: i64,
    name: Option<String>,
    description: Option<String>,
    price: Option<Paise>,
    stock: Option<i64>,
}

/// The user's cart, joined with the current catalog. Lines that refer to products that no longer exist are skipped.
pub async fn fetch_cart(user: &UserId, conn: &mut SqliteConnection) -> Result<Vec<CartEntry>, CartError> {
    let rows: Vec<CartRow> = sqlx::query_as(
        r#"
            SELECT c.product_id, c.quantity, p.name, p.description, p.price, p.quantity AS stock
            FROM cart_lines c LEFT JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.created_at, c.product_id;
        "#,
    )
    .bind(user)
    .fetch_all(conn)
    .await?;
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let (Some(name), Some(description), Some(unit_price), Some(stock)) =
            (row.name, row.description, row.price, row.stock)
        else {
            debug!("🛒️ Skipping cart line for {user}: product {} no longer exists", row.product_id);
            continue;
        };
        let line_total = unit_price.checked_mul(row.quantity).ok_or_else(|| {
            CartError::Overflow(format!("{} × {unit_price} for product {}", row.quantity, row.product_id))
        })?;
        entries.push(CartEntry {
            product_id: row.product_id,
            name,
            description,
            unit_price,
            quantity: row.quantity,
            stock_remaining: stock,
            line_total,
        });
    }
    Ok(entries)
}

pub async fn clear_cart(user: &UserId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1").bind(user).execute(conn).await?;
    Ok(result.rows_affected())
}
