use chrono::Utc;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::db_types::{NewProduct, Product, ProductId, ProductUpdate};

pub async fn fetch_product(id: ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_all(conn).await?.into_iter().next();
    Ok(product)
}

pub async fn fetch_available_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    let products = sqlx::query_as("SELECT * FROM products WHERE quantity > 0 ORDER BY id").fetch_all(conn).await?;
    Ok(products)
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let now = Utc::now();
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (name, description, price, quantity, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.quantity)
    .bind(product.created_by)
    .bind(now)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    debug!("🗃️ Product {} ({}) inserted with {} in stock", product.id, product.name, product.quantity);
    Ok(product)
}

/// Applies the non-empty fields of `update`. Returns `None` if the product does not exist.
pub async fn update_product(
    id: ProductId,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as(
        r#"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                quantity = COALESCE($5, quantity),
                updated_at = $6
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(update.name)
    .bind(update.description)
    .bind(update.price)
    .bind(update.quantity)
    .bind(Utc::now())
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(product)
}

/// Removes the product from the catalog. Cart lines that refer to it are left in place and are skipped when carts are
/// read. Orders keep their own copy of the item. Returns `false` if there was no such product.
pub async fn delete_product(id: ProductId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(conn).await?;
    debug!("🗃️ Delete of product {id} removed {} rows", result.rows_affected());
    Ok(result.rows_affected() > 0)
}

/// The current stock level, or `None` if the product does not exist.
pub async fn stock_level(id: ProductId, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let stock = sqlx::query_scalar("SELECT quantity FROM products WHERE id = $1")
        .bind(id)
        .fetch_all(conn)
        .await?
        .into_iter()
        .next();
    Ok(stock)
}

/// Decrements stock by `amount` iff at least `amount` units are available. This is a single conditional write, so it
/// can never oversell, regardless of what earlier (advisory) stock reads reported.
///
/// Returns the remaining stock, or `None` if the product does not exist or has insufficient stock. Nothing is changed
/// in the latter case.
pub async fn debit_stock(
    id: ProductId,
    amount: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let remaining = sqlx::query_scalar(
        r#"
            UPDATE products SET quantity = quantity - $2, updated_at = $3
            WHERE id = $1 AND quantity >= $2
            RETURNING quantity;
        "#,
    )
    .bind(id)
    .bind(amount)
    .bind(Utc::now())
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    trace!("🗃️ Debit of {amount} from product {id}. Remaining: {remaining:?}");
    Ok(remaining)
}

/// Adds `amount` units to stock. Returns the new stock level, or `None` if the product does not exist.
pub async fn credit_stock(
    id: ProductId,
    amount: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let stock = sqlx::query_scalar(
        r#"
            UPDATE products SET quantity = quantity + $2, updated_at = $3
            WHERE id = $1
            RETURNING quantity;
        "#,
    )
    .bind(id)
    .bind(amount)
    .bind(Utc::now())
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    trace!("🗃️ Credit of {amount} to product {id}. Stock: {stock:?}");
    Ok(stock)
}
