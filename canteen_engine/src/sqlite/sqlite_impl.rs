//! `SqliteDatabase` is a concrete implementation of a canteen engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::{fmt::Debug, time::Duration};

use log::*;
use sqlx::{migrate, migrate::MigrateError, SqlitePool};

use super::db::{cart, db_url, new_pool, orders, products};
use crate::{
    canteen_api::DEFAULT_STORE_TIMEOUT,
    db_types::{
        CartEntry,
        CartLine,
        NewOrder,
        NewProduct,
        Order,
        OrderId,
        OrderStatusType,
        Product,
        ProductId,
        ProductUpdate,
        UserId,
    },
    traits::{
        CartError,
        CartManagement,
        CatalogError,
        CatalogManagement,
        OrderManagement,
        OrderManagementError,
        PaymentApplied,
        PaymentConfirmation,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `CANTEEN_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        SqliteDatabase::new_with_options(url, max_connections, DEFAULT_STORE_TIMEOUT).await
    }

    /// `timeout` bounds how long a query may wait for a pooled connection, or for SQLite's write lock.
    pub async fn new_with_options(url: &str, max_connections: u32, timeout: Duration) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections, timeout).await?;
        info!("🗃️ Connected to {url} with up to {max_connections} connections");
        Ok(Self { url: url.to_string(), pool })
    }

    /// Applies the embedded schema migrations. Migrations that have already run are skipped.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database schema is up to date");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_available_products(&self) -> Result<Vec<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_available_products(&mut conn).await?;
        Ok(products)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        product.validate().map_err(CatalogError::InvalidInput)?;
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product, CatalogError> {
        update.validate().map_err(CatalogError::InvalidInput)?;
        let mut conn = self.pool.acquire().await?;
        products::update_product(id, update, &mut conn).await?.ok_or(CatalogError::ProductNotFound(id))
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        let mut conn = self.pool.acquire().await?;
        if products::delete_product(id, &mut conn).await? {
            Ok(())
        } else {
            Err(CatalogError::ProductNotFound(id))
        }
    }

    async fn check_available(&self, id: ProductId) -> Result<i64, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        products::stock_level(id, &mut conn).await?.ok_or(CatalogError::ProductNotFound(id))
    }

    async fn debit_stock(&self, id: ProductId, amount: i64) -> Result<i64, CatalogError> {
        if amount <= 0 {
            return Err(CatalogError::InvalidInput(format!("Cannot debit {amount} units")));
        }
        let mut conn = self.pool.acquire().await?;
        match products::debit_stock(id, amount, &mut conn).await? {
            Some(remaining) => Ok(remaining),
            None => {
                let available = products::stock_level(id, &mut conn).await?.ok_or(CatalogError::ProductNotFound(id))?;
                Err(CatalogError::InsufficientStock { product_id: id, requested: amount, available })
            },
        }
    }

    async fn credit_stock(&self, id: ProductId, amount: i64) -> Result<i64, CatalogError> {
        if amount <= 0 {
            return Err(CatalogError::InvalidInput(format!("Cannot credit {amount} units")));
        }
        let mut conn = self.pool.acquire().await?;
        products::credit_stock(id, amount, &mut conn).await?.ok_or(CatalogError::ProductNotFound(id))
    }
}

impl CartManagement for SqliteDatabase {
    async fn add_to_cart(&self, user: &UserId, product: ProductId, quantity: i64) -> Result<CartLine, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut conn = self.pool.acquire().await?;
        cart::add_to_cart(user, product, quantity, &mut conn).await
    }

    async fn set_cart_quantity(
        &self,
        user: &UserId,
        product: ProductId,
        quantity: i64,
    ) -> Result<CartLine, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut conn = self.pool.acquire().await?;
        cart::set_quantity(user, product, quantity, &mut conn).await
    }

    async fn remove_from_cart(&self, user: &UserId, product: ProductId) -> Result<(), CartError> {
        let mut conn = self.pool.acquire().await?;
        if cart::remove_line(user, product, &mut conn).await? {
            trace!("🛒️ Removed product {product} from the cart of {user}");
            Ok(())
        } else {
            Err(CartError::LineNotFound { user_id: user.clone(), product_id: product })
        }
    }

    async fn fetch_cart(&self, user: &UserId) -> Result<Vec<CartEntry>, CartError> {
        let mut conn = self.pool.acquire().await?;
        cart::fetch_cart(user, &mut conn).await
    }

    async fn clear_cart(&self, user: &UserId) -> Result<u64, CartError> {
        let mut conn = self.pool.acquire().await?;
        let removed = cart::clear_cart(user, &mut conn).await?;
        Ok(removed)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn bind_gateway_order(&self, id: OrderId, gateway_order_id: &str) -> Result<Order, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        match orders::bind_gateway_order(id, gateway_order_id, &mut conn).await? {
            Some(row) => {
                let items = orders::fetch_items(id, &mut conn).await?;
                Ok(row.into_order(items))
            },
            None => {
                let row = orders::fetch_order_row(id, &mut conn).await?.ok_or(OrderManagementError::OrderNotFound(id))?;
                Err(OrderManagementError::InvalidInput(format!(
                    "Order {id} is {} with gateway reference {:?}, and cannot be re-bound",
                    row.status, row.gateway_order_id
                )))
            },
        }
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_customer(&self, customer_id: &UserId) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders(Some(customer_id), &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_all_orders(&self) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders(None, &mut conn).await?;
        Ok(orders)
    }

    /// The `is_paid` flip comes first: it takes SQLite's write lock and acts as the idempotence guard. The debits
    /// follow in the same transaction, so if any of them fails, dropping the transaction rolls back the flip and every
    /// earlier debit together.
    async fn apply_payment(
        &self,
        id: OrderId,
        confirmation: &PaymentConfirmation,
    ) -> Result<PaymentApplied, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let Some(row) = orders::mark_paid(id, confirmation, &mut tx).await? else {
            tx.rollback().await?;
            let mut conn = self.pool.acquire().await?;
            let order = orders::fetch_order(id, &mut conn).await?.ok_or(OrderManagementError::OrderNotFound(id))?;
            return if order.is_paid {
                debug!("💰️ Order {id} is already paid and {}. Nothing to do.", order.status);
                Ok(PaymentApplied::AlreadyApplied(order))
            } else {
                Err(OrderManagementError::GatewayReferenceMismatch(id))
            };
        };
        let items = orders::fetch_items(id, &mut tx).await?;
        for item in &items {
            if products::debit_stock(item.product_id, item.quantity, &mut tx).await?.is_none() {
                warn!(
                    "💰️ Cannot debit {} of product {} for order {id}. Rolling back the payment.",
                    item.quantity, item.product_id
                );
                tx.rollback().await?;
                return Err(OrderManagementError::StockConflict {
                    order_id: id,
                    product_id: item.product_id,
                    requested: item.quantity,
                });
            }
        }
        tx.commit().await?;
        info!("💰️ Payment {} applied to order {id}", confirmation.gateway_payment_id);
        Ok(PaymentApplied::Applied(row.into_order(items)))
    }

    async fn mark_delivered(&self, id: OrderId, allow_unpaid: bool) -> Result<Order, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        match orders::mark_delivered(id, allow_unpaid, &mut conn).await? {
            Some(row) => {
                let items = orders::fetch_items(id, &mut conn).await?;
                Ok(row.into_order(items))
            },
            None => {
                let row = orders::fetch_order_row(id, &mut conn).await?.ok_or(OrderManagementError::OrderNotFound(id))?;
                Err(OrderManagementError::InvalidTransition {
                    order_id: id,
                    from: row.status,
                    to: OrderStatusType::Delivered,
                })
            },
        }
    }
}
