use thiserror::Error;

use crate::{
    db_types::{NewProduct, Product, ProductId, ProductUpdate},
    helpers::DeadlineExceeded,
};

/// The catalog, and the stock ledger that hangs off it.
///
/// The stock quantity on each product is the only source of truth for availability. [`check_available`] is a plain
/// read and reserves nothing. [`debit_stock`] is the only operation that permanently consumes stock, and must be a
/// single conditional write so that concurrent debits can never drive the quantity below zero.
///
/// [`check_available`]: CatalogManagement::check_available
/// [`debit_stock`]: CatalogManagement::debit_stock
#[allow(async_fn_in_trait)]
pub trait CatalogManagement: Clone {
    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, CatalogError>;

    /// All products that currently have stock, ordered by id.
    async fn fetch_available_products(&self) -> Result<Vec<Product>, CatalogError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;

    /// Edits a product. Existing orders are snapshots, and are unaffected.
    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product, CatalogError>;

    /// Removes a product from the catalog. Existing orders are snapshots, and are unaffected.
    async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError>;

    /// Returns the current stock for the product. Advisory only.
    async fn check_available(&self, id: ProductId) -> Result<i64, CatalogError>;

    /// Atomically decrements the stock by `amount` iff at least `amount` is available, returning the remaining stock.
    /// Otherwise nothing changes and `InsufficientStock` is returned.
    async fn debit_stock(&self, id: ProductId, amount: i64) -> Result<i64, CatalogError>;

    /// Returns `amount` units to stock (a restock), returning the new stock level.
    async fn credit_stock(&self, id: ProductId, amount: i64) -> Result<i64, CatalogError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Insufficient stock for product {product_id}. Requested {requested}, but only {available} available")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64 },
    #[error("Invalid product data. {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Timeout. {0}")]
    Timeout(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

impl From<DeadlineExceeded> for CatalogError {
    fn from(e: DeadlineExceeded) -> Self {
        CatalogError::Timeout(e.to_string())
    }
}
