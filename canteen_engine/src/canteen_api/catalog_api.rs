//! Catalog browsing and maintenance, plus direct access to the stock ledger.
use std::fmt::Debug;

use log::*;

use crate::{
    canteen_api::ApiTimeouts,
    db_types::{NewProduct, Product, ProductId, ProductUpdate},
    helpers::with_deadline,
    traits::{CatalogError, CatalogManagement},
};

pub struct CatalogApi<B> {
    db: B,
    timeouts: ApiTimeouts,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db, timeouts: ApiTimeouts::default() }
    }

    pub fn with_timeouts(mut self, timeouts: ApiTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub async fn available_products(&self) -> Result<Vec<Product>, CatalogError> {
        with_deadline(self.timeouts.store, "fetch products", self.db.fetch_available_products()).await
    }

    pub async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        with_deadline(self.timeouts.store, "fetch product", self.db.fetch_product(id))
            .await?
            .ok_or(CatalogError::ProductNotFound(id))
    }

    pub async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        product.validate().map_err(CatalogError::InvalidInput)?;
        let product = with_deadline(self.timeouts.store, "insert product", self.db.insert_product(product)).await?;
        info!("📦️ Product {} ({}) added to the catalog by {}", product.id, product.name, product.created_by);
        Ok(product)
    }

    pub async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product, CatalogError> {
        update.validate().map_err(CatalogError::InvalidInput)?;
        let product = with_deadline(self.timeouts.store, "update product", self.db.update_product(id, update)).await?;
        debug!("📦️ Product {id} updated. Price {}, stock {}", product.price, product.quantity);
        Ok(product)
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        with_deadline(self.timeouts.store, "delete product", self.db.delete_product(id)).await?;
        info!("📦️ Product {id} removed from the catalog");
        Ok(())
    }

    /// Current stock for the product. This is a plain read, and reserves nothing.
    pub async fn stock_level(&self, id: ProductId) -> Result<i64, CatalogError> {
        with_deadline(self.timeouts.store, "check stock", self.db.check_available(id)).await
    }

    /// Permanently consumes `amount` units of stock, if they are available.
    pub async fn debit_stock(&self, id: ProductId, amount: i64) -> Result<i64, CatalogError> {
        let remaining = with_deadline(self.timeouts.store, "debit stock", self.db.debit_stock(id, amount)).await?;
        debug!("📦️ Debited {amount} units of product {id}. {remaining} remaining");
        Ok(remaining)
    }

    pub async fn restock(&self, id: ProductId, amount: i64) -> Result<i64, CatalogError> {
        let stock = with_deadline(self.timeouts.store, "credit stock", self.db.credit_stock(id, amount)).await?;
        debug!("📦️ Restocked product {id} with {amount} units. {stock} in stock");
        Ok(stock)
    }
}
