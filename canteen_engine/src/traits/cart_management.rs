use thiserror::Error;

use crate::{
    db_types::{CartEntry, CartLine, ProductId, UserId},
    helpers::DeadlineExceeded,
};

/// Per-user shopping carts.
///
/// Every mutation enforces the stock ceiling: the persisted quantity of a line never exceeds the product's stock at the
/// moment of the write. Implementations must perform the check and the write as one atomic conditional statement; a
/// separate read followed by a write lets two concurrent adds overshoot the stock.
#[allow(async_fn_in_trait)]
pub trait CartManagement: Clone {
    /// Adds `quantity` units of the product to the user's cart, merging with any existing line.
    ///
    /// Fails with `InsufficientStock` if the merged quantity would exceed stock (nothing is partially filled), or
    /// `ProductNotFound` if the product does not exist.
    async fn add_to_cart(&self, user: &UserId, product: ProductId, quantity: i64) -> Result<CartLine, CartError>;

    /// Sets an existing line to exactly `quantity`. Fails with `LineNotFound` if there is no such line.
    async fn set_cart_quantity(&self, user: &UserId, product: ProductId, quantity: i64)
        -> Result<CartLine, CartError>;

    /// Deletes the line. Fails with `LineNotFound` if there is no such line.
    async fn remove_from_cart(&self, user: &UserId, product: ProductId) -> Result<(), CartError>;

    /// Returns the user's cart lines joined with current product data. Lines whose product no longer exists are left
    /// out.
    async fn fetch_cart(&self, user: &UserId) -> Result<Vec<CartEntry>, CartError>;

    /// Deletes every line in the user's cart, returning the number of lines removed.
    async fn clear_cart(&self, user: &UserId) -> Result<u64, CartError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Quantity must be a positive integer, but got {0}")]
    InvalidQuantity(i64),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Product {product_id} is not in the cart of user {user_id}")]
    LineNotFound { user_id: UserId, product_id: ProductId },
    #[error("Insufficient stock for product {product_id}. Requested {requested}, but only {available} available")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64 },
    #[error("The cart total cannot be represented. {0}")]
    Overflow(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Timeout. {0}")]
    Timeout(String),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::DatabaseError(e.to_string())
    }
}

impl From<DeadlineExceeded> for CartError {
    fn from(e: DeadlineExceeded) -> Self {
        CartError::Timeout(e.to_string())
    }
}
