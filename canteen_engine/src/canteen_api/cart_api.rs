//! The cart aggregator.
use std::fmt::Debug;

use log::*;

use crate::{
    canteen_api::{order_objects::CartSummary, ApiTimeouts},
    db_types::{CartLine, Paise, ProductId, UserId},
    helpers::with_deadline,
    traits::{CartError, CartManagement},
};

pub struct CartApi<B> {
    db: B,
    timeouts: ApiTimeouts,
}

impl<B: Debug> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi ({:?})", self.db)
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub fn new(db: B) -> Self {
        Self { db, timeouts: ApiTimeouts::default() }
    }

    pub fn with_timeouts(mut self, timeouts: ApiTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Adds `quantity` units to the user's cart. Repeated adds of the same product are merged, and the merged quantity
    /// may not exceed the product's stock.
    pub async fn add_item(&self, user: &UserId, product: ProductId, quantity: i64) -> Result<CartLine, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let line =
            with_deadline(self.timeouts.store, "add to cart", self.db.add_to_cart(user, product, quantity)).await?;
        debug!("🛒️ {user} added {quantity} of product {product}. Line is now {}", line.quantity);
        Ok(line)
    }

    /// Sets the quantity of an existing cart line (an absolute value, not an increment).
    pub async fn update_item(&self, user: &UserId, product: ProductId, quantity: i64) -> Result<CartLine, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let line = with_deadline(
            self.timeouts.store,
            "update cart line",
            self.db.set_cart_quantity(user, product, quantity),
        )
        .await?;
        debug!("🛒️ {user} set product {product} to {quantity}");
        Ok(line)
    }

    pub async fn remove_item(&self, user: &UserId, product: ProductId) -> Result<(), CartError> {
        with_deadline(self.timeouts.store, "remove cart line", self.db.remove_from_cart(user, product)).await?;
        debug!("🛒️ {user} removed product {product} from their cart");
        Ok(())
    }

    /// The user's cart priced at current catalog prices, with a grand total.
    pub async fn cart(&self, user: &UserId) -> Result<CartSummary, CartError> {
        let items = with_deadline(self.timeouts.store, "fetch cart", self.db.fetch_cart(user)).await?;
        let grand_total = Paise::checked_sum(items.iter().map(|i| i.line_total))
            .ok_or_else(|| CartError::Overflow(format!("Grand total for {user}")))?;
        trace!("🛒️ {user} has {} lines in their cart, totalling {grand_total}", items.len());
        Ok(CartSummary { items, grand_total })
    }

    pub async fn clear(&self, user: &UserId) -> Result<u64, CartError> {
        with_deadline(self.timeouts.store, "clear cart", self.db.clear_cart(user)).await
    }
}
