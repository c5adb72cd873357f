//! Order lookups, and the admin side of the order lifecycle.
use std::fmt::Debug;

use log::*;

use crate::{
    canteen_api::ApiTimeouts,
    db_types::{Order, OrderId, UserId},
    helpers::with_deadline,
    traits::{OrderManagement, OrderManagementError},
};

pub struct OrdersApi<B> {
    db: B,
    timeouts: ApiTimeouts,
    allow_unpaid_delivery: bool,
}

impl<B: Debug> Debug for OrdersApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrdersApi ({:?})", self.db)
    }
}

impl<B> OrdersApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db, timeouts: ApiTimeouts::default(), allow_unpaid_delivery: false }
    }

    pub fn with_timeouts(mut self, timeouts: ApiTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// When set, `Pending` orders may also be marked as delivered. Delivered orders can still never be re-delivered.
    pub fn with_unpaid_delivery(mut self, allow: bool) -> Self {
        self.allow_unpaid_delivery = allow;
        self
    }

    /// The customer's orders, newest first, exactly as they were priced at checkout.
    pub async fn history(&self, customer_id: &UserId) -> Result<Vec<Order>, OrderManagementError> {
        with_deadline(self.timeouts.store, "fetch order history", self.db.fetch_orders_for_customer(customer_id)).await
    }

    pub async fn all_orders(&self) -> Result<Vec<Order>, OrderManagementError> {
        with_deadline(self.timeouts.store, "fetch all orders", self.db.fetch_all_orders()).await
    }

    pub async fn order(&self, id: OrderId) -> Result<Order, OrderManagementError> {
        with_deadline(self.timeouts.store, "fetch order", self.db.fetch_order(id))
            .await?
            .ok_or(OrderManagementError::OrderNotFound(id))
    }

    /// Marks the order as delivered. Only `Paid` orders qualify, unless unpaid delivery has been enabled.
    pub async fn mark_delivered(&self, id: OrderId) -> Result<Order, OrderManagementError> {
        let order = with_deadline(
            self.timeouts.store,
            "mark order delivered",
            self.db.mark_delivered(id, self.allow_unpaid_delivery),
        )
        .await
        .map_err(|e| {
            debug!("📦️ Order {id} could not be marked as delivered. {e}");
            e
        })?;
        if !order.is_paid {
            warn!("📦️ Order {id} was delivered without being paid for");
        }
        info!("📦️ Order {id} has been delivered to {}", order.customer_id);
        Ok(order)
    }
}
