use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType, ProductId, UserId},
    helpers::DeadlineExceeded,
    traits::{PaymentApplied, PaymentConfirmation},
};

/// Order persistence and the order state machine.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Stores a new `Pending` order and its items in a single transaction.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError>;

    /// Records the payment gateway's order reference against a `Pending` order. A reference can only be bound once.
    async fn bind_gateway_order(&self, id: OrderId, gateway_order_id: &str) -> Result<Order, OrderManagementError>;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, OrderManagementError>;

    /// Every order for the customer, newest first.
    async fn fetch_orders_for_customer(&self, customer_id: &UserId) -> Result<Vec<Order>, OrderManagementError>;

    /// Every order in the system, newest first.
    async fn fetch_all_orders(&self) -> Result<Vec<Order>, OrderManagementError>;

    /// Applies a verified payment to the order as one atomic unit:
    /// * the order is marked paid, with the gateway references recorded, and moves from `Pending` to `Paid`,
    /// * every item's quantity is debited from stock.
    ///
    /// An order that was delivered before it was paid keeps its `Delivered` status but is otherwise treated the same.
    /// If any debit cannot be covered, nothing is changed and `StockConflict` is returned. If the order is already
    /// paid, nothing is changed and `PaymentApplied::AlreadyApplied` is returned, so replayed callbacks are harmless.
    /// The callback's gateway order reference must match the one bound to the order.
    async fn apply_payment(
        &self,
        id: OrderId,
        confirmation: &PaymentConfirmation,
    ) -> Result<PaymentApplied, OrderManagementError>;

    /// Moves the order to `Delivered`. Unless `allow_unpaid` is set, only `Paid` orders may be delivered.
    async fn mark_delivered(&self, id: OrderId, allow_unpaid: bool) -> Result<Order, OrderManagementError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderManagementError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Stock for product {product_id} cannot cover {requested} units for order {order_id}")]
    StockConflict { order_id: OrderId, product_id: ProductId, requested: i64 },
    #[error("The gateway reference does not match the one issued for order {0}")]
    GatewayReferenceMismatch(OrderId),
    #[error("Invalid order data. {0}")]
    InvalidInput(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Timeout. {0}")]
    Timeout(String),
}

impl From<sqlx::Error> for OrderManagementError {
    fn from(e: sqlx::Error) -> Self {
        OrderManagementError::DatabaseError(e.to_string())
    }
}

impl From<DeadlineExceeded> for OrderManagementError {
    fn from(e: DeadlineExceeded) -> Self {
        OrderManagementError::Timeout(e.to_string())
    }
}
