use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType, ProductId},
    helpers::DeadlineExceeded,
    traits::{CartError, GatewayError, OrderManagementError},
};

/// Errors from the checkout and payment flows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderFlowError {
    #[error("The cart is empty")]
    EmptyCart,
    #[error("Insufficient stock for product {product_id}. Requested {requested}, but only {available} available")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64 },
    #[error("Invalid input. {0}")]
    InvalidInput(String),
    #[error("Invalid payment signature. {0}")]
    InvalidSignature(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Stock for product {product_id} cannot cover {requested} units for order {order_id}")]
    StockConflict { order_id: OrderId, product_id: ProductId, requested: i64 },
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Payment gateway error. {0}")]
    GatewayError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Timeout. {0}")]
    Timeout(String),
}

impl From<OrderManagementError> for OrderFlowError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::OrderNotFound(id) => Self::OrderNotFound(id),
            OrderManagementError::InvalidTransition { order_id, from, to } => {
                Self::InvalidTransition { order_id, from, to }
            },
            OrderManagementError::StockConflict { order_id, product_id, requested } => {
                Self::StockConflict { order_id, product_id, requested }
            },
            OrderManagementError::GatewayReferenceMismatch(_) => Self::InvalidSignature(e.to_string()),
            OrderManagementError::InvalidInput(s) => Self::InvalidInput(s),
            OrderManagementError::DatabaseError(s) => Self::DatabaseError(s),
            OrderManagementError::Timeout(s) => Self::Timeout(s),
        }
    }
}

impl From<CartError> for OrderFlowError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::InsufficientStock { product_id, requested, available } => {
                Self::InsufficientStock { product_id, requested, available }
            },
            CartError::DatabaseError(s) => Self::DatabaseError(s),
            CartError::Timeout(s) => Self::Timeout(s),
            e => Self::InvalidInput(e.to_string()),
        }
    }
}

impl From<GatewayError> for OrderFlowError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Timeout(s) => Self::Timeout(s),
            e => Self::GatewayError(e.to_string()),
        }
    }
}

impl From<DeadlineExceeded> for OrderFlowError {
    fn from(e: DeadlineExceeded) -> Self {
        Self::Timeout(e.to_string())
    }
}
