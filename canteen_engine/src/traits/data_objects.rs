use canteen_common::Paise;
use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// The gateway-side transaction created for an order at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayTransaction {
    pub gateway_order_id: String,
    pub amount: Paise,
    pub currency: String,
}

/// The references carried by a verified payment callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentApplied {
    /// The order moved to `Paid` and its stock was debited by this call.
    Applied(Order),
    /// The order had already been paid. Nothing was changed.
    AlreadyApplied(Order),
}

impl PaymentApplied {
    pub fn order(&self) -> &Order {
        match self {
            PaymentApplied::Applied(o) | PaymentApplied::AlreadyApplied(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            PaymentApplied::Applied(o) | PaymentApplied::AlreadyApplied(o) => o,
        }
    }
}
