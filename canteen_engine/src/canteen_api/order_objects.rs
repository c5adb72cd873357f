use serde::{Deserialize, Serialize};

use crate::{
    db_types::{CartEntry, Order, Paise},
    traits::GatewayTransaction,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartEntry>,
    pub grand_total: Paise,
}

/// The result of a successful checkout: the persisted order snapshot plus what the client needs to open the payment
/// UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub order: Order,
    pub transaction: GatewayTransaction,
    /// The gateway's public key id.
    pub key_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub order: Order,
    /// False if the payment had already been applied by an earlier callback.
    pub newly_paid: bool,
    /// Whether the customer's cart was cleared by this call.
    pub cart_cleared: bool,
}
