use thiserror::Error;

use crate::{db_types::Order, helpers::DeadlineExceeded, traits::GatewayTransaction};

/// The remote payment provider.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// The public key that clients use to open the provider's payment UI.
    fn key_id(&self) -> &str;

    /// Creates the remote transaction the customer will pay against. The order id is passed on as the receipt.
    async fn create_transaction(&self, order: &Order) -> Result<GatewayTransaction, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("The payment gateway could not be reached. {0}")]
    Unavailable(String),
    #[error("The payment gateway rejected the request. {0}")]
    Rejected(String),
    #[error("Timeout. {0}")]
    Timeout(String),
}

impl From<DeadlineExceeded> for GatewayError {
    fn from(e: DeadlineExceeded) -> Self {
        GatewayError::Timeout(e.to_string())
    }
}
