use canteen_engine::{
    db_types::{Order, Paise},
    traits::{GatewayError, GatewayTransaction, PaymentGateway},
};
use log::*;
use razorpay_tools::{NewRazorpayOrder, RazorpayApi, RazorpayApiError, RazorpayConfig};

/// Razorpay, as the canteen engine's payment gateway.
#[derive(Clone)]
pub struct RazorpayGateway {
    api: RazorpayApi,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, RazorpayApiError> {
        let api = RazorpayApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> &str {
        self.api.key_id()
    }

    async fn create_transaction(&self, order: &Order) -> Result<GatewayTransaction, GatewayError> {
        let request = NewRazorpayOrder::new(order.total, order.id.value().to_string());
        let remote = self.api.create_order(request).await.map_err(gateway_error)?;
        if remote.amount != order.total.value() {
            warn!(
                "💰️ Razorpay order {} is for {} paise, but order {} totals {}",
                remote.id, remote.amount, order.id, order.total
            );
            return Err(GatewayError::Rejected(format!("Razorpay recorded the wrong amount for order {}", order.id)));
        }
        debug!("💰️ Razorpay order {} created for order {}", remote.id, order.id);
        Ok(GatewayTransaction {
            gateway_order_id: remote.id,
            amount: Paise::from(remote.amount),
            currency: remote.currency,
        })
    }
}

fn gateway_error(e: RazorpayApiError) -> GatewayError {
    match e {
        RazorpayApiError::Timeout(s) => GatewayError::Timeout(s),
        RazorpayApiError::QueryError { .. } | RazorpayApiError::InvalidAmount(_) => {
            GatewayError::Rejected(e.to_string())
        },
        _ => GatewayError::Unavailable(e.to_string()),
    }
}
