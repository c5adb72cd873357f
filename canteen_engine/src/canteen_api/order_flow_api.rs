//! The checkout and payment flows.
//!
//! Checkout turns the customer's cart into an immutable `Pending` order and opens a transaction with the payment
//! gateway. Payment confirmation verifies the gateway's signature and then applies the payment to the order exactly
//! once: stock is debited, the order is marked `Paid`, and the customer's cart is cleared.
use std::{fmt::Debug, time::Duration};

use chrono::Utc;
use log::*;

use crate::{
    canteen_api::{
        errors::OrderFlowError,
        order_objects::{Checkout, PaymentOutcome},
        ApiTimeouts,
    },
    db_types::{CartEntry, Customer, NewOrder, OrderId, OrderItem, Paise, UserId},
    helpers::{with_deadline, PaymentVerifier},
    traits::{CanteenDatabase, CartError, PaymentApplied, PaymentConfirmation, PaymentGateway},
};

pub const ORDER_CURRENCY: &str = canteen_common::INR_CURRENCY_CODE;
pub const PAYMENT_METHOD: &str = "razorpay";

const CART_CLEAR_ATTEMPTS: u32 = 3;
const CART_CLEAR_BACKOFF: Duration = Duration::from_millis(50);

pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    verifier: PaymentVerifier,
    timeouts: ApiTimeouts,
}

impl<B: Debug, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.db)
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, verifier: PaymentVerifier) -> Self {
        Self { db, gateway, verifier, timeouts: ApiTimeouts::default() }
    }

    pub fn with_timeouts(mut self, timeouts: ApiTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: CanteenDatabase,
    G: PaymentGateway,
{
    /// Converts the customer's cart into a `Pending` order and creates the matching transaction with the payment
    /// gateway.
    ///
    /// The order captures names, prices and quantities as they are right now. Later catalog changes do not affect it.
    /// Stock is *not* reserved here; it is only debited once payment is confirmed. The cart is left untouched.
    ///
    /// A cart whose total comes to zero is rejected before any order is stored.
    ///
    /// If the gateway call fails, the order stays `Pending` without a gateway reference and the error is returned.
    pub async fn create_order(&self, customer: Customer) -> Result<Checkout, OrderFlowError> {
        let entries = with_deadline(self.timeouts.store, "fetch cart", self.db.fetch_cart(&customer.id)).await?;
        let (items, total) = snapshot_cart(&entries)?;
        let new_order = NewOrder {
            customer,
            items,
            total,
            currency: ORDER_CURRENCY.to_string(),
            payment_method: PAYMENT_METHOD.to_string(),
            created_at: Utc::now(),
        };
        let order = with_deadline(self.timeouts.store, "insert order", self.db.insert_order(new_order)).await?;
        info!(
            "📦️ Order {} created for {} with {} items. Total {}",
            order.id,
            order.customer_id,
            order.items.len(),
            order.total
        );
        let pending_tx = self.gateway.create_transaction(&order);
        let transaction = match with_deadline(self.timeouts.gateway, "create gateway order", pending_tx).await {
            Ok(tx) => tx,
            Err(e) => {
                error!("💰️ Could not open a payment for order {}. It will remain Pending. {e}", order.id);
                return Err(e.into());
            },
        };
        let order = with_deadline(
            self.timeouts.store,
            "bind gateway order",
            self.db.bind_gateway_order(order.id, &transaction.gateway_order_id),
        )
        .await?;
        debug!("💰️ Order {} is bound to gateway order {}", order.id, transaction.gateway_order_id);
        Ok(Checkout { order, transaction, key_id: self.gateway.key_id().to_string() })
    }

    /// Handles a payment callback from the gateway.
    ///
    /// The signature is checked first. Nothing is read or written when it fails. A valid callback for an order that
    /// has already been paid is acknowledged without repeating any side effects.
    pub async fn verify_and_apply(
        &self,
        order_id: OrderId,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> Result<PaymentOutcome, OrderFlowError> {
        if let Err(e) = self.verifier.verify(gateway_order_id, gateway_payment_id, signature) {
            warn!("💰️ Rejected payment callback for order {order_id} (gateway order {gateway_order_id}). {e}");
            return Err(OrderFlowError::InvalidSignature(e.to_string()));
        }
        let confirmation = PaymentConfirmation {
            gateway_order_id: gateway_order_id.to_string(),
            gateway_payment_id: gateway_payment_id.to_string(),
        };
        let applied =
            with_deadline(self.timeouts.store, "apply payment", self.db.apply_payment(order_id, &confirmation)).await?;
        match applied {
            PaymentApplied::Applied(order) => {
                let cart_cleared = self.clear_cart_after_payment(&order.customer_id).await;
                Ok(PaymentOutcome { order, newly_paid: true, cart_cleared })
            },
            PaymentApplied::AlreadyApplied(order) => {
                info!("💰️ Payment for order {order_id} was already applied. Ignoring the repeat callback.");
                Ok(PaymentOutcome { order, newly_paid: false, cart_cleared: false })
            },
        }
    }

    /// The payment is already committed at this point, so failures are logged rather than returned.
    async fn clear_cart_after_payment(&self, customer_id: &UserId) -> bool {
        for attempt in 1..=CART_CLEAR_ATTEMPTS {
            let result: Result<u64, CartError> =
                with_deadline(self.timeouts.store, "clear cart", self.db.clear_cart(customer_id)).await;
            match result {
                Ok(n) => {
                    debug!("🛒️ Cleared {n} lines from the cart of {customer_id}");
                    return true;
                },
                Err(e) => {
                    error!("🛒️ Attempt {attempt} to clear the cart of {customer_id} failed. {e}");
                    tokio::time::sleep(CART_CLEAR_BACKOFF * attempt).await;
                },
            }
        }
        false
    }
}

/// Freezes the priced cart into order items and a total.
fn snapshot_cart(entries: &[CartEntry]) -> Result<(Vec<OrderItem>, Paise), OrderFlowError> {
    if entries.is_empty() {
        return Err(OrderFlowError::EmptyCart);
    }
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.quantity > entry.stock_remaining {
            return Err(OrderFlowError::InsufficientStock {
                product_id: entry.product_id,
                requested: entry.quantity,
                available: entry.stock_remaining,
            });
        }
        items.push(OrderItem {
            product_id: entry.product_id,
            name: entry.name.clone(),
            unit_price: entry.unit_price,
            quantity: entry.quantity,
            line_total: entry.line_total,
        });
    }
    let total = Paise::checked_sum(items.iter().map(|i| i.line_total))
        .ok_or_else(|| OrderFlowError::InvalidInput("The order total is too large".into()))?;
    // The gateway cannot take a payment of zero, so such an order could never leave `Pending`.
    if total.value() <= 0 {
        return Err(OrderFlowError::InvalidInput("The order total must be greater than zero".into()));
    }
    Ok((items, total))
}
