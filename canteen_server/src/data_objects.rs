use std::fmt::Display;

use canteen_engine::{
    db_types::{CartLine, NewProduct, Order, OrderId, Paise},
    order_objects::Checkout,
};
use serde::{de, Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineResponse {
    pub message: String,
    pub cart_line: CartLine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Paise,
    pub quantity: i64,
}

impl NewProductRequest {
    pub fn into_new_product(self, created_by: &str) -> NewProduct {
        NewProduct::new(self.name, self.price, self.quantity)
            .with_description(self.description)
            .with_created_by(created_by)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutUser {
    pub name: String,
    pub email: String,
}

/// What the client needs to open the Razorpay checkout widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    #[serde(rename = "orderID")]
    pub order_id: OrderId,
    #[serde(rename = "gatewayOrderID")]
    pub gateway_order_id: String,
    pub amount: Paise,
    pub currency: String,
    pub key: String,
    pub user: CheckoutUser,
}

impl From<Checkout> for CheckoutResponse {
    fn from(checkout: Checkout) -> Self {
        Self {
            order_id: checkout.order.id,
            gateway_order_id: checkout.transaction.gateway_order_id,
            amount: checkout.transaction.amount,
            currency: checkout.transaction.currency,
            key: checkout.key_id,
            user: CheckoutUser { name: checkout.order.customer_name, email: checkout.order.customer_email },
        }
    }
}

/// The payload the Razorpay widget hands to the client after a successful payment, plus our own order id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerificationRequest {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
    #[serde(rename = "orderID", deserialize_with = "order_id_from_number_or_string")]
    pub order_id: OrderId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerificationResponse {
    pub message: String,
    pub order: Order,
    pub cart_cleared: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub message: String,
    pub order: Order,
}

/// Clients send the order id back either as a JSON number or as a string.
fn order_id_from_number_or_string<'de, D>(deserializer: D) -> Result<OrderId, D::Error>
where D: Deserializer<'de> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }
    match RawId::deserialize(deserializer)? {
        RawId::Number(n) if n > 0 => Ok(OrderId(n)),
        RawId::Number(n) => Err(de::Error::custom(format!("{n} is not a valid order id"))),
        RawId::Text(s) => s.parse().map_err(de::Error::custom),
    }
}
