use canteen_common::{Paise, INR_CURRENCY_CODE};
use serde::{Deserialize, Serialize};

/// Request body for `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRazorpayOrder {
    /// Amount in the smallest currency unit (paise for INR).
    pub amount: i64,
    pub currency: String,
    /// Our own reference for the order. Razorpay limits this to 40 characters.
    pub receipt: String,
    /// 1 = capture payments automatically once authorised.
    pub payment_capture: u8,
}

impl NewRazorpayOrder {
    pub fn new<S: Into<String>>(amount: Paise, receipt: S) -> Self {
        Self {
            amount: amount.value(),
            currency: INR_CURRENCY_CODE.to_string(),
            receipt: receipt.into(),
            payment_capture: 1,
        }
    }
}

/// The subset of Razorpay's order entity that we use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RazorpayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    pub status: String,
}
