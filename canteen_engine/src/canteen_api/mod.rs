use std::time::Duration;

pub mod cart_api;
pub mod catalog_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod orders_api;

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bounds on how long the APIs wait for the store and for the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTimeouts {
    pub store: Duration,
    pub gateway: Duration,
}

impl Default for ApiTimeouts {
    fn default() -> Self {
        Self { store: DEFAULT_STORE_TIMEOUT, gateway: DEFAULT_GATEWAY_TIMEOUT }
    }
}
