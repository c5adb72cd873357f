use std::time::Duration;

use canteen_common::Secret;
use log::*;

pub const DEFAULT_RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1";
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    /// The public key id. It is also handed to clients so that the checkout widget can be opened.
    pub key_id: String,
    /// The API secret. Razorpay also uses it as the HMAC key when signing payment callbacks.
    pub key_secret: Secret<String>,
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            key_id: String::default(),
            key_secret: Secret::default(),
            api_url: DEFAULT_RAZORPAY_API_URL.to_string(),
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

impl RazorpayConfig {
    pub fn new_from_env_or_default() -> Self {
        let key_id = std::env::var("CANTEEN_RAZORPAY_KEY_ID").unwrap_or_else(|_| {
            warn!("🪛️ CANTEEN_RAZORPAY_KEY_ID not set, using (probably useless) default");
            "rzp_test_00000000000000".to_string()
        });
        let key_secret = Secret::new(std::env::var("CANTEEN_RAZORPAY_KEY_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ CANTEEN_RAZORPAY_KEY_SECRET not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let api_url = std::env::var("CANTEEN_RAZORPAY_API_URL").unwrap_or_else(|_| {
            info!("🪛️ CANTEEN_RAZORPAY_API_URL not set, using {DEFAULT_RAZORPAY_API_URL}");
            DEFAULT_RAZORPAY_API_URL.to_string()
        });
        let timeout = std::env::var("CANTEEN_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid value for CANTEEN_GATEWAY_TIMEOUT_SECS. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_GATEWAY_TIMEOUT);
        Self { key_id, key_secret, api_url, timeout }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
