//! Razorpay tools
//!
//! A small client for the parts of the Razorpay REST API that the canteen needs: creating an order (the remote
//! transaction a customer pays against) and fetching it back.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::RazorpayApi;
pub use config::RazorpayConfig;
pub use data_objects::{NewRazorpayOrder, RazorpayOrder};
pub use error::RazorpayApiError;
