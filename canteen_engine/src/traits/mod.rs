//! Backend traits for the canteen engine.
//!
//! Storage backends implement [`CatalogManagement`], [`CartManagement`] and [`OrderManagement`]; anything implementing
//! all three is automatically a [`CanteenDatabase`]. The remote payment provider is abstracted by [`PaymentGateway`].
mod cart_management;
mod catalog_management;
mod data_objects;
mod order_management;
mod payment_gateway;

pub use cart_management::{CartError, CartManagement};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use data_objects::{GatewayTransaction, PaymentApplied, PaymentConfirmation};
pub use order_management::{OrderManagement, OrderManagementError};
pub use payment_gateway::{GatewayError, PaymentGateway};

/// The full set of storage behaviour needed to run the cart → order → payment flow.
pub trait CanteenDatabase: CatalogManagement + CartManagement + OrderManagement {}

impl<T> CanteenDatabase for T where T: CatalogManagement + CartManagement + OrderManagement {}
