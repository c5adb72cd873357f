//! Canteen Engine
//!
//! The canteen engine holds the consistency-critical core of the canteen ordering backend: the cart → order → payment
//! lifecycle. It guarantees that
//! * stock is never oversold,
//! * orders are immutable snapshots of the cart and catalog at checkout time,
//! * payment callbacks are only accepted when their signature checks out,
//! * a payment's side effects (stock debit, status change, cart clearing) happen exactly once, however often the
//!   callback is replayed.
//!
//! The library is divided into three main sections:
//! 1. Backend traits ([`mod@traits`]) and the SQLite backend that implements them ([`mod@sqlite`]). You should never
//!    need to access the database directly. The exception is the data types used in the database. These are defined in
//!    the [`mod@db_types`] module and are public.
//! 2. The public API ([`mod@canteen_api`]): [`CatalogApi`], [`CartApi`], [`OrderFlowApi`] and [`OrdersApi`]. Each wraps
//!    a backend and bounds every store and gateway call with a timeout.
//! 3. Helpers ([`mod@helpers`]) for payment signature verification and deadlines.
pub mod canteen_api;
pub mod db_types;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use canteen_api::{
    cart_api::CartApi,
    catalog_api::CatalogApi,
    errors::OrderFlowError,
    order_flow_api::OrderFlowApi,
    order_objects,
    orders_api::OrdersApi,
    ApiTimeouts,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
