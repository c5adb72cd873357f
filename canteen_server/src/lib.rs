//! # Canteen server
//! This crate hosts the HTTP surface of the canteen ordering backend. It is responsible for:
//! * Validating the bearer tokens issued by the identity provider, and enforcing role-based access on every route.
//! * Translating requests into calls on the canteen engine APIs, and engine errors into HTTP responses.
//! * Talking to Razorpay, the payment gateway, on behalf of the engine.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! `/health` is unauthenticated. Every other route requires a valid `Authorization: Bearer <token>` header. See
//! [routes](routes/index.html) for the full list.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
