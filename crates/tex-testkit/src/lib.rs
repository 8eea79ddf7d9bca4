//! tex-testkit
//!
//! Deterministic collaborators for dashboard scenario tests:
//! - `InMemoryOrderService`: an `OrderService` with scripted failures, a
//!   request log and an optional gate that holds requests until released.
//! - `fixtures`: a small order book with known dates and statuses.

pub mod fixtures;
mod order_service;

pub use order_service::{InMemoryOrderService, StatusRequest};

