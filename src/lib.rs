//! Checkout payment orchestration for the storefront.
//!
//! A checkout acquires a payment order from the storefront backend while the
//! provider's hosted checkout library loads, opens the hosted widget once
//! both are ready, and confirms a provider-reported success with the backend
//! before reporting it to the page.
pub mod acquirer;
pub mod api;
pub mod config;
pub mod core;
pub mod gateway;
pub mod lifetime;
pub mod notify;
pub mod session;
pub mod types;
pub mod verification;

pub use crate::core::{CheckoutError, CheckoutOrchestrator, CheckoutState};
pub use crate::notify::{CheckoutCallbacks, Notifier};
pub use crate::types::{PaymentIntentRequest, PaymentOrderHandle, PaymentOutcome};
