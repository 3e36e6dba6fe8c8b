//! HTTP request handlers.
//!
//! Handlers stay thin: extract, delegate to a service, wrap in JSON.

pub mod auth;
pub mod health;
pub mod notify;
pub mod summaries;
pub mod users;
