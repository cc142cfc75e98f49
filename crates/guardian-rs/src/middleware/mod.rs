//! Cross-cutting HTTP middleware for the gateway.
//!
//! - [`security`] - response security headers applied to every route

pub mod security;
