//! HTTP route handlers and endpoint definitions for the Guardian gateway.
//!
//! # Module Organization
//!
//! - [`health`] - health, readiness and liveness probes (bypass the pipeline)
//! - [`metrics`] - metrics collection and Prometheus exposition
//! - [`proxy`] - `/check-access` and the catch-all admission + forwarding route
//! - [`auth_http`] - token and session endpoints
//!
//! Route registration order matters: the named endpoints must be configured
//! before the proxy module's catch-all resource, or the catch-all swallows
//! them.

pub mod auth_http;
pub mod health;
pub mod metrics;
pub mod proxy;
