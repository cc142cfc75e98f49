//! Service layer for the Guardian gateway.
//!
//! Each policy engine of the request pipeline lives here as an independent
//! service with its own state and locking discipline, composed by the
//! [`gateway::GatewayService`] orchestrator:
//!
//! ```text
//! Client → RateLimiter → ACL → WAF → Redirector → LoadBalancer → Forwarder → Upstream
//!              ↑                                        ↑
//!        (bans, windows)                     (health, connections)
//! ```
//!
//! - [`rate_limiter`] - sliding-window request counting with temporary bans
//! - [`waf`] - regex content inspection
//! - [`redirect`] - ordered redirection rules
//! - [`load_balancer`] - upstream selection, health and connection tracking
//! - [`session`] - opaque session lifecycle
//! - [`auth`] - HS256 bearer tokens
//! - [`gateway`] - pipeline orchestration
//! - [`http`] - upstream dispatch

pub mod auth;
pub mod gateway;
pub mod http;
pub mod load_balancer;
pub mod rate_limiter;
pub mod redirect;
pub mod session;
pub mod waf;
