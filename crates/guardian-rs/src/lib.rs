//! # Guardian
//!
//! A security-oriented reverse-proxy gateway built with Rust and Actix Web.
//! Guardian sits in front of a pool of backend servers and enforces access,
//! rate and content policies on every request it forwards: clients address it
//! as an ordinary HTTP endpoint, and Guardian decides whether the request is
//! admitted, redirected, or dispatched to an upstream.
//!
//! ## Request Pipeline
//!
//! Every proxied request passes through a fixed sequence of policy engines:
//!
//! ```text
//! ┌────────┐   ┌─────────────────────────────────────────┐   ┌──────────┐
//! │ Client │──▶│  RateLimiter → IP ACL → WAF → Redirect  │──▶│ Upstream │
//! └────────┘   │        → LoadBalancer → Forwarder       │   └──────────┘
//!              └─────────────────────────────────────────┘
//! ```
//!
//! The pipeline short-circuits on the first denial; rate limiting runs first
//! so ban state accrues even for requests that would have failed access
//! control. Session management and JWT authentication are separate
//! subsystems consumed through their own endpoints.
//!
//! ## Quick Start
//!
//! ```no_run
//! use guardian_rs::config::settings::load_config;
//! use guardian_rs::config::validation::ConfigValidator;
//! use guardian_rs::services::gateway::GatewayService;
//!
//! let config = load_config("config.yaml").expect("Failed to load configuration");
//! let validation = ConfigValidator::validate_comprehensive(&config);
//! assert!(validation.is_valid);
//!
//! let service = GatewayService::from_config(&config).expect("Invalid configuration");
//! service.start();
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - configuration loading and startup validation
//! - [`models`] - configuration model and error taxonomy
//! - [`services`] - the policy engines and upstream forwarding
//! - [`routes`] - HTTP surface (pipeline, health, metrics, auth)
//! - [`middleware`] - security headers
//! - [`logs`] - logger configuration
//! - [`utils`] - small shared helpers
//!
//! ## Environment Variables
//!
//! - `GUARDIAN_CONFIG_PATH`: configuration file path (default `./config.yaml`)
//! - `GUARDIAN_JWT_SECRET`: HS256 signing secret for access tokens
//! - `RUST_LOG`: overrides the configured log level
//! - `NO_COLOR`: disables colored log output

pub mod config;
pub mod logs;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;
