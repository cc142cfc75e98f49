//! Configuration management for the Guardian gateway.
//!
//! - [`settings`] - YAML configuration file loading
//! - [`validation`] - comprehensive startup validation
//!
//! The configuration path comes from `GUARDIAN_CONFIG_PATH` (default
//! `./config.yaml`). Validation errors are fatal at startup; warnings are
//! logged and the gateway proceeds.

pub mod settings;
pub mod validation;
