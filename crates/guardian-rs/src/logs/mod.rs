//! Logging configuration for the gateway.

pub mod logger;
