//! Comprehensive configuration validation with detailed error reporting.
//!
//! Errors make the configuration unusable and are fatal at startup; warnings
//! point at likely mistakes but let the gateway run.

use crate::models::gateway::GatewayConfig;
use log::{info, warn};
use regex::RegexBuilder;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates a loaded gateway configuration before the server starts.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Runs every validation pass and logs the outcome.
    pub fn validate_comprehensive(config: &GatewayConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_general(config, &mut result);
        Self::validate_access_control(config, &mut result);
        Self::validate_redirection(config, &mut result);
        Self::validate_load_balancing(config, &mut result);
        Self::validate_security(config, &mut result);

        Self::log_validation_results(&result);
        result
    }

    fn validate_general(config: &GatewayConfig, result: &mut ValidationResult) {
        if config.general.listen_port == 0 {
            result.add_error("listen_port must be non-zero".to_string());
        }
        if config.general.listen_address.is_empty() {
            result.add_error("listen_address must not be empty".to_string());
        }
    }

    fn validate_access_control(config: &GatewayConfig, result: &mut ValidationResult) {
        let allowed: HashSet<&String> = config.access_control.allowed_ips.iter().collect();
        for ip in &config.access_control.blocked_ips {
            if allowed.contains(ip) {
                result.add_warning(format!(
                    "IP {} appears in both allowed and blocked lists - block wins",
                    ip
                ));
            }
        }
    }

    fn validate_redirection(config: &GatewayConfig, result: &mut ValidationResult) {
        if !config.redirection.enabled {
            return;
        }

        for (index, rule) in config.redirection.rules.iter().enumerate() {
            if rule.name.is_empty() {
                result.add_warning(format!("Redirect rule {} has no name", index));
            }

            let has_port_pair = rule.source_port.is_some() && rule.destination_port.is_some();
            let has_path_pair = rule.source_path.is_some() && rule.destination_path.is_some();

            if !has_port_pair && !has_path_pair {
                result.add_error(format!(
                    "Redirect rule '{}' needs source_port/destination_port or source_path/destination_path",
                    rule.name
                ));
            }
            if rule.source_port.is_some() != rule.destination_port.is_some() {
                result.add_error(format!(
                    "Redirect rule '{}' has an unpaired port field",
                    rule.name
                ));
            }
            if rule.source_path.is_some() != rule.destination_path.is_some() {
                result.add_error(format!(
                    "Redirect rule '{}' has an unpaired path field",
                    rule.name
                ));
            }
        }
    }

    fn validate_load_balancing(config: &GatewayConfig, result: &mut ValidationResult) {
        if !config.load_balancing.enabled {
            return;
        }

        if config.load_balancing.servers.is_empty() {
            result.add_error(
                "Load balancing is enabled but no servers are configured".to_string(),
            );
        }

        let mut seen = HashSet::new();
        for server in &config.load_balancing.servers {
            if server.address.is_empty() {
                result.add_error("Upstream server with empty address".to_string());
            }
            if server.port == 0 {
                result.add_error(format!(
                    "Upstream server {} has port 0",
                    server.address
                ));
            }
            if !seen.insert(&server.address) {
                // Health and connection maps are keyed by address.
                result.add_warning(format!(
                    "Duplicate upstream address {} - health state is shared",
                    server.address
                ));
            }
        }
    }

    fn validate_security(config: &GatewayConfig, result: &mut ValidationResult) {
        let rate_limiting = &config.security.rate_limiting;
        if rate_limiting.enabled {
            if rate_limiting.max_requests_per_minute == 0 {
                result.add_error("max_requests_per_minute must be greater than zero".to_string());
            }
            if rate_limiting.ban_duration == 0 {
                result.add_warning(
                    "ban_duration is 0 - offenders are re-evaluated immediately".to_string(),
                );
            }
        }

        let waf = &config.security.waf;
        if waf.enabled {
            if waf.rules.is_empty() {
                result.add_warning("WAF is enabled without any rules".to_string());
            }
            for rule in &waf.rules {
                if rule.pattern.is_empty() {
                    result.add_error(format!("WAF rule '{}' has an empty pattern", rule.name));
                    continue;
                }
                if let Err(e) = RegexBuilder::new(&rule.pattern).case_insensitive(true).build() {
                    result.add_error(format!(
                        "WAF rule '{}' has an invalid pattern: {}",
                        rule.name, e
                    ));
                }
                if rule.action != "block" {
                    result.add_warning(format!(
                        "WAF rule '{}' has unsupported action '{}' - treated as block",
                        rule.name, rule.action
                    ));
                }
            }
        }

        if config.security.session_management.enabled
            && config.security.session_management.session_timeout == 0
        {
            result.add_warning(
                "session_timeout is 0 - sessions expire on their first validation".to_string(),
            );
        }
    }

    fn log_validation_results(result: &ValidationResult) {
        if result.is_valid {
            info!("Configuration validation passed");
        } else {
            for error in &result.errors {
                log::error!("Validation error: {}", error);
            }
        }

        for warning in &result.warnings {
            warn!("Validation warning: {}", warning);
        }
    }
}
