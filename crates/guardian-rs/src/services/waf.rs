//! Web Application Firewall: regex inspection of request content.
//!
//! Rules come from the `security.waf` config section and are compiled once at
//! construction. A malformed pattern is a startup error, never a per-request
//! one.

use crate::models::error::GatewayError;
use crate::models::gateway::WafSettings;
use log::warn;
use regex::{Regex, RegexBuilder};

/// A compiled WAF rule.
#[derive(Debug, Clone)]
struct WafRule {
    name: String,
    pattern: Regex,
}

/// Regex-based request inspector.
///
/// Patterns are matched case-insensitively against the composed request
/// content (path, headers, body, query). Rules are evaluated in declaration
/// order; the first match blocks the request.
#[derive(Debug, Clone)]
pub struct Waf {
    enabled: bool,
    rules: Vec<WafRule>,
}

impl Waf {
    /// Compiles the configured rules. Fails if any pattern is not a valid
    /// regular expression.
    pub fn new(settings: &WafSettings) -> Result<Self, GatewayError> {
        let mut rules = Vec::with_capacity(settings.rules.len());
        for rule in &settings.rules {
            let pattern = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| GatewayError::Config {
                    message: format!("invalid WAF pattern in rule '{}': {}", rule.name, e),
                })?;
            rules.push(WafRule {
                name: rule.name.clone(),
                pattern,
            });
        }

        Ok(Self {
            enabled: settings.enabled,
            rules,
        })
    }

    /// Inspects composed request content against all rules.
    ///
    /// Returns `Ok(())` when the WAF is disabled or nothing matches;
    /// otherwise the name of the first matching rule is carried in the error.
    pub fn inspect(&self, content: &str) -> Result<(), GatewayError> {
        if !self.enabled {
            return Ok(());
        }

        for rule in &self.rules {
            if rule.pattern.is_match(content) {
                warn!("WAF rule '{}' matched request content", rule.name);
                return Err(GatewayError::WafBlocked {
                    rule: rule.name.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
