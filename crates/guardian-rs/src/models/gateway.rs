use serde::{Deserialize, Serialize};

/// Top-level gateway configuration, immutable after load.
///
/// Mirrors the YAML configuration file section by section. Every section is
/// optional: a missing section deserializes to its default, which leaves the
/// corresponding feature disabled. Unknown keys are ignored so configuration
/// files may carry annotations for other tooling.
///
/// # Configuration File Format
///
/// ```yaml
/// general:
///   gateway_name: Guardian
///   version: "1.0.0"
///   listen_address: 0.0.0.0
///   listen_port: 8080
/// access_control:
///   allowed_ips: ["192.168.1.10"]
///   blocked_ips: ["192.168.1.100"]
/// redirection:
///   enabled: true
///   rules:
///     - name: Redirect HTTP to HTTPS
///       action: redirect
///       source_port: 80
///       destination_port: 443
/// load_balancing:
///   enabled: true
///   strategy: round_robin
///   health_checking: true
///   servers:
///     - address: 10.0.0.1
///       port: 8081
/// security:
///   rate_limiting:
///     enabled: true
///     max_requests_per_minute: 100
///     ban_duration: 300
///   waf:
///     enabled: true
///     rules:
///       - name: Block SQL Injection
///         pattern: "SELECT|UPDATE|DELETE|INSERT|DROP|ALTER"
///         action: block
///   session_management:
///     enabled: true
///     session_timeout: 3600
/// logging:
///   enabled: true
///   log_level: info
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GatewayConfig {
    #[serde(default)]
    pub general: GeneralSettings,

    #[serde(default)]
    pub access_control: AccessControlSettings,

    #[serde(default)]
    pub redirection: RedirectionSettings,

    #[serde(default)]
    pub load_balancing: LoadBalancingSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub security: SecuritySettings,
}

/// Gateway identity and listener settings.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeneralSettings {
    #[serde(default = "default_gateway_name")]
    pub gateway_name: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Address the gateway listens on. Also used as the host of port-based
    /// redirect targets.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            gateway_name: default_gateway_name(),
            version: default_version(),
            listen_address: default_listen_address(),
            listen_port: default_listen_port(),
        }
    }
}

fn default_gateway_name() -> String {
    "Unnamed Gateway".to_string()
}

fn default_version() -> String {
    "0.0.1".to_string()
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    8080
}

/// IP allow/block lists.
///
/// An empty `allowed_ips` list means every IP not blocked is admitted. When
/// an IP appears in both lists the block wins; the pipeline runs the block
/// check first.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AccessControlSettings {
    #[serde(default)]
    pub allowed_ips: Vec<String>,

    #[serde(default)]
    pub blocked_ips: Vec<String>,
}

/// Redirection section: ordered rules, first match wins.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RedirectionSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub rules: Vec<RedirectRule>,
}

/// A single redirection rule.
///
/// A rule matches either on the request port (`source_port` →
/// `destination_port`) or on the request path (`source_path` →
/// `destination_path`). Source paths may end in `*`; the star is stripped and
/// the remainder is treated as a substring of the request path.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RedirectRule {
    pub name: String,

    pub action: RedirectAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<String>,
}

/// Action taken by a matching redirect rule. Only `redirect` exists today;
/// the enum keeps the config forward-compatible.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RedirectAction {
    Redirect,
}

/// Load balancing section.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LoadBalancingSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub strategy: LoadBalancingStrategy,

    /// When enabled, upstreams that fail are excluded from selection until a
    /// cooldown elapses.
    #[serde(default)]
    pub health_checking: bool,

    #[serde(default)]
    pub servers: Vec<Upstream>,
}

/// Strategy used to pick the next upstream.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancingStrategy {
    #[default]
    RoundRobin,
    Random,
    LeastConnections,
}

/// A configured origin server the gateway forwards to.
///
/// The config value is never mutated: health state and connection counts are
/// owned by the load balancer in parallel maps keyed by `address`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub address: String,
    pub port: u16,
}

/// Logging section, consumed by the logger setup at startup.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoggingSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `text` (default) or `json`.
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Optional log file path. When unset, logs go to stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            log_level: default_log_level(),
            log_format: default_log_format(),
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Security section grouping the three security subsystems.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SecuritySettings {
    #[serde(default)]
    pub rate_limiting: RateLimitSettings,

    #[serde(default)]
    pub waf: WafSettings,

    #[serde(default)]
    pub session_management: SessionSettings,
}

/// Sliding-window rate limiting parameters.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RateLimitSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Requests allowed per rolling 60-second window, per client IP.
    #[serde(default = "default_max_requests")]
    pub max_requests_per_minute: u32,

    /// Seconds a client stays banned after hitting the limit.
    #[serde(default = "default_ban_duration")]
    pub ban_duration: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_requests_per_minute: default_max_requests(),
            ban_duration: default_ban_duration(),
        }
    }
}

fn default_max_requests() -> u32 {
    100
}

fn default_ban_duration() -> u64 {
    300
}

/// WAF section: ordered pattern rules.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct WafSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub rules: Vec<WafRuleConfig>,
}

/// A single WAF rule. Patterns are regular expressions matched
/// case-insensitively against the composed request content.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WafRuleConfig {
    pub name: String,
    pub pattern: String,

    #[serde(default = "default_waf_action")]
    pub action: String,
}

fn default_waf_action() -> String {
    "block".to_string()
}

/// Session management section.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Seconds of inactivity before a session expires.
    #[serde(default = "default_session_timeout")]
    pub session_timeout: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            session_timeout: default_session_timeout(),
        }
    }
}

fn default_session_timeout() -> u64 {
    3600
}
