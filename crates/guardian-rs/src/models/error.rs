use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;

/// Error taxonomy for the request pipeline.
///
/// Every denial or failure the gateway can produce maps to exactly one
/// variant, and every variant maps to one HTTP status. The display string of
/// a variant is the client-facing `detail` message, so the pipeline can log
/// and respond with the same text.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Too many requests. You are temporarily banned.")]
    RateLimited,

    #[error("Access denied: Your IP is blocked.")]
    IpBlocked,

    #[error("Access denied: Your IP is not allowed.")]
    IpNotAllowed,

    #[error("Blocked by WAF rule: {rule}")]
    WafBlocked { rule: String },

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Session expired or invalid. Please log in again.")]
    InvalidSession,

    #[error("Session management is not enabled.")]
    SessionsDisabled,

    #[error("Load balancing is disabled or misconfigured.")]
    LoadBalancingDisabled,

    #[error("No healthy upstream.")]
    NoHealthyUpstream,

    #[error("Upstream request to {url} failed: {message}")]
    Upstream { message: String, url: String },

    #[error("Upstream request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Invalid gateway configuration: {message}")]
    Config { message: String },
}

impl GatewayError {
    /// True for transport-level forwarding failures, which mark the selected
    /// upstream as failed when health checking is enabled.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::Upstream { .. } | GatewayError::Timeout { .. }
        )
    }
}

impl actix_web::error::ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::IpBlocked
            | GatewayError::IpNotAllowed
            | GatewayError::WafBlocked { .. } => StatusCode::FORBIDDEN,
            GatewayError::InvalidToken | GatewayError::InvalidSession => StatusCode::UNAUTHORIZED,
            GatewayError::LoadBalancingDisabled | GatewayError::NoHealthyUpstream => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::Upstream { .. }
            | GatewayError::Timeout { .. }
            | GatewayError::SessionsDisabled
            | GatewayError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            // Forwarding failures keep the original two-field shape so
            // clients can distinguish the generic detail from the cause.
            GatewayError::Upstream { .. } | GatewayError::Timeout { .. } => {
                HttpResponse::build(self.status_code()).json(json!({
                    "detail": "Error handling request",
                    "error": self.to_string(),
                }))
            }
            _ => HttpResponse::build(self.status_code()).json(json!({
                "detail": self.to_string(),
            })),
        }
    }
}
