//! Gateway service: the per-request admission pipeline.
//!
//! A `GatewayService` is built once from the loaded configuration and owns
//! every policy engine. The pipeline runs in a fixed order for all verbs:
//! rate limit, IP block, IP allow, WAF, redirection, upstream selection.
//! Rate limiting runs first so ban state accrues even for requests that
//! would have failed access control; the block check precedes the allow
//! check so an IP on both lists is blocked.

use crate::models::error::GatewayError;
use crate::models::gateway::{GatewayConfig, Upstream};
use crate::services::auth::{AuthService, Claims};
use crate::services::load_balancer::LoadBalancer;
use crate::services::rate_limiter::RateLimiter;
use crate::services::redirect::Redirector;
use crate::services::session::SessionManager;
use crate::services::waf::Waf;
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of the admission pipeline for an admitted request.
///
/// Denials are the `Err` side of [`GatewayService::route_request`]; the HTTP
/// adapter maps them to responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Forward to the selected upstream.
    Forward(Upstream),
    /// Respond with a temporary redirect to this URL.
    Redirect(String),
}

/// Owns the policy engines and runs the admission pipeline.
pub struct GatewayService {
    name: String,
    version: String,
    listen_address: String,
    listen_port: u16,
    allowed_ips: HashSet<String>,
    blocked_ips: HashSet<String>,
    rate_limiter: Option<RateLimiter>,
    waf: Option<Waf>,
    redirector: Redirector,
    load_balancer: Option<Arc<LoadBalancer>>,
    session_manager: Option<SessionManager>,
    auth: AuthService,
}

impl GatewayService {
    /// Builds the service from a loaded configuration.
    ///
    /// Disabled sections produce absent engines. WAF pattern compilation
    /// happens here, so a malformed pattern fails startup rather than a
    /// request.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let rate_limiter = if config.security.rate_limiting.enabled {
            Some(RateLimiter::new(
                config.security.rate_limiting.max_requests_per_minute,
                config.security.rate_limiting.ban_duration,
            ))
        } else {
            None
        };

        let waf = if config.security.waf.enabled {
            Some(Waf::new(&config.security.waf)?)
        } else {
            None
        };

        let session_manager = if config.security.session_management.enabled {
            Some(SessionManager::new(
                config.security.session_management.session_timeout,
            ))
        } else {
            None
        };

        Ok(Self {
            name: config.general.gateway_name.clone(),
            version: config.general.version.clone(),
            listen_address: config.general.listen_address.clone(),
            listen_port: config.general.listen_port,
            allowed_ips: config.access_control.allowed_ips.iter().cloned().collect(),
            blocked_ips: config.access_control.blocked_ips.iter().cloned().collect(),
            rate_limiter,
            waf,
            redirector: Redirector::new(&config.redirection, &config.general.listen_address),
            load_balancer: LoadBalancer::from_settings(&config.load_balancing).map(Arc::new),
            session_manager,
            auth: AuthService::from_env(),
        })
    }

    /// Logs the startup banner.
    pub fn start(&self) {
        info!("Starting {} version {}...", self.name, self.version);
        info!("Listening on {}:{}", self.listen_address, self.listen_port);
    }

    pub fn listen_port(&self) -> u16 {
        self.listen_port
    }

    pub fn load_balancer(&self) -> Option<&Arc<LoadBalancer>> {
        self.load_balancer.as_ref()
    }

    /// Rate limit and IP access checks for a client.
    ///
    /// Ordering is normative: the rate limiter runs before both list checks,
    /// and the block list before the allow list.
    pub fn check_access(&self, client_ip: &str) -> Result<(), GatewayError> {
        if let Some(limiter) = &self.rate_limiter {
            if let Err(e) = limiter.is_allowed(client_ip) {
                warn!("Rate limit exceeded for IP: {}", client_ip);
                return Err(e);
            }
        }

        if self.blocked_ips.contains(client_ip) {
            warn!("Access denied for blocked IP: {}", client_ip);
            return Err(GatewayError::IpBlocked);
        }

        if !self.allowed_ips.is_empty() && !self.allowed_ips.contains(client_ip) {
            warn!("Access denied for IP not in allowed list: {}", client_ip);
            return Err(GatewayError::IpNotAllowed);
        }

        Ok(())
    }

    /// WAF inspection of composed request content. OK when the WAF is
    /// disabled.
    pub fn inspect_request(&self, content: &str) -> Result<(), GatewayError> {
        match &self.waf {
            Some(waf) => waf.inspect(content),
            None => Ok(()),
        }
    }

    /// Redirect target for the request, if any rule matches.
    pub fn resolve_redirect(
        &self,
        path: &str,
        port: u16,
        query: &[(String, String)],
    ) -> Option<String> {
        self.redirector.redirect(path, port, query)
    }

    /// Selects the next upstream from the pool.
    pub fn next_upstream(&self) -> Result<Upstream, GatewayError> {
        match &self.load_balancer {
            Some(lb) => lb.next(),
            None => {
                warn!("Load balancing is disabled or misconfigured.");
                Err(GatewayError::LoadBalancingDisabled)
            }
        }
    }

    /// Marks an upstream failed after a transport error. No-op when load
    /// balancing or health checking is off.
    pub fn mark_upstream_failed(&self, upstream: &Upstream) {
        if let Some(lb) = &self.load_balancer {
            lb.mark_failed(upstream);
        }
    }

    /// Runs the full admission pipeline in the canonical order.
    pub fn route_request(
        &self,
        client_ip: &str,
        path: &str,
        port: u16,
        query: &[(String, String)],
        content: &str,
    ) -> Result<RouteDecision, GatewayError> {
        self.check_access(client_ip)?;
        self.inspect_request(content)?;

        if let Some(url) = self.resolve_redirect(path, port, query) {
            return Ok(RouteDecision::Redirect(url));
        }

        let upstream = self.next_upstream()?;
        Ok(RouteDecision::Forward(upstream))
    }

    /// Starts a session for a user. Fails when session management is off.
    pub fn start_session(&self, user_id: &str) -> Result<String, GatewayError> {
        match &self.session_manager {
            Some(manager) => Ok(manager.create_session(user_id)),
            None => Err(GatewayError::SessionsDisabled),
        }
    }

    /// Validates a session, surfacing expiry as `InvalidSession`.
    pub fn validate_session(&self, session_id: &str) -> Result<(), GatewayError> {
        match &self.session_manager {
            Some(manager) => {
                if manager.validate_session(session_id) {
                    Ok(())
                } else {
                    Err(GatewayError::InvalidSession)
                }
            }
            None => Err(GatewayError::SessionsDisabled),
        }
    }

    /// Revokes a session. Idempotent; fails only when sessions are disabled.
    pub fn revoke_session(&self, session_id: &str) -> Result<(), GatewayError> {
        match &self.session_manager {
            Some(manager) => {
                manager.revoke_session(session_id);
                Ok(())
            }
            None => Err(GatewayError::SessionsDisabled),
        }
    }

    /// Issues a signed access token for a user.
    pub fn authenticate_user(&self, user_id: &str) -> Result<String, GatewayError> {
        self.auth.create_access_token(
            user_id,
            Some(chrono::Duration::minutes(
                crate::services::auth::ACCESS_TOKEN_EXPIRE_MINUTES,
            )),
        )
    }

    /// Verifies a bearer token and returns its claims.
    pub fn verify_jwt(&self, token: &str) -> Result<Claims, GatewayError> {
        self.auth.verify_token(token)
    }
}
