//! Token and session endpoints.
//!
//! Exposes the authentication subsystems over HTTP: token issue/verify
//! backed by [`AuthService`], session lifecycle backed by [`SessionManager`].
//! These endpoints bypass the forwarding pipeline but not the error
//! contract: failures surface as `{"detail": ...}` JSON.
//!
//! [`AuthService`]: crate::services::auth::AuthService
//! [`SessionManager`]: crate::services::session::SessionManager

use crate::models::error::GatewayError;
use crate::services::auth::ACCESS_TOKEN_EXPIRE_MINUTES;
use crate::services::gateway::GatewayService;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateSessionRequest {
    pub session_id: String,
}

/// Issues a signed access token for a user.
pub async fn issue_token(
    payload: web::Json<TokenRequest>,
    service: web::Data<GatewayService>,
) -> Result<HttpResponse, GatewayError> {
    let token = service.authenticate_user(&payload.user_id)?;
    Ok(HttpResponse::Ok().json(json!({
        "access_token": token,
        "token_type": "bearer",
        "expires_in": ACCESS_TOKEN_EXPIRE_MINUTES * 60,
    })))
}

/// Verifies the bearer token in the Authorization header and returns its
/// claims.
pub async fn verify_token(
    req: HttpRequest,
    service: web::Data<GatewayService>,
) -> Result<HttpResponse, GatewayError> {
    let token = extract_bearer_token(&req)?;
    let claims = service.verify_jwt(token)?;
    Ok(HttpResponse::Ok().json(json!({
        "sub": claims.sub,
        "exp": claims.exp,
    })))
}

/// Starts a session for a user.
pub async fn create_session(
    payload: web::Json<SessionRequest>,
    service: web::Data<GatewayService>,
) -> Result<HttpResponse, GatewayError> {
    let session_id = service.start_session(&payload.user_id)?;
    Ok(HttpResponse::Ok().json(json!({ "session_id": session_id })))
}

/// Validates a session; expired or unknown sessions are a 401.
pub async fn validate_session(
    payload: web::Json<ValidateSessionRequest>,
    service: web::Data<GatewayService>,
) -> Result<HttpResponse, GatewayError> {
    service.validate_session(&payload.session_id)?;
    Ok(HttpResponse::Ok().json(json!({ "valid": true })))
}

/// Revokes a session. Revoking twice is fine.
pub async fn revoke_session(
    path: web::Path<String>,
    service: web::Data<GatewayService>,
) -> Result<HttpResponse, GatewayError> {
    service.revoke_session(&path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

fn extract_bearer_token(req: &HttpRequest) -> Result<&str, GatewayError> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(GatewayError::InvalidToken)
}

/// Registers the token and session routes.
pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/token", web::post().to(issue_token))
        .route("/auth/verify", web::get().to(verify_token))
        .route("/sessions", web::post().to(create_session))
        .route("/sessions/validate", web::post().to(validate_session))
        .route("/sessions/{session_id}", web::delete().to(revoke_session));
}
