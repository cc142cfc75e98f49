//! The client-facing pipeline surface: `/check-access` and the catch-all
//! proxy route.
//!
//! The proxy handler is the HTTP adapter over
//! [`GatewayService::route_request`]: it extracts the client IP, request port
//! and query pairs, composes the WAF content, and maps the pipeline outcome
//! to a response. Denials arrive here as [`GatewayError`] values and become
//! JSON error responses through `ResponseError`.

use crate::models::error::GatewayError;
use crate::routes::metrics::MetricsCollector;
use crate::services::gateway::{GatewayService, RouteDecision};
use crate::services::http::Forwarder;
use crate::services::load_balancer::ConnectionGuard;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, info};
use serde_json::json;
use std::time::Instant;
use url::form_urlencoded;

/// Evaluates rate limiting and IP access control for the caller.
pub async fn check_access(
    req: HttpRequest,
    service: web::Data<GatewayService>,
) -> Result<HttpResponse, GatewayError> {
    let client_ip = client_ip(&req);
    info!("Checking access for IP: {}", client_ip);
    service.check_access(&client_ip)?;
    info!("Access granted for IP: {}", client_ip);
    Ok(HttpResponse::Ok().json(json!({ "message": "Access granted" })))
}

/// Catch-all proxy handler: full pipeline plus forwarding, bracketed by
/// metrics.
pub async fn proxy(
    req: HttpRequest,
    body: web::Bytes,
    service: web::Data<GatewayService>,
    forwarder: web::Data<Forwarder>,
    metrics: web::Data<MetricsCollector>,
) -> Result<HttpResponse, GatewayError> {
    let start_time = Instant::now();
    metrics.increment_connections();

    let result = proxy_internal(&req, body, &service, &forwarder).await;

    match &result {
        Ok(response) => {
            if response.status().is_redirection() {
                metrics.record_redirect();
            }
            // Redirects count as handled, not as errors.
            let ok = !response.status().is_client_error() && !response.status().is_server_error();
            metrics.record_request(ok, start_time.elapsed());
        }
        Err(error) => {
            match error {
                GatewayError::RateLimited => metrics.record_rate_limited(),
                GatewayError::WafBlocked { .. } => metrics.record_waf_blocked(),
                e if e.is_transport_failure() => metrics.record_upstream_failure(),
                _ => {}
            }
            metrics.record_request(false, start_time.elapsed());
        }
    }
    metrics.decrement_connections();

    result
}

async fn proxy_internal(
    req: &HttpRequest,
    body: web::Bytes,
    service: &GatewayService,
    forwarder: &Forwarder,
) -> Result<HttpResponse, GatewayError> {
    let client_ip = client_ip(req);
    let path = req.path().to_string();
    let port = request_port(req, service.listen_port());
    let query: Vec<(String, String)> = form_urlencoded::parse(req.query_string().as_bytes())
        .into_owned()
        .collect();

    let content = compose_waf_content(req, &body, &query);

    match service.route_request(&client_ip, &path, port, &query, &content)? {
        RouteDecision::Redirect(url) => {
            debug!("Redirecting {} to {}", path, url);
            Ok(HttpResponse::TemporaryRedirect()
                .insert_header((header::LOCATION, url))
                .finish())
        }
        RouteDecision::Forward(upstream) => {
            // Connection accounting must survive every exit path, including
            // timeout and client cancellation: tie it to a drop guard.
            let _guard = service
                .load_balancer()
                .map(|lb| ConnectionGuard::new(lb.clone(), upstream.clone()));

            match forwarder.forward(&upstream, req, body, &query).await {
                Ok(response) => Ok(response),
                Err(error) => {
                    if error.is_transport_failure() {
                        service.mark_upstream_failed(&upstream);
                    }
                    Err(error)
                }
            }
        }
    }
}

/// Client IP as seen through proxy headers, falling back to the peer
/// address.
fn client_ip(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

/// Port the request arrived on, from the Host header when it carries one.
fn request_port(req: &HttpRequest, listen_port: u16) -> u16 {
    req.connection_info()
        .host()
        .rsplit_once(':')
        .and_then(|(_, port)| port.parse().ok())
        .unwrap_or(listen_port)
}

/// Composes the content string the WAF inspects: path, headers, body, query,
/// in that fixed order.
fn compose_waf_content(req: &HttpRequest, body: &web::Bytes, query: &[(String, String)]) -> String {
    let headers = req
        .headers()
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("")))
        .collect::<Vec<_>>()
        .join(", ");
    let query_pairs = query
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{} {} {} {}",
        req.path(),
        headers,
        String::from_utf8_lossy(body),
        query_pairs
    )
}

/// Registers `/check-access` and the catch-all proxy route.
///
/// The catch-all accepts the forwarded verbs only; payloads are capped at
/// 1 MB to bound memory per request.
pub fn configure_proxy(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(1024 * 1024))
        .app_data(web::JsonConfig::default().limit(1024 * 1024))
        .route("/check-access", web::get().to(check_access))
        .service(
            web::resource("/{tail:.*}")
                .route(web::get().to(proxy))
                .route(web::post().to(proxy))
                .route(web::put().to(proxy))
                .route(web::patch().to(proxy))
                .route(web::delete().to(proxy)),
        );
}
