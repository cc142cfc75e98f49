//! Upstream request forwarding.
//!
//! The forwarder owns a pooled HTTP client and relays an admitted request to
//! the upstream the load balancer selected: same method, body bytes and query,
//! hop-by-hop headers stripped, and a finite per-request timeout. The
//! upstream's status, headers and body come back to the client as-is.

use crate::models::error::GatewayError;
use crate::models::gateway::Upstream;
use crate::utils::path::format_upstream_url;
use actix_web::http::{Method as ActixMethod, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use log::debug;
use reqwest::{
    header::HeaderMap as ReqwestHeaderMap, header::HeaderName, header::HeaderValue, Client,
    Method as ReqwestMethod,
};
use tokio::time::{timeout, Duration};

/// Default upstream timeout in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT: u64 = 30;

/// Headers never forwarded upstream or relayed back. Hop-by-hop per RFC 9110
/// plus proxy artifacts.
const SKIP_HEADERS: &[&str] = &[
    "host",
    "connection",
    "upgrade",
    "proxy-connection",
    "keep-alive",
    "transfer-encoding",
    "te",
    "trailer",
];

/// Relays admitted requests to upstream servers.
///
/// Cheap to clone; the underlying client shares its connection pool across
/// clones and worker threads.
#[derive(Clone)]
pub struct Forwarder {
    client: Client,
    timeout_seconds: u64,
}

impl Forwarder {
    /// Creates a forwarder with a pooled client and the given upstream
    /// timeout.
    pub fn new(timeout_seconds: u64) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(32)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            timeout_seconds,
        }
    }

    /// Forwards the request to `upstream` and converts the upstream response
    /// into a client response.
    ///
    /// Timeout expiry and connection errors surface as transport failures;
    /// the caller decides whether to mark the upstream unhealthy.
    pub async fn forward(
        &self,
        upstream: &Upstream,
        req: &HttpRequest,
        body: web::Bytes,
        query: &[(String, String)],
    ) -> Result<HttpResponse, GatewayError> {
        let target_url = format_upstream_url(&upstream.address, upstream.port, req.path());
        debug!("Forwarding request to: {}", target_url);

        let mut forwarded = self
            .client
            .request(convert_method(req.method()), &target_url)
            .headers(build_headers(req.headers()))
            .body(body.to_vec());
        if !query.is_empty() {
            forwarded = forwarded.query(query);
        }

        let response = match timeout(Duration::from_secs(self.timeout_seconds), forwarded.send())
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(GatewayError::Upstream {
                    message: e.to_string(),
                    url: target_url,
                })
            }
            Err(_) => {
                return Err(GatewayError::Timeout {
                    seconds: self.timeout_seconds,
                })
            }
        };

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut builder = HttpResponse::build(status);

        for (key, value) in response.headers() {
            let name = key.as_str();
            if SKIP_HEADERS.iter().any(|skip| name.eq_ignore_ascii_case(skip)) {
                continue;
            }
            if let Ok(header_value) =
                actix_web::http::header::HeaderValue::from_bytes(value.as_bytes())
            {
                builder.insert_header((name, header_value));
            }
        }

        match response.bytes().await {
            Ok(bytes) => Ok(builder.body(bytes)),
            Err(e) => Err(GatewayError::Upstream {
                message: e.to_string(),
                url: target_url,
            }),
        }
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new(DEFAULT_UPSTREAM_TIMEOUT)
    }
}

/// The forwarded method always matches the inbound method.
fn convert_method(method: &ActixMethod) -> ReqwestMethod {
    match *method {
        ActixMethod::GET => ReqwestMethod::GET,
        ActixMethod::POST => ReqwestMethod::POST,
        ActixMethod::PUT => ReqwestMethod::PUT,
        ActixMethod::PATCH => ReqwestMethod::PATCH,
        ActixMethod::DELETE => ReqwestMethod::DELETE,
        ActixMethod::HEAD => ReqwestMethod::HEAD,
        ActixMethod::OPTIONS => ReqwestMethod::OPTIONS,
        _ => ReqwestMethod::GET,
    }
}

/// Converts inbound headers for upstream forwarding, dropping hop-by-hop
/// headers. Invalid header values are skipped rather than failing the
/// request.
fn build_headers(original: &actix_web::http::header::HeaderMap) -> ReqwestHeaderMap {
    let mut headers = ReqwestHeaderMap::with_capacity(original.len());

    for (key, value) in original {
        let name = key.as_str();
        if SKIP_HEADERS.iter().any(|skip| name.eq_ignore_ascii_case(skip)) {
            continue;
        }
        if let (Ok(header_name), Ok(header_value)) = (
            HeaderName::from_bytes(key.as_ref()),
            HeaderValue::from_bytes(value.as_bytes()),
        ) {
            headers.insert(header_name, header_value);
        }
    }

    headers.entry("user-agent").or_insert_with(|| {
        HeaderValue::from_static(concat!("guardian-rs/", env!("CARGO_PKG_VERSION")))
    });

    headers
}
