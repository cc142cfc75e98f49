//! HTTP-level tests: the full route surface exercised through the Actix test
//! harness, denial bodies included.

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use guardian_rs::models::gateway::{
    GatewayConfig, LoadBalancingStrategy, RedirectAction, RedirectRule, Upstream, WafRuleConfig,
};
use guardian_rs::routes::metrics::MetricsCollector;
use guardian_rs::routes::{auth_http, health, metrics, proxy};
use guardian_rs::services::gateway::GatewayService;
use guardian_rs::services::http::Forwarder;
use serde_json::{json, Value};
use std::net::SocketAddr;

fn base_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.general.gateway_name = "Test Gateway".to_string();
    config.general.listen_address = "0.0.0.0".to_string();
    config.general.listen_port = 8080;
    config
}

macro_rules! test_app {
    ($config:expr) => {{
        let service = GatewayService::from_config(&$config).unwrap();
        test::init_service(
            App::new()
                .app_data(web::Data::new(service))
                .app_data(web::Data::new(Forwarder::new(5)))
                .app_data(web::Data::new(MetricsCollector::default()))
                .configure(health::configure_health)
                .configure(metrics::configure_metrics)
                .configure(auth_http::configure_auth_routes)
                .configure(proxy::configure_proxy),
        )
        .await
    }};
}

fn peer(ip: [u8; 4]) -> SocketAddr {
    SocketAddr::from((ip, 50000))
}

#[actix_web::test]
async fn health_bypasses_the_pipeline() {
    // Health answers even when the caller's IP would be blocked.
    let mut config = base_config();
    config.access_control.blocked_ips.push("192.168.1.100".to_string());
    let app = test_app!(config);

    let req = test::TestRequest::get()
        .uri("/health")
        .peer_addr(peer([192, 168, 1, 100]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn check_access_grants_allowed_ip() {
    let mut config = base_config();
    config.access_control.allowed_ips.push("192.168.1.10".to_string());
    let app = test_app!(config);

    let req = test::TestRequest::get()
        .uri("/check-access")
        .peer_addr(peer([192, 168, 1, 10]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Access granted");
}

#[actix_web::test]
async fn blocked_ip_gets_403_with_detail() {
    let mut config = base_config();
    config.access_control.blocked_ips.push("192.168.1.100".to_string());
    let app = test_app!(config);

    let req = test::TestRequest::get()
        .uri("/foo")
        .peer_addr(peer([192, 168, 1, 100]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Access denied: Your IP is blocked.");
}

#[actix_web::test]
async fn ip_outside_allow_list_gets_403() {
    let mut config = base_config();
    config.access_control.allowed_ips.push("192.168.1.10".to_string());
    let app = test_app!(config);

    let req = test::TestRequest::get()
        .uri("/check-access")
        .peer_addr(peer([10, 0, 0, 99]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Access denied: Your IP is not allowed.");
}

#[actix_web::test]
async fn rate_limit_returns_429_after_the_threshold() {
    let mut config = base_config();
    config.security.rate_limiting.enabled = true;
    config.security.rate_limiting.max_requests_per_minute = 2;
    config.security.rate_limiting.ban_duration = 300;
    let app = test_app!(config);

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/check-access")
            .peer_addr(peer([10, 1, 1, 1]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get()
        .uri("/check-access")
        .peer_addr(peer([10, 1, 1, 1]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Too many requests. You are temporarily banned.");
}

#[actix_web::test]
async fn waf_blocks_sql_injection_with_rule_name() {
    let mut config = base_config();
    config.security.waf.enabled = true;
    config.security.waf.rules.push(WafRuleConfig {
        name: "Block SQL Injection".to_string(),
        pattern: "SELECT|UPDATE|DELETE|INSERT|DROP|ALTER".to_string(),
        action: "block".to_string(),
    });
    let app = test_app!(config);

    let req = test::TestRequest::post()
        .uri("/submit")
        .peer_addr(peer([10, 0, 0, 1]))
        .set_payload("SELECT * FROM users")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["detail"],
        "Blocked by WAF rule: Block SQL Injection"
    );
}

#[actix_web::test]
async fn port_redirect_sets_location_header() {
    let mut config = base_config();
    config.redirection.enabled = true;
    config.redirection.rules.push(RedirectRule {
        name: "Redirect HTTP to HTTPS".to_string(),
        action: RedirectAction::Redirect,
        source_port: Some(80),
        destination_port: Some(443),
        source_path: None,
        destination_path: None,
    });
    let app = test_app!(config);

    let req = test::TestRequest::get()
        .uri("/path")
        .insert_header(("Host", "0.0.0.0:80"))
        .peer_addr(peer([10, 0, 0, 1]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_redirection());
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://0.0.0.0:443/path"
    );
}

#[actix_web::test]
async fn disabled_load_balancing_is_503() {
    let app = test_app!(base_config());

    let req = test::TestRequest::get()
        .uri("/foo")
        .peer_addr(peer([10, 0, 0, 1]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Load balancing is disabled or misconfigured.");
}

#[actix_web::test]
async fn transport_failure_is_500_and_marks_the_upstream() {
    // Single unreachable upstream with health checking on: the first request
    // fails at the transport level, the second finds an empty healthy pool.
    let mut config = base_config();
    config.load_balancing.enabled = true;
    config.load_balancing.strategy = LoadBalancingStrategy::RoundRobin;
    config.load_balancing.health_checking = true;
    config.load_balancing.servers.push(Upstream {
        address: "127.0.0.1".to_string(),
        port: 9,
    });
    let app = test_app!(config);

    let req = test::TestRequest::get()
        .uri("/foo")
        .peer_addr(peer([10, 0, 0, 1]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Error handling request");
    assert!(body["error"].is_string());

    let req = test::TestRequest::get()
        .uri("/foo")
        .peer_addr(peer([10, 0, 0, 1]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "No healthy upstream.");
}

#[actix_web::test]
async fn token_issue_and_verify_round_trip() {
    let app = test_app!(base_config());

    let req = test::TestRequest::post()
        .uri("/auth/token")
        .set_json(json!({ "user_id": "alice" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();
    assert_eq!(body["token_type"], "bearer");

    let req = test::TestRequest::get()
        .uri("/auth/verify")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["sub"], "alice");
}

#[actix_web::test]
async fn invalid_token_is_401() {
    let app = test_app!(base_config());

    let req = test::TestRequest::get()
        .uri("/auth/verify")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Invalid or expired token");
}

#[actix_web::test]
async fn session_lifecycle_over_http() {
    let mut config = base_config();
    config.security.session_management.enabled = true;
    config.security.session_management.session_timeout = 3600;
    let app = test_app!(config);

    let req = test::TestRequest::post()
        .uri("/sessions")
        .set_json(json!({ "user_id": "alice" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/sessions/validate")
        .set_json(json!({ "session_id": session_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::delete()
        .uri(&format!("/sessions/{}", session_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri("/sessions/validate")
        .set_json(json!({ "session_id": session_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Session expired or invalid. Please log in again.");
}

#[actix_web::test]
async fn metrics_endpoint_exposes_guardian_counters() {
    let app = test_app!(base_config());

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert!(text.contains("guardian_requests_total"));
    assert!(text.contains("guardian_uptime_seconds"));
}
