//! Service-level tests for the admission pipeline.

use guardian_rs::models::error::GatewayError;
use guardian_rs::models::gateway::{
    AccessControlSettings, GatewayConfig, GeneralSettings, LoadBalancingSettings,
    LoadBalancingStrategy, RedirectAction, RedirectRule, RedirectionSettings, Upstream,
};
use guardian_rs::services::gateway::{GatewayService, RouteDecision};

fn gateway_config() -> GatewayConfig {
    GatewayConfig {
        general: GeneralSettings {
            gateway_name: "Test Gateway".to_string(),
            version: "1.0.0".to_string(),
            listen_address: "0.0.0.0".to_string(),
            listen_port: 8080,
        },
        access_control: AccessControlSettings {
            allowed_ips: vec!["192.168.1.10".to_string()],
            blocked_ips: vec!["192.168.1.100".to_string()],
        },
        redirection: RedirectionSettings {
            enabled: true,
            rules: vec![RedirectRule {
                name: "Redirect HTTP to HTTPS".to_string(),
                action: RedirectAction::Redirect,
                source_port: Some(80),
                destination_port: Some(443),
                source_path: None,
                destination_path: None,
            }],
        },
        load_balancing: LoadBalancingSettings {
            enabled: true,
            strategy: LoadBalancingStrategy::RoundRobin,
            health_checking: false,
            servers: vec![Upstream {
                address: "192.168.2.20".to_string(),
                port: 8081,
            }],
        },
        logging: Default::default(),
        security: Default::default(),
    }
}

#[test]
fn check_access_allows_listed_ip() {
    let service = GatewayService::from_config(&gateway_config()).unwrap();
    assert!(service.check_access("192.168.1.10").is_ok());
}

#[test]
fn check_access_denies_blocked_ip() {
    let service = GatewayService::from_config(&gateway_config()).unwrap();
    let denied = service.check_access("192.168.1.100");
    assert!(matches!(denied, Err(GatewayError::IpBlocked)));
    assert!(denied.unwrap_err().to_string().contains("Access denied"));
}

#[test]
fn redirection_rewrites_the_port() {
    let service = GatewayService::from_config(&gateway_config()).unwrap();
    assert_eq!(
        service.resolve_redirect("/path", 80, &[]),
        Some("https://0.0.0.0:443/path".to_string())
    );
}

#[test]
fn load_balancing_returns_the_configured_server() {
    let service = GatewayService::from_config(&gateway_config()).unwrap();
    let upstream = service.next_upstream().unwrap();
    assert_eq!(upstream.address, "192.168.2.20");
    assert_eq!(upstream.port, 8081);
}

#[test]
fn admitted_get_is_forwarded_to_the_single_upstream() {
    // Seed scenario: allowed IP, no redirect, single upstream.
    let service = GatewayService::from_config(&gateway_config()).unwrap();
    let decision = service
        .route_request("192.168.1.10", "/foo", 8080, &[], "/foo")
        .unwrap();
    assert_eq!(
        decision,
        RouteDecision::Forward(Upstream {
            address: "192.168.2.20".to_string(),
            port: 8081,
        })
    );
}

#[test]
fn redirect_decision_carries_query_parameters() {
    let service = GatewayService::from_config(&gateway_config()).unwrap();
    let query = vec![("a".to_string(), "1".to_string())];
    let decision = service
        .route_request("192.168.1.10", "/path", 80, &query, "/path")
        .unwrap();
    assert_eq!(
        decision,
        RouteDecision::Redirect("https://0.0.0.0:443/path?a=1".to_string())
    );
}

#[test]
fn empty_allow_list_admits_any_unblocked_ip() {
    let mut config = gateway_config();
    config.access_control.allowed_ips.clear();
    let service = GatewayService::from_config(&config).unwrap();
    assert!(service.check_access("203.0.113.7").is_ok());
    assert!(service.check_access("192.168.1.100").is_err());
}
