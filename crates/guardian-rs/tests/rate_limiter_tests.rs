//! Integration tests for the sliding-window rate limiter.

use guardian_rs::models::error::GatewayError;
use guardian_rs::services::rate_limiter::RateLimiter;

#[test]
fn allows_requests_within_limit() {
    let limiter = RateLimiter::new(5, 300);

    for _ in 0..5 {
        assert!(limiter.is_allowed("192.168.1.10").is_ok());
    }
}

#[test]
fn sixth_request_is_banned_and_the_ban_holds() {
    // Seed scenario: max_requests=5, ban_duration=300. Five calls pass, the
    // sixth installs a ban, and every further call within the ban window is
    // rejected too.
    let limiter = RateLimiter::new(5, 300);

    for _ in 0..5 {
        assert!(limiter.is_allowed("1.2.3.4").is_ok());
    }

    assert!(matches!(
        limiter.is_allowed("1.2.3.4"),
        Err(GatewayError::RateLimited)
    ));
    for _ in 0..3 {
        assert!(matches!(
            limiter.is_allowed("1.2.3.4"),
            Err(GatewayError::RateLimited)
        ));
    }
}

#[test]
fn no_more_than_max_requests_admitted_in_a_window() {
    let limiter = RateLimiter::new(10, 300);
    let mut admitted = 0;

    for _ in 0..50 {
        if limiter.is_allowed("10.0.0.5").is_ok() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 10);
}

#[test]
fn other_clients_are_unaffected_by_a_ban() {
    let limiter = RateLimiter::new(1, 300);

    assert!(limiter.is_allowed("10.0.0.1").is_ok());
    assert!(limiter.is_allowed("10.0.0.1").is_err());
    assert!(limiter.is_allowed("10.0.0.2").is_ok());
}
