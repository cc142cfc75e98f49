//! Prometheus-compatible metrics endpoint.
//!
//! Counters and histogram buckets are plain atomics updated from the proxy
//! handler; the `/metrics` endpoint renders them in Prometheus text
//! exposition format. The endpoint bypasses the admission pipeline.

use actix_web::{web, HttpResponse, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Thread-safe metrics collector shared across workers.
///
/// All fields are atomics behind `Arc`, so the collector can be cloned
/// freely. Updates use relaxed ordering; exact cross-counter consistency is
/// not required for scraping.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    /// Total requests through the proxy pipeline.
    pub requests_total: Arc<AtomicU64>,
    /// Requests answered with a 2xx from the upstream.
    pub requests_success: Arc<AtomicU64>,
    /// Requests that ended in an error response.
    pub requests_error: Arc<AtomicU64>,
    /// Requests denied by the rate limiter.
    pub requests_rate_limited: Arc<AtomicU64>,
    /// Requests denied by the WAF.
    pub requests_waf_blocked: Arc<AtomicU64>,
    /// Requests answered with a redirect.
    pub requests_redirected: Arc<AtomicU64>,
    /// Forwarding attempts that failed at the transport level.
    pub upstream_failures: Arc<AtomicU64>,
    /// Sum of response times in milliseconds, for the average gauge.
    pub response_time_sum: Arc<AtomicU64>,
    /// Requests currently in flight.
    pub active_connections: Arc<AtomicU64>,
    /// Highest concurrent request count observed.
    pub peak_connections: Arc<AtomicU64>,
    pub response_time_bucket_100ms: Arc<AtomicU64>,
    pub response_time_bucket_500ms: Arc<AtomicU64>,
    pub response_time_bucket_1s: Arc<AtomicU64>,
    pub response_time_bucket_5s: Arc<AtomicU64>,
    pub response_time_bucket_inf: Arc<AtomicU64>,
    /// Process start, for the uptime counter.
    pub start_time: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            requests_total: Arc::new(AtomicU64::new(0)),
            requests_success: Arc::new(AtomicU64::new(0)),
            requests_error: Arc::new(AtomicU64::new(0)),
            requests_rate_limited: Arc::new(AtomicU64::new(0)),
            requests_waf_blocked: Arc::new(AtomicU64::new(0)),
            requests_redirected: Arc::new(AtomicU64::new(0)),
            upstream_failures: Arc::new(AtomicU64::new(0)),
            response_time_sum: Arc::new(AtomicU64::new(0)),
            active_connections: Arc::new(AtomicU64::new(0)),
            peak_connections: Arc::new(AtomicU64::new(0)),
            response_time_bucket_100ms: Arc::new(AtomicU64::new(0)),
            response_time_bucket_500ms: Arc::new(AtomicU64::new(0)),
            response_time_bucket_1s: Arc::new(AtomicU64::new(0)),
            response_time_bucket_5s: Arc::new(AtomicU64::new(0)),
            response_time_bucket_inf: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }
}

impl MetricsCollector {
    /// Records a completed request: totals, outcome and histogram buckets.
    pub fn record_request(&self, success: bool, response_time: Duration) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        let response_time_ms = response_time.as_millis() as u64;
        self.response_time_sum
            .fetch_add(response_time_ms, Ordering::Relaxed);

        if response_time_ms <= 100 {
            self.response_time_bucket_100ms.fetch_add(1, Ordering::Relaxed);
        }
        if response_time_ms <= 500 {
            self.response_time_bucket_500ms.fetch_add(1, Ordering::Relaxed);
        }
        if response_time_ms <= 1000 {
            self.response_time_bucket_1s.fetch_add(1, Ordering::Relaxed);
        }
        if response_time_ms <= 5000 {
            self.response_time_bucket_5s.fetch_add(1, Ordering::Relaxed);
        } else {
            self.response_time_bucket_inf.fetch_add(1, Ordering::Relaxed);
        }

        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rate_limited(&self) {
        self.requests_rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_waf_blocked(&self) {
        self.requests_waf_blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_redirect(&self) {
        self.requests_redirected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_failure(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks a request in flight, updating the peak if this is a new high.
    pub fn increment_connections(&self) {
        let current = self.active_connections.fetch_add(1, Ordering::Relaxed) + 1;

        let mut peak = self.peak_connections.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_connections.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(new_peak) => peak = new_peak,
            }
        }
    }

    /// Must be called exactly once for each `increment_connections`.
    pub fn decrement_connections(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Renders all metrics in Prometheus text exposition format.
pub async fn metrics_endpoint(metrics: web::Data<MetricsCollector>) -> Result<HttpResponse> {
    let total_requests = metrics.requests_total.load(Ordering::Relaxed);
    let response_time_sum = metrics.response_time_sum.load(Ordering::Relaxed);

    let avg_response_time = if total_requests > 0 {
        response_time_sum as f64 / total_requests as f64
    } else {
        0.0
    };

    let metrics_text = format!(
        r#"# HELP guardian_requests_total Total number of HTTP requests
# TYPE guardian_requests_total counter
guardian_requests_total {}

# HELP guardian_requests_success_total Total number of successful HTTP requests
# TYPE guardian_requests_success_total counter
guardian_requests_success_total {}

# HELP guardian_requests_error_total Total number of failed HTTP requests
# TYPE guardian_requests_error_total counter
guardian_requests_error_total {}

# HELP guardian_requests_rate_limited_total Requests denied by the rate limiter
# TYPE guardian_requests_rate_limited_total counter
guardian_requests_rate_limited_total {}

# HELP guardian_requests_waf_blocked_total Requests denied by the WAF
# TYPE guardian_requests_waf_blocked_total counter
guardian_requests_waf_blocked_total {}

# HELP guardian_requests_redirected_total Requests answered with a redirect
# TYPE guardian_requests_redirected_total counter
guardian_requests_redirected_total {}

# HELP guardian_upstream_failures_total Forwarding attempts failed at transport level
# TYPE guardian_upstream_failures_total counter
guardian_upstream_failures_total {}

# HELP guardian_response_time_avg Average response time in milliseconds
# TYPE guardian_response_time_avg gauge
guardian_response_time_avg {:.2}

# HELP guardian_response_time_bucket Response time histogram buckets
# TYPE guardian_response_time_bucket histogram
guardian_response_time_bucket{{le="100"}} {}
guardian_response_time_bucket{{le="500"}} {}
guardian_response_time_bucket{{le="1000"}} {}
guardian_response_time_bucket{{le="5000"}} {}
guardian_response_time_bucket{{le="+Inf"}} {}

# HELP guardian_active_connections Current number of active connections
# TYPE guardian_active_connections gauge
guardian_active_connections {}

# HELP guardian_peak_connections Peak number of concurrent connections
# TYPE guardian_peak_connections gauge
guardian_peak_connections {}

# HELP guardian_uptime_seconds Service uptime in seconds
# TYPE guardian_uptime_seconds counter
guardian_uptime_seconds {}
"#,
        total_requests,
        metrics.requests_success.load(Ordering::Relaxed),
        metrics.requests_error.load(Ordering::Relaxed),
        metrics.requests_rate_limited.load(Ordering::Relaxed),
        metrics.requests_waf_blocked.load(Ordering::Relaxed),
        metrics.requests_redirected.load(Ordering::Relaxed),
        metrics.upstream_failures.load(Ordering::Relaxed),
        avg_response_time,
        metrics.response_time_bucket_100ms.load(Ordering::Relaxed),
        metrics.response_time_bucket_500ms.load(Ordering::Relaxed),
        metrics.response_time_bucket_1s.load(Ordering::Relaxed),
        metrics.response_time_bucket_5s.load(Ordering::Relaxed),
        metrics.response_time_bucket_inf.load(Ordering::Relaxed),
        metrics.active_connections.load(Ordering::Relaxed),
        metrics.peak_connections.load(Ordering::Relaxed),
        metrics.start_time.elapsed().as_secs(),
    );

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4; charset=utf-8")
        .body(metrics_text))
}

/// Registers `GET /metrics`.
pub fn configure_metrics(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics_endpoint));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_request_updates_totals_and_buckets() {
        let metrics = MetricsCollector::default();
        metrics.record_request(true, Duration::from_millis(50));
        metrics.record_request(false, Duration::from_millis(700));

        assert_eq!(metrics.requests_total.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.requests_success.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.requests_error.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.response_time_bucket_100ms.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.response_time_bucket_1s.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn connection_tracking_updates_peak() {
        let metrics = MetricsCollector::default();
        metrics.increment_connections();
        metrics.increment_connections();
        metrics.decrement_connections();
        metrics.increment_connections();

        assert_eq!(metrics.active_connections.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.peak_connections.load(Ordering::Relaxed), 2);
    }
}
