//! Per-client sliding-window rate limiting with temporary bans.
//!
//! Each client IP gets a bucket of request timestamps pruned to the last
//! 60 seconds on every check. Hitting the limit installs a ban; banned
//! clients are rejected outright until the ban expires.

use crate::models::error::GatewayError;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rolling window over which requests are counted.
const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct RateLimiterState {
    /// Request timestamps per client IP, pruned on access.
    requests: HashMap<String, Vec<Instant>>,
    /// Ban expiry per client IP, removed lazily once expired.
    banned_ips: HashMap<String, Instant>,
}

/// Sliding-window rate limiter with temporary bans.
///
/// The threshold is inclusive: the request that would make the window hold
/// `max_requests` entries is the one that triggers the ban. Both maps live
/// behind a single mutex; critical sections are a prune, a length check and a
/// push.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    ban_duration: Duration,
    state: Mutex<RateLimiterState>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per rolling minute and
    /// banning offenders for `ban_duration` seconds.
    pub fn new(max_requests: u32, ban_duration: u64) -> Self {
        Self {
            max_requests: max_requests as usize,
            ban_duration: Duration::from_secs(ban_duration),
            state: Mutex::new(RateLimiterState::default()),
        }
    }

    /// Checks whether a request from `client_ip` is admitted.
    ///
    /// Order matters: an active ban rejects before any counting, then the
    /// window is pruned, then the inclusive threshold either installs a ban
    /// or the request is recorded and admitted.
    pub fn is_allowed(&self, client_ip: &str) -> Result<(), GatewayError> {
        let now = Instant::now();
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;

        if let Some(&unban_at) = state.banned_ips.get(client_ip) {
            if now < unban_at {
                return Err(GatewayError::RateLimited);
            }
            state.banned_ips.remove(client_ip);
        }

        let timestamps = state.requests.entry(client_ip.to_string()).or_default();
        timestamps.retain(|&t| now.duration_since(t) < WINDOW);

        if timestamps.len() >= self.max_requests {
            let unban_at = now + self.ban_duration;
            state.banned_ips.insert(client_ip.to_string(), unban_at);
            return Err(GatewayError::RateLimited);
        }

        timestamps.push(now);
        Ok(())
    }

    /// Drops empty buckets and expired bans. Not required for correctness
    /// (buckets are pruned on access); keeps memory bounded under very large
    /// IP cardinality.
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap();
        state
            .requests
            .retain(|_, timestamps| timestamps.iter().any(|&t| now.duration_since(t) < WINDOW));
        state.banned_ips.retain(|_, &mut unban_at| now < unban_at);
    }

    /// Number of IPs currently tracked. Exposed for metrics.
    pub fn tracked_clients(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}
