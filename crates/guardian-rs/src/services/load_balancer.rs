//! Upstream selection: load balancing strategies with health tracking.
//!
//! The balancer owns the configured pool in declaration order plus all
//! runtime state (cursor, connection counts, health flags, failure times)
//! behind one mutex. Config values are never mutated.

use crate::models::error::GatewayError;
use crate::models::gateway::{LoadBalancingSettings, LoadBalancingStrategy, Upstream};
use log::{info, warn};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// How long a failed upstream stays excluded before optimistic re-admission.
const HEALTH_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct LbState {
    /// Round-robin position over the declaration-order pool.
    cursor: usize,
    /// Active connection count per upstream address (least-connections only).
    connections: HashMap<String, u32>,
    /// Health flag per upstream address.
    healthy: HashMap<String, bool>,
    /// Failure times of unhealthy upstreams, for cooldown expiry.
    failed_at: HashMap<String, Instant>,
}

/// Load balancer over the configured upstream pool.
///
/// Selection strategy is fixed at construction. When health checking is
/// enabled, upstreams marked failed are excluded from selection until
/// [`HEALTH_COOLDOWN`] elapses, after which they are re-admitted without a
/// probe. All mutating operations are serialized per instance.
#[derive(Debug)]
pub struct LoadBalancer {
    servers: Vec<Upstream>,
    strategy: LoadBalancingStrategy,
    health_checking: bool,
    cooldown: Duration,
    state: Mutex<LbState>,
}

impl LoadBalancer {
    /// Builds a balancer from the `load_balancing` config section.
    ///
    /// Returns `None` when load balancing is disabled; an enabled section
    /// with an empty pool is rejected at config validation.
    pub fn from_settings(settings: &LoadBalancingSettings) -> Option<Self> {
        if !settings.enabled {
            return None;
        }
        Some(Self::new(
            settings.servers.clone(),
            settings.strategy,
            settings.health_checking,
        ))
    }

    pub fn new(
        servers: Vec<Upstream>,
        strategy: LoadBalancingStrategy,
        health_checking: bool,
    ) -> Self {
        let healthy = servers
            .iter()
            .map(|s| (s.address.clone(), true))
            .collect::<HashMap<_, _>>();
        let connections = servers
            .iter()
            .map(|s| (s.address.clone(), 0))
            .collect::<HashMap<_, _>>();

        Self {
            servers,
            strategy,
            health_checking,
            cooldown: HEALTH_COOLDOWN,
            state: Mutex::new(LbState {
                cursor: 0,
                connections,
                healthy,
                failed_at: HashMap::new(),
            }),
        }
    }

    /// Overrides the failure cooldown. Used by tests to exercise re-admission
    /// without waiting the full minute.
    pub fn with_health_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Selects the next upstream according to the configured strategy.
    ///
    /// Fails with `NoHealthyUpstream` when every upstream is excluded.
    pub fn next(&self) -> Result<Upstream, GatewayError> {
        let mut state = self.state.lock().unwrap();
        self.readmit_recovered(&mut state);

        let healthy_count = self
            .servers
            .iter()
            .filter(|s| *state.healthy.get(&s.address).unwrap_or(&true))
            .count();
        if healthy_count == 0 {
            warn!("No healthy upstream available");
            return Err(GatewayError::NoHealthyUpstream);
        }

        let selected = match self.strategy {
            LoadBalancingStrategy::RoundRobin => self.next_round_robin(&mut state),
            LoadBalancingStrategy::Random => self.next_random(&state),
            LoadBalancingStrategy::LeastConnections => self.next_least_connections(&state),
        };

        info!("Routing to next server: {}:{}", selected.address, selected.port);
        Ok(selected)
    }

    /// Marks an upstream as failed. No-op unless health checking is enabled.
    pub fn mark_failed(&self, upstream: &Upstream) {
        if !self.health_checking {
            return;
        }
        let mut state = self.state.lock().unwrap();
        state.healthy.insert(upstream.address.clone(), false);
        state.failed_at.insert(upstream.address.clone(), Instant::now());
        warn!("Upstream {}:{} marked as failed", upstream.address, upstream.port);
    }

    /// Increments the connection count for an upstream. Only meaningful under
    /// the least-connections strategy; a no-op otherwise.
    pub fn acquire(&self, upstream: &Upstream) {
        if self.strategy != LoadBalancingStrategy::LeastConnections {
            return;
        }
        let mut state = self.state.lock().unwrap();
        *state.connections.entry(upstream.address.clone()).or_insert(0) += 1;
    }

    /// Decrements the connection count for an upstream, clamped at zero.
    pub fn release(&self, upstream: &Upstream) {
        if self.strategy != LoadBalancingStrategy::LeastConnections {
            return;
        }
        let mut state = self.state.lock().unwrap();
        let count = state.connections.entry(upstream.address.clone()).or_insert(0);
        *count = count.saturating_sub(1);
    }

    /// Current connection count for an upstream.
    pub fn active_connections(&self, upstream: &Upstream) -> u32 {
        self.state
            .lock()
            .unwrap()
            .connections
            .get(&upstream.address)
            .copied()
            .unwrap_or(0)
    }

    /// True when the upstream is currently admitted to the pool.
    pub fn is_healthy(&self, upstream: &Upstream) -> bool {
        let mut state = self.state.lock().unwrap();
        self.readmit_recovered(&mut state);
        *state.healthy.get(&upstream.address).unwrap_or(&true)
    }

    /// Re-admits failed upstreams whose cooldown has elapsed. Optimistic: no
    /// probe is sent, the next request finds out.
    fn readmit_recovered(&self, state: &mut LbState) {
        if !self.health_checking {
            return;
        }
        let now = Instant::now();
        let recovered: Vec<String> = state
            .failed_at
            .iter()
            .filter(|(_, &failed)| now.duration_since(failed) > self.cooldown)
            .map(|(address, _)| address.clone())
            .collect();

        for address in recovered {
            info!("Re-admitting upstream {} after cooldown", address);
            state.healthy.insert(address.clone(), true);
            state.failed_at.remove(&address);
        }
    }

    /// Advances the cursor over the declaration-order list, skipping
    /// unhealthy entries. Keeping the cursor on the full list preserves the
    /// declaration-order cycle when the healthy set shrinks or regrows.
    fn next_round_robin(&self, state: &mut LbState) -> Upstream {
        loop {
            let index = state.cursor % self.servers.len();
            state.cursor = state.cursor.wrapping_add(1);
            let candidate = &self.servers[index];
            if *state.healthy.get(&candidate.address).unwrap_or(&true) {
                return candidate.clone();
            }
        }
    }

    fn next_random(&self, state: &LbState) -> Upstream {
        let pool: Vec<&Upstream> = self
            .servers
            .iter()
            .filter(|s| *state.healthy.get(&s.address).unwrap_or(&true))
            .collect();
        let index = rand::thread_rng().gen_range(0..pool.len());
        pool[index].clone()
    }

    /// Minimum connection count wins; `min_by_key` keeps the first minimum,
    /// which preserves declaration-order tie-breaking.
    fn next_least_connections(&self, state: &LbState) -> Upstream {
        self.servers
            .iter()
            .filter(|s| *state.healthy.get(&s.address).unwrap_or(&true))
            .min_by_key(|s| state.connections.get(&s.address).copied().unwrap_or(0))
            .expect("healthy pool checked non-empty")
            .clone()
    }
}

/// RAII guard bracketing the forward step of a request.
///
/// Acquires the upstream's connection slot on creation and releases it on
/// drop, so the release runs on every exit path including timeouts and task
/// cancellation.
pub struct ConnectionGuard {
    balancer: Arc<LoadBalancer>,
    upstream: Upstream,
}

impl ConnectionGuard {
    pub fn new(balancer: Arc<LoadBalancer>, upstream: Upstream) -> Self {
        balancer.acquire(&upstream);
        Self { balancer, upstream }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.balancer.release(&self.upstream);
    }
}
