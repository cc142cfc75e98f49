//! In-memory session management.
//!
//! Sessions tie an opaque ID to a user and an activity timestamp. They expire
//! on the first validation after the inactivity timeout; successful
//! validation refreshes the activity timestamp.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Session {
    #[allow(dead_code)] // Kept for revocation auditing and future listing.
    user_id: String,
    #[allow(dead_code)]
    created_at: Instant,
    last_active: Instant,
}

/// Issues, validates and revokes opaque session IDs.
///
/// All operations are O(1) behind a single mutex. Sessions do not survive a
/// process restart.
#[derive(Debug)]
pub struct SessionManager {
    session_timeout: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionManager {
    /// Creates a manager expiring sessions after `session_timeout` seconds of
    /// inactivity.
    pub fn new(session_timeout: u64) -> Self {
        Self {
            session_timeout: Duration::from_secs(session_timeout),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a new session for `user_id` and returns its ID.
    ///
    /// IDs are UUIDv4, unique for the lifetime of the process.
    pub fn create_session(&self, user_id: &str) -> String {
        let session_id = Uuid::new_v4().to_string();
        let now = Instant::now();
        self.sessions.lock().unwrap().insert(
            session_id.clone(),
            Session {
                user_id: user_id.to_string(),
                created_at: now,
                last_active: now,
            },
        );
        session_id
    }

    /// Validates a session, refreshing its activity timestamp on success.
    ///
    /// A session idle past the timeout is revoked by this call and reported
    /// invalid. An unknown ID is simply invalid; neither case is an error at
    /// this layer.
    pub fn validate_session(&self, session_id: &str) -> bool {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().unwrap();

        match sessions.get_mut(session_id) {
            None => return false,
            Some(session) if now.duration_since(session.last_active) <= self.session_timeout => {
                session.last_active = now;
                return true;
            }
            Some(_) => {}
        }

        // Expired: revoked on this first touch past the timeout.
        sessions.remove(session_id);
        false
    }

    /// Removes a session if present. Idempotent.
    pub fn revoke_session(&self, session_id: &str) {
        self.sessions.lock().unwrap().remove(session_id);
    }

    /// Number of live sessions. Exposed for metrics.
    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_session_validates() {
        let manager = SessionManager::new(3600);
        let id = manager.create_session("alice");
        assert!(manager.validate_session(&id));
    }

    #[test]
    fn session_ids_are_unique() {
        let manager = SessionManager::new(3600);
        let a = manager.create_session("alice");
        let b = manager.create_session("alice");
        assert_ne!(a, b);
    }

    #[test]
    fn unknown_session_is_invalid() {
        let manager = SessionManager::new(3600);
        assert!(!manager.validate_session("no-such-session"));
    }

    #[test]
    fn revoked_session_no_longer_validates() {
        let manager = SessionManager::new(3600);
        let id = manager.create_session("alice");
        manager.revoke_session(&id);
        assert!(!manager.validate_session(&id));
    }

    #[test]
    fn revoke_is_idempotent() {
        let manager = SessionManager::new(3600);
        let id = manager.create_session("alice");
        manager.revoke_session(&id);
        manager.revoke_session(&id);
        assert_eq!(manager.active_sessions(), 0);
    }

    #[test]
    fn idle_session_expires_on_first_validation() {
        let manager = SessionManager::new(0);
        let id = manager.create_session("alice");

        std::thread::sleep(Duration::from_millis(20));
        assert!(!manager.validate_session(&id));
        // The expired session was revoked, not just reported invalid.
        assert_eq!(manager.active_sessions(), 0);
    }

    #[test]
    fn validation_refreshes_activity() {
        let manager = SessionManager::new(1);
        let id = manager.create_session("alice");

        // Touch the session repeatedly; it must stay alive well past the
        // timeout measured from creation.
        for _ in 0..4 {
            std::thread::sleep(Duration::from_millis(400));
            assert!(manager.validate_session(&id));
        }
    }
}
