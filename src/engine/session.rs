//! Session identity.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Length of the random base-36 suffix in a session id.
const SESSION_SUFFIX_LEN: usize = 9;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a session identifier: epoch millis, a separator, and a random
/// base-36 suffix. Collision probability across concurrent sessions is
/// negligible; no cryptographic guarantee is intended.
pub fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SESSION_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// One browser tab's lifetime.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque unique identifier, immutable for the process lifetime.
    pub session_id: String,
    /// External identity, settable after authentication.
    pub user_id: Option<String>,
    /// Construction time, used for duration computation.
    pub start_time: DateTime<Utc>,
}

impl Session {
    /// Start a new session now.
    pub fn new() -> Self {
        Self {
            session_id: generate_session_id(),
            user_id: None,
            start_time: Utc::now(),
        }
    }

    /// Elapsed session time in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (Utc::now() - self.start_time).num_milliseconds().max(0)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_session_id_shape() {
        let id = generate_session_id();
        let (millis, suffix) = id.split_once('-').expect("separator missing");
        assert!(millis.parse::<i64>().is_ok());
        assert!(suffix.len() >= 9);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_session_id_uniqueness() {
        let ids: HashSet<String> = (0..10_000).map(|_| generate_session_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_two_sessions_differ() {
        let a = Session::new();
        let b = Session::new();
        assert_ne!(a.session_id, b.session_id);
    }
}
