//! In-memory, TTL-bounded multi-turn dialogue state.
//!
//! Sessions live only for the process lifetime. The whole map sits behind a
//! single mutex with minimal critical sections: lookups, inserts, and appends
//! hold the lock briefly, and history reads copy a snapshot out before any
//! prompt work starts. Both turns of an exchange are appended under one lock
//! acquisition, so a concurrent request on the same session observes either
//! none or both of them.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::get_config;

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The customer.
    User,
    /// The assistant.
    Assistant,
}

/// One message in a session.
#[derive(Debug, Clone)]
pub struct Turn {
    /// Author of the message.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// Wall-clock timestamp, RFC3339.
    pub ts: String,
}

#[derive(Debug)]
struct Session {
    turns: Vec<Turn>,
    created_at: Instant,
    last_seen_at: Instant,
}

impl Session {
    fn new(now: Instant) -> Self {
        Self {
            turns: Vec::new(),
            created_at: now,
            last_seen_at: now,
        }
    }

    fn expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.last_seen_at) > ttl
    }
}

/// Process-wide session registry keyed by opaque UUID.
pub struct SessionManager {
    sessions: Mutex<HashMap<Uuid, Session>>,
    ttl: Duration,
}

impl SessionManager {
    /// Build a manager with an explicit idle TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Build a manager from the process configuration.
    pub fn from_config() -> Self {
        Self::new(get_config().session_ttl)
    }

    /// Resolve a session id, allocating a fresh one when the provided id is
    /// missing, unparseable, or expired.
    ///
    /// Expired sessions are swept opportunistically on every call, so the map
    /// stays bounded by active traffic.
    pub fn get_or_create(&self, session_id: Option<&str>) -> (Uuid, bool) {
        let now = Instant::now();
        let requested = session_id.and_then(|raw| Uuid::parse_str(raw.trim()).ok());

        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        sweep_expired(&mut sessions, now, self.ttl);

        if let Some(id) = requested
            && let Some(session) = sessions.get_mut(&id)
        {
            session.last_seen_at = now;
            return (id, false);
        }

        let id = Uuid::new_v4();
        sessions.insert(id, Session::new(now));
        tracing::debug!(session_id = %id, "Allocated session");
        (id, true)
    }

    /// Append a full user/assistant exchange atomically.
    ///
    /// The caller invokes this only after the assistant response has been
    /// fully observed, so a failed or cancelled request leaves the session
    /// length unchanged.
    pub fn append_exchange(&self, session_id: &Uuid, user: &str, assistant: &str) {
        let now = Instant::now();
        let ts = timestamp_rfc3339();

        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        let session = sessions
            .entry(*session_id)
            .or_insert_with(|| Session::new(now));
        session.turns.push(Turn {
            role: Role::User,
            content: user.to_string(),
            ts: ts.clone(),
        });
        session.turns.push(Turn {
            role: Role::Assistant,
            content: assistant.to_string(),
            ts,
        });
        session.last_seen_at = now;
    }

    /// Snapshot the last `2 * max_turns` messages in chronological order.
    pub fn history(&self, session_id: &Uuid, max_turns: usize) -> Vec<Turn> {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        let Some(session) = sessions.get(session_id) else {
            return Vec::new();
        };

        let cap = max_turns.saturating_mul(2);
        let skip = session.turns.len().saturating_sub(cap);
        session.turns[skip..].to_vec()
    }

    /// Number of turns currently stored for a session.
    pub fn len(&self, session_id: &Uuid) -> usize {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions
            .get(session_id)
            .map(|session| session.turns.len())
            .unwrap_or(0)
    }

    /// Whether the session id is currently known and live.
    pub fn contains(&self, session_id: &Uuid) -> bool {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions.contains_key(session_id)
    }

    /// Drop every session idle past the TTL.
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        sweep_expired(&mut sessions, now, self.ttl);
    }

}

fn sweep_expired(sessions: &mut HashMap<Uuid, Session>, now: Instant, ttl: Duration) {
    sessions.retain(|id, session| {
        let keep = !session.expired(now, ttl);
        if !keep {
            tracing::debug!(
                session_id = %id,
                age_secs = session.created_at.elapsed().as_secs(),
                turns = session.turns.len(),
                "Session expired"
            );
        }
        keep
    });
}

fn timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new(Duration::from_secs(1800))
    }

    #[test]
    fn get_or_create_allocates_for_missing_and_invalid_ids() {
        let manager = manager();
        let (first, is_new) = manager.get_or_create(None);
        assert!(is_new);

        let (second, is_new) = manager.get_or_create(Some("not-a-uuid"));
        assert!(is_new);
        assert_ne!(first, second);

        let (reused, is_new) = manager.get_or_create(Some(&first.to_string()));
        assert!(!is_new);
        assert_eq!(first, reused);
    }

    #[test]
    fn unknown_but_valid_uuid_allocates_a_fresh_session() {
        let manager = manager();
        let stranger = Uuid::new_v4();
        let (id, is_new) = manager.get_or_create(Some(&stranger.to_string()));
        assert!(is_new);
        assert_ne!(id, stranger);
    }

    #[test]
    fn exchanges_append_atomically_and_alternate() {
        let manager = manager();
        let (id, _) = manager.get_or_create(None);

        manager.append_exchange(&id, "My phone has no signal", "Try restarting it.");
        manager.append_exchange(&id, "I already tried restarting", "Check the SIM seating.");

        let turns = manager.history(&id, 20);
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(turns[2].role, Role::User);
        assert_eq!(turns[3].role, Role::Assistant);
        assert_eq!(manager.len(&id), 4);
    }

    #[test]
    fn history_caps_at_twice_max_turns_keeping_the_tail() {
        let manager = manager();
        let (id, _) = manager.get_or_create(None);
        for round in 0..30 {
            manager.append_exchange(&id, &format!("q{round}"), &format!("a{round}"));
        }

        let turns = manager.history(&id, 20);
        assert_eq!(turns.len(), 40);
        assert_eq!(turns[0].content, "q10");
        assert_eq!(turns[39].content, "a29");
        // Storage retains the full transcript; only the prompt view truncates.
        assert_eq!(manager.len(&id), 60);
    }

    #[test]
    fn expired_sessions_are_replaced_with_fresh_ids() {
        let manager = SessionManager::new(Duration::from_millis(0));
        let (id, _) = manager.get_or_create(None);
        manager.append_exchange(&id, "hello", "hi");

        std::thread::sleep(Duration::from_millis(5));
        let (new_id, is_new) = manager.get_or_create(Some(&id.to_string()));
        assert!(is_new);
        assert_ne!(id, new_id);
        assert!(manager.history(&id, 20).is_empty());
    }

    #[test]
    fn sweep_drops_only_expired_sessions() {
        let manager = SessionManager::new(Duration::from_secs(1800));
        let (live, _) = manager.get_or_create(None);
        manager.sweep();
        assert!(manager.contains(&live));
    }
}
