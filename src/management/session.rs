use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use axum::http::{HeaderMap, header::COOKIE};
use tokio::sync::Mutex;
use tracing::debug;

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "EXPGATE_SESSION";

/// Session attribute holding the cached `Authorization` value.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Idle time after which a session is dropped, matching the usual servlet
/// container default.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Per-session key/value storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session: &str, key: &str) -> Option<String>;
    async fn set(&self, session: &str, key: &str, value: &str);
    async fn clear(&self, session: &str, key: &str);
}

#[derive(Debug)]
struct Session {
    attrs: HashMap<String, String>,
    last_access: Instant,
}

impl Session {
    fn new(now: Instant) -> Self {
        Session {
            attrs: HashMap::new(),
            last_access: now,
        }
    }
}

/// Process-local session store.
///
/// A session ends when it has not been touched for the idle timeout or when
/// [`end_session`] is called. Idle sessions are swept on every access, so the
/// map never holds more than the sessions active within one timeout window.
///
/// [`end_session`]: MemorySessionStore::end_session
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    idle_timeout: Duration,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        MemorySessionStore {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub async fn end_session(&self, session: &str) {
        self.sessions.lock().await.remove(session);
    }

    /// Number of live sessions, after dropping idle ones.
    pub async fn session_count(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        self.evict_idle(&mut sessions, Instant::now());
        sessions.len()
    }

    fn evict_idle(&self, sessions: &mut HashMap<String, Session>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_access) < self.idle_timeout);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "dropped idle sessions");
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session: &str, key: &str) -> Option<String> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        self.evict_idle(&mut sessions, now);

        let entry = sessions.get_mut(session)?;
        entry.last_access = now;
        entry.attrs.get(key).cloned()
    }

    async fn set(&self, session: &str, key: &str, value: &str) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        self.evict_idle(&mut sessions, now);

        let entry = sessions
            .entry(session.to_string())
            .or_insert_with(|| Session::new(now));
        entry.last_access = now;
        entry.attrs.insert(key.to_string(), value.to_string());
    }

    async fn clear(&self, session: &str, key: &str) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        self.evict_idle(&mut sessions, now);

        if let Some(entry) = sessions.get_mut(session) {
            entry.last_access = now;
            entry.attrs.remove(key);
        }
    }
}

/// Extracts the session id from the request's `Cookie` headers.
pub fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, id)| id.trim().to_string())
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// `Set-Cookie` value binding the browser to a session.
pub fn session_cookie(session: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session
    )
}
