//! Browser sessions
//!
//! A `relay_session` cookie carries a UUID v4. Each id maps to its own
//! `SessionContext`; idle sessions are pruned after the configured TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use relay_core::SessionContext;
use uuid::Uuid;

use crate::AppError;

pub const SESSION_COOKIE: &str = "relay_session";

struct SessionEntry {
    context: Arc<Mutex<SessionContext>>,
    last_seen: Instant,
}

/// In-memory session store
pub struct SessionStore {
    entries: Mutex<HashMap<Uuid, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Resume the cookie's session, or start a fresh one
    pub fn open(&self, cookie: &SessionCookie) -> SessionHandle {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.last_seen) < self.ttl);
        let pruned = before - entries.len();
        if pruned > 0 {
            tracing::debug!("Pruned {} idle sessions", pruned);
        }

        if let Some(id) = cookie.0 {
            if let Some(entry) = entries.get_mut(&id) {
                entry.last_seen = now;
                return SessionHandle {
                    id,
                    context: entry.context.clone(),
                    is_new: false,
                };
            }
        }

        let id = Uuid::new_v4();
        let context = Arc::new(Mutex::new(SessionContext::new()));
        entries.insert(
            id,
            SessionEntry {
                context: context.clone(),
                last_seen: now,
            },
        );
        tracing::debug!("Session started: {}", id);

        SessionHandle { id, context, is_new: true }
    }

    /// Existing session only; never creates one
    pub fn find(&self, cookie: &SessionCookie) -> Option<Arc<Mutex<SessionContext>>> {
        let id = cookie.0?;
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(&id)?;
        if entry.last_seen.elapsed() >= self.ttl {
            entries.remove(&id);
            return None;
        }
        entry.last_seen = Instant::now();
        Some(entry.context.clone())
    }

    /// Drop a session created by a request that failed; the browser never
    /// received its cookie. Resumed sessions are kept.
    pub fn discard(&self, handle: &SessionHandle) {
        if handle.is_new && self.entries.lock().remove(&handle.id).is_some() {
            tracing::debug!("Session discarded: {}", handle.id);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// A resolved session for one request
#[derive(Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    pub context: Arc<Mutex<SessionContext>>,
    pub is_new: bool,
}

impl SessionHandle {
    /// Attach `Set-Cookie` when the session was just created
    pub fn respond(&self, body: impl IntoResponse) -> Response {
        let mut response = body.into_response();
        if self.is_new {
            let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, self.id);
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

/// Session id from the request cookie, if any and well-formed
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionCookie(pub Option<Uuid>);

impl SessionCookie {
    fn parse(header: &str) -> Option<Uuid> {
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionCookie
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(SessionCookie::parse);
        Ok(SessionCookie(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_header() {
        let id = Uuid::new_v4();
        let header = format!("theme=dark; {}={}; other=1", SESSION_COOKIE, id);
        assert_eq!(SessionCookie::parse(&header), Some(id));
        assert_eq!(SessionCookie::parse("relay_session=not-a-uuid"), None);
        assert_eq!(SessionCookie::parse("theme=dark"), None);
    }

    #[test]
    fn test_open_resumes_known_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let first = store.open(&SessionCookie::default());
        assert!(first.is_new);

        let again = store.open(&SessionCookie(Some(first.id)));
        assert!(!again.is_new);
        assert_eq!(again.id, first.id);
        assert!(Arc::ptr_eq(&first.context, &again.context));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_id_starts_new_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let handle = store.open(&SessionCookie(Some(Uuid::new_v4())));
        assert!(handle.is_new);
        assert!(store.find(&SessionCookie(Some(handle.id))).is_some());
    }

    #[test]
    fn test_idle_sessions_expire() {
        let store = SessionStore::new(Duration::ZERO);
        let handle = store.open(&SessionCookie::default());
        assert!(store.find(&SessionCookie(Some(handle.id))).is_none());

        let next = store.open(&SessionCookie(Some(handle.id)));
        assert!(next.is_new);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_discard_only_drops_new_sessions() {
        let store = SessionStore::new(Duration::from_secs(60));
        let kept = store.open(&SessionCookie::default());
        let resumed = store.open(&SessionCookie(Some(kept.id)));
        store.discard(&resumed);
        assert_eq!(store.len(), 1);

        let fresh = store.open(&SessionCookie::default());
        assert_eq!(store.len(), 2);
        store.discard(&fresh);
        assert_eq!(store.len(), 1);
        assert!(store.find(&SessionCookie(Some(fresh.id))).is_none());
        assert!(store.find(&SessionCookie(Some(kept.id))).is_some());
    }

    #[test]
    fn test_respond_sets_cookie_once() {
        let store = SessionStore::new(Duration::from_secs(60));
        let handle = store.open(&SessionCookie::default());
        let response = handle.respond("ok");
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with(&format!("{}={}", SESSION_COOKIE, handle.id)));

        let resumed = store.open(&SessionCookie(Some(handle.id)));
        assert!(resumed.respond("ok").headers().get(SET_COOKIE).is_none());
    }
}
