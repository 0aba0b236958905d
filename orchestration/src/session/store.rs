//! In-memory session map with a retention policy.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::model::WorkflowSession;

/// Default cap on retained sessions.
const DEFAULT_MAX_SESSIONS: usize = 100;
/// Default time a finished session is kept (24h).
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

/// Bounds on how many finished sessions are kept, and for how long.
///
/// Only terminal sessions are ever evicted; a running session is never
/// dropped from under its driver. Fields left out of a config file keep
/// their defaults; use [`RetentionPolicy::unbounded`] to disable both limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Evict the oldest terminal sessions beyond this count.
    pub max_sessions: Option<usize>,
    /// Evict terminal sessions not updated for this long.
    pub max_age_secs: Option<u64>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_sessions: Some(DEFAULT_MAX_SESSIONS),
            max_age_secs: Some(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

impl RetentionPolicy {
    /// Keep every session forever.
    pub fn unbounded() -> Self {
        Self {
            max_sessions: None,
            max_age_secs: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, WorkflowSession>>,
    retention: RetentionPolicy,
}

impl SessionStore {
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// Insert a session and apply retention. Returns the number evicted.
    pub fn insert(&self, session: WorkflowSession) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.id.clone(), session);
        self.prune_locked(&mut sessions, Utc::now())
    }

    /// Snapshot of a session.
    pub fn get(&self, id: &str) -> Option<WorkflowSession> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// All sessions, oldest first.
    pub fn list(&self) -> Vec<WorkflowSession> {
        let mut sessions: Vec<WorkflowSession> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        sessions
    }

    pub fn remove(&self, id: &str) -> Option<WorkflowSession> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Mutate a session in place under the lock. `None` if the id is unknown.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut WorkflowSession) -> R) -> Option<R> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.get_mut(id).map(f)
    }

    /// Apply retention now. Returns the number evicted.
    pub fn prune(&self) -> usize {
        self.prune_at(Utc::now())
    }

    pub(crate) fn prune_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        self.prune_locked(&mut sessions, now)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune_locked(&self, sessions: &mut HashMap<String, WorkflowSession>, now: DateTime<Utc>) -> usize {
        let before = sessions.len();

        if let Some(max_age) = self.retention.max_age_secs {
            let max_age = i64::try_from(max_age).unwrap_or(i64::MAX);
            sessions.retain(|_, s| {
                !(s.is_terminal() && (now - s.updated_at).num_seconds() > max_age)
            });
        }

        if let Some(max) = self.retention.max_sessions {
            if sessions.len() > max {
                let mut terminal: Vec<(DateTime<Utc>, String)> = sessions
                    .values()
                    .filter(|s| s.is_terminal())
                    .map(|s| (s.created_at, s.id.clone()))
                    .collect();
                terminal.sort();
                let excess = sessions.len() - max;
                for (_, id) in terminal.into_iter().take(excess) {
                    sessions.remove(&id);
                }
            }
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted workflow sessions");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use crate::session::{WorkflowContext, WorkflowResult, WorkflowType};

    fn session(created_offset_secs: i64, terminal: bool) -> WorkflowSession {
        let mut s = WorkflowSession::new(WorkflowType::Sequential, "t", "d", WorkflowContext::new());
        s.start().unwrap();
        if terminal {
            s.complete(WorkflowResult {
                final_output: String::new(),
                confidence: 100,
                recommendations: vec![],
                changes: vec![],
            })
            .unwrap();
        }
        let at = Utc::now() + ChronoDuration::seconds(created_offset_secs);
        s.created_at = at;
        s.updated_at = at;
        s
    }

    #[test]
    fn test_default_policy_is_bounded() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.max_sessions, Some(DEFAULT_MAX_SESSIONS));
        assert_eq!(policy.max_age_secs, Some(DEFAULT_SESSION_TTL_SECS));
        assert_ne!(policy, RetentionPolicy::unbounded());
    }

    #[test]
    fn test_unbounded_keeps_everything() {
        let store = SessionStore::new(RetentionPolicy::unbounded());
        for i in 0..5 {
            assert_eq!(store.insert(session(i, true)), 0);
        }
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_count_limit_evicts_oldest_terminal() {
        let store = SessionStore::new(RetentionPolicy {
            max_sessions: Some(2),
            max_age_secs: None,
        });
        let oldest = session(-30, true);
        let oldest_id = oldest.id.clone();
        store.insert(oldest);
        store.insert(session(-20, true));
        let evicted = store.insert(session(-10, true));
        assert_eq!(evicted, 1);
        assert!(store.get(&oldest_id).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_running_sessions_are_never_evicted() {
        let store = SessionStore::new(RetentionPolicy {
            max_sessions: Some(1),
            max_age_secs: Some(1),
        });
        store.insert(session(-3600, false));
        store.insert(session(-3600, false));
        assert_eq!(store.prune(), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_age_limit() {
        let store = SessionStore::new(RetentionPolicy {
            max_sessions: None,
            max_age_secs: Some(60),
        });
        let stale = session(-120, true);
        let stale_id = stale.id.clone();
        store.insert(stale);
        store.insert(session(0, true));
        assert_eq!(store.len(), 1);
        assert!(store.get(&stale_id).is_none());
        assert_eq!(store.prune_at(Utc::now() + ChronoDuration::seconds(61)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_is_ordered_by_creation() {
        let store = SessionStore::default();
        let late = session(10, true);
        let early = session(-10, true);
        let (late_id, early_id) = (late.id.clone(), early.id.clone());
        store.insert(late);
        store.insert(early);
        let ids: Vec<String> = store.list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![early_id, late_id]);
    }

    #[test]
    fn test_update_unknown_is_none() {
        let store = SessionStore::default();
        assert!(store.update("nope", |s| s.title.clone()).is_none());
    }

    #[test]
    fn test_get_is_a_snapshot() {
        let store = SessionStore::default();
        let s = session(0, false);
        let id = s.id.clone();
        store.insert(s);
        let mut copy = store.get(&id).unwrap();
        copy.title = "changed".into();
        assert_eq!(store.get(&id).unwrap().title, "t");
    }
}
