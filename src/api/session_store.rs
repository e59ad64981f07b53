// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Live reader sessions keyed by cookie id
//!
//! The map is behind an `RwLock`; each session has its own async mutex so
//! one visitor's long-running question never blocks another's.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::rag::ChatSession;

pub type SharedSession = Arc<Mutex<ChatSession>>;

#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
    pub cleanup_interval: Duration,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            idle_timeout: Duration::from_secs(1800), // 30 minutes
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

struct SessionEntry {
    session: SharedSession,
    last_seen: Instant,
}

impl SessionEntry {
    fn is_expired(&self, idle_timeout: Duration) -> bool {
        self.last_seen.elapsed() > idle_timeout
    }
}

#[derive(Clone)]
pub struct SessionStore {
    config: SessionStoreConfig,
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl SessionStore {
    pub fn new(config: SessionStoreConfig) -> Self {
        Self {
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &SessionStoreConfig {
        &self.config
    }

    /// Look up a session and mark it as recently used
    pub async fn get(&self, session_id: &str) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(session_id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.session))
    }

    /// Return the existing session for `session_id`, or create a new one.
    ///
    /// When the store is full the least recently used session is evicted.
    pub async fn get_or_create(&self, session_id: Option<&str>) -> (String, SharedSession) {
        if let Some(id) = session_id {
            if let Some(session) = self.get(id).await {
                return (id.to_string(), session);
            }
        }

        let session = ChatSession::new();
        let id = session.id().to_string();
        let shared = Arc::new(Mutex::new(session));

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.config.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                info!("Session limit {} reached, evicting {}", self.config.max_sessions, oldest);
                sessions.remove(&oldest);
            }
        }
        sessions.insert(
            id.clone(),
            SessionEntry {
                session: Arc::clone(&shared),
                last_seen: Instant::now(),
            },
        );
        debug!("Created session {} ({} live)", id, sessions.len());

        (id, shared)
    }

    pub async fn destroy(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for longer than the configured timeout
    pub async fn cleanup_expired(&self) -> usize {
        remove_expired(&self.sessions, self.config.idle_timeout).await
    }

    /// Run `cleanup_expired` periodically until every clone of the store is dropped
    pub fn spawn_cleanup_task(&self) -> tokio::task::JoinHandle<()> {
        let sessions = Arc::downgrade(&self.sessions);
        let interval = self.config.cleanup_interval;
        let idle_timeout = self.config.idle_timeout;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(sessions) = sessions.upgrade() else {
                    debug!("Session store dropped, stopping cleanup task");
                    break;
                };
                let removed = remove_expired(&sessions, idle_timeout).await;
                if removed > 0 {
                    info!("Cleaned up {} idle sessions", removed);
                }
            }
        })
    }
}

async fn remove_expired(
    sessions: &RwLock<HashMap<String, SessionEntry>>,
    idle_timeout: Duration,
) -> usize {
    let mut sessions = sessions.write().await;
    let initial_count = sessions.len();
    sessions.retain(|_, entry| !entry.is_expired(idle_timeout));
    initial_count - sessions.len()
}
