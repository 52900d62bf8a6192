//! In-memory recommendation sessions.
//!
//! A session holds one ranked result set and hands it out a page at a time:
//! the first page is always the top of the ranking, later pages are drawn at
//! random from designers not yet shown. Sessions expire after a fixed TTL and
//! are removed lazily on lookup or by the sweep that runs on every creation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::clock::{Clock, SystemClock};
use crate::models::{Proposal, ScoredDesigner};

/// Default session lifetime
pub const SESSION_TTL_MINUTES: i64 = 30;

/// Designers returned per initial or refresh call
pub const PAGE_SIZE: usize = 2;

/// Session store parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl: Duration,
    pub page_size: usize,
    /// Base seed for refresh shuffles; OS entropy when unset
    pub shuffle_seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(SESSION_TTL_MINUTES),
            page_size: PAGE_SIZE,
            shuffle_seed: None,
        }
    }
}

#[derive(Debug)]
struct SessionState {
    returned_ids: Vec<i64>,
    rng: StdRng,
}

impl SessionState {
    fn record(&mut self, page: &[ScoredDesigner]) {
        for designer in page {
            let id = designer.user_id();
            if !self.returned_ids.contains(&id) {
                self.returned_ids.push(id);
            }
        }
    }
}

/// One ranked result set plus the ids already shown from it
///
/// The ranked list is fixed at creation. Page selection locks the session so
/// the read-shuffle-record sequence never interleaves with another call on
/// the same session.
#[derive(Debug)]
pub struct MatchingSession {
    id: String,
    proposal: Proposal,
    designers: Vec<ScoredDesigner>,
    created_at: DateTime<Utc>,
    state: Mutex<SessionState>,
}

impl MatchingSession {
    fn new(
        id: String,
        proposal: Proposal,
        designers: Vec<ScoredDesigner>,
        created_at: DateTime<Utc>,
        rng: StdRng,
    ) -> Self {
        Self {
            id,
            proposal,
            designers,
            created_at,
            state: Mutex::new(SessionState {
                returned_ids: Vec::new(),
                rng,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    /// Rank-sorted designers, unchanged since creation
    pub fn designers(&self) -> &[ScoredDesigner] {
        &self.designers
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Ids already handed out, in the order they were first returned
    pub fn returned_ids(&self) -> Vec<i64> {
        self.state.lock().returned_ids.clone()
    }

    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now > self.created_at + ttl
    }

    /// The top `page_size` designers
    pub fn initial_page(&self, page_size: usize) -> Vec<ScoredDesigner> {
        let page: Vec<ScoredDesigner> = self.designers.iter().take(page_size).cloned().collect();
        self.state.lock().record(&page);
        page
    }

    /// A random page of designers not yet returned
    ///
    /// When fewer than `page_size` unseen designers remain the whole ranked
    /// list becomes eligible again, so a designer may repeat once the pool is
    /// nearly exhausted.
    pub fn refresh_page(&self, page_size: usize) -> Vec<ScoredDesigner> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let mut available: Vec<&ScoredDesigner> = self
            .designers
            .iter()
            .filter(|designer| !state.returned_ids.contains(&designer.user_id()))
            .collect();

        if available.len() < page_size {
            info!(
                "Not enough unseen designers, drawing from the full list - session: {}",
                self.id
            );
            available = self.designers.iter().collect();
        }

        available.shuffle(&mut state.rng);

        let page: Vec<ScoredDesigner> = available.into_iter().take(page_size).cloned().collect();
        state.record(&page);
        page
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            proposal: self.proposal.clone(),
            all_matching_designers: self.designers.clone(),
            created_at: self.created_at,
            returned_designer_ids: self.returned_ids(),
        }
    }
}

/// Serializable view of a session for introspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub proposal: Proposal,
    #[serde(rename = "allMatchingDesigners")]
    pub all_matching_designers: Vec<ScoredDesigner>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "returnedDesignerIds")]
    pub returned_designer_ids: Vec<i64>,
}

/// Concurrent, time-expiring store of matching sessions
///
/// Owned by the application state and dropped on shutdown; nothing is
/// persisted.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Arc<MatchingSession>>,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    sequence: AtomicU64,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
            clock,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Store a ranked list under a fresh id and sweep expired sessions
    pub fn create_session(&self, proposal: Proposal, designers: Vec<ScoredDesigner>) -> String {
        let created_at = self.clock.now();
        let designer_count = designers.len();

        let session_id = loop {
            let id = generate_session_id(created_at);
            match self.sessions.entry(id.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(Arc::new(MatchingSession::new(
                        id.clone(),
                        proposal,
                        designers,
                        created_at,
                        self.next_rng(),
                    )));
                    break id;
                }
                Entry::Occupied(_) => {
                    debug!("Session id collision, regenerating: {}", id);
                }
            }
        };

        info!(
            "Created matching session - id: {}, designers: {}",
            session_id, designer_count
        );

        self.cleanup_expired_sessions();

        session_id
    }

    /// Look up a live session, removing it if it has expired
    pub fn get_session(&self, session_id: &str) -> Option<Arc<MatchingSession>> {
        if session_id.trim().is_empty() {
            return None;
        }

        let session = self
            .sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))?;

        let now = self.clock.now();
        let ttl = self.config.ttl;
        if session.is_expired(now, ttl) {
            self.sessions
                .remove_if(session_id, |_, stored| stored.is_expired(now, ttl));
            info!("Removed expired session: {}", session_id);
            return None;
        }

        Some(session)
    }

    /// The top page of a session's ranking
    pub fn get_initial_recommendations(&self, session_id: &str) -> Vec<ScoredDesigner> {
        let Some(session) = self.get_session(session_id) else {
            warn!("Session not found for initial recommendations: {}", session_id);
            return Vec::new();
        };

        if session.designers().is_empty() {
            return Vec::new();
        }

        let page = session.initial_page(self.config.page_size);
        info!(
            "Returning initial recommendations - session: {}, designers: {}",
            session_id,
            page.len()
        );
        page
    }

    /// A random page of not-yet-returned designers
    pub fn get_refreshed_recommendations(&self, session_id: &str) -> Vec<ScoredDesigner> {
        let Some(session) = self.get_session(session_id) else {
            warn!("Session not found for refresh: {}", session_id);
            return Vec::new();
        };

        if session.designers().is_empty() {
            warn!("Session has no matching designers: {}", session_id);
            return Vec::new();
        }

        let page = session.refresh_page(self.config.page_size);
        info!(
            "Returning refreshed recommendations - session: {}, designers: {}",
            session_id,
            page.len()
        );
        page
    }

    /// Remove every expired session, returning how many were dropped
    pub fn cleanup_expired_sessions(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.config.ttl;
        let mut removed = 0;

        self.sessions.retain(|_, session| {
            let keep = !session.is_expired(now, ttl);
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            info!("Cleaned up {} expired sessions", removed);
        }

        removed
    }

    /// Number of live sessions, after sweeping expired ones
    pub fn active_session_count(&self) -> usize {
        self.cleanup_expired_sessions();
        self.sessions.len()
    }

    /// Number of stored sessions, expired ones included
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn next_rng(&self) -> StdRng {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        match self.config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(sequence)),
            None => StdRng::from_os_rng(),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

fn generate_session_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", now.timestamp_millis(), &suffix[..8])
}
