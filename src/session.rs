//! Per-session tracking state.
use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::{Duration, Instant};

use crate::{identity::Identity, sink::Properties};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// State that lives from construction (or the last reset) until the next
/// reset: who is logged in, with which traits, and since when.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    identity: Option<Identity>,
    traits: Properties,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl Session {
    /// Starts an anonymous session.
    pub fn new() -> Self {
        let started_at = Utc::now();
        Self {
            id: generate_session_id(&started_at),
            identity: None,
            traits: Properties::new(),
            started_at,
            started: Instant::now(),
        }
    }

    /// The session id attached to session-scoped events.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The identity set by the last identify, if any.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The traits sent with the last identify.
    pub fn traits(&self) -> &Properties {
        &self.traits
    }

    /// Whether someone was identified since the session started.
    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Wall clock time the session started at.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time since the session started. Monotonic, so never negative.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// [`Session::elapsed`] in whole milliseconds.
    pub fn duration_millis(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    pub(crate) fn identify(&mut self, identity: Identity, traits: Properties) {
        self.identity = Some(identity);
        self.traits = traits;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// `sess_` + 9 random base-36 characters + `_` + start time in unix millis.
pub fn generate_session_id(started_at: &DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let salt: String = (0..9)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("sess_{}_{}", salt, started_at.timestamp_millis())
}
