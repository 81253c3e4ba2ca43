//! Time-bounded snapshot of the store's macro list.
//!
//! The snapshot is replaced wholesale, never edited in place. Scoring always
//! reads the best snapshot available; an expired or invalidated snapshot asks
//! for a refresh and keeps serving until the refresh lands.

use std::sync::Arc;

use crate::macros::Macro;

pub struct CandidateCache {
    macros: Arc<[Macro]>,
    captured_at: Option<u64>,
    ttl_ms: u64,
    /// Generation of the newest refresh handed out.
    generation: u64,
    in_flight: bool,
    invalidated: bool,
}

impl CandidateCache {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            macros: Arc::from(Vec::new()),
            captured_at: None,
            ttl_ms,
            generation: 0,
            in_flight: false,
            invalidated: false,
        }
    }

    pub fn snapshot(&self) -> Arc<[Macro]> {
        Arc::clone(&self.macros)
    }

    pub fn is_loaded(&self) -> bool {
        self.captured_at.is_some()
    }

    pub fn is_fresh(&self, now_ms: u64) -> bool {
        !self.invalidated
            && self
                .captured_at
                .is_some_and(|t| now_ms.saturating_sub(t) < self.ttl_ms)
    }

    /// Whether the caller should start a refresh now.
    /// An invalidation supersedes a refresh that is still in flight.
    pub fn needs_refresh(&self, now_ms: u64) -> bool {
        if self.invalidated {
            return true;
        }
        !self.in_flight && !self.is_fresh(now_ms)
    }

    /// Hand out a generation for a new refresh.
    pub fn begin_refresh(&mut self) -> u64 {
        self.generation += 1;
        self.in_flight = true;
        self.invalidated = false;
        self.generation
    }

    /// Install a refreshed list. Results from superseded refreshes are dropped.
    pub fn complete_refresh(&mut self, generation: u64, macros: Vec<Macro>, now_ms: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.macros = Arc::from(macros);
        self.captured_at = Some(now_ms);
        self.in_flight = false;
        true
    }

    /// A refresh failed; keep the last-known list.
    pub fn fail_refresh(&mut self, generation: u64) {
        if generation == self.generation {
            self.in_flight = false;
        }
    }

    /// Store change notification: the next scoring pass must refresh.
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }
}
