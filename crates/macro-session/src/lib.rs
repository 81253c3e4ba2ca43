//! Inline macro suggestion engine for editable surfaces.
//!
//! `AutocompleteEngine` tracks the one focused surface, decides when a
//! suggestion list may appear, ranks macros for the typed query and applies
//! the picked macro back into the surface. It never blocks: timers, store
//! reads and body expansion are requests in the returned `EngineResponse`
//! that the host answers later with the matching token.

pub(crate) mod types;

mod input;
mod insertion;
mod key_handlers;
mod lifecycle;
mod overlay;
mod pointer;
mod response;
pub mod surface;
mod timing;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use macro_core::cache::CandidateCache;
use macro_core::field::{LabelSource, NoLabels};
use macro_core::Settings;

pub use insertion::insert_text;
pub use overlay::{preview, GhostView, OverlayContent, OverlayItem, OverlayView, WhiteSpace};
pub use surface::{CaretRange, EditableSurface, InsertError, SurfaceHandle};
pub use timing::{ChangeOrigin, InputTimingSample};
pub use types::{
    EngineResponse, ExpansionRequest, FocusTarget, GhostAction, KeyEvent, OverlayAction, Phase,
    RefreshRequest, SessionSnapshot, TimerCommand, TimerKind, TimerToken, UsageRecord,
};

use types::Session;

/// One long-lived engine per page. At most one session is live at a time.
pub struct AutocompleteEngine {
    settings: Arc<Settings>,
    labels: Box<dyn LabelSource>,
    domain: String,
    cache: CandidateCache,
    session: Option<Session>,
    /// Focus token of the newest session; timers carry it.
    next_token: u64,
    next_ticket: u64,
    enabled: bool,
    disposed: bool,
}

impl AutocompleteEngine {
    pub fn new(settings: Arc<Settings>, domain: impl Into<String>) -> Self {
        let cache = CandidateCache::new(settings.cache.ttl_ms);
        Self {
            settings,
            labels: Box::new(NoLabels),
            domain: domain.into(),
            cache,
            session: None,
            next_token: 0,
            next_ticket: 0,
            enabled: true,
            disposed: false,
        }
    }

    /// Document label lookup used by the field classifier.
    pub fn with_labels(mut self, labels: Box<dyn LabelSource>) -> Self {
        self.labels = labels;
        self
    }

    /// Page navigation: later sessions classify against the new domain.
    pub fn set_domain(&mut self, domain: impl Into<String>) {
        self.domain = domain.into();
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.disposed
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or(Phase::Idle, Session::phase)
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(Session::snapshot)
    }

    /// The surface the live session is attached to.
    pub fn active_surface(&self) -> Option<&SurfaceHandle> {
        self.session.as_ref().map(|s| &s.surface)
    }

    /// Last timing verdict for the live session.
    pub fn last_timing(&self) -> Option<InputTimingSample> {
        self.session.as_ref().and_then(|s| s.timing.last())
    }

    pub fn cached_macro_count(&self) -> usize {
        self.cache.snapshot().len()
    }

    /// Route an event to the live session only if it concerns its surface.
    fn routed(&mut self, target: &SurfaceHandle) -> Option<&mut Session> {
        if self.disposed {
            return None;
        }
        self.session.as_mut().filter(|s| s.surface.same_as(target))
    }

    /// Start a store read if the cache is stale, invalidated or empty.
    fn maybe_refresh(&mut self, now_ms: u64) -> Option<RefreshRequest> {
        self.cache
            .needs_refresh(now_ms)
            .then(|| RefreshRequest {
                generation: self.cache.begin_refresh(),
            })
    }
}
