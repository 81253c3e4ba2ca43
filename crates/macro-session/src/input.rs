use std::sync::Arc;

use tracing::{debug, debug_span, warn};

use macro_core::macros::Macro;
use macro_core::ranking::{rank, tab_match};
use macro_core::store::StoreError;
use macro_core::text::{char_len, trailing_token};

use super::response::{hide_all, render};
use super::surface::SurfaceHandle;
use super::timing::{ChangeMark, ChangeOrigin};
use super::types::{EngineResponse, Stage};
use super::AutocompleteEngine;

impl AutocompleteEngine {
    /// The active surface's content changed.
    pub fn on_input(&mut self, target: &SurfaceHandle, now_ms: u64) -> EngineResponse {
        let _span = debug_span!("on_input", now_ms).entered();
        let settings = Arc::clone(&self.settings);
        let Some(session) = self.routed(target) else {
            return EngineResponse::none();
        };
        let len = char_len(&session.surface.borrow().text());
        let Some(origin) = session.timing.classify(now_ms, len, &settings.timing) else {
            debug!("own insertion echoed back; ignored");
            return EngineResponse::none();
        };
        debug!(?origin, stage = ?session.stage, "change classified");

        match (session.stage, origin) {
            (Stage::Dismissed, _) => EngineResponse::none(),
            // Typed during the focus delay: evaluated when the delay ends.
            (Stage::PendingFocus, ChangeOrigin::Human) => EngineResponse::none(),
            (_, ChangeOrigin::Programmatic) => {
                session.stage = Stage::Suppressed;
                session.clear_suggestions();
                hide_all(session)
            }
            (Stage::Active | Stage::Suppressed, ChangeOrigin::Human) => {
                session.stage = Stage::Active;
                self.recompute(now_ms)
            }
        }
    }

    /// A paste is about to change the active surface.
    pub fn on_paste(&mut self, target: &SurfaceHandle, _now_ms: u64) -> EngineResponse {
        if let Some(session) = self.routed(target) {
            session.timing.mark(ChangeMark::Paste);
        }
        EngineResponse::none()
    }

    /// Answer to a `RefreshRequest`. Superseded answers are dropped; a failed
    /// read keeps the last-known list.
    pub fn receive_macros(
        &mut self,
        generation: u64,
        result: Result<Vec<Macro>, StoreError>,
        now_ms: u64,
    ) -> EngineResponse {
        let _span = debug_span!("receive_macros", generation, now_ms).entered();
        if self.disposed {
            return EngineResponse::none();
        }
        match result {
            Ok(macros) => {
                let count = macros.len();
                let first_load = !self.cache.is_loaded();
                if !self.cache.complete_refresh(generation, macros, now_ms) {
                    debug!("superseded refresh dropped");
                    return EngineResponse::none();
                }
                debug!(count, first_load, "candidate cache refreshed");
                // Fresh data updates what is on screen; it never pops a list
                // open by itself once the first list has loaded.
                let showing = self
                    .session
                    .as_ref()
                    .is_some_and(|s| s.overlay_shown || s.ghost_shown);
                if first_load || showing {
                    self.recompute(now_ms)
                } else {
                    EngineResponse::none()
                }
            }
            Err(e) => {
                warn!(error = %e, "macro store list failed; keeping last-known macros");
                self.cache.fail_refresh(generation);
                EngineResponse::none()
            }
        }
    }

    /// The store changed. The next scoring pass must see fresh data; a live
    /// session asks for it right away.
    pub fn invalidate_cache(&mut self, now_ms: u64) -> EngineResponse {
        if self.disposed {
            return EngineResponse::none();
        }
        self.cache.invalidate();
        let mut resp = EngineResponse::none();
        if self.session.is_some() {
            resp.refresh = self.maybe_refresh(now_ms);
        }
        resp
    }

    /// Re-derive query, suggestions and tab match from the surface and the
    /// current cache snapshot, then describe what to show.
    pub(crate) fn recompute(&mut self, now_ms: u64) -> EngineResponse {
        let active = self
            .session
            .as_ref()
            .is_some_and(|s| s.stage == Stage::Active);
        if !active {
            return EngineResponse::none();
        }
        let refresh = self.maybe_refresh(now_ms);
        let settings = Arc::clone(&self.settings);
        let candidates = self.cache.snapshot();
        let Some(session) = self.session.as_mut() else {
            return EngineResponse::none();
        };

        let query = {
            let s = session.surface.borrow();
            match s.caret_offsets() {
                Some(caret) => trailing_token(&s.text_before(caret.end)).to_string(),
                None => String::new(),
            }
        };
        if query != session.query {
            session.selected = 0;
        }
        session.query = query;
        session.suggestions = rank(
            &session.query,
            Some(&session.context),
            &candidates,
            &settings,
        );
        session.selected = session
            .selected
            .min(session.suggestions.len().saturating_sub(1));
        session.tab_match =
            tab_match(&session.query, &session.suggestions, &candidates, &settings).cloned();
        debug!(
            query = %session.query,
            suggestions = session.suggestions.len(),
            tab = session.tab_match.as_ref().map(|m| m.name.as_str()),
            "recomputed"
        );

        let mut resp = render(session);
        resp.refresh = refresh;
        resp
    }
}
