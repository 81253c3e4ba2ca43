use tracing::{debug, debug_span};

use macro_core::macros::Macro;

use super::response::{hide_all, render};
use super::surface::SurfaceHandle;
use super::timing::ChangeMark;
use super::types::{EngineResponse, KeyEvent, Stage};
use super::AutocompleteEngine;

enum KeyOutcome {
    Pass,
    Redraw,
    Commit { entry: Macro, replace_query: bool },
    Dismiss,
}

impl AutocompleteEngine {
    /// Process a key press on `target`. A consumed response means the host
    /// must prevent the key's default action.
    pub fn on_keydown(
        &mut self,
        target: &SurfaceHandle,
        key: KeyEvent,
        _now_ms: u64,
    ) -> EngineResponse {
        let _span = debug_span!("on_keydown", ?key).entered();
        let replace_on_pick = self.settings.behavior.replace_query_on_pick;
        let Some(session) = self.routed(target) else {
            return EngineResponse::none();
        };

        if key.edits_text() {
            session.timing.mark(ChangeMark::Keystroke);
            return EngineResponse::none();
        }
        // The compact badge leaves every key to the page.
        if session.stage != Stage::Active || session.minimized || session.pending_insert.is_some()
        {
            return EngineResponse::none();
        }

        let list_open = !session.suggestions.is_empty();
        let last = session.suggestions.len().saturating_sub(1);
        let outcome = match key {
            KeyEvent::ArrowDown if list_open => {
                session.selected = (session.selected + 1).min(last);
                KeyOutcome::Redraw
            }
            KeyEvent::ArrowUp if list_open => {
                session.selected = session.selected.saturating_sub(1);
                KeyOutcome::Redraw
            }
            KeyEvent::Enter if list_open => KeyOutcome::Commit {
                entry: session.suggestions[session.selected].entry.clone(),
                replace_query: replace_on_pick,
            },
            // Tab completes straight to the match, replacing the query.
            KeyEvent::Tab { shift: false } => match &session.tab_match {
                Some(m) => KeyOutcome::Commit {
                    entry: m.clone(),
                    replace_query: true,
                },
                None => KeyOutcome::Pass,
            },
            KeyEvent::Escape if session.overlay_shown || session.ghost_shown => {
                KeyOutcome::Dismiss
            }
            _ => KeyOutcome::Pass,
        };

        match outcome {
            KeyOutcome::Pass => EngineResponse::none(),
            KeyOutcome::Redraw => {
                debug!(selected = session.selected, "selection moved");
                let mut resp = render(session);
                resp.consumed = true;
                resp
            }
            KeyOutcome::Commit {
                entry,
                replace_query,
            } => self.begin_insertion(entry, replace_query),
            KeyOutcome::Dismiss => {
                let mut resp = self.dismiss();
                resp.consumed = true;
                resp
            }
        }
    }

    /// Close the suggestion surface for the rest of this focus.
    pub(crate) fn dismiss(&mut self) -> EngineResponse {
        let Some(session) = self.session.as_mut() else {
            return EngineResponse::none();
        };
        debug!(token = session.token, "session dismissed");
        session.stage = Stage::Dismissed;
        session.query.clear();
        session.clear_suggestions();
        hide_all(session)
    }
}
