use tracing::debug;

use super::response::render;
use super::surface::SurfaceHandle;
use super::types::{EngineResponse, Stage};
use super::AutocompleteEngine;

impl AutocompleteEngine {
    /// Pointer moved over list item `index`.
    pub fn pointer_hover(&mut self, index: usize) -> EngineResponse {
        let Some(session) = self.session.as_mut() else {
            return EngineResponse::none();
        };
        if session.stage != Stage::Active
            || session.minimized
            || index >= session.suggestions.len()
            || index == session.selected
        {
            return EngineResponse::none();
        }
        session.selected = index;
        render(session)
    }

    /// Pointer pressed on list item `index`. Hosts deliver this before the
    /// surface would blur so the caret is still where the user left it.
    pub fn pointer_commit(&mut self, index: usize) -> EngineResponse {
        let replace_query = self.settings.behavior.replace_query_on_pick;
        let Some(session) = self.session.as_mut() else {
            return EngineResponse::none();
        };
        if session.stage != Stage::Active
            || session.pending_insert.is_some()
            || session.minimized
        {
            return EngineResponse::none();
        }
        let Some(entry) = session.suggestions.get(index).map(|s| s.entry.clone()) else {
            return EngineResponse::none();
        };
        session.selected = index;
        self.begin_insertion(entry, replace_query)
    }

    /// Compact affordance clicked: show the full list. Sticky for the session.
    pub fn expand_overlay(&mut self) -> EngineResponse {
        let Some(session) = self.session.as_mut() else {
            return EngineResponse::none();
        };
        session.user_expanded = true;
        if !session.minimized {
            return EngineResponse::none();
        }
        session.minimized = false;
        debug!("overlay expanded");
        render(session)
    }

    pub fn minimize_overlay(&mut self) -> EngineResponse {
        let Some(session) = self.session.as_mut() else {
            return EngineResponse::none();
        };
        if session.minimized {
            return EngineResponse::none();
        }
        session.minimized = true;
        session.user_expanded = false;
        debug!("overlay minimized");
        render(session)
    }

    /// Close button: same as Escape.
    pub fn close_overlay(&mut self) -> EngineResponse {
        let active = self
            .session
            .as_ref()
            .is_some_and(|s| s.stage == Stage::Active);
        if active {
            self.dismiss()
        } else {
            EngineResponse::none()
        }
    }

    /// The surface scrolled; overlay anchor and ghost mirror follow.
    pub fn on_scroll(&mut self, target: &SurfaceHandle) -> EngineResponse {
        self.sync_geometry(target)
    }

    pub fn on_resize(&mut self, target: &SurfaceHandle) -> EngineResponse {
        self.sync_geometry(target)
    }

    fn sync_geometry(&mut self, target: &SurfaceHandle) -> EngineResponse {
        match self.routed(target) {
            Some(session) if session.overlay_shown || session.ghost_shown => render(session),
            _ => EngineResponse::none(),
        }
    }
}
