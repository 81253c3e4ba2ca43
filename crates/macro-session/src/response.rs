use super::overlay::{build_ghost, build_overlay};
use super::types::{EngineResponse, GhostAction, OverlayAction, Session, Stage};

/// Describe the overlay and ghost text for the session's current state.
pub(crate) fn render(session: &mut Session) -> EngineResponse {
    if session.stage != Stage::Active {
        return hide_all(session);
    }
    let mut resp = EngineResponse::none();
    let surface = session.surface.borrow();
    let geometry = surface.geometry();

    if session.suggestions.is_empty() {
        if session.overlay_shown {
            resp.overlay = OverlayAction::Hide;
        }
        session.overlay_shown = false;
    } else {
        resp.overlay = OverlayAction::Show(build_overlay(
            &geometry,
            &session.suggestions,
            session.selected,
            session.minimized,
        ));
        session.overlay_shown = true;
    }

    let ghost = session.tab_match.as_ref().and_then(|m| {
        let caret = surface.caret_offsets()?;
        build_ghost(&geometry, &surface.text(), caret, &session.query, &m.body)
    });
    match ghost {
        Some(view) => {
            resp.ghost = GhostAction::Show(view);
            session.ghost_shown = true;
        }
        None => {
            if session.ghost_shown {
                resp.ghost = GhostAction::Hide;
            }
            session.ghost_shown = false;
        }
    }
    resp
}

/// Remove whatever the session currently shows.
pub(crate) fn hide_all(session: &mut Session) -> EngineResponse {
    let mut resp = EngineResponse::none();
    if std::mem::take(&mut session.overlay_shown) {
        resp.overlay = OverlayAction::Hide;
    }
    if std::mem::take(&mut session.ghost_shown) {
        resp.ghost = GhostAction::Hide;
    }
    resp
}
