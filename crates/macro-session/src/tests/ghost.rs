use macro_core::SurfaceDescriptor;

use super::{plain, Harness};
use crate::surface::{Edges, Rect, SurfaceGeometry};
use crate::{GhostAction, GhostView, KeyEvent, WhiteSpace};

fn ghost_of(resp: &crate::EngineResponse) -> Option<&GhostView> {
    match &resp.ghost {
        GhostAction::Show(view) => Some(view),
        _ => None,
    }
}

fn geometry(scroll_left: f32) -> SurfaceGeometry {
    SurfaceGeometry {
        bounds: Rect::new(0.0, 100.0, 400.0, 30.0),
        border: Edges::uniform(1.0),
        padding: Edges::uniform(6.0),
        scroll_left,
        ..SurfaceGeometry::default()
    }
}

#[test]
fn ghost_shows_untyped_remainder() {
    let mut h = Harness::new();
    let (field, handle) = plain(SurfaceDescriptor::input("text", "q"));
    field.borrow_mut().set_geometry(geometry(0.0));
    h.focus_settled(&handle);

    let resp = h.type_text(&field, &handle, "than");
    let ghost = ghost_of(&resp).expect("ghost text");
    assert_eq!(ghost.lead, "than");
    assert_eq!(ghost.ghost, "ks so much for your help.");
    assert_eq!(ghost.frame, Rect::new(1.0, 101.0, 398.0, 28.0));
    assert_eq!(ghost.padding, Edges::uniform(6.0));
    assert_eq!(ghost.white_space, WhiteSpace::Pre);
}

#[test]
fn no_ghost_when_body_does_not_continue_query() {
    let mut h = Harness::new();
    let (field, handle) = plain(SurfaceDescriptor::input("text", "q"));
    h.focus_settled(&handle);
    let resp = h.type_text(&field, &handle, "si");
    assert!(h.engine.snapshot().unwrap().tab_match.is_some());
    assert!(!resp.shows_ghost());
}

#[test]
fn ghost_follows_scroll_and_hides_on_selection() {
    let mut h = Harness::new();
    let (field, handle) = plain(SurfaceDescriptor::input("text", "q"));
    field.borrow_mut().set_geometry(geometry(0.0));
    h.focus_settled(&handle);
    h.type_text(&field, &handle, "than");

    field.borrow_mut().set_geometry(geometry(30.0));
    let resp = h.engine.on_scroll(&handle);
    assert_eq!(ghost_of(&resp).unwrap().scroll_left, 30.0);
    assert!(resp.shows_overlay());

    field.borrow_mut().set_selection(0, 4);
    let resp = h.engine.on_resize(&handle);
    assert_eq!(resp.ghost, GhostAction::Hide);
    assert!(!h.engine.snapshot().unwrap().ghost_visible);
}

#[test]
fn textarea_ghost_wraps() {
    let mut h = Harness::new();
    let (field, handle) = plain(SurfaceDescriptor::textarea("reply"));
    h.focus_settled(&handle);
    let resp = h.type_text(&field, &handle, "Than");
    let ghost = ghost_of(&resp).unwrap();
    assert_eq!(ghost.white_space, WhiteSpace::PreWrap);
    assert_eq!(ghost.ghost, "ks so much for your help.");
}

#[test]
fn ghost_clears_after_tab() {
    let mut h = Harness::new();
    let (field, handle) = plain(SurfaceDescriptor::input("text", "q"));
    h.focus_settled(&handle);
    h.type_text(&field, &handle, "than");
    let resp = h.key(&handle, KeyEvent::Tab { shift: false });
    assert_eq!(resp.ghost, GhostAction::Hide);
    assert_eq!(field.borrow().value(), "Thanks so much for your help.");
}
