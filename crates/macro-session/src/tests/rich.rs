use std::cell::RefCell;
use std::rc::Rc;

use macro_core::field::FieldKind;
use macro_core::SurfaceDescriptor;

use super::Harness;
use crate::surface::{RichPosition, RichTextRegion, SurfaceHandle};
use crate::{KeyEvent, Phase};

fn region(runs: &[&str]) -> (Rc<RefCell<RichTextRegion>>, SurfaceHandle) {
    let desc = SurfaceDescriptor {
        aria_label: Some("Message body".into()),
        ..SurfaceDescriptor::content_editable()
    };
    let r = Rc::new(RefCell::new(
        RichTextRegion::new(desc).with_runs(runs.iter().copied()),
    ));
    let handle = SurfaceHandle::from(Rc::clone(&r));
    (r, handle)
}

fn type_rich(
    h: &mut Harness,
    r: &Rc<RefCell<RichTextRegion>>,
    handle: &SurfaceHandle,
    text: &str,
) {
    for ch in text.chars() {
        h.advance(120);
        let s = ch.to_string();
        h.engine.on_keydown(handle, KeyEvent::text(&s), h.now);
        r.borrow_mut().type_text(&s);
        let resp = h.engine.on_input(handle, h.now);
        h.settle(resp);
    }
}

#[test]
fn rich_region_is_classified_from_its_label() {
    let mut h = Harness::new();
    let (_r, handle) = region(&[""]);
    h.focus_settled(&handle);
    let snap = h.engine.snapshot().unwrap();
    assert_eq!(snap.context.kind, FieldKind::Message);
    assert_eq!(snap.phase, Phase::Visible);
}

#[test]
fn query_comes_from_the_caret_run() {
    let mut h = Harness::new();
    let (r, handle) = region(&["Hello team", ""]);
    r.borrow_mut().set_caret(RichPosition { run: 1, offset: 0 });
    h.focus_settled(&handle);
    type_rich(&mut h, &r, &handle, "si");
    // The first run's text does not leak into the query.
    assert_eq!(h.engine.snapshot().unwrap().query, "si");
}

#[test]
fn tab_completion_in_rich_text() {
    let mut h = Harness::new();
    let (r, handle) = region(&["Hello team,\n"]);
    h.focus_settled(&handle);
    type_rich(&mut h, &r, &handle, "si");

    let resp = h.key(&handle, KeyEvent::Tab { shift: false });
    assert!(resp.consumed);
    assert!(resp.changed);
    let region = r.borrow();
    assert_eq!(region.runs(), ["Hello team,\n", "Best,\nA"]);
    assert_eq!(region.notifications(), 1);
    let (anchor, focus) = region.selection().unwrap();
    assert_eq!(anchor, focus);
    assert_eq!(focus, RichPosition { run: 1, offset: 7 });
    assert_eq!(h.usage[0].field_type, FieldKind::Message);
}

#[test]
fn list_pick_replaces_rich_selection() {
    let mut h = Harness::new();
    let (r, handle) = region(&["see you "]);
    h.focus_settled(&handle);
    type_rich(&mut h, &r, &handle, "than");
    r.borrow_mut().set_selection(
        RichPosition { run: 0, offset: 0 },
        RichPosition { run: 0, offset: 3 },
    );

    h.key(&handle, KeyEvent::Enter);
    assert_eq!(
        r.borrow().runs().concat(),
        "Thanks so much for your help. you than"
    );
}
