mod ghost;
mod rich;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use macro_core::field::FieldKind;
use macro_core::{Macro, Settings, SurfaceDescriptor};

use crate::surface::{PlainField, SurfaceHandle};
use crate::{AutocompleteEngine, EngineResponse, KeyEvent, TimerCommand, TimerKind, TimerToken};

pub(super) const DOMAIN: &str = "mail.example.com";

pub(super) fn test_macros() -> Vec<Macro> {
    vec![
        Macro::new("m-sig", "sig", "Best,\nA").with_usage(3, Some(1_000)),
        Macro::new("m-thanks", "thanks", "Thanks so much for your help.")
            .with_usage(1, Some(2_000)),
        Macro::new("m-email", "work email", "jane@work.example")
            .with_field_types([FieldKind::Email])
            .with_usage(220, Some(3_000)),
        Macro::new("m-email-old", "old email", "jane@old.example")
            .with_field_types([FieldKind::Email]),
        Macro::new("m-meet", "meeting notes", "Agenda:\n1. "),
    ]
}

pub(super) fn scheduled(resp: &EngineResponse, kind: TimerKind) -> Option<TimerToken> {
    resp.timers.iter().find_map(|t| match t {
        TimerCommand::Schedule { token, .. } if token.kind == kind => Some(*token),
        _ => None,
    })
}

pub(super) fn cancelled(resp: &EngineResponse, kind: TimerKind) -> bool {
    resp.timers
        .iter()
        .any(|t| matches!(t, TimerCommand::Cancel(token) if token.kind == kind))
}

pub(super) fn plain(desc: SurfaceDescriptor) -> (Rc<RefCell<PlainField>>, SurfaceHandle) {
    let field = Rc::new(RefCell::new(PlainField::new(desc)));
    let handle = SurfaceHandle::from(Rc::clone(&field));
    (field, handle)
}

/// Engine plus a virtual clock. Store reads and expansions are answered
/// immediately from `macros`, the way a host with a local store would.
pub(super) struct Harness {
    pub engine: AutocompleteEngine,
    pub macros: Vec<Macro>,
    pub now: u64,
    /// Usage records collected from every answered response.
    pub usage: Vec<crate::UsageRecord>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(Settings::default(), test_macros())
    }

    pub fn with_settings(settings: Settings, macros: Vec<Macro>) -> Self {
        Self {
            engine: AutocompleteEngine::new(Arc::new(settings), DOMAIN),
            macros,
            now: 0,
            usage: Vec::new(),
        }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }

    /// Answer store and expansion requests carried by `resp`, and return
    /// `resp` merged with everything the answers produced.
    pub fn settle(&mut self, mut resp: EngineResponse) -> EngineResponse {
        loop {
            let next = if let Some(req) = resp.refresh.take() {
                self.engine
                    .receive_macros(req.generation, Ok(self.macros.clone()), self.now)
            } else if let Some(req) = resp.expansion.take() {
                let mut done = self
                    .engine
                    .complete_insertion(req.ticket, Ok(req.raw_body), self.now);
                // The host echoes the synthetic change back as an input event.
                if done.changed {
                    if let Some(h) = self.engine.active_surface().cloned() {
                        let echo = self.engine.on_input(&h, self.now);
                        done.merge(echo);
                    }
                }
                done
            } else {
                self.usage.extend(resp.usage.iter().cloned());
                return resp;
            };
            resp.merge(next);
        }
    }

    pub fn focus(&mut self, handle: &SurfaceHandle) -> EngineResponse {
        let resp = self.engine.on_focus(handle.clone(), self.now);
        self.settle(resp)
    }

    /// Focus and let the focus delay elapse.
    pub fn focus_settled(&mut self, handle: &SurfaceHandle) -> EngineResponse {
        let resp = self.focus(handle);
        let token = scheduled(&resp, TimerKind::FocusDelay).expect("focus delay scheduled");
        let delay = self.engine.settings().timing.focus_delay_ms;
        self.advance(delay);
        let resp = self.engine.fire_timer(token, self.now);
        self.settle(resp)
    }

    /// Type `text` one character at a time at a human cadence.
    pub fn type_text(
        &mut self,
        field: &Rc<RefCell<PlainField>>,
        handle: &SurfaceHandle,
        text: &str,
    ) -> EngineResponse {
        let mut last = EngineResponse::none();
        for ch in text.chars() {
            self.advance(120);
            let s = ch.to_string();
            let key = self.engine.on_keydown(handle, KeyEvent::text(&s), self.now);
            assert!(!key.consumed);
            field.borrow_mut().type_text(&s);
            let resp = self.engine.on_input(handle, self.now);
            last = self.settle(resp);
        }
        last
    }

    pub fn key(&mut self, handle: &SurfaceHandle, key: KeyEvent) -> EngineResponse {
        self.advance(80);
        let resp = self.engine.on_keydown(handle, key, self.now);
        self.settle(resp)
    }
}
