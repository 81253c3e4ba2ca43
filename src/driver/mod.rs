//! Single-threaded host around an `AutocompleteEngine`.
//!
//! The engine never blocks: it answers every event with an `EngineResponse`
//! whose timers, store reads and body expansions the host has to carry out.
//! `HostDriver` is that host. It owns a virtual clock and timer queue, runs
//! store and expander work as queued jobs, feeds the answers back with their
//! tokens, reports usage to the store and mirrors what is on screen.


use std::collections::VecDeque;

use tracing::{debug, debug_span, warn};

use macro_core::store::MacroStore;
use macro_core::variables::BodyExpander;
use macro_session::{
    AutocompleteEngine, EngineResponse, ExpansionRequest, FocusTarget, GhostAction, GhostView,
    KeyEvent, OverlayAction, OverlayView, RefreshRequest, SurfaceHandle, TimerCommand,
    TimerToken, UsageRecord,
};

/// When queued store and expander work runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AsyncMode {
    /// Right after the event that queued it.
    #[default]
    Immediate,
    /// Only on `run_pending`.
    Manual,
}

#[derive(Debug, Clone)]
enum Job {
    Refresh(RefreshRequest),
    Expand(ExpansionRequest),
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    due_ms: u64,
    seq: u64,
    token: TimerToken,
}

pub struct HostDriver<S: MacroStore, E: BodyExpander> {
    engine: AutocompleteEngine,
    store: S,
    expander: E,
    mode: AsyncMode,
    now_ms: u64,
    timers: Vec<Scheduled>,
    timer_seq: u64,
    jobs: VecDeque<Job>,
    /// Store revision the engine cache was last synced to.
    seen_revision: u64,
    overlay: Option<OverlayView>,
    ghost: Option<GhostView>,
    reported: Vec<UsageRecord>,
}

impl<S: MacroStore, E: BodyExpander> HostDriver<S, E> {
    pub fn new(engine: AutocompleteEngine, store: S, expander: E) -> Self {
        let seen_revision = store.revision();
        Self {
            engine,
            store,
            expander,
            mode: AsyncMode::default(),
            now_ms: 0,
            timers: Vec::new(),
            timer_seq: 0,
            jobs: VecDeque::new(),
            seen_revision,
            overlay: None,
            ghost: None,
            reported: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: AsyncMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn engine(&self) -> &AutocompleteEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut AutocompleteEngine {
        &mut self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutate the store, then let the engine know if anything changed.
    pub fn update_store<R>(&mut self, f: impl FnOnce(&mut S) -> R) -> R {
        let out = f(&mut self.store);
        self.sync_store();
        if self.mode == AsyncMode::Immediate {
            self.run_pending();
        }
        out
    }

    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Suggestion panel currently on screen.
    pub fn overlay(&self) -> Option<&OverlayView> {
        self.overlay.as_ref()
    }

    /// Ghost-text mirror currently on screen.
    pub fn ghost(&self) -> Option<&GhostView> {
        self.ghost.as_ref()
    }

    /// Usage records successfully written to the store.
    pub fn reported_usage(&self) -> &[UsageRecord] {
        &self.reported
    }

    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    // -----------------------------------------------------------------------
    // Host events
    // -----------------------------------------------------------------------

    pub fn focus(&mut self, surface: &SurfaceHandle) -> EngineResponse {
        let _span = debug_span!("driver_focus", now_ms = self.now_ms).entered();
        let resp = self.engine.on_focus(surface.clone(), self.now_ms);
        self.dispatch(resp)
    }

    pub fn blur(&mut self, surface: &SurfaceHandle, to: FocusTarget) -> EngineResponse {
        let resp = self.engine.on_blur(surface, to, self.now_ms);
        self.dispatch(resp)
    }

    /// Focus left the overlay for somewhere other than `surface`. Starts the
    /// same grace teardown as a plain blur.
    pub fn overlay_blur(&mut self, surface: &SurfaceHandle) -> EngineResponse {
        self.blur(surface, FocusTarget::Elsewhere)
    }

    /// Forward a key press. `consumed` in the result means the host must
    /// prevent the key's default action.
    pub fn key(&mut self, surface: &SurfaceHandle, key: KeyEvent) -> EngineResponse {
        let _span = debug_span!("driver_key", ?key, now_ms = self.now_ms).entered();
        let resp = self.engine.on_keydown(surface, key, self.now_ms);
        self.dispatch(resp)
    }

    pub fn input(&mut self, surface: &SurfaceHandle) -> EngineResponse {
        let resp = self.engine.on_input(surface, self.now_ms);
        self.dispatch(resp)
    }

    pub fn paste(&mut self, surface: &SurfaceHandle) -> EngineResponse {
        let resp = self.engine.on_paste(surface, self.now_ms);
        self.dispatch(resp)
    }

    pub fn scroll(&mut self, surface: &SurfaceHandle) -> EngineResponse {
        let resp = self.engine.on_scroll(surface);
        self.dispatch(resp)
    }

    pub fn resize(&mut self, surface: &SurfaceHandle) -> EngineResponse {
        let resp = self.engine.on_resize(surface);
        self.dispatch(resp)
    }

    pub fn pointer_hover(&mut self, index: usize) -> EngineResponse {
        let resp = self.engine.pointer_hover(index);
        self.dispatch(resp)
    }

    pub fn pointer_commit(&mut self, index: usize) -> EngineResponse {
        let resp = self.engine.pointer_commit(index);
        self.dispatch(resp)
    }

    pub fn set_enabled(&mut self, enabled: bool) -> EngineResponse {
        let resp = self.engine.set_enabled(enabled);
        self.dispatch(resp)
    }

    /// Tear the engine down. Pending timers and jobs are dropped with it.
    pub fn dispose(&mut self) {
        let resp = self.engine.dispose();
        self.apply(resp);
        self.timers.clear();
        self.jobs.clear();
        self.overlay = None;
        self.ghost = None;
    }

    // -----------------------------------------------------------------------
    // Clock and queued work
    // -----------------------------------------------------------------------

    /// Move the clock forward, firing every timer that falls due on the way
    /// in deadline order.
    pub fn advance(&mut self, ms: u64) {
        let target = self.now_ms + ms;
        while let Some(idx) = self.next_due(target) {
            let timer = self.timers.remove(idx);
            self.now_ms = timer.due_ms;
            debug!(kind = ?timer.token.kind, at = timer.due_ms, "timer fired");
            let resp = self.engine.fire_timer(timer.token, self.now_ms);
            self.dispatch(resp);
        }
        self.now_ms = target;
    }

    fn next_due(&self, limit: u64) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= limit)
            .min_by_key(|(_, t)| (t.due_ms, t.seq))
            .map(|(i, _)| i)
    }

    /// Run queued store reads and body expansions, including whatever their
    /// answers queue in turn.
    pub fn run_pending(&mut self) {
        while let Some(job) = self.jobs.pop_front() {
            let resp = self.run_job(job);
            self.apply(resp);
        }
    }

    fn run_job(&mut self, job: Job) -> EngineResponse {
        match job {
            Job::Refresh(req) => {
                let _span = debug_span!("store_list", generation = req.generation).entered();
                let listed = self.store.list();
                if let Err(e) = &listed {
                    warn!(error = %e, "macro store list failed");
                }
                self.engine
                    .receive_macros(req.generation, listed, self.now_ms)
            }
            Job::Expand(req) => {
                let _span = debug_span!("expand", ticket = req.ticket, id = %req.macro_id).entered();
                let expanded = self.expander.expand(&req.raw_body);
                let mut resp = self
                    .engine
                    .complete_insertion(req.ticket, expanded, self.now_ms);
                // A real surface fires an input event for the synthetic change.
                if resp.changed {
                    if let Some(surface) = self.engine.active_surface().cloned() {
                        resp.merge(self.engine.on_input(&surface, self.now_ms));
                    }
                }
                resp
            }
        }
    }

    /// Apply `resp`, then settle queued work if the mode says so.
    fn dispatch(&mut self, resp: EngineResponse) -> EngineResponse {
        self.apply(resp.clone());
        if self.mode == AsyncMode::Immediate {
            self.run_pending();
        }
        resp
    }

    /// Carry out everything one response asks for.
    fn apply(&mut self, resp: EngineResponse) {
        for cmd in &resp.timers {
            match *cmd {
                TimerCommand::Schedule { token, delay_ms } => {
                    self.timer_seq += 1;
                    self.timers.push(Scheduled {
                        due_ms: self.now_ms + delay_ms,
                        seq: self.timer_seq,
                        token,
                    });
                }
                TimerCommand::Cancel(token) => self.timers.retain(|t| t.token != token),
            }
        }

        match resp.overlay {
            OverlayAction::Keep => {}
            OverlayAction::Show(view) => self.overlay = Some(view),
            OverlayAction::Hide => self.overlay = None,
        }
        match resp.ghost {
            GhostAction::Keep => {}
            GhostAction::Show(view) => self.ghost = Some(view),
            GhostAction::Hide => self.ghost = None,
        }

        if let Some(req) = resp.refresh {
            self.jobs.push_back(Job::Refresh(req));
        }
        if let Some(req) = resp.expansion {
            self.jobs.push_back(Job::Expand(req));
        }

        if !resp.usage.is_empty() {
            for record in resp.usage {
                self.report_usage(record);
            }
            self.sync_store();
        }
    }

    fn report_usage(&mut self, record: UsageRecord) {
        let written = self
            .store
            .increment_usage(&record.macro_id, record.at_ms)
            .and_then(|()| {
                self.store.record_context_usage(
                    &record.macro_id,
                    &record.context_key,
                    record.field_type,
                    &record.domain,
                )
            });
        match written {
            Ok(()) => {
                debug!(id = %record.macro_id, context = %record.context_key, "usage recorded");
                self.reported.push(record);
            }
            Err(e) => warn!(error = %e, id = %record.macro_id, "usage not recorded"),
        }
    }

    /// Invalidate the engine cache when the store moved on.
    fn sync_store(&mut self) {
        let revision = self.store.revision();
        if revision == self.seen_revision {
            return;
        }
        debug!(from = self.seen_revision, to = revision, "store changed");
        self.seen_revision = revision;
        let resp = self.engine.invalidate_cache(self.now_ms);
        self.apply(resp);
    }
}
