use macro_core::field::{FieldContext, FieldKind};
use macro_core::macros::{Macro, MacroId};
use macro_core::ranking::Suggestion;

use super::overlay::{GhostView, OverlayView};
use super::surface::SurfaceHandle;
use super::timing::TimingTracker;

/// Key presses the host forwards from the active surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    /// Character-producing key.
    Char(String),
    Backspace,
    Delete,
    ArrowDown,
    ArrowUp,
    Enter,
    Tab { shift: bool },
    Escape,
    /// Anything else (modifiers, function keys, navigation).
    Other,
}

impl KeyEvent {
    pub fn text(s: &str) -> Self {
        Self::Char(s.to_string())
    }

    /// Keys that always make the next change count as typed.
    pub(crate) fn edits_text(&self) -> bool {
        matches!(self, Self::Char(_) | Self::Backspace | Self::Delete)
    }
}

/// Where focus went when the active surface blurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    /// Into the suggestion overlay itself. When the overlay later loses
    /// focus too, the host blurs the surface again with `Elsewhere`.
    Overlay,
    Elsewhere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    FocusDelay,
    BlurGrace,
}

/// Identifies one scheduled callback. `session` is the focus token of the
/// session that scheduled it; a token from a superseded focus is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub session: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    Schedule { token: TimerToken, delay_ms: u64 },
    Cancel(TimerToken),
}

/// Ask the host to list the store and answer with `receive_macros`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequest {
    pub generation: u64,
}

/// Ask the host to run the body expander and answer with `complete_insertion`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionRequest {
    pub ticket: u64,
    pub macro_id: MacroId,
    pub raw_body: String,
}

/// Usage to report to the store after a successful insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    pub macro_id: MacroId,
    /// `domain:fieldType`
    pub context_key: String,
    pub field_type: FieldKind,
    pub domain: String,
    pub at_ms: u64,
}

/// Suggestion list panel action.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OverlayAction {
    #[default]
    Keep,
    Show(OverlayView),
    Hide,
}

/// Inline ghost-text mirror action.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GhostAction {
    #[default]
    Keep,
    Show(GhostView),
    Hide,
}

/// Everything the host must do in answer to one event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineResponse {
    /// The host must prevent the key's default action.
    pub consumed: bool,
    pub overlay: OverlayAction,
    pub ghost: GhostAction,
    pub timers: Vec<TimerCommand>,
    pub refresh: Option<RefreshRequest>,
    pub expansion: Option<ExpansionRequest>,
    pub usage: Vec<UsageRecord>,
    /// The engine mutated the surface text.
    pub changed: bool,
}

impl EngineResponse {
    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn consumed() -> Self {
        Self {
            consumed: true,
            ..Self::default()
        }
    }

    /// Fold a later response into this one. Later display actions win
    /// unless they are `Keep`; lists are concatenated.
    pub fn merge(&mut self, later: EngineResponse) {
        self.consumed |= later.consumed;
        if !matches!(later.overlay, OverlayAction::Keep) {
            self.overlay = later.overlay;
        }
        if !matches!(later.ghost, GhostAction::Keep) {
            self.ghost = later.ghost;
        }
        self.timers.extend(later.timers);
        if later.refresh.is_some() {
            self.refresh = later.refresh;
        }
        if later.expansion.is_some() {
            self.expansion = later.expansion;
        }
        self.usage.extend(later.usage);
        self.changed |= later.changed;
    }

    pub fn shows_overlay(&self) -> bool {
        matches!(self.overlay, OverlayAction::Show(_))
    }

    pub fn shows_ghost(&self) -> bool {
        matches!(self.ghost, GhostAction::Show(_))
    }
}

/// Externally visible state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No live session.
    Idle,
    PendingFocus,
    Visible,
    Suppressed,
    Minimized,
    Dismissed,
}

/// Read-only view of the live session, for hosts and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub token: u64,
    pub phase: Phase,
    pub context: FieldContext,
    pub query: String,
    pub suggestions: Vec<MacroId>,
    pub selected: usize,
    pub tab_match: Option<MacroId>,
    pub user_expanded: bool,
    pub overlay_visible: bool,
    pub ghost_visible: bool,
    pub insertion_pending: bool,
}

// --- Session internals ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    PendingFocus,
    Active,
    /// The last change looked programmatic; nothing is shown until a typed change.
    Suppressed,
    /// Closed by the user; terminal until the surface is focused again.
    Dismissed,
}

pub(crate) struct PendingInsert {
    pub(crate) ticket: u64,
    pub(crate) entry: Macro,
    pub(crate) replace_query: bool,
    pub(crate) query: String,
}

/// Transient state for the one focused surface.
pub(crate) struct Session {
    pub(crate) token: u64,
    pub(crate) surface: SurfaceHandle,
    pub(crate) context: FieldContext,
    pub(crate) stage: Stage,
    pub(crate) minimized: bool,
    pub(crate) user_expanded: bool,
    /// The surface expects the browser's own autofill dropdown.
    pub(crate) native_autocomplete: bool,
    pub(crate) query: String,
    pub(crate) suggestions: Vec<Suggestion>,
    pub(crate) selected: usize,
    pub(crate) tab_match: Option<Macro>,
    pub(crate) timing: TimingTracker,
    pub(crate) pending_insert: Option<PendingInsert>,
    pub(crate) armed: Vec<TimerToken>,
    pub(crate) blur_pending: bool,
    pub(crate) teardown_after_insert: bool,
    pub(crate) overlay_shown: bool,
    pub(crate) ghost_shown: bool,
}

impl Session {
    pub(crate) fn new(
        token: u64,
        surface: SurfaceHandle,
        context: FieldContext,
        native_autocomplete: bool,
        timing: TimingTracker,
    ) -> Self {
        Self {
            token,
            surface,
            context,
            stage: Stage::PendingFocus,
            minimized: false,
            user_expanded: false,
            native_autocomplete,
            query: String::new(),
            suggestions: Vec::new(),
            selected: 0,
            tab_match: None,
            timing,
            pending_insert: None,
            armed: Vec::new(),
            blur_pending: false,
            teardown_after_insert: false,
            overlay_shown: false,
            ghost_shown: false,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        match self.stage {
            Stage::PendingFocus => Phase::PendingFocus,
            Stage::Suppressed => Phase::Suppressed,
            Stage::Dismissed => Phase::Dismissed,
            Stage::Active if self.minimized => Phase::Minimized,
            Stage::Active => Phase::Visible,
        }
    }

    pub(crate) fn timer(&self, kind: TimerKind) -> TimerToken {
        TimerToken {
            kind,
            session: self.token,
        }
    }

    /// Arm a timer and return the command scheduling it.
    pub(crate) fn arm(&mut self, kind: TimerKind, delay_ms: u64) -> TimerCommand {
        let token = self.timer(kind);
        if !self.armed.contains(&token) {
            self.armed.push(token);
        }
        TimerCommand::Schedule { token, delay_ms }
    }

    /// Disarm a timer. Returns the cancel command if it was armed.
    pub(crate) fn disarm(&mut self, kind: TimerKind) -> Option<TimerCommand> {
        let token = self.timer(kind);
        let pos = self.armed.iter().position(|t| *t == token)?;
        self.armed.remove(pos);
        Some(TimerCommand::Cancel(token))
    }

    /// Drop list and completion state (after dismissal or insertion).
    pub(crate) fn clear_suggestions(&mut self) {
        self.suggestions.clear();
        self.selected = 0;
        self.tab_match = None;
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            token: self.token,
            phase: self.phase(),
            context: self.context.clone(),
            query: self.query.clone(),
            suggestions: self.suggestions.iter().map(|s| s.entry.id.clone()).collect(),
            selected: self.selected,
            tab_match: self.tab_match.as_ref().map(|m| m.id.clone()),
            user_expanded: self.user_expanded,
            overlay_visible: self.overlay_shown,
            ghost_visible: self.ghost_shown,
            insertion_pending: self.pending_insert.is_some(),
        }
    }
}
