use tracing::{debug, debug_span};

use macro_core::field::classify;
use macro_core::text::char_len;

use super::response::hide_all;
use super::surface::SurfaceHandle;
use super::timing::TimingTracker;
use super::types::{EngineResponse, FocusTarget, Session, Stage, TimerKind, TimerToken};
use super::AutocompleteEngine;

impl AutocompleteEngine {
    /// A surface gained focus. The previous session is torn down first; an
    /// eligible surface gets a fresh session that waits out the focus delay
    /// before anything is shown.
    pub fn on_focus(&mut self, surface: SurfaceHandle, now_ms: u64) -> EngineResponse {
        let _span = debug_span!("on_focus", now_ms).entered();
        if self.disposed {
            return EngineResponse::none();
        }
        let mut resp = self.teardown();
        if !self.enabled {
            return resp;
        }

        let (descriptor, len) = {
            let s = surface.borrow();
            (s.descriptor().clone(), char_len(&s.text()))
        };
        if !descriptor.is_eligible() {
            debug!(element = ?descriptor.element, "ineligible surface ignored");
            return resp;
        }

        let context = classify(&descriptor, self.labels.as_ref(), &self.domain);
        let native = self.settings.behavior.minimize_on_native_autocomplete
            && descriptor.expects_native_autocomplete(context.kind);
        self.next_token += 1;
        let mut session = Session::new(
            self.next_token,
            surface,
            context,
            native,
            TimingTracker::new(len),
        );
        session.minimized = native;
        resp.timers.push(session.arm(
            TimerKind::FocusDelay,
            self.settings.timing.focus_delay_ms,
        ));
        debug!(
            token = session.token,
            kind = session.context.kind.as_str(),
            native,
            "session started"
        );
        self.session = Some(session);
        resp.refresh = self.maybe_refresh(now_ms);
        resp
    }

    /// The active surface lost focus. Teardown waits out a grace delay so a
    /// click into the overlay or a running insertion can finish.
    ///
    /// Focus moving into the overlay arms nothing: the session stays up until
    /// focus returns to the surface or the host reports the overlay itself
    /// losing focus with `on_blur(surface, FocusTarget::Elsewhere, ..)`.
    pub fn on_blur(
        &mut self,
        target: &SurfaceHandle,
        to: FocusTarget,
        now_ms: u64,
    ) -> EngineResponse {
        let _span = debug_span!("on_blur", ?to, now_ms).entered();
        let grace = self.settings.timing.blur_grace_ms;
        let Some(session) = self.routed(target) else {
            return EngineResponse::none();
        };
        if to == FocusTarget::Overlay {
            return EngineResponse::none();
        }
        session.blur_pending = true;
        let mut resp = EngineResponse::none();
        resp.timers.push(session.arm(TimerKind::BlurGrace, grace));
        resp
    }

    /// A scheduled timer fired. Timers from a superseded session, or ones
    /// already cancelled, do nothing.
    pub fn fire_timer(&mut self, token: TimerToken, now_ms: u64) -> EngineResponse {
        let _span =
            debug_span!("fire_timer", kind = ?token.kind, session = token.session, now_ms)
                .entered();
        if self.disposed {
            return EngineResponse::none();
        }
        let Some(session) = self.session.as_mut() else {
            return EngineResponse::none();
        };
        let Some(pos) = session.armed.iter().position(|t| *t == token) else {
            debug!("stale timer ignored");
            return EngineResponse::none();
        };
        session.armed.remove(pos);

        match token.kind {
            TimerKind::FocusDelay => {
                if session.stage != Stage::PendingFocus || session.blur_pending {
                    return EngineResponse::none();
                }
                session.stage = Stage::Active;
                debug!(minimized = session.minimized, "focus delay elapsed");
                self.recompute(now_ms)
            }
            TimerKind::BlurGrace => {
                if !session.blur_pending {
                    return EngineResponse::none();
                }
                if session.pending_insert.is_some() {
                    debug!("insertion in flight; teardown deferred");
                    session.teardown_after_insert = true;
                    return EngineResponse::none();
                }
                self.teardown()
            }
        }
    }

    /// Turn suggestions on or off. Disabling removes everything shown now;
    /// enabling takes effect at the next focus.
    pub fn set_enabled(&mut self, enabled: bool) -> EngineResponse {
        debug!(enabled, "feature toggle");
        self.enabled = enabled;
        if enabled {
            EngineResponse::none()
        } else {
            self.teardown()
        }
    }

    /// Release the session, its timers and anything on screen. The engine
    /// ignores every later event.
    pub fn dispose(&mut self) -> EngineResponse {
        let resp = self.teardown();
        self.disposed = true;
        resp
    }

    /// End the live session, if any: hide what it shows and cancel its timers.
    pub(crate) fn teardown(&mut self) -> EngineResponse {
        let Some(mut session) = self.session.take() else {
            return EngineResponse::none();
        };
        debug!(token = session.token, "session torn down");
        let mut resp = hide_all(&mut session);
        for kind in [TimerKind::FocusDelay, TimerKind::BlurGrace] {
            resp.timers.extend(session.disarm(kind));
        }
        resp
    }
}
