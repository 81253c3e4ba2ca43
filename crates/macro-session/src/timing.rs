//! Human-vs-programmatic classification of surface changes.
//!
//! Host autofill and scripts fill fields in one shot, with no key event in
//! front of the change. Typed changes arrive after a key press or at a
//! human cadence. Only typed changes may surface suggestions.

use macro_core::settings::TimingSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    Human,
    Programmatic,
}

/// Hint recorded before the change it describes arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChangeMark {
    Keystroke,
    Paste,
    /// The engine's own insertion; the resulting change is not a user change.
    OwnInsertion,
}

/// Timestamp and verdict for the last observed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputTimingSample {
    pub at_ms: u64,
    pub origin: ChangeOrigin,
}

pub(crate) struct TimingTracker {
    last: Option<InputTimingSample>,
    pending: Option<ChangeMark>,
    last_len: usize,
}

impl TimingTracker {
    pub(crate) fn new(initial_len: usize) -> Self {
        Self {
            last: None,
            pending: None,
            last_len: initial_len,
        }
    }

    pub(crate) fn mark(&mut self, mark: ChangeMark) {
        self.pending = Some(mark);
    }

    pub(crate) fn last(&self) -> Option<InputTimingSample> {
        self.last
    }

    /// Classify a change that left the surface with `new_len` characters.
    /// `None` means the change was the engine's own and must be ignored.
    pub(crate) fn classify(
        &mut self,
        now_ms: u64,
        new_len: usize,
        t: &TimingSettings,
    ) -> Option<ChangeOrigin> {
        let prev_len = std::mem::replace(&mut self.last_len, new_len);
        let origin = match self.pending.take() {
            Some(ChangeMark::OwnInsertion) => return None,
            Some(ChangeMark::Keystroke) => ChangeOrigin::Human,
            Some(ChangeMark::Paste) => ChangeOrigin::Programmatic,
            None if prev_len == 0 && new_len > 1 => ChangeOrigin::Programmatic,
            None => match self.last {
                Some(prev) if human_gap(now_ms.saturating_sub(prev.at_ms), t) => {
                    ChangeOrigin::Human
                }
                _ => ChangeOrigin::Programmatic,
            },
        };
        self.last = Some(InputTimingSample {
            at_ms: now_ms,
            origin,
        });
        Some(origin)
    }
}

fn human_gap(gap_ms: u64, t: &TimingSettings) -> bool {
    gap_ms > t.human_gap_min_ms && gap_ms < t.human_gap_max_ms
}
