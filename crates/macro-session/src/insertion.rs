//! Applying a picked macro to the surface.
//!
//! Insertion is two-phase: the commit hands the raw body out for expansion,
//! and only the expanded text comes back to be spliced in. A failed
//! expansion aborts without touching the surface.

use tracing::{debug, warn};

use macro_core::macros::Macro;
use macro_core::variables::ExpandError;

use super::response::hide_all;
use super::surface::{CaretRange, EditableSurface, InsertError};
use super::timing::ChangeMark;
use super::types::{EngineResponse, ExpansionRequest, PendingInsert, UsageRecord};
use super::AutocompleteEngine;

/// Splice `text` into `surface` and notify its observers.
///
/// With `replace_query`, the query before the caret is replaced (how the
/// trailing query is located depends on the surface); otherwise `text`
/// replaces the current selection. Returns the range that was replaced.
pub fn insert_text(
    surface: &mut dyn EditableSurface,
    text: &str,
    replace_query: Option<&str>,
) -> Result<CaretRange, InsertError> {
    let caret = surface.caret_offsets().ok_or(InsertError::NoCaret)?;
    let range = match replace_query {
        Some(query) => surface.query_range(caret, query),
        None => caret,
    };
    surface.splice_text(range, text)?;
    surface.notify_changed();
    Ok(range)
}

impl AutocompleteEngine {
    /// Commit `entry`: ask the host to expand its body.
    pub(crate) fn begin_insertion(&mut self, entry: Macro, replace_query: bool) -> EngineResponse {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let Some(session) = self.session.as_mut() else {
            return EngineResponse::none();
        };
        debug!(ticket, id = %entry.id, replace_query, "insertion started");
        let mut resp = EngineResponse::consumed();
        resp.expansion = Some(ExpansionRequest {
            ticket,
            macro_id: entry.id.clone(),
            raw_body: entry.body.clone(),
        });
        session.pending_insert = Some(PendingInsert {
            ticket,
            entry,
            replace_query,
            query: session.query.clone(),
        });
        resp
    }

    /// Answer to an `ExpansionRequest`. On success the text is applied,
    /// usage is reported and the suggestion surface closes.
    pub fn complete_insertion(
        &mut self,
        ticket: u64,
        expanded: Result<String, ExpandError>,
        now_ms: u64,
    ) -> EngineResponse {
        if self.disposed {
            return EngineResponse::none();
        }
        let Some(session) = self.session.as_mut() else {
            debug!(ticket, "insertion for a torn-down session dropped");
            return EngineResponse::none();
        };
        let pending = match session.pending_insert.take() {
            Some(p) if p.ticket == ticket => p,
            other => {
                session.pending_insert = other;
                debug!(ticket, "stale insertion ticket ignored");
                return EngineResponse::none();
            }
        };

        let mut resp = match expanded {
            Err(e) => {
                warn!(error = %e, id = %pending.entry.id, "body expansion failed; insertion aborted");
                EngineResponse::none()
            }
            Ok(text) => {
                let query = pending.replace_query.then_some(pending.query.as_str());
                let applied = insert_text(&mut *session.surface.borrow_mut(), &text, query);
                match applied {
                    Err(e) => {
                        warn!(error = %e, id = %pending.entry.id, "insertion aborted");
                        EngineResponse::none()
                    }
                    Ok(range) => {
                        debug!(start = range.start, end = range.end, "macro inserted");
                        session.timing.mark(ChangeMark::OwnInsertion);
                        session.query.clear();
                        session.clear_suggestions();
                        let mut r = hide_all(session);
                        r.changed = true;
                        r.usage.push(UsageRecord {
                            macro_id: pending.entry.id.clone(),
                            context_key: session.context.context_key(),
                            field_type: session.context.kind,
                            domain: session.context.domain.clone(),
                            at_ms: now_ms,
                        });
                        r
                    }
                }
            }
        };

        if session.teardown_after_insert {
            resp.merge(self.teardown());
        }
        resp
    }
}
