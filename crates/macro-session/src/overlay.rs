//! Presentation model for the suggestion list and the ghost-text mirror.
//!
//! The engine never touches real nodes. It describes what the host should
//! draw: a list panel anchored below the surface, or its compact minimized
//! affordance, and a transparent mirror over the surface whose only visible
//! text is the untyped remainder of the tab completion.

use macro_core::macros::MacroId;
use macro_core::ranking::Suggestion;
use macro_core::text::{char_len, char_prefix, strip_prefix_ci};

use super::surface::{CaretRange, Edges, FontMetrics, Rect, SurfaceGeometry, TextAlign};

/// Vertical gap between the surface's bottom edge and the list panel.
pub const ANCHOR_GAP_PX: f32 = 2.0;
/// Longest body preview shown under an item name, in characters.
pub const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayItem {
    pub id: MacroId,
    pub name: String,
    pub preview: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayContent {
    List {
        items: Vec<OverlayItem>,
        selected: usize,
    },
    /// Minimized: a small badge that re-expands the list when clicked.
    Compact { count: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayView {
    /// Top-left at the surface's bottom-left, as wide as the surface.
    pub anchor: Rect,
    pub content: OverlayContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Single-line fields never wrap.
    Pre,
    PreWrap,
}

/// Mirror laid exactly over the surface's text. `lead` is drawn transparent
/// so `ghost` starts where the caret is.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostView {
    /// Padding box of the surface (border box inset by the border).
    pub frame: Rect,
    pub padding: Edges,
    pub font: FontMetrics,
    pub text_align: TextAlign,
    pub scroll_left: f32,
    pub scroll_top: f32,
    pub white_space: WhiteSpace,
    pub lead: String,
    pub ghost: String,
}

pub(crate) fn anchor_below(bounds: &Rect) -> Rect {
    Rect::new(bounds.x, bounds.bottom() + ANCHOR_GAP_PX, bounds.width, 0.0)
}

/// First line of the body, shortened with an ellipsis.
pub fn preview(body: &str) -> String {
    let line = body.lines().next().unwrap_or("");
    if char_len(line) > PREVIEW_CHARS {
        format!("{}…", char_prefix(line, PREVIEW_CHARS - 1))
    } else if line.len() < body.trim_end().len() {
        format!("{line}…")
    } else {
        line.to_string()
    }
}

pub(crate) fn build_overlay(
    geometry: &SurfaceGeometry,
    suggestions: &[Suggestion],
    selected: usize,
    minimized: bool,
) -> OverlayView {
    let content = if minimized {
        OverlayContent::Compact {
            count: suggestions.len(),
        }
    } else {
        OverlayContent::List {
            items: suggestions
                .iter()
                .map(|s| OverlayItem {
                    id: s.entry.id.clone(),
                    name: s.entry.name.clone(),
                    preview: preview(&s.entry.body),
                    score: s.score,
                })
                .collect(),
            selected,
        }
    };
    OverlayView {
        anchor: anchor_below(&geometry.bounds),
        content,
    }
}

/// Untyped remainder of `body` after `query`, if the body starts with the
/// query (case-insensitively) and there is anything left to show.
pub(crate) fn ghost_remainder<'a>(body: &'a str, query: &str) -> Option<&'a str> {
    if query.is_empty() {
        return None;
    }
    strip_prefix_ci(body, query).filter(|rest| !rest.is_empty())
}

/// Ghost mirror for a completion, or `None` when it must not be shown:
/// the caret holds a selection, or the body does not continue the query.
pub(crate) fn build_ghost(
    geometry: &SurfaceGeometry,
    text: &str,
    caret: CaretRange,
    query: &str,
    body: &str,
) -> Option<GhostView> {
    if !caret.is_collapsed() {
        return None;
    }
    let rest = ghost_remainder(body, query)?;
    Some(GhostView {
        frame: geometry.bounds.inset(&geometry.border),
        padding: geometry.padding,
        font: geometry.font.clone(),
        text_align: geometry.text_align,
        scroll_left: geometry.scroll_left,
        scroll_top: geometry.scroll_top,
        white_space: if geometry.multiline {
            WhiteSpace::PreWrap
        } else {
            WhiteSpace::Pre
        },
        lead: char_prefix(text, caret.end).to_string(),
        ghost: rest.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> SurfaceGeometry {
        SurfaceGeometry {
            bounds: Rect::new(10.0, 20.0, 300.0, 32.0),
            border: Edges::uniform(1.0),
            padding: Edges::uniform(4.0),
            scroll_left: 12.0,
            text_align: TextAlign::Right,
            ..SurfaceGeometry::default()
        }
    }

    #[test]
    fn anchor_sits_below_bounds() {
        let a = anchor_below(&geometry().bounds);
        assert_eq!(a.x, 10.0);
        assert_eq!(a.y, 52.0 + ANCHOR_GAP_PX);
        assert_eq!(a.width, 300.0);
    }

    #[test]
    fn preview_uses_first_line() {
        assert_eq!(preview("Best,\nA"), "Best,…");
        assert_eq!(preview("short"), "short");
        let long = "x".repeat(80);
        assert_eq!(char_len(&preview(&long)), PREVIEW_CHARS);
    }

    #[test]
    fn ghost_mirrors_geometry() {
        let g = build_ghost(
            &geometry(),
            "hello thx",
            CaretRange::collapsed(9),
            "thx",
            "THX for your help",
        )
        .unwrap();
        assert_eq!(g.ghost, " for your help");
        assert_eq!(g.lead, "hello thx");
        assert_eq!(g.frame, Rect::new(11.0, 21.0, 298.0, 30.0));
        assert_eq!(g.scroll_left, 12.0);
        assert_eq!(g.text_align, TextAlign::Right);
        assert_eq!(g.white_space, WhiteSpace::Pre);
    }

    #[test]
    fn ghost_hidden_with_selection_or_mismatch() {
        let geo = geometry();
        assert!(build_ghost(&geo, "thx", CaretRange::new(0, 3), "thx", "thx a lot").is_none());
        assert!(build_ghost(&geo, "si", CaretRange::collapsed(2), "si", "Best,\nA").is_none());
        assert!(build_ghost(&geo, "thx", CaretRange::collapsed(3), "thx", "thx").is_none());
    }
}
