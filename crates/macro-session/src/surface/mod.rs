//! Editable surfaces behind one capability interface.
//!
//! The engine never branches on what kind of element it is talking to; the
//! plain-field and rich-text adapters answer the same handful of questions
//! (where is the caret, what text precedes it, splice this range).

mod geometry;
mod plain;
mod rich;

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use macro_core::text::{char_len, ends_with_ci};
use macro_core::SurfaceDescriptor;

pub use geometry::{Edges, FontMetrics, Rect, SurfaceGeometry, TextAlign};
pub use plain::PlainField;
pub use rich::{RichPosition, RichTextRegion};

/// Selection in character offsets over `EditableSurface::text()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretRange {
    pub start: usize,
    pub end: usize,
}

impl CaretRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn collapsed(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InsertError {
    #[error("surface has no caret or selection")]
    NoCaret,
    #[error("range {start}..{end} is outside text of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },
}

pub trait EditableSurface {
    fn descriptor(&self) -> &SurfaceDescriptor;

    fn geometry(&self) -> SurfaceGeometry;

    /// Full text content.
    fn text(&self) -> String;

    /// Current selection, or `None` when the surface has no caret.
    fn caret_offsets(&self) -> Option<CaretRange>;

    /// Text of the editing unit containing `offset`, from the unit's start
    /// up to `offset`. For a plain field the unit is the whole value; for
    /// rich text it is the text run holding the caret.
    fn text_before(&self, offset: usize) -> String;

    /// Range a tab completion for `query` replaces, given the caret.
    /// Default: the query must be the case-insensitive trailing text before
    /// the caret, otherwise the completion lands at the caret.
    fn query_range(&self, caret: CaretRange, query: &str) -> CaretRange {
        let end = caret.end;
        if !query.is_empty() && ends_with_ci(&self.text_before(end), query) {
            CaretRange::new(end - char_len(query), end)
        } else {
            caret
        }
    }

    /// Replace `range` with `text` and collapse the caret after it.
    fn splice_text(&mut self, range: CaretRange, text: &str) -> Result<(), InsertError>;

    /// Tell host-page observers the content changed, as if typed.
    fn notify_changed(&mut self);
}

/// Shared reference to a host surface. The host keeps its own clone to keep
/// editing the element while the engine tracks it.
#[derive(Clone)]
pub struct SurfaceHandle(Rc<RefCell<dyn EditableSurface>>);

impl SurfaceHandle {
    pub fn new<S: EditableSurface + 'static>(surface: S) -> Self {
        Self(Rc::new(RefCell::new(surface)))
    }

    /// Reference equality: same underlying element.
    pub fn same_as(&self, other: &SurfaceHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn borrow(&self) -> Ref<'_, dyn EditableSurface> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, dyn EditableSurface> {
        self.0.borrow_mut()
    }
}

impl<S: EditableSurface + 'static> From<Rc<RefCell<S>>> for SurfaceHandle {
    fn from(rc: Rc<RefCell<S>>) -> Self {
        Self(rc)
    }
}

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SurfaceHandle")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}
