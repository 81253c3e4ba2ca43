use macro_core::text::{char_len, char_prefix, char_suffix};
use macro_core::SurfaceDescriptor;

use super::{CaretRange, EditableSurface, InsertError, SurfaceGeometry};

/// Single-line input or textarea: one string value plus a selection.
pub struct PlainField {
    descriptor: SurfaceDescriptor,
    geometry: SurfaceGeometry,
    value: String,
    selection: Option<CaretRange>,
    notifications: u32,
}

impl PlainField {
    pub fn new(descriptor: SurfaceDescriptor) -> Self {
        let multiline = descriptor.element == macro_core::field::ElementKind::TextArea;
        Self {
            descriptor,
            geometry: SurfaceGeometry {
                multiline,
                ..SurfaceGeometry::default()
            },
            value: String::new(),
            selection: Some(CaretRange::collapsed(0)),
            notifications: 0,
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    pub fn with_geometry(mut self, geometry: SurfaceGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn selection(&self) -> Option<CaretRange> {
        self.selection
    }

    /// Number of synthetic change notifications dispatched so far.
    pub fn notifications(&self) -> u32 {
        self.notifications
    }

    /// Assign the whole value the way a script or autofill would.
    /// The caret moves to the end.
    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.selection = Some(CaretRange::collapsed(char_len(value)));
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        let len = char_len(&self.value);
        self.selection = Some(CaretRange::new(start.min(len), end.min(len)));
    }

    /// Drop the caret entirely (element lost its selection state).
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn set_geometry(&mut self, geometry: SurfaceGeometry) {
        self.geometry = geometry;
    }

    /// Typed text replaces the selection.
    pub fn type_text(&mut self, text: &str) {
        let range = self.selection.unwrap_or(CaretRange::collapsed(char_len(&self.value)));
        self.replace(range, text);
    }

    /// Backspace: delete the selection, or the character before the caret.
    pub fn backspace(&mut self) {
        let Some(range) = self.selection else {
            return;
        };
        let range = if range.is_collapsed() {
            CaretRange::new(range.start.saturating_sub(1), range.end)
        } else {
            range
        };
        self.replace(range, "");
    }

    fn replace(&mut self, range: CaretRange, text: &str) {
        let mut next = String::with_capacity(self.value.len() + text.len());
        next.push_str(char_prefix(&self.value, range.start));
        next.push_str(text);
        next.push_str(char_suffix(&self.value, range.end));
        self.value = next;
        self.selection = Some(CaretRange::collapsed(range.start + char_len(text)));
    }
}

impl EditableSurface for PlainField {
    fn descriptor(&self) -> &SurfaceDescriptor {
        &self.descriptor
    }

    fn geometry(&self) -> SurfaceGeometry {
        self.geometry.clone()
    }

    fn text(&self) -> String {
        self.value.clone()
    }

    fn caret_offsets(&self) -> Option<CaretRange> {
        self.selection
    }

    fn text_before(&self, offset: usize) -> String {
        char_prefix(&self.value, offset).to_string()
    }

    fn splice_text(&mut self, range: CaretRange, text: &str) -> Result<(), InsertError> {
        let len = char_len(&self.value);
        if range.start > range.end || range.end > len {
            return Err(InsertError::InvalidRange {
                start: range.start,
                end: range.end,
                len,
            });
        }
        self.replace(range, text);
        Ok(())
    }

    fn notify_changed(&mut self) {
        // Stands in for dispatching `input` + `change` on the element.
        self.notifications += 1;
    }
}
