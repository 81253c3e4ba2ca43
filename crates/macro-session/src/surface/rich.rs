use macro_core::text::{char_len, char_prefix, char_suffix};
use macro_core::SurfaceDescriptor;

use super::{CaretRange, EditableSurface, InsertError, SurfaceGeometry};

/// Point inside a rich-text region: a text run and a character offset in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RichPosition {
    pub run: usize,
    pub offset: usize,
}

/// Content-editable region modelled as an ordered list of text runs
/// (text nodes) with a DOM-style selection of two positions.
pub struct RichTextRegion {
    descriptor: SurfaceDescriptor,
    geometry: SurfaceGeometry,
    runs: Vec<String>,
    selection: Option<(RichPosition, RichPosition)>,
    notifications: u32,
}

impl RichTextRegion {
    pub fn new(descriptor: SurfaceDescriptor) -> Self {
        Self {
            descriptor,
            geometry: SurfaceGeometry {
                multiline: true,
                ..SurfaceGeometry::default()
            },
            runs: vec![String::new()],
            selection: Some((
                RichPosition { run: 0, offset: 0 },
                RichPosition { run: 0, offset: 0 },
            )),
            notifications: 0,
        }
    }

    /// Replace the content with `runs` and put the caret at the very end.
    pub fn with_runs<S: Into<String>>(mut self, runs: impl IntoIterator<Item = S>) -> Self {
        self.runs = runs.into_iter().map(Into::into).collect();
        if self.runs.is_empty() {
            self.runs.push(String::new());
        }
        let last = self.runs.len() - 1;
        let end = RichPosition {
            run: last,
            offset: char_len(&self.runs[last]),
        };
        self.selection = Some((end, end));
        self
    }

    pub fn with_geometry(mut self, geometry: SurfaceGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn runs(&self) -> &[String] {
        &self.runs
    }

    pub fn notifications(&self) -> u32 {
        self.notifications
    }

    pub fn selection(&self) -> Option<(RichPosition, RichPosition)> {
        self.selection
    }

    pub fn set_caret(&mut self, pos: RichPosition) {
        let pos = self.clamp(pos);
        self.selection = Some((pos, pos));
    }

    pub fn set_selection(&mut self, anchor: RichPosition, focus: RichPosition) {
        self.selection = Some((self.clamp(anchor), self.clamp(focus)));
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn set_geometry(&mut self, geometry: SurfaceGeometry) {
        self.geometry = geometry;
    }

    /// Typed text goes into the caret's run.
    pub fn type_text(&mut self, text: &str) {
        if let Some(range) = self.caret_offsets() {
            // Typing extends the current run rather than creating a node.
            let start = match self.ordered_selection() {
                Some((a, _)) if range.is_collapsed() => a,
                _ => self.delete_range(range),
            };
            let run = &mut self.runs[start.run];
            let byte = macro_core::text::byte_index(run, start.offset);
            run.insert_str(byte, text);
            let pos = RichPosition {
                run: start.run,
                offset: start.offset + char_len(text),
            };
            self.selection = Some((pos, pos));
        }
    }

    fn clamp(&self, pos: RichPosition) -> RichPosition {
        let run = pos.run.min(self.runs.len() - 1);
        RichPosition {
            run,
            offset: pos.offset.min(char_len(&self.runs[run])),
        }
    }

    fn global(&self, pos: RichPosition) -> usize {
        self.runs[..pos.run].iter().map(|r| char_len(r)).sum::<usize>() + pos.offset
    }

    fn ordered_selection(&self) -> Option<(RichPosition, RichPosition)> {
        let (a, b) = self.selection?;
        if self.global(a) <= self.global(b) {
            Some((a, b))
        } else {
            Some((b, a))
        }
    }

    /// Run holding a global offset. Boundary offsets belong to the earlier run.
    fn locate(&self, offset: usize) -> RichPosition {
        let mut base = 0;
        for (i, run) in self.runs.iter().enumerate() {
            let len = char_len(run);
            if offset <= base + len {
                return RichPosition {
                    run: i,
                    offset: offset - base,
                };
            }
            base += len;
        }
        let last = self.runs.len() - 1;
        RichPosition {
            run: last,
            offset: char_len(&self.runs[last]),
        }
    }

    fn total_len(&self) -> usize {
        self.runs.iter().map(|r| char_len(r)).sum()
    }

    fn delete_range(&mut self, range: CaretRange) -> RichPosition {
        let start = self.locate(range.start);
        let end = self.locate(range.end);
        if start.run == end.run {
            let run = &self.runs[start.run];
            self.runs[start.run] = format!(
                "{}{}",
                char_prefix(run, start.offset),
                char_suffix(run, end.offset)
            );
        } else {
            let head = char_prefix(&self.runs[start.run], start.offset).to_string();
            let tail = char_suffix(&self.runs[end.run], end.offset).to_string();
            self.runs[start.run] = head;
            self.runs[end.run] = tail;
            self.runs.drain(start.run + 1..end.run);
        }
        start
    }
}

impl EditableSurface for RichTextRegion {
    fn descriptor(&self) -> &SurfaceDescriptor {
        &self.descriptor
    }

    fn geometry(&self) -> SurfaceGeometry {
        self.geometry.clone()
    }

    fn text(&self) -> String {
        self.runs.concat()
    }

    fn caret_offsets(&self) -> Option<CaretRange> {
        let (a, b) = self.ordered_selection()?;
        Some(CaretRange::new(self.global(a), self.global(b)))
    }

    fn text_before(&self, offset: usize) -> String {
        // Prefer the run the caret actually sits in when asked about the caret.
        let pos = match self.selection {
            Some((_, focus)) if self.global(focus) == offset => focus,
            _ => self.locate(offset),
        };
        char_prefix(&self.runs[pos.run], pos.offset).to_string()
    }

    /// Rich text retracts the range start by the query length, without
    /// re-checking the characters.
    fn query_range(&self, caret: CaretRange, query: &str) -> CaretRange {
        CaretRange::new(caret.start.saturating_sub(char_len(query)), caret.end)
    }

    fn splice_text(&mut self, range: CaretRange, text: &str) -> Result<(), InsertError> {
        let len = self.total_len();
        if range.start > range.end || range.end > len {
            return Err(InsertError::InvalidRange {
                start: range.start,
                end: range.end,
                len,
            });
        }
        let at = self.delete_range(range);

        // Split the run at the insertion point and put the new text node between.
        let run = std::mem::take(&mut self.runs[at.run]);
        let left = char_prefix(&run, at.offset).to_string();
        let right = char_suffix(&run, at.offset).to_string();
        let mut replacement = Vec::with_capacity(3);
        if !left.is_empty() {
            replacement.push(left);
        }
        let inserted = at.run + replacement.len();
        replacement.push(text.to_string());
        if !right.is_empty() {
            replacement.push(right);
        }
        self.runs.splice(at.run..=at.run, replacement);

        let caret = RichPosition {
            run: inserted,
            offset: char_len(text),
        };
        self.selection = Some((caret, caret));
        Ok(())
    }

    fn notify_changed(&mut self) {
        // Stands in for dispatching `input` on the region.
        self.notifications += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(runs: &[&str]) -> RichTextRegion {
        RichTextRegion::new(SurfaceDescriptor::content_editable()).with_runs(runs.iter().copied())
    }

    #[test]
    fn caret_offsets_are_global() {
        let mut r = region(&["Hello ", "wor"]);
        assert_eq!(r.caret_offsets(), Some(CaretRange::collapsed(9)));
        r.set_caret(RichPosition { run: 1, offset: 1 });
        assert_eq!(r.caret_offsets(), Some(CaretRange::collapsed(7)));
        r.set_selection(
            RichPosition { run: 1, offset: 2 },
            RichPosition { run: 0, offset: 1 },
        );
        assert_eq!(r.caret_offsets(), Some(CaretRange::new(1, 8)));
    }

    #[test]
    fn text_before_stays_in_caret_run() {
        let mut r = region(&["Dear team, ", "si"]);
        assert_eq!(r.text_before(13), "si");
        r.set_caret(RichPosition { run: 1, offset: 0 });
        // Caret at the start of the second run: nothing before it in that node.
        assert_eq!(r.text_before(11), "");
    }

    #[test]
    fn splice_inserts_text_node_and_collapses_after() {
        let mut r = region(&["Hi si"]);
        let caret = r.caret_offsets().unwrap();
        let range = r.query_range(caret, "si");
        assert_eq!(range, CaretRange::new(3, 5));
        r.splice_text(range, "Best,\nA").unwrap();
        assert_eq!(r.text(), "Hi Best,\nA");
        assert_eq!(r.runs(), ["Hi ", "Best,\nA"]);
        assert_eq!(r.caret_offsets(), Some(CaretRange::collapsed(10)));
    }

    #[test]
    fn splice_across_runs() {
        let mut r = region(&["ab", "cd", "ef"]);
        r.splice_text(CaretRange::new(1, 5), "X").unwrap();
        assert_eq!(r.text(), "aXf");
        assert_eq!(r.caret_offsets(), Some(CaretRange::collapsed(2)));
    }

    #[test]
    fn splice_in_the_middle_keeps_right_part() {
        let mut r = region(&["abcd"]);
        r.splice_text(CaretRange::collapsed(2), "--").unwrap();
        assert_eq!(r.runs(), ["ab", "--", "cd"]);
    }

    #[test]
    fn typing_extends_current_run() {
        let mut r = region(&["one ", "tw"]);
        r.type_text("o");
        assert_eq!(r.runs(), ["one ", "two"]);
        assert_eq!(r.text_before(7), "two");
    }
}
