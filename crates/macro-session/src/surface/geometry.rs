//! Layout facts the host reports for a surface, in CSS pixels.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Shrink by `edges` on every side, never below zero size.
    pub fn inset(&self, edges: &Edges) -> Rect {
        Rect {
            x: self.x + edges.left,
            y: self.y + edges.top,
            width: (self.width - edges.left - edges.right).max(0.0),
            height: (self.height - edges.top - edges.bottom).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub fn uniform(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    pub family: String,
    pub size_px: f32,
    pub line_height_px: f32,
    pub weight: u16,
    pub letter_spacing_px: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size_px: 14.0,
            line_height_px: 20.0,
            weight: 400,
            letter_spacing_px: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Start,
    Left,
    Center,
    Right,
    End,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceGeometry {
    /// Border box in viewport coordinates.
    pub bounds: Rect,
    pub border: Edges,
    pub padding: Edges,
    pub font: FontMetrics,
    pub scroll_left: f32,
    pub scroll_top: f32,
    pub text_align: TextAlign,
    /// Wraps lines (textarea, rich text) rather than scrolling one line.
    pub multiline: bool,
}
