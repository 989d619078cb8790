use serde::{Deserialize, Serialize};

use crate::section_id::SectionId;

/// One navigable region of the page, as measured by the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    /// Text shown on the navigation link.
    pub label: String,
    /// Distance in pixels from the document top to the section's top edge.
    pub offset_top: f64,
    /// Vertical extent in pixels.
    pub offset_height: f64,
}

impl Section {
    pub fn new(
        id: impl Into<SectionId>,
        label: impl Into<String>,
        offset_top: f64,
        offset_height: f64,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            offset_top,
            offset_height,
        }
    }

    /// Bottom edge (exclusive).
    pub fn offset_bottom(&self) -> f64 {
        self.offset_top + self.offset_height
    }

    /// Whether `y` lies in `[offset_top, offset_top + offset_height)`.
    pub fn contains(&self, y: f64) -> bool {
        self.offset_top <= y && y < self.offset_bottom()
    }
}

/// Snapshot of the viewport, produced on every scroll or resize event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollState {
    /// Current vertical scroll offset.
    pub scroll_y: f64,
    /// Height of the visible viewport.
    pub viewport_height: f64,
    /// Total scrollable height of the document.
    pub document_height: f64,
}

impl ScrollState {
    pub fn new(scroll_y: f64, viewport_height: f64, document_height: f64) -> Self {
        Self {
            scroll_y,
            viewport_height,
            document_height,
        }
    }

    /// Bring out-of-range values back into the documented domain.
    ///
    /// Negative or non-finite offsets and heights become zero, and a
    /// document shorter than the viewport is stretched to the viewport.
    pub fn clamped(&self) -> Self {
        let scroll_y = non_negative(self.scroll_y);
        let viewport_height = non_negative(self.viewport_height);
        let document_height = non_negative(self.document_height).max(viewport_height);
        Self {
            scroll_y,
            viewport_height,
            document_height,
        }
    }

    /// Largest reachable `scroll_y`. Zero when the page does not scroll.
    pub fn max_scroll(&self) -> f64 {
        (self.document_height - self.viewport_height).max(0.0)
    }

    /// Bottom edge of the viewport in document coordinates.
    pub fn viewport_bottom(&self) -> f64 {
        self.scroll_y + self.viewport_height
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}
