//! Navbar chrome derived from the same scroll snapshots as the tracker.

use scrollspy_protocol::ScrollState;

/// Whether the navbar should use its scrolled (opaque) style.
pub fn is_scrolled(scroll: &ScrollState, threshold: f64) -> bool {
    scroll.clamped().scroll_y > threshold
}

/// Fraction of the scrollable range already scrolled, in `0.0..=1.0`.
///
/// A page that does not scroll reports `0.0`.
pub fn scroll_progress(scroll: &ScrollState) -> f64 {
    let scroll = scroll.clamped();
    let max = scroll.max_scroll();
    if max <= 0.0 {
        return 0.0;
    }
    (scroll.scroll_y / max).clamp(0.0, 1.0)
}
