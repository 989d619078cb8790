use serde::{Deserialize, Serialize};

use crate::section_id::SectionId;

/// A single change the rendering layer has to apply to the page chrome.
///
/// The core emits a `Vec<NavUpdate>` per event containing only what changed.
/// Renderers consume the list in order; each update carries all the data it
/// needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavUpdate {
    /// Highlight the nav link of `id` and clear the previous highlight.
    SetActive { id: SectionId },

    /// Switch the navbar between its transparent and scrolled style.
    SetScrolled { scrolled: bool },

    /// Move the reading-progress bar to `progress` (`0.0..=1.0`).
    SetProgress { progress: f64 },
}
