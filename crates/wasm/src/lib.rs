mod dom;

use scrollspy_core::{ConfigError, PageLayout, ScrollEvent, ScrollSpy, TrackerConfig};
use scrollspy_protocol::{NavUpdate, ScrollState, Section, SectionId};
use thiserror::Error;
use wasm_bindgen::prelude::*;

pub use dom::{ScrollSpyBinding, attach};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("layout: {0}")]
    Layout(#[from] ConfigError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no window or document available")]
    NoDocument,
    #[error("browser rejected {what}")]
    Dom { what: &'static str },
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Stateless entry point: the active section id for one scroll snapshot.
///
/// `scroll_json` is a `ScrollState`, `sections_json` an array of `Section`,
/// `config_json` an optional (partial) `TrackerConfig`.
#[wasm_bindgen]
pub fn compute_active_json(
    scroll_json: &str,
    sections_json: &str,
    previous: Option<String>,
    config_json: Option<String>,
) -> Result<String, JsError> {
    Ok(compute_active_str(
        scroll_json,
        sections_json,
        previous.as_deref(),
        config_json.as_deref(),
    )?)
}

fn compute_active_str(
    scroll_json: &str,
    sections_json: &str,
    previous: Option<&str>,
    config_json: Option<&str>,
) -> Result<String, BridgeError> {
    let scroll: ScrollState = serde_json::from_str(scroll_json)?;
    let sections: Vec<Section> = serde_json::from_str(sections_json)?;
    let config = match config_json {
        Some(json) => {
            let config: TrackerConfig = serde_json::from_str(json)?;
            config.validate()?;
            config
        }
        None => TrackerConfig::default(),
    };
    let previous = previous.map(SectionId::from);
    let active = scrollspy_core::compute_active(&scroll, &sections, previous.as_ref(), &config);
    Ok(active.to_string())
}

/// Scroll spy driven by the host page's own event handlers.
///
/// Every method taking an event returns the resulting `NavUpdate` list as
/// JSON; an empty array means nothing changed.
#[wasm_bindgen]
pub struct WasmScrollSpy {
    spy: ScrollSpy,
}

#[wasm_bindgen]
impl WasmScrollSpy {
    #[wasm_bindgen(constructor)]
    pub fn new(layout_json: &str) -> Result<WasmScrollSpy, JsError> {
        Ok(Self::from_json(layout_json)?)
    }

    pub fn on_scroll(
        &mut self,
        scroll_y: f64,
        viewport_height: f64,
        document_height: f64,
    ) -> Result<String, JsError> {
        let scroll = ScrollState::new(scroll_y, viewport_height, document_height);
        Ok(self.apply(ScrollEvent::Scroll(scroll))?)
    }

    pub fn on_resize(
        &mut self,
        scroll_y: f64,
        viewport_height: f64,
        document_height: f64,
    ) -> Result<String, JsError> {
        let scroll = ScrollState::new(scroll_y, viewport_height, document_height);
        Ok(self.apply(ScrollEvent::Resize(scroll))?)
    }

    /// Replace the measured sections (JSON array of `Section`).
    pub fn relayout(
        &mut self,
        sections_json: &str,
        scroll_y: f64,
        viewport_height: f64,
        document_height: f64,
    ) -> Result<String, JsError> {
        Ok(self.relayout_str(
            sections_json,
            ScrollState::new(scroll_y, viewport_height, document_height),
        )?)
    }

    /// Advance the progress bar animation by `dt` seconds.
    pub fn tick(&mut self, dt: f64) -> Result<String, JsError> {
        Ok(self.apply(ScrollEvent::Tick { dt })?)
    }

    pub fn active(&self) -> String {
        self.spy.active().to_string()
    }

    pub fn is_animating(&self) -> bool {
        self.spy.is_animating()
    }

    /// Full current state, for the first paint.
    pub fn snapshot(&self) -> Result<String, JsError> {
        Ok(updates_json(&self.spy.snapshot())?)
    }

    /// Layout problems as a JSON array of messages; `[]` for a clean layout.
    pub fn issues(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&issue_messages(&self.spy))?)
    }
}

impl WasmScrollSpy {
    fn from_json(layout_json: &str) -> Result<Self, BridgeError> {
        let layout = PageLayout::from_json(layout_json.as_bytes())?;
        Ok(Self {
            spy: ScrollSpy::from_layout(layout),
        })
    }

    fn apply(&mut self, event: ScrollEvent) -> Result<String, BridgeError> {
        updates_json(&self.spy.handle(event))
    }

    fn relayout_str(&mut self, sections_json: &str, scroll: ScrollState) -> Result<String, BridgeError> {
        let sections: Vec<Section> = serde_json::from_str(sections_json)?;
        self.apply(ScrollEvent::Relayout { sections, scroll })
    }
}

fn updates_json(updates: &[NavUpdate]) -> Result<String, BridgeError> {
    Ok(serde_json::to_string(updates)?)
}

/// The browser has no tracing subscriber, so layout issues travel as text.
fn issue_messages(spy: &ScrollSpy) -> Vec<String> {
    spy.layout_issues()
        .iter()
        .map(|issue| format!("scrollspy: {issue}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTIONS: &str = r#"[
        {"id": "a", "label": "A", "offset_top": 0, "offset_height": 500},
        {"id": "b", "label": "B", "offset_top": 800, "offset_height": 500}
    ]"#;

    #[test]
    fn stateless_gap_keeps_previous() {
        // probe = 550 + 300 / 3 = 650, inside the gap.
        let scroll = r#"{"scroll_y": 550, "viewport_height": 300, "document_height": 5000}"#;
        let active = compute_active_str(scroll, SECTIONS, Some("b"), None);
        assert_eq!(active.ok().as_deref(), Some("b"));
    }

    #[test]
    fn stateless_respects_config() {
        let scroll = r#"{"scroll_y": 0, "viewport_height": 900, "document_height": 5000}"#;
        // A probe at the very top of the viewport lands in "a".
        let config = r#"{"probe_fraction": 0.0, "fallback_id": "b"}"#;
        let active = compute_active_str(scroll, SECTIONS, None, Some(config));
        assert_eq!(active.ok().as_deref(), Some("a"));
    }

    #[test]
    fn stateless_rejects_bad_config() {
        let scroll = r#"{"scroll_y": 0, "viewport_height": 900, "document_height": 5000}"#;
        let result = compute_active_str(scroll, SECTIONS, None, Some(r#"{"bottom_slack": -1}"#));
        assert!(matches!(result, Err(BridgeError::Layout(_))));
    }

    #[test]
    fn spy_emits_json_updates() {
        let layout = serde_json::to_string(&PageLayout::portfolio()).unwrap_or_default();
        let mut spy = match WasmScrollSpy::from_json(&layout) {
            Ok(spy) => spy,
            Err(e) => unreachable!("portfolio layout rejected: {e}"),
        };
        let json = spy
            .apply(ScrollEvent::Scroll(ScrollState::new(620.0, 900.0, 3600.0)))
            .unwrap_or_default();
        assert_eq!(
            json,
            r#"[{"type":"set_active","id":"about"},{"type":"set_scrolled","scrolled":true}]"#
        );
        assert_eq!(spy.active(), "about");
    }

    #[test]
    fn relayout_accepts_section_json() {
        let layout = r#"{"sections": []}"#;
        let Ok(mut spy) = WasmScrollSpy::from_json(layout) else {
            unreachable!("empty layout rejected");
        };
        assert_eq!(spy.active(), SectionId::NONE);
        let json = spy
            .relayout_str(SECTIONS, ScrollState::new(0.0, 300.0, 5000.0))
            .unwrap_or_default();
        assert_eq!(json, r#"[{"type":"set_active","id":"a"}]"#);
    }

    #[test]
    fn layout_issues_become_messages() {
        let layout = r#"{
            "sections": [
                {"id": "a", "label": "A", "offset_top": 0, "offset_height": 500},
                {"id": "a", "label": "A", "offset_top": 500, "offset_height": 500}
            ]
        }"#;
        let Ok(spy) = WasmScrollSpy::from_json(layout) else {
            unreachable!("layout rejected");
        };
        assert_eq!(
            issue_messages(&spy.spy),
            ["scrollspy: section id 'a' is registered more than once"]
        );

        let clean = serde_json::to_string(&PageLayout::portfolio()).unwrap_or_default();
        let Ok(spy) = WasmScrollSpy::from_json(&clean) else {
            unreachable!("portfolio layout rejected");
        };
        assert!(issue_messages(&spy.spy).is_empty());
    }
}
