use scrollspy_protocol::{ScrollState, Section, SectionId};
use tracing::debug;

use crate::config::TrackerConfig;
use crate::registry::SectionRegistry;

/// Vertical coordinate tested against section bounds.
///
/// Sits a fraction of the viewport below the top edge so a section becomes
/// active once it has scrolled well into view, not when its top touches the
/// viewport edge.
pub fn probe_point(scroll: &ScrollState, config: &TrackerConfig) -> f64 {
    scroll.scroll_y + scroll.viewport_height * config.probe_fraction
}

/// Whether the viewport bottom is within `bottom_slack` of the document end.
pub fn is_at_bottom(scroll: &ScrollState, config: &TrackerConfig) -> bool {
    scroll.viewport_bottom() >= scroll.document_height - config.bottom_slack
}

/// Section forced active at the bottom of the page.
///
/// The configured terminal when it is registered, otherwise the last section.
pub fn terminal_id(sections: &[Section], config: &TrackerConfig) -> Option<SectionId> {
    config
        .terminal_id
        .as_ref()
        .filter(|id| sections.iter().any(|s| s.id == **id))
        .cloned()
        .or_else(|| sections.last().map(|s| s.id.clone()))
}

/// Section reported before anything matched.
///
/// The configured fallback, else the first section, else [`SectionId::NONE`].
pub fn fallback_id(sections: &[Section], config: &TrackerConfig) -> SectionId {
    config
        .fallback_id
        .clone()
        .or_else(|| sections.first().map(|s| s.id.clone()))
        .unwrap_or_else(SectionId::none)
}

/// First section in list order whose half-open extent contains `y`.
pub fn section_at(sections: &[Section], y: f64) -> Option<&Section> {
    sections.iter().find(|s| s.contains(y))
}

/// Pick the single active section for a scroll snapshot.
///
/// Rules, in order:
/// 1. No sections: the fallback id.
/// 2. Viewport bottom within `bottom_slack` of the document end: the terminal
///    section, wherever the probe point falls.
/// 3. The first section in list order whose `[offset_top, offset_top +
///    offset_height)` contains the probe point. List order breaks ties
///    between overlapping sections.
/// 4. Probe point in a gap: `previous`, when it is registered or is the
///    fallback; otherwise the fallback.
///
/// Inputs are clamped with [`ScrollState::clamped`] first. The function is
/// pure and total: the result is always a registered id or the fallback id.
pub fn compute_active(
    scroll: &ScrollState,
    sections: &[Section],
    previous: Option<&SectionId>,
    config: &TrackerConfig,
) -> SectionId {
    let fallback = fallback_id(sections, config);
    if sections.is_empty() {
        return fallback;
    }

    let scroll = scroll.clamped();
    if is_at_bottom(&scroll, config)
        && let Some(terminal) = terminal_id(sections, config)
    {
        return terminal;
    }

    let probe = probe_point(&scroll, config);
    if let Some(section) = section_at(sections, probe) {
        return section.id.clone();
    }

    match previous {
        Some(prev) if *prev == fallback || sections.iter().any(|s| s.id == *prev) => prev.clone(),
        _ => fallback,
    }
}

/// Owns the registered sections and the currently active id.
///
/// The only mutable state is `active`; every recomputation goes through
/// [`compute_active`].
#[derive(Debug, Clone)]
pub struct ActiveSectionTracker {
    registry: SectionRegistry,
    config: TrackerConfig,
    active: SectionId,
}

impl ActiveSectionTracker {
    pub fn new(registry: SectionRegistry, config: TrackerConfig) -> Self {
        registry.log_issues(&config);
        let active = registry.fallback_id(&config);
        Self {
            registry,
            config,
            active,
        }
    }

    pub fn active(&self) -> &SectionId {
        &self.active
    }

    pub fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// What [`update`](Self::update) would select, without committing it.
    pub fn peek(&self, scroll: &ScrollState) -> SectionId {
        compute_active(
            scroll,
            self.registry.sections(),
            Some(&self.active),
            &self.config,
        )
    }

    /// Recompute for a new snapshot. Returns the new id only when it changed.
    pub fn update(&mut self, scroll: &ScrollState) -> Option<SectionId> {
        let next = self.peek(scroll);
        if next == self.active {
            return None;
        }
        debug!(from = %self.active, to = %next, scroll_y = scroll.scroll_y, "active section changed");
        self.active = next.clone();
        Some(next)
    }

    /// Replace the measured sections after a layout change.
    ///
    /// The current id survives when it is still registered; otherwise the
    /// tracker falls back. Returns the new id when that changed it.
    pub fn relayout(&mut self, registry: SectionRegistry) -> Option<SectionId> {
        registry.log_issues(&self.config);
        self.registry = registry;
        let fallback = self.registry.fallback_id(&self.config);
        if self.active == fallback || self.registry.contains(self.active.as_str()) {
            return None;
        }
        debug!(from = %self.active, to = %fallback, "active section dropped by relayout");
        self.active = fallback.clone();
        Some(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(spec: &[(&str, f64, f64)]) -> Vec<Section> {
        spec.iter()
            .map(|&(id, top, height)| Section::new(id, id.to_uppercase(), top, height))
            .collect()
    }

    /// Scroll state whose probe point lands exactly on `probe` with the
    /// default 1/3 fraction, far from the document bottom.
    fn probing(probe: f64) -> ScrollState {
        let viewport = 300.0;
        ScrollState::new(probe - viewport / 3.0, viewport, 100_000.0)
    }

    #[test]
    fn bottom_of_page_selects_terminal() {
        let config = TrackerConfig {
            terminal_id: Some("contact".into()),
            ..TrackerConfig::default()
        };
        let list = sections(&[
            ("home", 0.0, 800.0),
            ("about", 800.0, 900.0),
            ("contact", 1700.0, 100.0),
        ]);
        let scroll = ScrollState::new(1160.0, 800.0, 2000.0);
        // Probe point 1426.7 sits inside "about", the bottom rule still wins.
        assert_eq!(compute_active(&scroll, &list, None, &config), "contact");
    }

    #[test]
    fn bottom_of_page_defaults_to_last_section() {
        let list = sections(&[("a", 0.0, 1000.0), ("b", 1000.0, 1000.0)]);
        let scroll = ScrollState::new(1160.0, 800.0, 2000.0);
        assert_eq!(
            compute_active(&scroll, &list, None, &TrackerConfig::default()),
            "b"
        );
    }

    #[test]
    fn unregistered_terminal_falls_back_to_last_section() {
        let config = TrackerConfig {
            terminal_id: Some("footer".into()),
            ..TrackerConfig::default()
        };
        let list = sections(&[("a", 0.0, 1000.0), ("b", 1000.0, 1000.0)]);
        let scroll = ScrollState::new(1200.0, 800.0, 2000.0);
        assert_eq!(compute_active(&scroll, &list, None, &config), "b");
    }

    #[test]
    fn gap_keeps_previous() {
        let list = sections(&[("a", 0.0, 500.0), ("b", 800.0, 500.0)]);
        let config = TrackerConfig::default();
        let scroll = probing(650.0);
        assert!((probe_point(&scroll, &config) - 650.0).abs() < 1e-9);

        let prev_a = SectionId::from("a");
        let prev_b = SectionId::from("b");
        assert_eq!(compute_active(&scroll, &list, Some(&prev_a), &config), "a");
        assert_eq!(compute_active(&scroll, &list, Some(&prev_b), &config), "b");
    }

    #[test]
    fn gap_without_previous_uses_fallback() {
        let list = sections(&[("a", 0.0, 500.0), ("b", 800.0, 500.0)]);
        let config = TrackerConfig::default();
        assert_eq!(compute_active(&probing(650.0), &list, None, &config), "a");

        let stale = SectionId::from("removed");
        assert_eq!(
            compute_active(&probing(650.0), &list, Some(&stale), &config),
            "a"
        );
    }

    #[test]
    fn lower_bound_inclusive_upper_bound_exclusive() {
        let list = sections(&[("x", 100.0, 200.0), ("y", 300.0, 200.0)]);
        let config = TrackerConfig::default();
        assert_eq!(compute_active(&probing(100.0), &list, None, &config), "x");
        assert_eq!(compute_active(&probing(300.0), &list, None, &config), "y");
    }

    #[test]
    fn overlap_first_in_list_wins() {
        let config = TrackerConfig::default();
        let list = sections(&[("late", 200.0, 400.0), ("early", 0.0, 500.0)]);
        assert_eq!(compute_active(&probing(300.0), &list, None, &config), "late");

        let swapped = sections(&[("early", 0.0, 500.0), ("late", 200.0, 400.0)]);
        assert_eq!(
            compute_active(&probing(300.0), &swapped, None, &config),
            "early"
        );
    }

    #[test]
    fn empty_registry_returns_fallback() {
        let scroll = ScrollState::new(400.0, 800.0, 2000.0);
        assert_eq!(
            compute_active(&scroll, &[], None, &TrackerConfig::default()),
            SectionId::NONE
        );

        let config = TrackerConfig {
            fallback_id: Some("home".into()),
            ..TrackerConfig::default()
        };
        let prev = SectionId::from("about");
        assert_eq!(compute_active(&scroll, &[], Some(&prev), &config), "home");
    }

    #[test]
    fn clamps_instead_of_failing() {
        let list = sections(&[("a", 0.0, 500.0), ("b", 500.0, 5000.0)]);
        let config = TrackerConfig::default();
        // Negative scroll behaves like the top of the page.
        let negative = ScrollState::new(-300.0, 600.0, 5500.0);
        assert_eq!(compute_active(&negative, &list, None, &config), "a");
        // A document shorter than the viewport is at its bottom.
        let short = ScrollState::new(0.0, 600.0, 100.0);
        assert_eq!(compute_active(&short, &list, None, &config), "b");
    }

    #[test]
    fn idempotent_and_always_known() {
        let list = sections(&[
            ("home", 0.0, 900.0),
            ("about", 1000.0, 600.0),
            ("work", 1500.0, 1200.0),
            ("contact", 2800.0, 300.0),
        ]);
        let config = TrackerConfig::default();
        let mut previous: Option<SectionId> = None;
        let mut y = -100.0;
        while y < 3400.0 {
            let scroll = ScrollState::new(y, 700.0, 3100.0);
            let first = compute_active(&scroll, &list, previous.as_ref(), &config);
            let second = compute_active(&scroll, &list, previous.as_ref(), &config);
            assert_eq!(first, second);
            assert!(list.iter().any(|s| s.id == first));
            previous = Some(first);
            y += 17.0;
        }
    }

    #[test]
    fn tracker_reports_changes_once() {
        let list = sections(&[("a", 0.0, 500.0), ("b", 500.0, 500.0), ("c", 1000.0, 2000.0)]);
        let mut tracker =
            ActiveSectionTracker::new(SectionRegistry::new(list), TrackerConfig::default());
        assert_eq!(tracker.active(), "a");

        assert_eq!(tracker.update(&probing(100.0)), None);
        assert_eq!(tracker.update(&probing(600.0)), Some(SectionId::from("b")));
        assert_eq!(tracker.update(&probing(700.0)), None);
        assert_eq!(tracker.active(), "b");
    }

    #[test]
    fn section_at_prefers_list_order() {
        let list = sections(&[("wide", 0.0, 1000.0), ("inner", 200.0, 100.0)]);
        assert_eq!(section_at(&list, 250.0).map(|s| s.id.as_str()), Some("wide"));
        assert!(section_at(&list, 1000.0).is_none());
    }

    #[test]
    fn relayout_keeps_surviving_section() {
        let list = sections(&[("a", 0.0, 500.0), ("b", 500.0, 500.0)]);
        let mut tracker =
            ActiveSectionTracker::new(SectionRegistry::new(list), TrackerConfig::default());
        tracker.update(&probing(600.0));
        assert_eq!(tracker.active(), "b");

        let grown = sections(&[("a", 0.0, 800.0), ("b", 800.0, 500.0)]);
        assert_eq!(tracker.relayout(SectionRegistry::new(grown)), None);
        assert_eq!(tracker.active(), "b");

        let without_b = sections(&[("a", 0.0, 800.0), ("c", 800.0, 500.0)]);
        assert_eq!(
            tracker.relayout(SectionRegistry::new(without_b)),
            Some(SectionId::from("a"))
        );
    }
}
