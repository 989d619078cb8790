use scrollspy_protocol::{NavUpdate, ScrollState, Section, SectionId};

use crate::chrome;
use crate::config::{PageLayout, SpringConfig, TrackerConfig};
use crate::registry::{LayoutIssue, SectionRegistry};
use crate::spring::ProgressSpring;
use crate::tracker::ActiveSectionTracker;

/// Input pushed by the host environment.
#[derive(Debug, Clone)]
pub enum ScrollEvent {
    Scroll(ScrollState),
    /// Viewport or document size changed.
    Resize(ScrollState),
    /// Sections were re-measured (async content, fonts, window resize).
    Relayout {
        sections: Vec<Section>,
        scroll: ScrollState,
    },
    /// Animation frame; `dt` in seconds since the previous one.
    Tick { dt: f64 },
}

/// Navigation state of one page view.
///
/// Feeds every event through the active-section tracker, the navbar
/// threshold, and the progress spring, and reports only what changed.
#[derive(Debug, Clone)]
pub struct ScrollSpy {
    tracker: ActiveSectionTracker,
    spring: ProgressSpring,
    scrolled: bool,
    /// Last progress handed to the renderer.
    reported_progress: f64,
}

impl ScrollSpy {
    pub fn new(registry: SectionRegistry, tracker: TrackerConfig, spring: SpringConfig) -> Self {
        Self {
            tracker: ActiveSectionTracker::new(registry, tracker),
            spring: ProgressSpring::new(spring),
            scrolled: false,
            reported_progress: 0.0,
        }
    }

    pub fn from_layout(layout: PageLayout) -> Self {
        Self::new(
            SectionRegistry::new(layout.sections),
            layout.tracker,
            layout.spring,
        )
    }

    pub fn active(&self) -> &SectionId {
        self.tracker.active()
    }

    pub fn scrolled(&self) -> bool {
        self.scrolled
    }

    pub fn progress(&self) -> f64 {
        self.spring.value()
    }

    /// Whether the progress bar still needs animation frames.
    pub fn is_animating(&self) -> bool {
        !self.spring.is_at_rest()
    }

    pub fn tracker(&self) -> &ActiveSectionTracker {
        &self.tracker
    }

    /// Problems with the current section layout, for hosts that log them
    /// without a tracing subscriber.
    pub fn layout_issues(&self) -> Vec<LayoutIssue> {
        self.tracker.registry().issues(self.tracker.config())
    }

    /// Current state as a full set of updates, for painting a freshly
    /// mounted page.
    pub fn snapshot(&self) -> Vec<NavUpdate> {
        vec![
            NavUpdate::SetActive {
                id: self.active().clone(),
            },
            NavUpdate::SetScrolled {
                scrolled: self.scrolled,
            },
            NavUpdate::SetProgress {
                progress: self.reported_progress,
            },
        ]
    }

    /// Apply one event. Updates come back in `SetActive`, `SetScrolled`,
    /// `SetProgress` order; an empty list means nothing visible changed.
    pub fn handle(&mut self, event: ScrollEvent) -> Vec<NavUpdate> {
        let before = self.active().clone();
        let mut updates = Vec::new();

        match event {
            ScrollEvent::Scroll(scroll) | ScrollEvent::Resize(scroll) => {
                self.observe(&scroll, &before, &mut updates);
            }
            ScrollEvent::Relayout { sections, scroll } => {
                self.tracker.relayout(SectionRegistry::new(sections));
                self.observe(&scroll, &before, &mut updates);
            }
            ScrollEvent::Tick { dt } => {
                self.spring.step(dt);
                self.report_progress(&mut updates);
            }
        }

        updates
    }

    fn observe(&mut self, scroll: &ScrollState, before: &SectionId, updates: &mut Vec<NavUpdate>) {
        self.tracker.update(scroll);
        if self.active() != before {
            updates.push(NavUpdate::SetActive {
                id: self.active().clone(),
            });
        }

        let scrolled = chrome::is_scrolled(scroll, self.tracker.config().scrolled_threshold);
        if scrolled != self.scrolled {
            self.scrolled = scrolled;
            updates.push(NavUpdate::SetScrolled { scrolled });
        }

        self.spring.set_target(chrome::scroll_progress(scroll));
    }

    fn report_progress(&mut self, updates: &mut Vec<NavUpdate>) {
        let progress = self.spring.value();
        if progress != self.reported_progress {
            self.reported_progress = progress;
            updates.push(NavUpdate::SetProgress { progress });
        }
    }
}
