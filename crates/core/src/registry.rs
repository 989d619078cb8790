use std::collections::HashSet;

use scrollspy_protocol::{Section, SectionId};
use thiserror::Error;
use tracing::warn;

use crate::config::TrackerConfig;
use crate::tracker;

/// A layout that breaks the "ordered, non-overlapping, unique" contract.
///
/// None of these stop the tracker; they are reported so the host can log
/// them. The tracker resolves each one deterministically (first match in
/// list order, last section as terminal).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutIssue {
    #[error("section id '{0}' is registered more than once")]
    DuplicateId(SectionId),
    #[error("section '{later}' starts above '{earlier}' but is listed after it")]
    OutOfOrder {
        earlier: SectionId,
        later: SectionId,
    },
    #[error("sections '{first}' and '{second}' overlap by {overlap}px")]
    Overlap {
        first: SectionId,
        second: SectionId,
        overlap: f64,
    },
    #[error("section '{0}' has a negative or non-finite height")]
    BadHeight(SectionId),
    #[error("terminal section '{0}' is not registered")]
    UnknownTerminal(SectionId),
}

/// The ordered list of sections measured at mount.
///
/// List order is kept exactly as registered: it decides which of two
/// overlapping sections wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionRegistry {
    sections: Vec<Section>,
}

impl SectionRegistry {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn get(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn fallback_id(&self, config: &TrackerConfig) -> SectionId {
        tracker::fallback_id(&self.sections, config)
    }

    /// Everything wrong with this layout, in list order.
    pub fn issues(&self, config: &TrackerConfig) -> Vec<LayoutIssue> {
        let mut issues = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for section in &self.sections {
            if !seen.insert(section.id.as_str()) {
                issues.push(LayoutIssue::DuplicateId(section.id.clone()));
            }
            if !section.offset_height.is_finite() || section.offset_height < 0.0 {
                issues.push(LayoutIssue::BadHeight(section.id.clone()));
            }
        }

        for pair in self.sections.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if b.offset_top < a.offset_top {
                issues.push(LayoutIssue::OutOfOrder {
                    earlier: a.id.clone(),
                    later: b.id.clone(),
                });
            } else if b.offset_top < a.offset_bottom() {
                issues.push(LayoutIssue::Overlap {
                    first: a.id.clone(),
                    second: b.id.clone(),
                    overlap: a.offset_bottom().min(b.offset_bottom()) - b.offset_top,
                });
            }
        }

        if let Some(terminal) = &config.terminal_id
            && !self.contains(terminal.as_str())
        {
            issues.push(LayoutIssue::UnknownTerminal(terminal.clone()));
        }

        issues
    }

    pub(crate) fn log_issues(&self, config: &TrackerConfig) {
        for issue in self.issues(config) {
            warn!(%issue, "malformed section layout");
        }
    }
}

impl FromIterator<Section> for SectionRegistry {
    fn from_iter<I: IntoIterator<Item = Section>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
