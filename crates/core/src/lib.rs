//! Scroll-driven navigation highlighting.
//!
//! The pure entry point is [`tracker::compute_active`]. [`controller::ScrollSpy`]
//! wraps it together with the navbar chrome and the progress spring for
//! hosts that feed raw scroll events.

pub mod chrome;
pub mod config;
pub mod controller;
pub mod registry;
pub mod spring;
pub mod tracker;

pub use config::{ConfigError, PageLayout, SpringConfig, TrackerConfig};
pub use controller::{ScrollEvent, ScrollSpy};
pub use registry::{LayoutIssue, SectionRegistry};
pub use tracker::{ActiveSectionTracker, compute_active};
