use scrollspy_protocol::{Section, SectionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("probe_fraction must lie in [0, 1], got {0}")]
    ProbeFraction(f64),
}

/// Tuning of the active-section rules.
///
/// The probe fraction and bottom slack were tuned by eye on the portfolio
/// page; they stay configurable rather than derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Fraction of the viewport height added to `scroll_y` to get the probe point.
    pub probe_fraction: f64,
    /// Pixel tolerance for the bottom-of-page rule.
    pub bottom_slack: f64,
    /// `scroll_y` above which the navbar switches to its scrolled style.
    pub scrolled_threshold: f64,
    /// Section forced active at the bottom of the page. Defaults to the last section.
    pub terminal_id: Option<SectionId>,
    /// Section active before anything matched. Defaults to the first section.
    pub fallback_id: Option<SectionId>,
}

pub const DEFAULT_PROBE_FRACTION: f64 = 1.0 / 3.0;
pub const DEFAULT_BOTTOM_SLACK: f64 = 50.0;
pub const DEFAULT_SCROLLED_THRESHOLD: f64 = 50.0;

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            probe_fraction: DEFAULT_PROBE_FRACTION,
            bottom_slack: DEFAULT_BOTTOM_SLACK,
            scrolled_threshold: DEFAULT_SCROLLED_THRESHOLD,
            terminal_id: None,
            fallback_id: None,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("probe_fraction", self.probe_fraction)?;
        if !(0.0..=1.0).contains(&self.probe_fraction) {
            return Err(ConfigError::ProbeFraction(self.probe_fraction));
        }
        non_negative("bottom_slack", self.bottom_slack)?;
        non_negative("scrolled_threshold", self.scrolled_threshold)?;
        Ok(())
    }
}

/// Damped spring driving the reading-progress bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
    /// Distance from the target under which the spring may come to rest.
    pub rest_delta: f64,
    /// Speed under which the spring may come to rest.
    pub rest_speed: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            damping: 30.0,
            mass: 1.0,
            rest_delta: 0.001,
            rest_speed: 0.01,
        }
    }
}

impl SpringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("stiffness", self.stiffness)?;
        positive("mass", self.mass)?;
        // An undamped spring or a zero rest window would animate forever.
        positive("damping", self.damping)?;
        positive("rest_delta", self.rest_delta)?;
        positive("rest_speed", self.rest_speed)?;
        Ok(())
    }
}

/// Everything a host needs to mount the tracker: the measured sections plus
/// tuning. This is the JSON document exchanged with the browser bridge and
/// loaded by the terminal front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub sections: Vec<Section>,
    /// Total document height. Defaults to the bottom of the lowest section.
    #[serde(default)]
    pub document_height: Option<f64>,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub spring: SpringConfig,
}

impl PageLayout {
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let layout: PageLayout = serde_json::from_slice(data)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        self.spring.validate()?;
        if let Some(height) = self.document_height {
            non_negative("document_height", height)?;
        }
        Ok(())
    }

    pub fn document_height(&self) -> f64 {
        self.document_height.unwrap_or_else(|| {
            self.sections
                .iter()
                .map(Section::offset_bottom)
                .fold(0.0, f64::max)
        })
    }

    /// The portfolio page as laid out on a 900px-tall viewport: a full-height
    /// hero, the about block, the project showcase, the contact form, and a
    /// 140px footer that belongs to no section.
    pub fn portfolio() -> Self {
        Self {
            sections: vec![
                Section::new("home", "Home", 0.0, 900.0),
                Section::new("about", "Sobre", 900.0, 640.0),
                Section::new("vitrine", "Vitrine", 1540.0, 1200.0),
                Section::new("contato", "Contato", 2740.0, 720.0),
            ],
            document_height: Some(3600.0),
            tracker: TrackerConfig {
                terminal_id: Some("contato".into()),
                fallback_id: Some("home".into()),
                ..TrackerConfig::default()
            },
            spring: SpringConfig::default(),
        }
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}
