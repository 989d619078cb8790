use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a navigable page section (`"home"`, `"contato"`, ...).
///
/// Wraps `Arc<str>`: the tracker hands the same id back on every scroll
/// event, so cloning must not allocate.
///
/// Implements `PartialEq<&str>` so assertions like
/// `assert_eq!(active, "about")` work naturally.
#[derive(Debug, Clone, Eq)]
pub struct SectionId(Arc<str>);

impl SectionId {
    /// Id reported when nothing is registered and no fallback was configured.
    pub const NONE: &'static str = "none";

    pub fn none() -> Self {
        Self::from(Self::NONE)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value of the `href` attribute of the nav link pointing at this section.
    pub fn anchor(&self) -> String {
        format!("#{}", self.0)
    }
}

impl PartialEq for SectionId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl PartialEq<str> for SectionId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for SectionId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl From<&str> for SectionId {
    #[inline]
    fn from(s: &str) -> Self {
        SectionId(Arc::from(s))
    }
}

impl From<String> for SectionId {
    #[inline]
    fn from(s: String) -> Self {
        SectionId(Arc::from(s))
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// Serialized as a bare string; hand-rolled so serde's `rc` feature stays off.

impl Serialize for SectionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SectionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(SectionId::from(s))
    }
}
