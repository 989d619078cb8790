use serde::{Deserialize, Serialize};

/// Semantic style tokens resolved by each renderer.
///
/// The browser bridge maps them to CSS classes; the terminal front-end maps
/// them to colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleToken {
    NavLinkActive,
    NavLinkIdle,

    NavbarTransparent,
    NavbarScrolled,

    ProgressBar,
}

impl StyleToken {
    /// CSS class the page stylesheet defines for this token.
    pub fn css_class(self) -> &'static str {
        match self {
            StyleToken::NavLinkActive => "active",
            StyleToken::NavLinkIdle => "nav-link-custom",
            StyleToken::NavbarTransparent => "custom-nav",
            StyleToken::NavbarScrolled => "custom-nav-scrolled",
            StyleToken::ProgressBar => "progress-bar",
        }
    }

    pub fn nav_link(active: bool) -> Self {
        if active {
            StyleToken::NavLinkActive
        } else {
            StyleToken::NavLinkIdle
        }
    }

    pub fn navbar(scrolled: bool) -> Self {
        if scrolled {
            StyleToken::NavbarScrolled
        } else {
            StyleToken::NavbarTransparent
        }
    }
}
