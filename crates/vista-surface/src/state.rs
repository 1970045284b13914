//! Surface State
//!
//! ```text
//! Blank ──show──▶ Loading ──load finished──▶ ShowingContent | ShowingUrl
//!   ▲                │                                │
//!   └──── reset ─────┴────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceState {
    /// Hidden and pointed at about:blank
    Blank,
    /// A document or URL is on its way; the loading indicator is up
    Loading,
    /// A raw document is visible
    ShowingContent,
    /// A remote URL is visible
    ShowingUrl,
}

impl SurfaceState {
    /// Whether moving straight to `target` is allowed
    pub fn can_transition_to(&self, target: SurfaceState) -> bool {
        match (self, target) {
            // reset is always allowed
            (_, SurfaceState::Blank) => true,
            (SurfaceState::Blank, SurfaceState::Loading) => true,
            (SurfaceState::Loading, SurfaceState::ShowingContent) => true,
            (SurfaceState::Loading, SurfaceState::ShowingUrl) => true,
            _ => false,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, SurfaceState::ShowingContent | SurfaceState::ShowingUrl)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceState::Blank => "blank",
            SurfaceState::Loading => "loading",
            SurfaceState::ShowingContent => "showing-content",
            SurfaceState::ShowingUrl => "showing-url",
        }
    }
}

impl std::fmt::Display for SurfaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
