//! Headless host
//!
//! Stands in for an editor UI: views are not rendered, only logged, and
//! every load is reported complete once a command settles.

use vista_core::{Chrome, Viewport};

pub struct HeadlessViewport {
    tab: String,
}

impl HeadlessViewport {
    pub fn new(tab: &str) -> Self {
        Self {
            tab: tab.to_string(),
        }
    }
}

impl Viewport for HeadlessViewport {
    fn navigate(&mut self, url: &str) {
        tracing::debug!(tab = %self.tab, url = %url, "Navigate");
    }

    fn write_document(&mut self, content: &str) {
        tracing::debug!(tab = %self.tab, bytes = content.len(), "Write document");
    }

    fn set_visible(&mut self, visible: bool) {
        tracing::trace!(tab = %self.tab, visible, "Visibility");
    }

    fn set_loading(&mut self, loading: bool) {
        tracing::trace!(tab = %self.tab, loading, "Loading indicator");
    }
}

/// No menus or styles to install without a UI
pub struct HeadlessChrome;

impl Chrome for HeadlessChrome {
    fn insert_styles(&self) {
        tracing::trace!("No styles to insert");
    }

    fn add_reload_action(&self) {
        tracing::trace!("Reload is the `reload` command");
    }
}
