//! Application state management
use std::sync::Arc;
use std::time::Duration;

use vista_core::{Config, Result, Viewport, ViewportFactory, Workbench};

use crate::host::{HeadlessChrome, HeadlessViewport};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The workbench of one command invocation
pub struct AppState {
    workbench: Workbench,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let viewports: ViewportFactory =
            Arc::new(|name: &str| Box::new(HeadlessViewport::new(name)) as Box<dyn Viewport>);
        let workbench = Workbench::new(config, viewports, Arc::new(HeadlessChrome))?;
        workbench.draw();

        Ok(Self { workbench })
    }

    /// Bring back the tabs of earlier invocations
    pub async fn initialize(&self) -> Result<()> {
        self.workbench.restore_tabs()?;
        self.settle().await
    }

    pub fn workbench(&self) -> &Workbench {
        &self.workbench
    }

    /// Wait for pending server starts and navigations, mark every view
    /// loaded, then snapshot the tabs.
    pub async fn settle(&self) -> Result<()> {
        let config = self.workbench.config();
        let deadline = tokio::time::Instant::now() + config.discovery_timeout() + POLL_INTERVAL;

        if self.awaiting_server() {
            while self.awaiting_server() && tokio::time::Instant::now() < deadline {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            // navigation to a fresh server waits out the settle delay
            tokio::time::sleep(config.settle_delay() + POLL_INTERVAL).await;
        }

        for tab in self.workbench.registry().list() {
            tab.controller.surface_loaded();
        }

        self.workbench.persist()?;
        Ok(())
    }

    fn awaiting_server(&self) -> bool {
        self.workbench
            .registry()
            .list()
            .iter()
            .any(|tab| tab.controller.is_awaiting_server())
    }
}
