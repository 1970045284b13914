//! Vista Core
//!
//! Coordination layer between the editor host and the tab machinery:
//! routes open requests, persists tab snapshots across host restarts, and
//! performs the one-time host setup.

mod chrome;
mod config;
mod error;
mod launcher;
mod routing;
mod workbench;

#[cfg(test)]
mod testing;

pub use chrome::Chrome;
pub use config::Config;
pub use error::CoreError;
pub use launcher::{LAUNCHER_SCRIPT, LAUNCHER_VERSION_KEY};
pub use routing::strip_shebang;
pub use workbench::{Selection, Workbench};

// Re-export the tab machinery hosts need
pub use vista_process::{
    ProcessError, ProcessSignaller, ProcessSpawner, ServerEndpoint, ServerOptions, ServerSession,
};
pub use vista_storage::{Database, StorageError};
pub use vista_surface::{SurfaceState, Viewport};
pub use vista_tabs::{
    EditorHooks, OpenOutcome, OpenRequest, SessionMode, SessionState, Tab, TabError,
    ViewportFactory, ADMIN_TAB,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
