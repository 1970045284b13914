//! Vista Tabs
//!
//! A tab shows one resource: a raw document, or a database served by a
//! backing admin server. The controller keeps the render surface, the
//! persisted session record and the backing process in step across opens,
//! activations, restores after a host restart, and close.

mod controller;
mod error;
mod hooks;
mod registry;
mod session;

#[cfg(test)]
mod testing;

pub use controller::{ControllerOptions, TabController};
pub use error::TabError;
pub use hooks::EditorHooks;
pub use registry::{OpenOutcome, OpenRequest, Tab, TabRegistry, ViewportFactory, ADMIN_TAB};
pub use session::{SessionMode, SessionState};

pub type Result<T> = std::result::Result<T, TabError>;
