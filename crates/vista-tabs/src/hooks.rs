//! Host lifecycle hooks
//!
//! The editor host calls these on its own event loop. Each returns promptly;
//! anything slow (server start, settle delay) is scheduled, not awaited.

use crate::session::SessionState;

pub trait EditorHooks {
    /// A document is about to be bound to this tab's surface
    fn document_load(&self);

    /// The tab was switched into
    fn document_activate(&self);

    /// Apply a snapshot: a fresh open, or a restore after the host restarted
    fn set_state(&self, state: SessionState);

    /// Snapshot for the host to persist
    fn get_state(&self) -> SessionState;

    /// The host's "Reload" action
    fn reload_tab(&self);

    /// The tab is closing
    fn close(&self);
}
