//! Host chrome hooks
//!
//! Process-wide pieces of host UI that must be set up once: the surface
//! styles and the "Reload" entry in the tab context menu.

pub trait Chrome: Send + Sync {
    fn insert_styles(&self);

    /// Add a "Reload" action that the host routes to `Workbench::reload_tab`
    fn add_reload_action(&self);
}
