//! Tab Registry
//!
//! Finds or creates tabs by logical name so that a resource is never open in
//! two tabs. Opening a different resource under a taken name replaces the
//! old tab (closing it, and with it its backing server).

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use vista_process::ServerSession;
use vista_surface::Viewport;

use crate::controller::{ControllerOptions, TabController};
use crate::error::TabError;
use crate::hooks::EditorHooks;
use crate::session::SessionState;
use crate::Result;

/// Logical name of the single database administration tab
pub const ADMIN_TAB: &str = "admin-tab";

/// Creates the host view for a new tab, given the tab's name
pub type ViewportFactory = Arc<dyn Fn(&str) -> Box<dyn Viewport> + Send + Sync>;

#[derive(Clone)]
pub struct Tab {
    pub name: String,
    pub title: String,
    pub controller: TabController,
}

impl Tab {
    pub fn snapshot(&self) -> SessionState {
        self.controller.get_state()
    }
}

impl std::fmt::Debug for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tab")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("surface", &self.controller.surface_state())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct OpenRequest {
    /// Logical name; `None` always opens a fresh tab
    pub name: Option<String>,
    pub title: String,
    pub state: SessionState,
}

impl OpenRequest {
    pub fn named(name: impl Into<String>, title: impl Into<String>, state: SessionState) -> Self {
        Self {
            name: Some(name.into()),
            title: title.into(),
            state,
        }
    }

    pub fn unnamed(title: impl Into<String>, state: SessionState) -> Self {
        Self {
            name: None,
            title: title.into(),
            state,
        }
    }
}

#[derive(Debug)]
pub enum OpenOutcome {
    /// The resource was already open; its tab was focused
    Focused(Tab),
    Opened(Tab),
    /// A tab with the same name but another resource was closed first
    Replaced(Tab),
}

impl OpenOutcome {
    pub fn tab(&self) -> &Tab {
        match self {
            OpenOutcome::Focused(tab) | OpenOutcome::Opened(tab) | OpenOutcome::Replaced(tab) => tab,
        }
    }
}

pub struct TabRegistry {
    tabs: Arc<RwLock<HashMap<String, Tab>>>,
    focused: Arc<RwLock<Option<String>>>,
    servers: ServerSession,
    options: ControllerOptions,
    viewports: ViewportFactory,
}

impl TabRegistry {
    pub fn new(servers: ServerSession, options: ControllerOptions, viewports: ViewportFactory) -> Self {
        Self {
            tabs: Arc::new(RwLock::new(HashMap::new())),
            focused: Arc::new(RwLock::new(None)),
            servers,
            options,
            viewports,
        }
    }

    /// Focus the tab already showing the requested resource, or open one.
    pub fn open(&self, request: OpenRequest) -> Result<OpenOutcome> {
        let name = match request.name {
            Some(name) if name.trim().is_empty() => return Err(TabError::EmptyName),
            Some(name) => name,
            None => format!("tab-{}", Uuid::new_v4()),
        };

        let mut replaced = false;
        if let Some(existing) = self.find(&name) {
            let wanted = request.state.resource();
            if wanted.is_some() && existing.snapshot().resource() == wanted {
                tracing::info!(tab = %name, "Resource already open, focusing");
                self.focus(&name)?;
                return Ok(OpenOutcome::Focused(existing));
            }

            self.close(&name)?;
            replaced = true;
        }

        let tab = self.create(name, request.title, request.state);
        Ok(if replaced {
            OpenOutcome::Replaced(tab)
        } else {
            OpenOutcome::Opened(tab)
        })
    }

    /// Recreate a tab from a snapshot taken before the host restarted
    pub fn restore(&self, name: &str, title: &str, state: SessionState) -> Result<Tab> {
        if name.trim().is_empty() {
            return Err(TabError::EmptyName);
        }

        let existing = self.tabs.write().remove(name);
        if let Some(existing) = existing {
            existing.controller.close();
        }

        Ok(self.create(name.to_string(), title.to_string(), state))
    }

    pub fn find(&self, name: &str) -> Option<Tab> {
        self.tabs.read().get(name).cloned()
    }

    pub fn get(&self, name: &str) -> Result<Tab> {
        self.find(name)
            .ok_or_else(|| TabError::NotFound(name.to_string()))
    }

    /// Make `name` the focused tab, activating it if focus moved
    pub fn focus(&self, name: &str) -> Result<Tab> {
        let tab = self.get(name)?;

        let previous = self.focused.write().replace(name.to_string());
        if previous.as_deref() != Some(name) {
            tab.controller.document_activate();
        }

        Ok(tab)
    }

    pub fn focused(&self) -> Option<Tab> {
        let name = self.focused.read().clone()?;
        self.find(&name)
    }

    pub fn close(&self, name: &str) -> Result<()> {
        let tab = self
            .tabs
            .write()
            .remove(name)
            .ok_or_else(|| TabError::NotFound(name.to_string()))?;

        {
            let mut focused = self.focused.write();
            if focused.as_deref() == Some(name) {
                *focused = None;
            }
        }

        tab.controller.close();
        Ok(())
    }

    /// All open tabs, ordered by name
    pub fn list(&self) -> Vec<Tab> {
        let mut tabs: Vec<Tab> = self.tabs.read().values().cloned().collect();
        tabs.sort_by(|a, b| a.name.cmp(&b.name));
        tabs
    }

    fn create(&self, name: String, title: String, state: SessionState) -> Tab {
        let viewport = (self.viewports)(&name);
        let controller = TabController::new(
            name.clone(),
            viewport,
            self.servers.clone(),
            self.options.clone(),
        );

        controller.document_load();
        controller.set_state(state);

        let tab = Tab {
            name: name.clone(),
            title,
            controller,
        };

        self.tabs.write().insert(name.clone(), tab.clone());
        *self.focused.write() = Some(name.clone());

        tracing::info!(tab = %name, title = %tab.title, "Opened tab");

        tab
    }
}

impl Clone for TabRegistry {
    fn clone(&self) -> Self {
        Self {
            tabs: Arc::clone(&self.tabs),
            focused: Arc::clone(&self.focused),
            servers: self.servers.clone(),
            options: self.options.clone(),
            viewports: Arc::clone(&self.viewports),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use std::time::Duration;
    use vista_surface::SurfaceState;

    const SERVING: &[u8] = b"Serving on http://127.0.0.1:9091\n";

    async fn run_for(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn admin(path: &str) -> OpenRequest {
        OpenRequest::named(ADMIN_TAB, "phpliteadmin", SessionState::with_path(path))
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopening_same_database_focuses_existing_tab() {
        let fx = Fixture::printing(SERVING);
        let registry = fx.registry();

        let opened = registry.open(admin("/work/db.sqlite")).unwrap();
        assert!(matches!(opened, OpenOutcome::Opened(_)));
        run_for(2000).await;
        opened.tab().controller.surface_loaded();

        let again = registry.open(admin("/work/db.sqlite")).unwrap();
        assert!(matches!(again, OpenOutcome::Focused(_)));
        run_for(2000).await;

        assert_eq!(fx.spawner.spawn_count(), 1);
        assert_eq!(fx.viewport.navigations_to("http://127.0.0.1:9091"), 1);
        assert_eq!(again.tab().controller.surface_state(), SurfaceState::ShowingUrl);
        assert_eq!(registry.list().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_database_replaces_admin_tab() {
        let fx = Fixture::printing(SERVING);
        let registry = fx.registry();

        let first = registry.open(admin("/work/a.db")).unwrap();
        run_for(2000).await;

        let second = registry.open(admin("/work/b.db")).unwrap();
        assert!(matches!(second, OpenOutcome::Replaced(_)));
        run_for(2000).await;

        assert!(first.tab().controller.is_closed());
        assert_eq!(fx.signaller.signalled(), vec![100]);
        assert_eq!(fx.spawner.spawn_count(), 2);
        assert_eq!(registry.get(ADMIN_TAB).unwrap().snapshot().pid, Some(101));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unnamed_tabs_never_reuse() {
        let fx = Fixture::printing(SERVING);
        let registry = fx.registry();

        let state = SessionState::with_content("<p>hi</p>");
        let a = registry.open(OpenRequest::unnamed("hi.html", state.clone())).unwrap();
        let b = registry.open(OpenRequest::unnamed("hi.html", state)).unwrap();

        assert_ne!(a.tab().name, b.tab().name);
        assert_eq!(registry.list().len(), 2);
        assert_eq!(registry.focused().unwrap().name, b.tab().name);
        assert_eq!(fx.spawner.spawn_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_releases_server_and_focus() {
        let fx = Fixture::printing(SERVING);
        let registry = fx.registry();

        registry.open(admin("/work/db.sqlite")).unwrap();
        run_for(2000).await;

        registry.close(ADMIN_TAB).unwrap();
        assert!(registry.focused().is_none());
        assert_eq!(fx.signaller.signalled(), vec![100]);
        assert!(matches!(registry.close(ADMIN_TAB), Err(TabError::NotFound(_))));
        assert_eq!(fx.signaller.signalled(), vec![100]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_reuses_recorded_server() {
        let fx = Fixture::printing(SERVING);
        let registry = fx.registry();

        let state = SessionState {
            path: Some("/work/db.sqlite".into()),
            url: Some("http://x/y".to_string()),
            pid: Some(123),
            content: None,
        };
        let tab = registry.restore(ADMIN_TAB, "phpliteadmin", state).unwrap();
        run_for(2000).await;

        assert_eq!(tab.controller.surface_target().as_deref(), Some("http://x/y"));
        assert_eq!(fx.spawner.spawn_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let fx = Fixture::printing(SERVING);
        let registry = fx.registry();

        let result = registry.open(OpenRequest::named(" ", "x", SessionState::default()));
        assert!(matches!(result, Err(TabError::EmptyName)));
    }
}
