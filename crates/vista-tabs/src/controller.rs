//! Tab session controller
//!
//! ```text
//! Empty ──set_state──▶ Loading ──▶ ShowingContent
//!                         │
//!                         ├──▶ (server start) ──settle delay──▶ ShowingUrl
//!                         └──▶ ShowingUrl (server already recorded)
//! ```
//!
//! Every event resets the surface first. A backing process is started at
//! most once per pending resource and hung up exactly once, when the tab
//! closes. A server that finishes starting after nobody wants it any more is
//! hung up as soon as its start resolves.

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use vista_process::{ServerEndpoint, ServerSession};
use vista_surface::{RenderSurface, SurfaceState, Viewport};

use crate::hooks::EditorHooks;
use crate::session::SessionState;

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Wait between a server reporting its URL and the first navigation to it
    pub settle_delay: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1000),
        }
    }
}

struct Inner {
    name: String,
    session: SessionState,
    surface: RenderSurface,
    /// Bumped whenever a scheduled navigation must no longer happen
    generation: u64,
    /// Settle-delay navigation waiting to fire
    navigation: Option<JoinHandle<()>>,
    /// Resource whose server start this tab is waiting on
    awaiting: Option<PathBuf>,
    closed: bool,
}

impl Inner {
    fn supersede(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.navigation.take() {
            handle.abort();
        }
    }

    fn navigate(&mut self, url: &str) {
        self.supersede();
        self.surface.show_url(url);
    }

    fn render(&mut self, content: &str) {
        self.supersede();
        self.surface.show_content(content);
    }
}

/// Per-tab controller. Cheap to clone; clones share one tab.
///
/// Hooks must be called from inside a tokio runtime.
pub struct TabController {
    inner: Arc<Mutex<Inner>>,
    servers: ServerSession,
    options: ControllerOptions,
}

impl TabController {
    pub fn new(
        name: impl Into<String>,
        viewport: Box<dyn Viewport>,
        servers: ServerSession,
        options: ControllerOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                name: name.into(),
                session: SessionState::default(),
                surface: RenderSurface::new(viewport),
                generation: 0,
                navigation: None,
                awaiting: None,
                closed: false,
            })),
            servers,
            options,
        }
    }

    pub fn name(&self) -> String {
        self.inner.lock().name.clone()
    }

    pub fn surface_state(&self) -> SurfaceState {
        self.inner.lock().surface.state()
    }

    pub fn surface_target(&self) -> Option<String> {
        self.inner.lock().surface.current_target().map(str::to_string)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().surface.is_loading()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn is_awaiting_server(&self) -> bool {
        self.inner.lock().awaiting.is_some()
    }

    /// The host's view finished loading
    pub fn surface_loaded(&self) -> bool {
        self.inner.lock().surface.load_finished()
    }

    /// Replace the document shown by a content tab
    pub fn push_content(&self, content: impl Into<String>) {
        let content = content.into();
        let mut inner = self.inner.lock();
        if inner.closed {
            return;
        }

        inner.session.content = Some(content.clone());
        inner.render(&content);
    }

    fn start_server(&self, inner: &mut Inner, path: PathBuf) {
        inner.surface.show_loading();

        if inner.awaiting.as_ref() == Some(&path) {
            tracing::debug!(tab = %inner.name, path = %path.display(), "Server start already pending");
            return;
        }

        tracing::info!(tab = %inner.name, path = %path.display(), "Starting backing server");
        inner.awaiting = Some(path.clone());

        let pending = self.servers.start(&path);
        let tab = self.clone();
        tokio::spawn(async move {
            let result = pending.await;
            tab.server_started(path, result);
        });
    }

    fn server_started(&self, path: PathBuf, result: vista_process::Result<ServerEndpoint>) {
        let mut inner = self.inner.lock();
        let owned = !inner.closed && inner.awaiting.as_ref() == Some(&path);

        match result {
            Ok(endpoint) if owned => {
                inner.awaiting = None;
                inner.session.attach_server(&endpoint);
                tracing::info!(
                    tab = %inner.name,
                    pid = endpoint.pid,
                    url = %endpoint.url,
                    "Backing server attached"
                );
                self.schedule_navigation(&mut inner, endpoint.url);
            }
            Ok(endpoint) => {
                let attached = inner.session.pid == Some(endpoint.pid);
                let name = inner.name.clone();
                drop(inner);

                if !attached {
                    tracing::info!(tab = %name, pid = endpoint.pid, "Server started for a tab that moved on");
                    self.servers.stop(endpoint.pid);
                }
            }
            Err(e) if owned => {
                inner.awaiting = None;
                tracing::error!(
                    tab = %inner.name,
                    path = %path.display(),
                    error = %e,
                    "Failed to start backing server"
                );
                inner.surface.reset();
                inner.surface.set_loading(false);
            }
            Err(e) => {
                tracing::debug!(tab = %inner.name, error = %e, "Ignoring failed start nobody waits for");
            }
        }
    }

    fn schedule_navigation(&self, inner: &mut Inner, url: String) {
        inner.supersede();
        let generation = inner.generation;
        let delay = self.options.settle_delay;
        let tab = Arc::clone(&self.inner);

        inner.navigation = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut inner = tab.lock();
            if inner.closed || inner.generation != generation {
                return;
            }
            inner.navigation = None;
            inner.surface.show_url(&url);
        }));
    }
}

impl EditorHooks for TabController {
    fn document_load(&self) {
        let mut inner = self.inner.lock();
        inner.supersede();
        inner.surface.reset();
    }

    fn document_activate(&self) {
        let mut inner = self.inner.lock();
        if inner.closed {
            return;
        }

        let url = inner.session.url.clone();
        let content = inner.session.content.clone();

        match (url, content) {
            (Some(url), _) if inner.surface.current_target() != Some(url.as_str()) => {
                inner.navigate(&url)
            }
            (_, Some(content)) => inner.render(&content),
            _ => {}
        }
    }

    fn set_state(&self, state: SessionState) {
        let state = state.normalized();
        let mut inner = self.inner.lock();
        if inner.closed {
            tracing::warn!(tab = %inner.name, "Ignoring state for a closed tab");
            return;
        }

        inner.supersede();
        inner.surface.reset();

        // a server this tab no longer refers to would otherwise outlive it
        if let Some(previous) = inner.session.pid {
            if state.pid != Some(previous) {
                tracing::info!(tab = %inner.name, pid = previous, "Releasing replaced backing server");
                self.servers.stop(previous);
            }
        }

        let keep_waiting = state.server().is_none()
            && state.content.is_none()
            && state.path.is_some()
            && state.path == inner.awaiting;
        if !keep_waiting {
            inner.awaiting = None;
        }

        inner.session = SessionState {
            path: state.path.clone(),
            ..SessionState::default()
        };

        if let Some(endpoint) = state.server() {
            inner.session.attach_server(&endpoint);
            inner.navigate(&endpoint.url);
        } else if let Some(content) = state.content {
            inner.session.content = Some(content.clone());
            inner.render(&content);
        } else if let Some(path) = state.path {
            self.start_server(&mut inner, path);
        }

        tracing::debug!(tab = %inner.name, mode = ?inner.session.mode(), "Applied tab state");
    }

    fn get_state(&self) -> SessionState {
        self.inner.lock().session.clone()
    }

    fn reload_tab(&self) {
        let mut inner = self.inner.lock();
        if inner.closed {
            return;
        }

        if let Some(url) = inner.session.url.clone() {
            // in-place reload is not allowed for a remote view
            inner.navigate(&url);
        } else if let Some(content) = inner.session.content.clone() {
            inner.render(&content);
        } else if let Some(path) = inner.session.path.clone() {
            self.start_server(&mut inner, path);
        }
    }

    fn close(&self) {
        let (name, pid) = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return;
            }

            inner.closed = true;
            inner.supersede();
            inner.awaiting = None;
            inner.surface.reset();
            inner.surface.set_loading(false);
            (inner.name.clone(), inner.session.pid)
        };

        if let Some(pid) = pid {
            self.servers.stop(pid);
        }

        tracing::info!(tab = %name, pid = ?pid, "Closed tab");
    }
}

impl Clone for TabController {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            servers: self.servers.clone(),
            options: self.options.clone(),
        }
    }
}
