//! Workbench: the host-facing entry point
//!
//! Routes open requests to tabs, keeps tab snapshots in storage so a host
//! restart can restore them, and owns the process plumbing shared by every
//! tab.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use vista_process::{
    forward_output, ProcessSignaller, ProcessSpawner, ServerEndpoint, ServerSession, SpawnOptions,
    SystemSignaller, SystemSpawner,
};
use vista_storage::Database;
use vista_tabs::{
    EditorHooks, OpenOutcome, OpenRequest, SessionState, Tab, TabRegistry, ViewportFactory,
    ADMIN_TAB,
};

use crate::chrome::Chrome;
use crate::config::Config;
use crate::error::CoreError;
use crate::launcher;
use crate::routing::{resolve, strip_shebang, title_for, workspace_path};
use crate::Result;

/// Tabs opened from one file-tree selection
#[derive(Debug, Default)]
pub struct Selection {
    pub content: Vec<OpenOutcome>,
    pub database: Option<OpenOutcome>,
    /// Folders and files that could not be opened
    pub skipped: Vec<PathBuf>,
}

pub struct Workbench {
    config: Config,
    db: Database,
    registry: TabRegistry,
    spawner: Arc<dyn ProcessSpawner>,
    chrome: Arc<dyn Chrome>,
    drawn: Arc<AtomicBool>,
}

impl Workbench {
    /// Open the workbench database and wire real process control
    pub fn new(config: Config, viewports: ViewportFactory, chrome: Arc<dyn Chrome>) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;

        Ok(Self::with_parts(
            config,
            db,
            Arc::new(SystemSpawner),
            Arc::new(SystemSignaller),
            viewports,
            chrome,
        ))
    }

    pub fn with_parts(
        config: Config,
        db: Database,
        spawner: Arc<dyn ProcessSpawner>,
        signaller: Arc<dyn ProcessSignaller>,
        viewports: ViewportFactory,
        chrome: Arc<dyn Chrome>,
    ) -> Self {
        let servers = ServerSession::new(config.server_options(), spawner.clone(), signaller);
        let registry = TabRegistry::new(servers, config.controller_options(), viewports);

        Self {
            config,
            db,
            registry,
            spawner,
            chrome,
            drawn: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }

    /// One-time host setup; later calls do nothing.
    pub fn draw(&self) {
        if self.drawn.swap(true, Ordering::SeqCst) {
            return;
        }

        self.chrome.insert_styles();
        self.chrome.add_reload_action();

        tracing::debug!("Workbench chrome drawn");
    }

    /// Recreate every tab recorded in storage.
    ///
    /// Tabs that were serving a database reattach to their recorded server
    /// instead of starting another one.
    pub fn restore_tabs(&self) -> Result<Vec<Tab>> {
        let mut restored = Vec::new();

        for stored in self.db.list_tab_states()? {
            let state = match SessionState::from_json(stored.state) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(tab = %stored.name, error = %e, "Discarding unreadable tab snapshot");
                    self.db.delete_tab_state(&stored.name)?;
                    continue;
                }
            };

            restored.push(self.registry.restore(&stored.name, &stored.title, state)?);
        }

        tracing::info!(count = restored.len(), "Restored tabs");

        Ok(restored)
    }

    /// Handle `open <cwd> <path>` as passed on by the launcher.
    pub fn exec_open(&self, args: &[String]) -> Result<OpenOutcome> {
        match args {
            [cwd, path] => self.open_file(Path::new(cwd), Path::new(path)),
            _ => Err(CoreError::Usage("open <cwd> <path>".to_string())),
        }
    }

    /// Open a database in the admin tab, anything else as a content tab.
    pub fn open_file(&self, cwd: &Path, path: &Path) -> Result<OpenOutcome> {
        let full = resolve(cwd, path);

        if self.config.is_database(&full) {
            return self.open_database(full);
        }

        let bytes = std::fs::read(&full)?;
        let text = String::from_utf8_lossy(&bytes);
        let content = strip_shebang(&text).to_string();

        let outcome = self.registry.open(OpenRequest::unnamed(
            title_for(&full),
            SessionState::with_content(content),
        ))?;
        self.persist_tab(outcome.tab())?;

        Ok(outcome)
    }

    /// Show `path` in the admin tab, focusing it if it already does.
    pub fn open_database(&self, path: PathBuf) -> Result<OpenOutcome> {
        tracing::info!(path = %path.display(), "Opening database");

        let outcome = self.registry.open(OpenRequest::named(
            ADMIN_TAB,
            self.config.admin_program.clone(),
            SessionState::with_path(path),
        ))?;
        self.persist_tab(outcome.tab())?;

        Ok(outcome)
    }

    /// Open a file-tree selection. Paths are rooted at `workspace`.
    ///
    /// Only the last selected database is opened, since there is a single
    /// admin tab. Folders are passed over, and a file that cannot be opened
    /// is recorded in `skipped` without stopping the rest of the selection.
    pub fn open_selection(&self, workspace: &Path, paths: &[PathBuf]) -> Result<Selection> {
        let mut selection = Selection::default();
        let mut last_database = None;

        for path in paths {
            let full = workspace_path(workspace, path);
            if self.config.is_database(&full) {
                last_database = Some(full);
                continue;
            }

            if full.is_dir() {
                tracing::debug!(path = %full.display(), "Skipping folder in selection");
                selection.skipped.push(full);
                continue;
            }

            match self.open_file(workspace, &full) {
                Ok(outcome) => selection.content.push(outcome),
                Err(e) => {
                    tracing::warn!(path = %full.display(), error = %e, "Could not open selected file");
                    selection.skipped.push(full);
                }
            }
        }

        if let Some(database) = last_database {
            selection.database = Some(self.open_database(database)?);
        }

        Ok(selection)
    }

    pub fn reload_tab(&self, name: &str) -> Result<Tab> {
        let tab = self.registry.get(name)?;
        tab.controller.reload_tab();
        self.persist_tab(&tab)?;
        Ok(tab)
    }

    /// Close a tab, hanging up its server, and forget its snapshot.
    pub fn close_tab(&self, name: &str) -> Result<()> {
        self.registry.close(name)?;
        self.db.delete_tab_state(name)?;

        tracing::info!(tab = %name, "Closed tab");

        Ok(())
    }

    /// Snapshot every open tab into storage
    pub fn persist(&self) -> Result<usize> {
        let tabs = self.registry.list();
        for tab in &tabs {
            self.persist_tab(tab)?;
        }
        Ok(tabs.len())
    }

    fn persist_tab(&self, tab: &Tab) -> Result<()> {
        self.db
            .save_tab_state(&tab.name, &tab.title, &tab.snapshot().to_json())?;
        Ok(())
    }

    pub fn install_launcher(&self) -> Result<bool> {
        launcher::install(
            &self.db,
            &self.config.launcher_path,
            self.config.launcher_version,
        )
    }

    /// Serve `dir` with the static file server.
    ///
    /// The server is detached; stop it with `SIGHUP` to its process group.
    pub async fn serve_directory(&self, dir: &Path) -> Result<ServerEndpoint> {
        if !dir.is_dir() {
            return Err(CoreError::Usage(format!(
                "serve <dir>: {} is not a directory",
                dir.display()
            )));
        }

        let port = self.config.static_server_port;
        let program = &self.config.static_server_program;
        let options = SpawnOptions::with_args(["-p".to_string(), port.to_string()])
            .cwd(dir)
            .log(self.config.log_dir.join(format!("{}-{}.log", program, port)));

        let process = self
            .spawner
            .spawn(program, &options)
            .map_err(|e| {
                tracing::error!(dir = %dir.display(), error = %e, "Failed to start static server");
                e
            })?;

        let pid = process.pid;
        if let Some(stderr) = process.stderr {
            forward_output(pid, "stderr", stderr);
        }
        forward_output(pid, "stdout", process.stdout);

        tokio::time::sleep(self.config.settle_delay()).await;

        let url = format!("http://127.0.0.1:{}", port);
        tracing::info!(pid, url = %url, dir = %dir.display(), "Serving folder");

        Ok(ServerEndpoint { url, pid })
    }
}

impl Clone for Workbench {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: self.db.clone(),
            registry: self.registry.clone(),
            spawner: Arc::clone(&self.spawner),
            chrome: Arc::clone(&self.chrome),
            drawn: Arc::clone(&self.drawn),
        }
    }
}
