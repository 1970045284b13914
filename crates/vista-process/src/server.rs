//! Server sessions
//!
//! Ties a resource path to at most one backing admin server. Concurrent
//! starts for the same path share one launch and one result.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

use crate::error::ProcessError;
use crate::extractor::discover_url;
use crate::signal::{ProcessSignaller, SystemSignaller};
use crate::spawner::{forward_output, ProcessSpawner, SpawnOptions, SystemSpawner};
use crate::Result;

/// Where a running backing server can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub url: String,
    pub pid: u32,
}

#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Admin server executable
    pub program: String,
    /// Arguments placed before the resource path
    pub args: Vec<String>,
    /// How long to wait for a URL on stdout
    pub discovery_timeout: Duration,
    /// Directory for per-resource server logs. Without one the server
    /// writes into pipes and dies with the host.
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            program: "phpliteadmin".to_string(),
            args: vec!["--url-only".to_string()],
            discovery_timeout: Duration::from_secs(15),
            log_dir: None,
        }
    }
}

type PendingStart = Shared<BoxFuture<'static, Result<ServerEndpoint>>>;

pub struct ServerSession {
    options: ServerOptions,
    spawner: Arc<dyn ProcessSpawner>,
    signaller: Arc<dyn ProcessSignaller>,
    /// Starts that have not resolved yet, by resource path
    in_flight: Arc<Mutex<HashMap<PathBuf, PendingStart>>>,
}

impl ServerSession {
    pub fn new(
        options: ServerOptions,
        spawner: Arc<dyn ProcessSpawner>,
        signaller: Arc<dyn ProcessSignaller>,
    ) -> Self {
        Self {
            options,
            spawner,
            signaller,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Session backed by real processes and real signals
    pub fn system(options: ServerOptions) -> Self {
        Self::new(options, Arc::new(SystemSpawner), Arc::new(SystemSignaller))
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    /// Start a server for `resource` and resolve to its endpoint.
    ///
    /// The launch runs on its own task whether or not the returned future is
    /// polled. A call made while an earlier start for the same path is still
    /// pending returns that start's result instead of spawning again.
    pub fn start(&self, resource: &Path) -> impl Future<Output = Result<ServerEndpoint>> + Send + 'static {
        let mut in_flight = self.in_flight.lock();

        if let Some(pending) = in_flight.get(resource) {
            tracing::debug!(path = %resource.display(), "Joining pending server start");
            return pending.clone();
        }

        let task = tokio::spawn(launch(
            resource.to_path_buf(),
            self.options.clone(),
            Arc::clone(&self.spawner),
            Arc::clone(&self.signaller),
            Arc::clone(&self.in_flight),
        ));

        let program = self.options.program.clone();
        let pending = async move {
            task.await.unwrap_or_else(|e| {
                Err(ProcessError::Spawn {
                    program,
                    reason: e.to_string(),
                })
            })
        }
        .boxed()
        .shared();

        in_flight.insert(resource.to_path_buf(), pending.clone());
        pending
    }

    /// True while a start for `resource` has not resolved
    pub fn is_starting(&self, resource: &Path) -> bool {
        self.in_flight.lock().contains_key(resource)
    }

    /// Ask the OS to hang up the process group led by `pid`.
    ///
    /// Never fails: the tab that owned the server is already gone, so a
    /// missing process or a permission problem is only logged.
    pub fn stop(&self, pid: u32) {
        match self.signaller.hang_up_group(pid) {
            Ok(()) => tracing::info!(pid, "Stopped backing server"),
            Err(e) => tracing::warn!(pid, error = %e, "Could not stop backing server"),
        }
    }
}

impl Clone for ServerSession {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            spawner: Arc::clone(&self.spawner),
            signaller: Arc::clone(&self.signaller),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

async fn launch(
    resource: PathBuf,
    options: ServerOptions,
    spawner: Arc<dyn ProcessSpawner>,
    signaller: Arc<dyn ProcessSignaller>,
    in_flight: Arc<Mutex<HashMap<PathBuf, PendingStart>>>,
) -> Result<ServerEndpoint> {
    let result = run(&resource, &options, spawner.as_ref(), signaller.as_ref()).await;
    in_flight.lock().remove(&resource);
    result
}

async fn run(
    resource: &Path,
    options: &ServerOptions,
    spawner: &dyn ProcessSpawner,
    signaller: &dyn ProcessSignaller,
) -> Result<ServerEndpoint> {
    let mut args = options.args.clone();
    args.push(resource.to_string_lossy().into_owned());

    let mut spawn_options = SpawnOptions::with_args(args);
    if let Some(dir) = &options.log_dir {
        spawn_options = spawn_options.log(dir.join(log_name(resource)));
    }

    let process = spawner.spawn(&options.program, &spawn_options)?;
    let pid = process.pid;
    let mut stdout = process.stdout;

    if let Some(stderr) = process.stderr {
        forward_output(pid, "stderr", stderr);
    }

    match discover_url(&mut stdout, pid, options.discovery_timeout).await {
        Ok(url) => {
            // mirror later output into the host log while the host runs
            forward_output(pid, "stdout", stdout);
            tracing::info!(pid, url = %url, path = %resource.display(), "Backing server ready");
            Ok(ServerEndpoint { url, pid })
        }
        Err(e) => {
            tracing::warn!(pid, error = %e, "Backing server never reported a URL");
            if let Err(signal_error) = signaller.hang_up_group(pid) {
                tracing::debug!(pid, error = %signal_error, "Unusable server already gone");
            }
            Err(e)
        }
    }
}

/// `<file name>.log`, with anything unusual in the name replaced
fn log_name(resource: &Path) -> String {
    let name: String = resource
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();

    if name.is_empty() {
        "server.log".to_string()
    } else {
        format!("{}.log", name)
    }
}
