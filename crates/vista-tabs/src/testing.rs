//! In-memory host and process doubles for controller and registry tests

use parking_lot::Mutex;
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, DuplexStream};

use vista_process::{
    ProcessError, ProcessSignaller, ProcessSpawner, ServerOptions, ServerSession, SpawnOptions,
    SpawnedProcess,
};
use vista_surface::Viewport;

use crate::controller::{ControllerOptions, TabController};
use crate::registry::{TabRegistry, ViewportFactory};

enum Output {
    Fail,
    Print(&'static [u8]),
    /// Test writes output by hand through `print`
    Manual,
}

pub struct FakeSpawner {
    output: Mutex<Output>,
    next_pid: AtomicU32,
    spawned: Mutex<Vec<SpawnOptions>>,
    writers: Mutex<Vec<Option<DuplexStream>>>,
}

impl FakeSpawner {
    fn new(output: Output) -> Self {
        Self {
            output: Mutex::new(output),
            next_pid: AtomicU32::new(100),
            spawned: Mutex::new(Vec::new()),
            writers: Mutex::new(Vec::new()),
        }
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.lock().len()
    }

    pub fn set_output(&self, output: &'static [u8]) {
        *self.output.lock() = Output::Print(output);
    }

    /// Write to the stdout of the `index`th manually driven process
    pub async fn print(&self, index: usize, bytes: &[u8]) {
        let mut writer = self.writers.lock()[index].take().unwrap();
        writer.write_all(bytes).await.unwrap();
        self.writers.lock()[index] = Some(writer);
    }
}

impl ProcessSpawner for FakeSpawner {
    fn spawn(&self, program: &str, options: &SpawnOptions) -> vista_process::Result<SpawnedProcess> {
        let stdout: vista_process::OutputStream = match &*self.output.lock() {
            Output::Fail => {
                return Err(ProcessError::Spawn {
                    program: program.to_string(),
                    reason: "No such file or directory".to_string(),
                })
            }
            Output::Print(bytes) => Box::new(Cursor::new(bytes.to_vec())),
            Output::Manual => {
                let (writer, reader) = tokio::io::duplex(1024);
                self.writers.lock().push(Some(writer));
                Box::new(reader)
            }
        };

        self.spawned.lock().push(options.clone());
        Ok(SpawnedProcess {
            pid: self.next_pid.fetch_add(1, Ordering::SeqCst),
            stdout,
            stderr: None,
        })
    }
}

#[derive(Default)]
pub struct FakeSignaller {
    signalled: Mutex<Vec<u32>>,
}

impl FakeSignaller {
    pub fn signalled(&self) -> Vec<u32> {
        self.signalled.lock().clone()
    }
}

impl ProcessSignaller for FakeSignaller {
    fn hang_up_group(&self, pid: u32) -> vista_process::Result<()> {
        self.signalled.lock().push(pid);
        Ok(())
    }
}

/// Records every call; shared by all tabs of a fixture.
#[derive(Clone, Default)]
pub struct RecordingViewport {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingViewport {
    pub fn navigations_to(&self, url: &str) -> usize {
        let expected = format!("navigate {}", url);
        self.calls.lock().iter().filter(|c| **c == expected).count()
    }

    pub fn writes(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| c.strip_prefix("write ").map(str::to_string))
            .collect()
    }
}

impl Viewport for RecordingViewport {
    fn navigate(&mut self, url: &str) {
        self.calls.lock().push(format!("navigate {}", url));
    }
    fn write_document(&mut self, content: &str) {
        self.calls.lock().push(format!("write {}", content));
    }
    fn set_visible(&mut self, visible: bool) {
        self.calls.lock().push(format!("visible {}", visible));
    }
    fn set_loading(&mut self, loading: bool) {
        self.calls.lock().push(format!("loading {}", loading));
    }
}

pub struct Fixture {
    pub spawner: Arc<FakeSpawner>,
    pub signaller: Arc<FakeSignaller>,
    pub viewport: RecordingViewport,
    pub servers: ServerSession,
}

impl Fixture {
    fn new(output: Output) -> Self {
        let spawner = Arc::new(FakeSpawner::new(output));
        let signaller = Arc::new(FakeSignaller::default());
        let options = ServerOptions {
            discovery_timeout: Duration::from_secs(15),
            ..ServerOptions::default()
        };
        let servers = ServerSession::new(options, spawner.clone(), signaller.clone());

        Self {
            spawner,
            signaller,
            viewport: RecordingViewport::default(),
            servers,
        }
    }

    pub fn printing(output: &'static [u8]) -> Self {
        Self::new(Output::Print(output))
    }

    pub fn failing() -> Self {
        Self::new(Output::Fail)
    }

    pub fn manual() -> Self {
        Self::new(Output::Manual)
    }

    pub fn controller(&self, name: &str) -> TabController {
        TabController::new(
            name,
            Box::new(self.viewport.clone()),
            self.servers.clone(),
            ControllerOptions::default(),
        )
    }

    pub fn registry(&self) -> TabRegistry {
        let viewport = self.viewport.clone();
        let factory: ViewportFactory = Arc::new(move |_name: &str| {
            Box::new(viewport.clone()) as Box<dyn Viewport>
        });
        TabRegistry::new(self.servers.clone(), ControllerOptions::default(), factory)
    }
}
