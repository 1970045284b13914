//! Process, host and chrome doubles for workbench tests

use parking_lot::Mutex;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use vista_process::{ProcessError, ProcessSignaller, ProcessSpawner, SpawnOptions, SpawnedProcess};
use vista_storage::Database;
use vista_surface::Viewport;
use vista_tabs::ViewportFactory;

use crate::chrome::Chrome;
use crate::config::Config;
use crate::workbench::Workbench;

const SERVING: &[u8] = b"phpLiteAdmin ready\nhttp://127.0.0.1:9091\n";

pub struct FakeSpawner {
    failing: AtomicBool,
    next_pid: AtomicU32,
    spawned: Mutex<Vec<(String, SpawnOptions)>>,
}

impl FakeSpawner {
    fn new(failing: bool) -> Self {
        Self {
            failing: AtomicBool::new(failing),
            next_pid: AtomicU32::new(100),
            spawned: Mutex::new(Vec::new()),
        }
    }

    pub fn succeed(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.lock().len()
    }

    pub fn spawned_program(&self, index: usize) -> String {
        self.spawned.lock()[index].0.clone()
    }

    pub fn spawned_args(&self, index: usize) -> Vec<String> {
        self.spawned.lock()[index].1.args.clone()
    }

    pub fn spawned_cwd(&self, index: usize) -> Option<PathBuf> {
        self.spawned.lock()[index].1.cwd.clone()
    }

    pub fn spawned_log(&self, index: usize) -> Option<PathBuf> {
        self.spawned.lock()[index].1.log.clone()
    }
}

impl ProcessSpawner for FakeSpawner {
    fn spawn(&self, program: &str, options: &SpawnOptions) -> vista_process::Result<SpawnedProcess> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProcessError::Spawn {
                program: program.to_string(),
                reason: "No such file or directory".to_string(),
            });
        }

        self.spawned
            .lock()
            .push((program.to_string(), options.clone()));

        Ok(SpawnedProcess {
            pid: self.next_pid.fetch_add(1, Ordering::SeqCst),
            stdout: Box::new(Cursor::new(SERVING.to_vec())),
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
    fn set_visible(&mut self, _visible: bool) {}
    fn set_loading(&mut self, _loading: bool) {}
}

#[derive(Default)]
pub struct RecordingChrome {
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingChrome {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }
}

impl Chrome for RecordingChrome {
    fn insert_styles(&self) {
        self.calls.lock().push("insert_styles");
    }

    fn add_reload_action(&self) {
        self.calls.lock().push("add_reload_action");
    }
}

/// Everything a workbench talks to, shared by every workbench it builds so
/// a second one behaves like the same host after a restart.
pub struct Host {
    pub dir: TempDir,
    pub db: Database,
    pub spawner: Arc<FakeSpawner>,
    pub signaller: Arc<FakeSignaller>,
    pub viewport: RecordingViewport,
    pub chrome: Arc<RecordingChrome>,
}

impl Host {
    fn with_spawner(spawner: FakeSpawner) -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            db: Database::open_in_memory().unwrap(),
            spawner: Arc::new(spawner),
            signaller: Arc::new(FakeSignaller::default()),
            viewport: RecordingViewport::default(),
            chrome: Arc::new(RecordingChrome::default()),
        }
    }

    pub fn new() -> Self {
        Self::with_spawner(FakeSpawner::new(false))
    }

    pub fn failing() -> Self {
        Self::with_spawner(FakeSpawner::new(true))
    }

    pub fn workbench(&self) -> Workbench {
        let mut config = Config::new(self.dir.path().join("data"));
        config.launcher_path = self.dir.path().join("bin/browser");

        let viewport = self.viewport.clone();
        let factory: ViewportFactory =
            Arc::new(move |_name: &str| Box::new(viewport.clone()) as Box<dyn Viewport>);

        Workbench::with_parts(
            config,
            self.db.clone(),
            self.spawner.clone(),
            self.signaller.clone(),
            factory,
            self.chrome.clone(),
        )
    }
}
