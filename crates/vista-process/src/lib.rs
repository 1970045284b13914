//! Vista Backing Processes
//!
//! A database tab is served by an external admin server. This crate starts
//! that server with its output going to a log file, recovers its URL from
//! that output, and later asks the OS to end its process group by pid. No
//! in-memory child handle is ever kept, so a pid recorded before a host
//! restart is exactly as stoppable as a fresh one.

mod error;
mod extractor;
mod server;
mod signal;
mod spawner;

pub use error::ProcessError;
pub use extractor::{discover_url, UrlExtractor};
pub use server::{ServerEndpoint, ServerOptions, ServerSession};
pub use signal::{ProcessSignaller, SystemSignaller};
pub use spawner::{forward_output, OutputStream, ProcessSpawner, SpawnOptions, SpawnedProcess, SystemSpawner};

pub type Result<T> = std::result::Result<T, ProcessError>;
