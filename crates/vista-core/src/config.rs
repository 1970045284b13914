//! Workbench configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use vista_process::ServerOptions;
use vista_tabs::ControllerOptions;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Admin server launched for database files
    pub admin_program: String,
    /// Arguments placed before the database path
    pub admin_args: Vec<String>,
    /// File extensions opened through the admin server
    pub database_extensions: Vec<String>,
    /// Wait after a server reports its URL before navigating to it
    pub settle_delay_ms: u64,
    /// How long a server may take to print its URL
    pub discovery_timeout_secs: u64,
    /// Output of detached servers, one file per served resource
    pub log_dir: PathBuf,
    /// Where the shebang launcher is installed
    pub launcher_path: PathBuf,
    pub launcher_version: u32,
    /// Static file server used to serve folders
    pub static_server_program: String,
    pub static_server_port: u16,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        let launcher_path = dirs::home_dir()
            .map(|h| h.join("bin/browser"))
            .unwrap_or_else(|| data_dir.join("bin/browser"));

        Self {
            database_path: data_dir.join("vista.db"),
            admin_program: "phpliteadmin".to_string(),
            admin_args: vec!["--url-only".to_string()],
            database_extensions: ["db", "db3", "sqlite", "sqlite3"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            settle_delay_ms: 1000,
            discovery_timeout_secs: 15,
            log_dir: data_dir.join("logs"),
            launcher_path,
            launcher_version: 1,
            static_server_program: "http-server".to_string(),
            static_server_port: 8081,
        }
    }

    /// Load a JSON config file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("vista"))
            .unwrap_or_else(|| PathBuf::from(".vista"))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    pub fn server_options(&self) -> ServerOptions {
        ServerOptions {
            program: self.admin_program.clone(),
            args: self.admin_args.clone(),
            discovery_timeout: self.discovery_timeout(),
            log_dir: Some(self.log_dir.clone()),
        }
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            settle_delay: self.settle_delay(),
        }
    }

    pub fn is_database(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.database_extensions.iter().any(|known| known == ext))
            .unwrap_or(false)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        std::env::var("HOME").ok().map(PathBuf::from)
    }

    pub fn data_local_dir() -> Option<PathBuf> {
        std::env::var("XDG_DATA_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| home_dir().map(|h| h.join(".local/share")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_extensions() {
        let config = Config::new(PathBuf::from("/tmp/vista"));
        assert!(config.is_database(Path::new("/work/db.sqlite")));
        assert!(config.is_database(Path::new("shop.db3")));
        assert!(!config.is_database(Path::new("index.html")));
        assert!(!config.is_database(Path::new("sqlite")));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vista.json");
        std::fs::write(&path, r#"{ "admin_program": "adminer", "settle_delay_ms": 250 }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.admin_program, "adminer");
        assert_eq!(config.settle_delay(), Duration::from_millis(250));
        assert_eq!(config.static_server_port, 8081);
        assert_eq!(config.server_options().args, vec!["--url-only"]);
        assert_eq!(config.server_options().log_dir, Some(Config::data_dir().join("logs")));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vista.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Config::from_file(&path), Err(CoreError::Config(_))));
    }
}
