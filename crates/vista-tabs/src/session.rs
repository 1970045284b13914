//! Session record
//!
//! What a tab shows and which process serves it. Serialized flat as
//! `{content, path, pid, url}` and round-tripped verbatim by the host.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use vista_process::ServerEndpoint;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Which of the mutually exclusive display modes a session describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionMode {
    Empty,
    /// Raw document, no process
    Content,
    /// Resource path known, no server yet
    AwaitingServer,
    /// Resource path served at `url` by `pid`
    Serving,
}

impl SessionState {
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> SessionMode {
        if self.server().is_some() {
            SessionMode::Serving
        } else if self.content.is_some() {
            SessionMode::Content
        } else if self.path.is_some() {
            SessionMode::AwaitingServer
        } else {
            SessionMode::Empty
        }
    }

    /// Resource this session is about, used to decide tab reuse
    pub fn resource(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn server(&self) -> Option<ServerEndpoint> {
        match (&self.url, self.pid) {
            (Some(url), Some(pid)) => Some(ServerEndpoint {
                url: url.clone(),
                pid,
            }),
            _ => None,
        }
    }

    pub(crate) fn attach_server(&mut self, endpoint: &ServerEndpoint) {
        self.url = Some(endpoint.url.clone());
        self.pid = Some(endpoint.pid);
    }

    /// Drop a url/pid pair where only one half is present
    pub(crate) fn normalized(mut self) -> Self {
        if self.url.is_some() != self.pid.is_some() {
            tracing::warn!(url = ?self.url, pid = ?self.pid, "Discarding half-recorded server");
            self.url = None;
            self.pid = None;
        }
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "content": self.content,
            "path": self.path,
            "pid": self.pid,
            "url": self.url,
        })
    }

    pub fn from_json(value: serde_json::Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}
