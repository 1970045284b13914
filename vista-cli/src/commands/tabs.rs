//! Tab commands
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use vista_core::{OpenOutcome, SessionMode, SurfaceState, Tab};

use super::print_json;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TabInfo {
    pub name: String,
    pub title: String,
    pub mode: SessionMode,
    pub surface: SurfaceState,
    pub path: Option<PathBuf>,
    pub url: Option<String>,
    pub pid: Option<u32>,
    pub focused: bool,
}

impl TabInfo {
    fn new(tab: &Tab, focused: bool) -> Self {
        let snapshot = tab.snapshot();
        Self {
            name: tab.name.clone(),
            title: tab.title.clone(),
            mode: snapshot.mode(),
            surface: tab.controller.surface_state(),
            path: snapshot.path,
            url: snapshot.url,
            pid: snapshot.pid,
            focused,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OpenedTab {
    /// "focused", "opened" or "replaced"
    pub outcome: &'static str,
    #[serde(flatten)]
    pub tab: TabInfo,
}

impl From<&OpenOutcome> for OpenedTab {
    fn from(outcome: &OpenOutcome) -> Self {
        let label = match outcome {
            OpenOutcome::Focused(_) => "focused",
            OpenOutcome::Opened(_) => "opened",
            OpenOutcome::Replaced(_) => "replaced",
        };
        Self {
            outcome: label,
            tab: TabInfo::new(outcome.tab(), true),
        }
    }
}

/// Describe opened tabs as they are after settling
fn describe(state: &AppState, outcomes: &[OpenOutcome]) -> Vec<OpenedTab> {
    let focused = state.workbench().registry().focused().map(|t| t.name);
    outcomes
        .iter()
        .map(|outcome| {
            let mut opened = OpenedTab::from(outcome);
            opened.tab.focused = focused.as_deref() == Some(opened.tab.name.as_str());
            opened
        })
        .collect()
}

pub async fn open(state: &AppState, cwd: Option<PathBuf>, paths: Vec<PathBuf>) -> Result<()> {
    let cwd = match cwd {
        Some(cwd) => cwd,
        None => std::env::current_dir().context("Could not determine working directory")?,
    };

    let mut outcomes = Vec::new();
    for path in paths {
        let args = [cwd.display().to_string(), path.display().to_string()];
        let outcome = state
            .workbench()
            .exec_open(&args)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        outcomes.push(outcome);
    }

    state.settle().await?;
    print_json(&describe(state, &outcomes))
}

pub async fn select(state: &AppState, workspace: &Path, paths: Vec<PathBuf>) -> Result<()> {
    let selection = state.workbench().open_selection(workspace, &paths)?;

    state.settle().await?;

    for path in &selection.skipped {
        eprintln!("Skipped {}", path.display());
    }

    let mut outcomes = selection.content;
    outcomes.extend(selection.database);
    print_json(&describe(state, &outcomes))
}

pub fn list(state: &AppState) -> Result<()> {
    let focused = state.workbench().registry().focused().map(|t| t.name);
    let tabs: Vec<TabInfo> = state
        .workbench()
        .registry()
        .list()
        .iter()
        .map(|tab| TabInfo::new(tab, focused.as_deref() == Some(tab.name.as_str())))
        .collect();

    print_json(&tabs)
}

pub async fn reload(state: &AppState, name: &str) -> Result<()> {
    let tab = state.workbench().reload_tab(name)?;
    state.settle().await?;
    print_json(&TabInfo::new(&tab, true))
}

pub fn close(state: &AppState, name: &str) -> Result<()> {
    state.workbench().close_tab(name)?;
    println!("Closed {}", name);
    Ok(())
}
