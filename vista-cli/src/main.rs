//! Vista CLI
//!
//! Headless host for HTML documents and database admin tabs. Tabs and the
//! servers behind them outlive a single invocation: every command restores
//! the tabs recorded by earlier ones.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vista_core::Config;

mod commands;
mod host;
mod state;

use state::AppState;

#[derive(Parser)]
#[command(name = "vista")]
#[command(author, version, about = "HTML and database tabs backed by local servers", long_about = None)]
struct Cli {
    /// JSON config file (defaults apply to missing keys)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open files: databases in the admin tab, anything else as a document
    Open {
        /// Directory relative paths are resolved against
        #[arg(long, value_name = "DIR")]
        cwd: Option<PathBuf>,

        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },

    /// Open a file-tree selection rooted at a workspace
    Select {
        /// Workspace directory the selected paths are rooted at
        #[arg(long, value_name = "DIR")]
        workspace: PathBuf,

        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },

    /// List open tabs
    List,

    /// Reload a tab
    Reload {
        name: String,
    },

    /// Close a tab and stop its server
    Close {
        name: String,
    },

    /// Serve a folder with the static file server
    Serve {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Install the `browser` shebang launcher
    InstallLauncher,
}

#[tokio::main]
async fn main() -> Result<()> {
    vista_core::init_logging();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let state = AppState::new(config).context("Failed to open workbench")?;
    state.initialize().await?;

    match cli.command {
        Commands::Open { cwd, paths } => commands::tabs::open(&state, cwd, paths).await,
        Commands::Select { workspace, paths } => {
            commands::tabs::select(&state, &workspace, paths).await
        }
        Commands::List => commands::tabs::list(&state),
        Commands::Reload { name } => commands::tabs::reload(&state, &name).await,
        Commands::Close { name } => commands::tabs::close(&state, &name),
        Commands::Serve { dir } => commands::serve::serve(&state, &dir).await,
        Commands::InstallLauncher => commands::launcher::install(&state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_open_requires_a_path() {
        assert!(Cli::try_parse_from(["vista", "open"]).is_err());

        let cli = Cli::try_parse_from(["vista", "open", "--cwd", "/work", "db.sqlite"]).unwrap();
        match cli.command {
            Commands::Open { cwd, paths } => {
                assert_eq!(cwd, Some(PathBuf::from("/work")));
                assert_eq!(paths, vec![PathBuf::from("db.sqlite")]);
            }
            _ => panic!("expected open"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["vista", "list", "--config", "vista.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("vista.json")));
        assert!(matches!(cli.command, Commands::List));
    }
}
