//! Launcher installation
use anyhow::Result;

use crate::state::AppState;

pub fn install(state: &AppState) -> Result<()> {
    let path = &state.workbench().config().launcher_path;

    if state.workbench().install_launcher()? {
        println!("Installed launcher at {}", path.display());
        println!("Start HTML files with `#!/usr/bin/env browser` to open them in a tab.");
    } else {
        println!("Launcher at {} is up to date", path.display());
    }

    Ok(())
}
