//! Folder serving
use std::path::Path;

use anyhow::Result;

use crate::state::AppState;

pub async fn serve(state: &AppState, dir: &Path) -> Result<()> {
    let endpoint = state.workbench().serve_directory(dir).await?;

    println!("Serving {} at {}", dir.display(), endpoint.url);
    println!("  pid: {} (stop with: kill -HUP -{})", endpoint.pid, endpoint.pid);

    Ok(())
}
