//! Shebang launcher
//!
//! Installs a small `browser` script so HTML files can be made executable
//! with `#!/usr/bin/env browser` and open straight into a tab.

use std::fs;
use std::path::Path;

use vista_storage::Database;

use crate::error::CoreError;
use crate::Result;

/// Settings key holding the installed launcher version
pub const LAUNCHER_VERSION_KEY: &str = "launcher_version";

pub const LAUNCHER_SCRIPT: &str = r#"#!/bin/sh
# Opens files in a vista tab. Usable as an interpreter line:
#   #!/usr/bin/env browser
if [ "$#" -eq 0 ]; then
    echo "Usage: browser <file>..." >&2
    exit 1
fi
exec vista open --cwd "$PWD" "$@"
"#;

/// Write the launcher unless an up-to-date copy is already installed.
///
/// Returns whether the script was (re)written.
pub(crate) fn install(db: &Database, path: &Path, version: u32) -> Result<bool> {
    let recorded = db
        .get_setting(LAUNCHER_VERSION_KEY)?
        .and_then(|v| v.parse::<u32>().ok());

    if path.exists() && recorded.map_or(false, |v| v >= version) {
        tracing::debug!(path = %path.display(), version, "Launcher up to date");
        return Ok(false);
    }

    write_script(path).map_err(|source| CoreError::Install {
        path: path.to_path_buf(),
        source,
    })?;

    db.set_setting(LAUNCHER_VERSION_KEY, &version.to_string())?;

    tracing::info!(path = %path.display(), version, "Installed launcher");

    Ok(true)
}

fn write_script(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, LAUNCHER_SCRIPT)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}
