//! Open-request helpers

use std::path::{Path, PathBuf};

const SHEBANG: &str = "#!/usr/bin/env browser";

/// Remove a leading `#!/usr/bin/env browser` line, newline included.
pub fn strip_shebang(text: &str) -> &str {
    let (first, rest) = match text.find('\n') {
        Some(end) => (&text[..end], &text[end + 1..]),
        None => (text, ""),
    };

    if first.trim_end() == SHEBANG {
        rest
    } else {
        text
    }
}

/// Join a relative `path` onto `cwd`; absolute paths pass through.
pub(crate) fn resolve(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// File-tree paths are rooted at the workspace, not the filesystem.
pub(crate) fn workspace_path(workspace: &Path, tree_path: &Path) -> PathBuf {
    match tree_path.strip_prefix("/") {
        Ok(relative) => workspace.join(relative),
        Err(_) => workspace.join(tree_path),
    }
}

/// Tab title for a content file
pub(crate) fn title_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_shebang() {
        assert_eq!(
            strip_shebang("#!/usr/bin/env browser\n<html></html>\n"),
            "<html></html>\n"
        );
        assert_eq!(strip_shebang("#!/usr/bin/env browser  \r\n<p/>"), "<p/>");
        assert_eq!(strip_shebang("#!/usr/bin/env browser"), "");
    }

    #[test]
    fn test_other_first_lines_are_kept() {
        assert_eq!(strip_shebang("#!/bin/sh\necho"), "#!/bin/sh\necho");
        assert_eq!(strip_shebang("<p>#!/usr/bin/env browser</p>"), "<p>#!/usr/bin/env browser</p>");
        assert_eq!(strip_shebang(""), "");
    }

    #[test]
    fn test_resolve_paths() {
        let cwd = Path::new("/home/ubuntu/project");
        assert_eq!(resolve(cwd, Path::new("db.sqlite")), PathBuf::from("/home/ubuntu/project/db.sqlite"));
        assert_eq!(resolve(cwd, Path::new("/srv/db.sqlite")), PathBuf::from("/srv/db.sqlite"));
        assert_eq!(
            workspace_path(Path::new("/home/ubuntu/workspace"), Path::new("/pset7/finance.db")),
            PathBuf::from("/home/ubuntu/workspace/pset7/finance.db")
        );
    }

    #[test]
    fn test_title_for() {
        assert_eq!(title_for(Path::new("/work/hello.html")), "hello.html");
    }
}
