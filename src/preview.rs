//! Opening rendered documents in the system's default browser.

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum PreviewError {
    #[error("OS not supported: {0}")]
    UnsupportedPlatform(String),

    #[error("could not find '{program}' on PATH: {source}")]
    NotFound {
        program: String,
        source: which::Error,
    },

    #[error("failed to launch {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("{} exited with {status}", program.display())]
    Failed { program: PathBuf, status: ExitStatus },
}

// =============================================================================
// Opener table
// =============================================================================

/// The command that opens a file with the desktop's default application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opener {
    pub program: &'static str,
    /// Arguments placed before the file path
    pub args: &'static [&'static str],
}

const XDG_OPEN: Opener = Opener {
    program: "xdg-open",
    args: &[],
};

/// Opener per operating system, keyed by [`std::env::consts::OS`].
pub const OPENERS: &[(&str, Opener)] = &[
    ("linux", XDG_OPEN),
    ("freebsd", XDG_OPEN),
    ("netbsd", XDG_OPEN),
    ("openbsd", XDG_OPEN),
    ("dragonfly", XDG_OPEN),
    (
        "macos",
        Opener {
            program: "open",
            args: &[],
        },
    ),
    (
        "windows",
        Opener {
            program: "cmd.exe",
            args: &["/C", "start"],
        },
    ),
];

/// Look up the opener for an operating system.
pub fn opener_for(os: &str) -> Result<Opener, PreviewError> {
    OPENERS
        .iter()
        .find(|(name, _)| *name == os)
        .map(|(_, opener)| *opener)
        .ok_or_else(|| PreviewError::UnsupportedPlatform(os.to_string()))
}

impl Opener {
    /// Full argument list for opening `path`.
    pub fn args_for(&self, path: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(OsString::from)
            .chain(std::iter::once(path.as_os_str().to_os_string()))
            .collect()
    }
}

// =============================================================================
// Previewers
// =============================================================================

/// Something that can show a rendered file to the user.
pub trait Previewer {
    fn preview(&self, path: &Path) -> impl Future<Output = Result<(), PreviewError>>;
}

/// Opens files with the platform's opener, found on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemPreviewer {
    os: String,
    /// Directories searched instead of `PATH`
    search_path: Option<OsString>,
}

impl SystemPreviewer {
    /// A previewer for the operating system this binary was built for.
    pub fn new() -> Self {
        Self::for_os(std::env::consts::OS)
    }

    pub fn for_os(os: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            search_path: None,
        }
    }

    /// Look for the opener in these directories rather than `PATH`.
    #[cfg(test)]
    pub fn with_search_path(mut self, paths: impl Into<OsString>) -> Self {
        self.search_path = Some(paths.into());
        self
    }

    fn locate(&self, program: &str) -> Result<PathBuf, PreviewError> {
        let found = match &self.search_path {
            Some(paths) => which::which_in(program, Some(paths), Path::new(".")),
            None => which::which(program),
        };
        found.map_err(|source| PreviewError::NotFound {
            program: program.to_string(),
            source,
        })
    }
}

impl Default for SystemPreviewer {
    fn default() -> Self {
        Self::new()
    }
}

impl Previewer for SystemPreviewer {
    async fn preview(&self, path: &Path) -> Result<(), PreviewError> {
        let opener = opener_for(&self.os)?;
        let program = self.locate(opener.program)?;

        tracing::info!(program = %program.display(), path = %path.display(), "opening preview");

        // stdout stays reserved for the output path
        let status = tokio::process::Command::new(&program)
            .args(opener.args_for(path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .await
            .map_err(|source| PreviewError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(PreviewError::Failed { program, status });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opener_table() {
        assert_eq!(opener_for("linux").unwrap().program, "xdg-open");
        assert_eq!(opener_for("freebsd").unwrap().program, "xdg-open");
        assert_eq!(opener_for("macos").unwrap().program, "open");

        let windows = opener_for("windows").unwrap();
        assert_eq!(windows.program, "cmd.exe");
        assert_eq!(windows.args, &["/C", "start"]);
    }

    #[test]
    fn test_unsupported_platform() {
        let err = opener_for("plan9").unwrap_err();

        assert!(matches!(err, PreviewError::UnsupportedPlatform(ref os) if os == "plan9"));
        assert_eq!(err.to_string(), "OS not supported: plan9");
    }

    #[test]
    fn test_args_for_appends_path() {
        let args = opener_for("windows")
            .unwrap()
            .args_for(Path::new("/tmp/mdp1.html"));

        assert_eq!(
            args,
            vec![
                OsString::from("/C"),
                OsString::from("start"),
                OsString::from("/tmp/mdp1.html")
            ]
        );
        assert_eq!(
            XDG_OPEN.args_for(Path::new("a.html")),
            vec![OsString::from("a.html")]
        );
    }

    #[tokio::test]
    async fn test_system_previewer_rejects_unknown_os() {
        let result = SystemPreviewer::for_os("plan9")
            .preview(Path::new("a.html"))
            .await;

        assert!(matches!(result, Err(PreviewError::UnsupportedPlatform(_))));
    }

    #[tokio::test]
    async fn test_missing_opener_is_not_found() {
        let empty = tempfile::tempdir().unwrap();

        let result = SystemPreviewer::for_os("linux")
            .with_search_path(empty.path())
            .preview(Path::new("a.html"))
            .await;

        match result {
            Err(PreviewError::NotFound { program, .. }) => assert_eq!(program, "xdg-open"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    /// A directory holding an `xdg-open` shell script with the given body.
    #[cfg(unix)]
    fn fake_opener(script: &str) -> tempfile::TempDir {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xdg-open");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        dir
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_opener_nonzero_exit_is_failed() {
        let bin = fake_opener("#!/bin/sh\nexit 3\n");

        let result = SystemPreviewer::for_os("linux")
            .with_search_path(bin.path())
            .preview(Path::new("a.html"))
            .await;

        match result {
            Err(PreviewError::Failed { program, status }) => {
                assert_eq!(program, bin.path().join("xdg-open"));
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_opener_that_cannot_start_is_spawn_error() {
        let bin = fake_opener("#!/nonexistent/interpreter\n");

        let result = SystemPreviewer::for_os("linux")
            .with_search_path(bin.path())
            .preview(Path::new("a.html"))
            .await;

        assert!(matches!(result, Err(PreviewError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_opener_receives_path() {
        let bin = fake_opener("#!/bin/sh\n[ \"$1\" = /tmp/page.html ] || exit 1\necho ignored\n");

        let result = SystemPreviewer::for_os("linux")
            .with_search_path(bin.path())
            .preview(Path::new("/tmp/page.html"))
            .await;

        assert!(result.is_ok(), "{result:?}");
    }
}
