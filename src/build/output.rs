//! Output placement and writing.
//!
//! A rendered document goes to one of three places:
//! - a fresh temporary file (`mdp*.html` in the system temp directory)
//! - a file derived from the input name (`notes.md` -> `notes.md.html`)
//! - an explicit path given by the caller
//!
//! Only temporary files are considered disposable after preview.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::config::{OutputConfig, Placement};

const TEMP_PREFIX: &str = "mdp";
const HTML_SUFFIX: &str = ".html";

#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("failed to create temporary file: {0}")]
    CreateTemp(std::io::Error),

    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("input path has no file name: {}", .0.display())]
    NoFileName(PathBuf),
}

/// Where the output file should be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// A new uniquely named file in the system temp directory
    Temp,
    /// `<input file name>.html` inside the given directory
    Derived { dir: PathBuf },
    /// Exactly this path
    Explicit(PathBuf),
}

impl OutputTarget {
    /// Pick the target from the output config. An explicit path wins over
    /// the placement policy.
    pub fn from_config(output: &OutputConfig) -> Self {
        if let Some(path) = &output.path {
            return OutputTarget::Explicit(path.clone());
        }
        match output.placement {
            Placement::Temp => OutputTarget::Temp,
            Placement::Derived => OutputTarget::Derived {
                dir: output.dir.clone().unwrap_or_else(|| PathBuf::from(".")),
            },
        }
    }
}

/// A written output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    /// Whether the file may be removed once it has been previewed
    pub temporary: bool,
}

/// Output file name for an input: its base name with `.html` appended.
///
/// ```ignore
/// derived_file_name("docs/notes.md") => "notes.md.html"
/// ```
pub fn derived_file_name(input: &Path) -> Result<PathBuf, OutputError> {
    let name = input
        .file_name()
        .ok_or_else(|| OutputError::NoFileName(input.to_path_buf()))?;

    let mut name = name.to_os_string();
    name.push(HTML_SUFFIX);
    Ok(PathBuf::from(name))
}

/// Write `html` to the location chosen by `target`.
///
/// Either the whole document is written and its path returned, or no file is
/// left at the output path: a temporary file is removed, and a file that was
/// opened for writing but not completely written is removed as well.
pub async fn write_output(
    html: &[u8],
    target: &OutputTarget,
    input: &Path,
) -> Result<OutputFile, OutputError> {
    let (path, temporary) = match target {
        OutputTarget::Temp => (create_temp_file()?, true),
        OutputTarget::Derived { dir } => {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| OutputError::CreateDir {
                    path: dir.clone(),
                    source,
                })?;
            (dir.join(derived_file_name(input)?), false)
        }
        OutputTarget::Explicit(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| OutputError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
            (path.clone(), false)
        }
    };

    if let Err(source) = save_html(&path, html).await {
        if temporary {
            let _ = tokio::fs::remove_file(&path).await;
        }
        return Err(OutputError::Write { path, source });
    }

    tracing::debug!(path = %path.display(), temporary, "wrote output");
    Ok(OutputFile { path, temporary })
}

/// Reserve a uniquely named `mdp*.html` file that outlives this process.
fn create_temp_file() -> Result<PathBuf, OutputError> {
    let file = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(HTML_SUFFIX)
        .tempfile()
        .map_err(OutputError::CreateTemp)?;

    let (_, path) = file.keep().map_err(|e| OutputError::CreateTemp(e.error))?;
    Ok(path)
}

/// Write the file readable by everyone and writable by the owner.
///
/// A regular file that was created or truncated but could not be finished is
/// removed before the error is returned.
async fn save_html(path: &Path, html: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;

    if let Err(err) = fill(&mut file, html).await {
        drop(file);
        remove_partial(path).await;
        return Err(err);
    }

    Ok(())
}

async fn fill(file: &mut tokio::fs::File, html: &[u8]) -> std::io::Result<()> {
    file.write_all(html).await?;
    file.flush().await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o644)).await?;
    }

    Ok(())
}

/// Remove a half-written output. Devices and other special files are kept.
async fn remove_partial(path: &Path) {
    let is_file = tokio::fs::symlink_metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file());
    if !is_file {
        return;
    }
    if let Err(err) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %err, "failed to remove partial output");
    }
}
