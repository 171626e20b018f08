use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{
    build::{
        BuildError, OutputError, OutputFile, OutputTarget, Pipeline, RenderError, SourceDocument,
        write_output,
    },
    config::Config,
    preview::{PreviewError, Previewer},
    util::title_from_path,
};

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("failed to read {}: {source}", path.display())]
    InputRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("failed to report output path: {0}")]
    Report(std::io::Error),

    #[error(transparent)]
    Preview(#[from] PreviewError),
}

/// Render `input` to HTML, write it out, announce the path on `out` and
/// preview it unless previews are disabled.
///
/// `out` receives exactly the output path and a newline, and only after the
/// file has been fully written. A temporary output is removed after the
/// preview has had `preview.grace_period_ms` to open it.
pub async fn run<P: Previewer>(
    config: &Config,
    input: &Path,
    out: &mut impl Write,
    previewer: &P,
) -> Result<OutputFile, RunError> {
    let source = SourceDocument::read(input)
        .await
        .map_err(|source| RunError::InputRead {
            path: input.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %input.display(), bytes = source.bytes.len(), "read input");

    let pipeline = Pipeline::from_config(config).await?;
    let document = pipeline.run(&document_title(config, &source.path), &source)?;

    let target = OutputTarget::from_config(&config.output);
    let output = write_output(document.as_bytes(), &target, &source.path).await?;

    if let Err(err) = writeln!(out, "{}", output.path.display()) {
        discard(&output).await;
        return Err(RunError::Report(err));
    }

    if config.preview.skip {
        tracing::debug!("preview skipped");
        return Ok(output);
    }

    let result = previewer.preview(&output.path).await;

    if output.temporary {
        if launched(&result) {
            // The viewer is not tracked; give it time to read the file
            let grace = Duration::from_millis(config.preview.grace_period_ms);
            tokio::time::sleep(grace).await;
        }
        discard(&output).await;
    }

    result?;
    Ok(output)
}

/// The title configured for `input`.
fn document_title(config: &Config, input: &Path) -> String {
    if config.title_from_file
        && let Some(title) = title_from_path(input)
    {
        return title;
    }
    config.title.clone()
}

/// Whether a viewer process was actually started.
fn launched(result: &Result<(), PreviewError>) -> bool {
    matches!(result, Ok(()) | Err(PreviewError::Failed { .. }))
}

/// Remove a temporary output file. Other outputs are left alone.
async fn discard(output: &OutputFile) {
    if !output.temporary {
        return;
    }
    match tokio::fs::remove_file(&output.path).await {
        Ok(()) => tracing::debug!(path = %output.path.display(), "removed temporary output"),
        Err(err) => {
            tracing::warn!(path = %output.path.display(), error = %err, "failed to remove temporary output")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::config::Placement;

    /// Records the files it was asked to open and whether they existed then.
    #[derive(Default)]
    struct RecordingPreviewer {
        calls: RefCell<Vec<(PathBuf, bool)>>,
        failure: Option<fn() -> PreviewError>,
    }

    impl RecordingPreviewer {
        fn failing(failure: fn() -> PreviewError) -> Self {
            Self {
                failure: Some(failure),
                ..Default::default()
            }
        }
    }

    impl Previewer for RecordingPreviewer {
        async fn preview(&self, path: &Path) -> Result<(), PreviewError> {
            self.calls
                .borrow_mut()
                .push((path.to_path_buf(), path.exists()));
            match self.failure {
                Some(failure) => Err(failure()),
                None => Ok(()),
            }
        }
    }

    #[cfg(unix)]
    fn exited_nonzero() -> PreviewError {
        use std::os::unix::process::ExitStatusExt;

        PreviewError::Failed {
            program: PathBuf::from("xdg-open"),
            status: std::process::ExitStatus::from_raw(1 << 8),
        }
    }

    fn opener_missing() -> PreviewError {
        PreviewError::NotFound {
            program: "xdg-open".to_string(),
            source: which::Error::CannotFindBinaryPath,
        }
    }

    fn write_input(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.preview.grace_period_ms = 0;
        config
    }

    fn reported_path(out: &[u8]) -> PathBuf {
        let text = std::str::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);
        PathBuf::from(text.trim_end_matches('\n'))
    }

    #[tokio::test]
    async fn test_skip_preview_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "doc.md", "# Hello\n");
        let mut config = fast_config();
        config.preview.skip = true;
        let previewer = RecordingPreviewer::default();
        let mut out = Vec::new();

        let output = run(&config, &input, &mut out, &previewer).await.unwrap();

        assert!(previewer.calls.borrow().is_empty());
        assert_eq!(reported_path(&out), output.path);
        assert!(output.path.exists());
        let html = std::fs::read_to_string(&output.path).unwrap();
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<title>Markdown Preview Tool</title>"));

        std::fs::remove_file(&output.path).unwrap();
    }

    #[tokio::test]
    async fn test_preview_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "doc.md", "text");
        let previewer = RecordingPreviewer::default();
        let mut out = Vec::new();

        let output = run(&fast_config(), &input, &mut out, &previewer).await.unwrap();

        let calls = previewer.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (output.path.clone(), true));
        assert!(output.temporary);
        assert!(!output.path.exists());
        assert_eq!(reported_path(&out), output.path);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_preview_still_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "doc.md", "text");
        let previewer = RecordingPreviewer::failing(exited_nonzero);
        let mut out = Vec::new();

        let result = run(&fast_config(), &input, &mut out, &previewer).await;

        assert!(matches!(result, Err(RunError::Preview(PreviewError::Failed { .. }))));
        let path = reported_path(&out);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_opener_removes_temp_file_without_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "doc.md", "text");
        let mut config = Config::default();
        config.preview.grace_period_ms = 600_000;
        let previewer = RecordingPreviewer::failing(opener_missing);
        let mut out = Vec::new();

        let result = tokio::time::timeout(
            Duration::from_secs(30),
            run(&config, &input, &mut out, &previewer),
        )
        .await
        .expect("no viewer was started, so there is nothing to wait for");

        assert!(matches!(result, Err(RunError::Preview(PreviewError::NotFound { .. }))));
        assert_eq!(previewer.calls.borrow().len(), 1);
        let path = reported_path(&out);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_preview_keeps_derived_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "notes.md", "text");
        let mut config = fast_config();
        config.output.placement = Placement::Derived;
        config.output.dir = Some(dir.path().join("out"));
        let previewer = RecordingPreviewer::default();
        let mut out = Vec::new();

        let output = run(&config, &input, &mut out, &previewer).await.unwrap();

        assert_eq!(output.path, dir.path().join("out/notes.md.html"));
        assert!(!output.temporary);
        assert_eq!(previewer.calls.borrow().len(), 1);
        assert!(output.path.exists());
    }

    #[tokio::test]
    async fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fast_config();
        config.output.path = Some(dir.path().join("out.html"));
        let previewer = RecordingPreviewer::default();
        let mut out = Vec::new();

        let result = run(&config, &dir.path().join("missing.md"), &mut out, &previewer).await;

        assert!(matches!(result, Err(RunError::InputRead { .. })));
        assert!(out.is_empty());
        assert!(!dir.path().join("out.html").exists());
        assert!(previewer.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_broken_template_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "doc.md", "text");
        let template = write_input(dir.path(), "page.html", "{{ title ");
        let mut config = fast_config();
        config.template.path = Some(template);
        config.output.path = Some(dir.path().join("out.html"));
        let previewer = RecordingPreviewer::default();
        let mut out = Vec::new();

        let result = run(&config, &input, &mut out, &previewer).await;

        match result {
            Err(RunError::Build(BuildError::Render(err))) => assert!(err.is_load_error()),
            other => panic!("expected template load error, got {other:?}"),
        }
        assert!(out.is_empty());
        assert!(!dir.path().join("out.html").exists());
    }

    #[tokio::test]
    async fn test_title_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "release-notes.md", "text");
        let mut config = fast_config();
        config.title_from_file = true;
        config.preview.skip = true;
        config.output.path = Some(dir.path().join("out.html"));
        let mut out = Vec::new();

        run(&config, &input, &mut out, &RecordingPreviewer::default())
            .await
            .unwrap();

        let html = std::fs::read_to_string(dir.path().join("out.html")).unwrap();
        assert!(html.contains("<title>Release Notes</title>"));
    }

    #[tokio::test]
    async fn test_same_input_same_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "doc.md", "# A\n\n| x |\n|---|\n| 1 |\n");
        let mut config = fast_config();
        config.preview.skip = true;

        let mut outputs = Vec::new();
        for name in ["one.html", "two.html"] {
            config.output.path = Some(dir.path().join(name));
            let mut out = Vec::new();
            let output = run(&config, &input, &mut out, &RecordingPreviewer::default())
                .await
                .unwrap();
            outputs.push(std::fs::read(output.path).unwrap());
        }

        assert_eq!(outputs[0], outputs[1]);
    }
}
