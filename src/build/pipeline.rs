//! Build pipeline for a single document.
//!
//! The pipeline transforms a document through a fixed series of stages:
//! 1. Markdown rendering (source bytes to raw HTML)
//! 2. Sanitizing (raw HTML to safe HTML)
//! 3. Template rendering (page template wrapper)
//!
//! The stage order is fixed. Each stage produces a distinct type and the
//! templater only accepts a [`SafeFragment`], so a fragment cannot reach
//! the template without being sanitized.

mod document;

pub use document::{RenderedDocument, SourceDocument};

use pulldown_cmark::Options;

use crate::config::Config;

use super::markdown::{RenderedFragment, markdown_options, render_markdown};
use super::render::{DocumentView, RenderError, Templater};
use super::sanitize::{SafeFragment, Sanitizer};
use super::BuildError;

/// The document processing pipeline: markdown → sanitize → template.
pub struct Pipeline {
    options: Options,
    sanitizer: Sanitizer,
    templater: Templater,
}

impl Pipeline {
    pub fn new(options: Options, sanitizer: Sanitizer, templater: Templater) -> Self {
        Self {
            options,
            sanitizer,
            templater,
        }
    }

    /// Create the pipeline described by the config.
    ///
    /// Loads the custom template if one is configured, otherwise compiles the
    /// configured skeleton.
    pub async fn from_config(config: &Config) -> Result<Self, BuildError> {
        let options = markdown_options(&config.markdown)?;
        let templater = match &config.template.path {
            Some(path) => {
                tracing::debug!(template = %path.display(), "loading custom template");
                Templater::load(path).await?
            }
            None => Templater::from_skeleton(&config.template.skeleton)?,
        };

        Ok(Self::new(options, Sanitizer::ugc(), templater))
    }

    /// Run the document through every stage.
    pub fn run(
        &self,
        title: &str,
        source: &SourceDocument,
    ) -> Result<RenderedDocument, RenderError> {
        let rendered = self.render(source);
        let safe = self.sanitize(&rendered);
        self.template(title, &safe)
    }

    fn render(&self, source: &SourceDocument) -> RenderedFragment {
        let rendered = render_markdown(&source.bytes, self.options);
        tracing::debug!(bytes = rendered.as_str().len(), "rendered markdown");
        rendered
    }

    fn sanitize(&self, rendered: &RenderedFragment) -> SafeFragment {
        let safe = self.sanitizer.clean(rendered);
        tracing::debug!(bytes = safe.as_str().len(), "sanitized html");
        safe
    }

    fn template(&self, title: &str, safe: &SafeFragment) -> Result<RenderedDocument, RenderError> {
        let html = self.templater.render_page(&DocumentView::new(title, safe))?;
        tracing::debug!(bytes = html.len(), "applied page template");
        Ok(RenderedDocument { html })
    }
}
