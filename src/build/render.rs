use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};

use super::sanitize::SafeFragment;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to read template {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse template {name}: {source}")]
    TemplateParse { name: String, source: tera::Error },

    #[error("failed to render template {name}: {source}")]
    TemplateExecution { name: String, source: tera::Error },
}

impl RenderError {
    /// Whether the template could not be loaded at all, as opposed to
    /// failing while substituting values.
    #[cfg(test)]
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            RenderError::TemplateRead { .. } | RenderError::TemplateParse { .. }
        )
    }
}

/// Name the built-in skeleton is registered under.
const DEFAULT_TEMPLATE_NAME: &str = "default";

/// Values available to the page template as `title` and `body`.
#[derive(Debug, Serialize)]
pub struct DocumentView<'a> {
    /// HTML-escaped document title
    pub title: String,
    /// Sanitized HTML, inserted as-is
    pub body: &'a str,
}

impl<'a> DocumentView<'a> {
    pub fn new(title: &str, body: &'a SafeFragment) -> Self {
        Self {
            title: tera::escape_html(title),
            body: body.as_str(),
        }
    }
}

/// The page template renderer, wrapping Tera.
///
/// Autoescaping is off: the title is escaped when the view is built and the
/// body is already sanitized, so templates use plain `{{ title }}` and
/// `{{ body }}`.
pub struct Templater {
    tera: Tera,
    name: String,
}

impl Templater {
    /// Compile a template from source text.
    pub fn compile(name: &str, source: &str) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(name, source)
            .map_err(|source| RenderError::TemplateParse {
                name: name.to_string(),
                source,
            })?;

        Ok(Self {
            tera,
            name: name.to_string(),
        })
    }

    /// Compile the built-in skeleton supplied by the config.
    pub fn from_skeleton(skeleton: &str) -> Result<Self, RenderError> {
        Self::compile(DEFAULT_TEMPLATE_NAME, skeleton)
    }

    /// Load and compile a custom template file.
    pub async fn load(path: &Path) -> Result<Self, RenderError> {
        let source =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| RenderError::TemplateRead {
                    path: path.to_path_buf(),
                    source,
                })?;

        Self::compile(&path.display().to_string(), &source)
    }

    /// Render a complete document.
    pub fn render_page(&self, view: &DocumentView) -> Result<String, RenderError> {
        let context = Context::from_serialize(view).map_err(|source| {
            RenderError::TemplateExecution {
                name: self.name.clone(),
                source,
            }
        })?;

        self.tera
            .render(&self.name, &context)
            .map_err(|source| RenderError::TemplateExecution {
                name: self.name.clone(),
                source,
            })
    }
}
