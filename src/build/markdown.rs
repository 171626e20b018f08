//! Markdown rendering.

use pulldown_cmark::{Options, Parser, html};

use crate::config::MarkdownConfig;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// Raw HTML produced from Markdown. Not safe to embed until it has been
/// through the sanitizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFragment(String);

impl RenderedFragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Translate configured extension names into pulldown-cmark options.
pub fn markdown_options(markdown_config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &markdown_config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

/// Render Markdown source to HTML using pulldown-cmark.
///
/// Never fails: invalid UTF-8 is replaced with U+FFFD and anything the
/// parser does not recognize comes out as literal text.
pub fn render_markdown(source: &[u8], options: Options) -> RenderedFragment {
    let markdown = String::from_utf8_lossy(source);
    let parser = Parser::new_ext(&markdown, options);

    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, parser);

    RenderedFragment(html_output)
}
