//! Configuration type definitions.
//!
//! This module contains the data structures read from `mdp.yaml`.
//! These types are pure data - no I/O or complex logic.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Title used when neither the config nor the command line provides one.
pub const DEFAULT_TITLE: &str = "Markdown Preview Tool";

/// The built-in page skeleton. `title` is already HTML-escaped when it reaches
/// the template and `body` is the sanitized fragment.
pub const DEFAULT_SKELETON: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta http-equiv="content-type" content="text/html; charset=utf-8">
    <title>{{ title }}</title>
</head>
<body>
{{ body }}
</body>
</html>"#;

// =============================================================================
// Top-level config
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Document title placed in the `<title>` element
    #[serde(default = "default_title")]
    pub title: String,
    /// Derive the title from the input file name instead of `title`
    #[serde(default)]
    pub title_from_file: bool,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default)]
    pub template: TemplateConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: default_title(),
            title_from_file: false,
            markdown: MarkdownConfig::default(),
            template: TemplateConfig::default(),
            output: OutputConfig::default(),
            preview: PreviewConfig::default(),
        }
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// pulldown-cmark extensions to enable
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    vec![
        "tables".to_string(),
        "strikethrough".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

// =============================================================================
// Template configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Custom template file. When set, `skeleton` is ignored.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Template source used when no custom template is given
    #[serde(default = "default_skeleton")]
    pub skeleton: String,
}

fn default_skeleton() -> String {
    DEFAULT_SKELETON.to_string()
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: None,
            skeleton: default_skeleton(),
        }
    }
}

// =============================================================================
// Output configuration
// =============================================================================

/// Where the rendered document is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// A fresh `mdp*.html` file in the system temp directory, removed after preview
    #[default]
    Temp,
    /// `<input file name>.html` in `output.dir`, kept after preview
    Derived,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub placement: Placement,
    /// Directory for derived output (defaults to the current directory)
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Exact output file; overrides `placement`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Preview configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Do not launch the browser; the output file is kept
    #[serde(default)]
    pub skip: bool,
    /// How long to wait after launching the viewer before removing a temp file.
    /// The viewer process is not tracked, so this is a best-effort delay.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
}

fn default_grace_period_ms() -> u64 {
    2000
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            skip: false,
            grace_period_ms: default_grace_period_ms(),
        }
    }
}
