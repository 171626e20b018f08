//! Configuration loading and types for mdp.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)
//! - Applying command line overrides (`overrides`)

mod load;
mod overrides;
mod types;

pub use overrides::Overrides;
pub use types::{Config, MarkdownConfig, OutputConfig, Placement};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "mdp.yaml";

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("config path is not valid UTF-8: {0}")]
    EncodePath(std::path::PathBuf),

    #[error("invalid markdown configuration: {0}")]
    Markdown(#[from] crate::build::MarkdownError),
}
