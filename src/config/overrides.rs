//! Command line overrides layered on top of the loaded config.

use std::path::PathBuf;

use super::{Config, Placement};

/// Settings given on the command line. `None`/`false` leaves the config value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub title: Option<String>,
    pub template: Option<PathBuf>,
    pub placement: Option<Placement>,
    pub output: Option<PathBuf>,
    pub skip_preview: bool,
}

impl Config {
    /// Apply command line overrides, consuming the loaded config.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(title) = overrides.title {
            self.title = title;
            // An explicit title always wins over a derived one
            self.title_from_file = false;
        }
        if let Some(template) = overrides.template {
            self.template.path = Some(template);
        }
        if let Some(placement) = overrides.placement {
            self.output.placement = placement;
        }
        if let Some(output) = overrides.output {
            self.output.path = Some(output);
        }
        if overrides.skip_preview {
            self.preview.skip = true;
        }
        self
    }
}
