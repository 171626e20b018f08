//! Configuration loading from files and the environment.

use std::path::Path;

use super::{Config, ConfigError, DEFAULT_CONFIG_FILE};
use crate::build::markdown_options;

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "MDP";

/// `MDP_SECTION__KEY` variables, e.g. `MDP_OUTPUT__PLACEMENT=derived`.
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Config {
    /// Load the config from the command line argument.
    ///
    /// An explicit file must exist. Without one, `mdp.yaml` in the working
    /// directory is used if present and the defaults otherwise. `MDP_*`
    /// environment variables are layered on top.
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) => {
                let path_str = path
                    .as_os_str()
                    .to_str()
                    .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;
                config::File::new(path_str, config::FileFormat::Yaml).required(true)
            }
            None => config::File::new(DEFAULT_CONFIG_FILE, config::FileFormat::Yaml)
                .required(false),
        };

        Self::load_sources(file, environment())
    }

    fn load_sources(
        file: impl config::Source + Send + Sync + 'static,
        env: config::Environment,
    ) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize::<Config>()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a config from YAML text, without consulting the environment.
    #[cfg(test)]
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()?
            .try_deserialize::<Config>()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would otherwise only fail halfway through a run.
    fn validate(&self) -> Result<(), ConfigError> {
        markdown_options(&self.markdown)?;
        Ok(())
    }
}
