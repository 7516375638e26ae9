//! Configuration loading across all sources.

use super::merge::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::FiguraConfig;
use config::{ConfigError, Environment, File};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace
    /// `config/config.toml`, workspace `config/{FIGURA_ENV}.toml`, environment.
    pub fn load(workspace_root: &Path) -> Result<FiguraConfig, ConfigError> {
        Self::load_with_override(workspace_root, None)
    }

    /// Like [`ConfigLoader::load`], with an explicit file applied last.
    pub fn load_with_override(
        workspace_root: &Path,
        explicit: Option<&Path>,
    ) -> Result<FiguraConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let mut builder = builder.add_source(env_source());
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder.build()?.try_deserialize()
    }

    /// Load a single file on top of the defaults, ignoring other sources.
    pub fn load_from_file(path: &Path) -> Result<FiguraConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("FIGURA")
        .separator("__")
        .try_parsing(true)
}
