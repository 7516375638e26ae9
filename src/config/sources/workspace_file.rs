//! Per-workspace config files under `<workspace>/config/`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PROFILE_ENV: &str = "FIGURA_ENV";

/// Existing workspace config files, lowest precedence first: `config.toml`,
/// then `<profile>.toml` when a profile is active.
pub fn workspace_config_files(workspace_root: &Path, profile: Option<&str>) -> Vec<PathBuf> {
    let config_dir = workspace_root.join("config");
    let profile_file = profile
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "config")
        .map(|name| config_dir.join(format!("{}.toml", name)));

    std::iter::once(config_dir.join("config.toml"))
        .chain(profile_file)
        .filter(|path| path.is_file())
        .collect()
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let profile = std::env::var(PROFILE_ENV).ok();
    let files = workspace_config_files(workspace_root, profile.as_deref());
    if files.is_empty() {
        debug!(workspace = %workspace_root.display(), "No workspace configuration files");
    }
    Ok(files.into_iter().fold(builder, |builder, path| {
        debug!(config_path = %path.display(), "Layering workspace configuration");
        builder.add_source(File::from(path).required(true))
    }))
}
