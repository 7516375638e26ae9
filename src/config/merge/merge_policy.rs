//! Merge rules: built-in defaults at the lowest precedence.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("qa.enabled", false)?
        .set_default("qa.max_retries", 1)?
        .set_default("enrichment.enabled", true)?
        .set_default("output.dir", "figures")?
        .set_default("output.write_qa_sidecar", false)?
        .set_default("logging.output", "stderr")
}
