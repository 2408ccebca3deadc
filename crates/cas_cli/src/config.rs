use anyhow::{Context, Result};
use cas_equiv::EquivConfig;
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "cas_equiv.toml";

/// Explicit `--config` must exist; the default file is optional.
pub fn load(explicit: Option<&Path>) -> Result<EquivConfig> {
    if let Some(path) = explicit {
        return EquivConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()));
    }
    let default = Path::new(DEFAULT_CONFIG_FILE);
    if default.exists() {
        tracing::info!(path = DEFAULT_CONFIG_FILE, "using config file");
        return EquivConfig::load(default)
            .with_context(|| format!("loading config {}", DEFAULT_CONFIG_FILE));
    }
    Ok(EquivConfig::default())
}
