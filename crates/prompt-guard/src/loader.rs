use std::path::Path;

use anyhow::{Context, Result};

use crate::config::{resolve, PolicyOptions};

/// Load [`PolicyOptions`] from a YAML file on disk.
///
/// The options are resolved once as a dry run so that an invalid file is
/// reported here, with the file name attached, rather than later at
/// engine construction.
pub fn load_options(path: impl AsRef<Path>) -> Result<PolicyOptions> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read policy file: {}", path.display()))?;
    load_options_from_str(&contents)
        .with_context(|| format!("failed to parse policy file: {}", path.display()))
}

/// Parse and validate [`PolicyOptions`] from a YAML string.
pub fn load_options_from_str(yaml: &str) -> Result<PolicyOptions> {
    // An empty document means "all defaults".
    if yaml.trim().is_empty() {
        return Ok(PolicyOptions::default());
    }
    let options: PolicyOptions =
        serde_yml::from_str(yaml).context("YAML deserialization failed")?;
    resolve(options.clone())?;
    Ok(options)
}
