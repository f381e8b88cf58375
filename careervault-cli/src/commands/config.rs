use std::{fs, path::Path};

use anyhow::{Context, Result};
use clap::ValueEnum;
use shared::config::ClientConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    fn default_file_name(self) -> &'static str {
        match self {
            Self::Yaml => "careervault.yaml",
            Self::Json => "careervault.json",
        }
    }
}

/// Generates a configuration file holding the defaults.
///
/// # Arguments
/// * `format` - Serialization of the file.
/// * `output` - Destination; `careervault.<format>` in the current directory when absent.
///
/// # Errors
/// Returns an error if serialization or writing the file fails.
pub fn generate_config(format: ConfigFormat, output: Option<&Path>) -> Result<()> {
    let config = ClientConfig::with_defaults();
    let path = output.unwrap_or_else(|| Path::new(format.default_file_name()));

    let serialized = match format {
        ConfigFormat::Yaml => serde_yml::to_string(&config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
    };

    fs::write(path, serialized)
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!(
        "Configuration file '{}' generated successfully.",
        path.display()
    );
    Ok(())
}
