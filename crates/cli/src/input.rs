use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use textbook_chunker::{PipelineConfig, RawText};

/// Read parts in the order given. Unreadable parts are skipped with a
/// warning; only an input with no text at all is an error.
pub fn load_parts(paths: &[PathBuf]) -> Result<RawText> {
    let mut builder = RawText::builder();
    for path in paths {
        let name = path.display().to_string();
        builder = match fs::read(path) {
            Ok(bytes) => {
                log::debug!("Read part {name} ({} bytes)", bytes.len());
                builder.push_part(name, &bytes)
            }
            Err(err) => builder.skip_part(name, err.to_string()),
        };
    }
    builder
        .build()
        .with_context(|| format!("No readable text in {} part(s)", paths.len()))
}

pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = PipelineConfig::from_slice(&bytes)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}
