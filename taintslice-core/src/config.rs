//! Pattern configuration loading
//!
//! Patterns come from a YAML file ([`load_yaml_config`]) or from plain
//! text files with one regex per line ([`load_pattern_lines`]). A
//! missing or malformed configuration degrades to an empty pattern
//! set with a warning; it never aborts the run.

use std::path::Path;

use tracing::{debug, warn};

use crate::domain::patterns::{PatternConfig, PatternSet};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
}

/// Parse a YAML pattern configuration file.
pub fn load_yaml_config(path: &Path) -> Result<PatternConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: PatternConfig = serde_yml::from_str(&content)?;
    debug!(
        path = %path.display(),
        sources = config.enabled_sources().len(),
        sinks = config.enabled_sinks().len(),
        "Loaded pattern configuration"
    );
    Ok(config)
}

/// Read a plain text pattern file: one regex per line. Blank lines
/// and any line containing `#` are dropped, so a `#` cannot appear
/// inside a pattern in this format; use the YAML configuration for
/// patterns that need one.
pub fn load_pattern_lines(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains('#'))
        .map(str::to_string)
        .collect())
}

/// Load and compile the YAML configuration at `path`, degrading to an
/// empty set on any failure.
pub fn load_pattern_set(path: &Path) -> PatternSet {
    match load_yaml_config(path) {
        Ok(config) => config.compile(),
        Err(error) => {
            warn!(
                path = %path.display(),
                %error,
                "Pattern configuration unavailable, continuing with empty pattern set"
            );
            PatternSet::default()
        }
    }
}

/// Compile pattern sets from plain text files. Either file may be
/// absent; the missing side contributes no patterns.
pub fn load_pattern_set_from_text(
    sources_path: Option<&Path>,
    sinks_path: Option<&Path>,
) -> PatternSet {
    let read = |path: Option<&Path>, kind: &'static str| -> Vec<String> {
        let Some(path) = path else {
            return Vec::new();
        };
        match load_pattern_lines(path) {
            Ok(lines) => lines,
            Err(error) => {
                warn!(path = %path.display(), kind, %error, "Pattern file unavailable");
                Vec::new()
            }
        }
    };

    PatternSet::compile(read(sources_path, "source"), read(sinks_path, "sink"))
}
