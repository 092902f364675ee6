//! Source/sink pattern configuration and the compiled pattern set
//!
//! The configuration file carries two named collections (`sources`
//! and `sinks`) of categorised entries; only entries with
//! `enabled: true` take part in scanning.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One configured pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternEntry {
    /// Regular expression matched against each source line.
    pub pattern: String,
    /// Disabled entries are excluded before scanning.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Pattern configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub sources: BTreeMap<String, Vec<PatternEntry>>,
    pub sinks: BTreeMap<String, Vec<PatternEntry>>,
}

impl PatternConfig {
    /// Enabled source patterns, category order then entry order.
    pub fn enabled_sources(&self) -> Vec<String> {
        Self::enabled(&self.sources)
    }

    /// Enabled sink patterns, category order then entry order.
    pub fn enabled_sinks(&self) -> Vec<String> {
        Self::enabled(&self.sinks)
    }

    fn enabled(groups: &BTreeMap<String, Vec<PatternEntry>>) -> Vec<String> {
        groups
            .values()
            .flatten()
            .filter(|entry| entry.enabled)
            .map(|entry| entry.pattern.clone())
            .collect()
    }

    /// Compile the enabled entries into a [`PatternSet`].
    pub fn compile(&self) -> PatternSet {
        PatternSet::compile(self.enabled_sources(), self.enabled_sinks())
    }
}

/// A compiled pattern, keeping the raw text for reporting.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub raw: String,
    pub regex: Regex,
}

/// The immutable set of compiled source and sink patterns handed to
/// the engine. An empty set is legal: the run still produces call
/// graph and chain data without source/sink matches.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    pub sources: Vec<CompiledPattern>,
    pub sinks: Vec<CompiledPattern>,
}

impl PatternSet {
    /// Compile pattern strings in order; entries that fail to compile
    /// are skipped with a warning rather than aborting the run.
    pub fn compile(sources: Vec<String>, sinks: Vec<String>) -> Self {
        Self {
            sources: compile_all(sources, "source"),
            sinks: compile_all(sinks, "sink"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.sinks.is_empty()
    }
}

fn compile_all(patterns: Vec<String>, kind: &'static str) -> Vec<CompiledPattern> {
    patterns
        .into_iter()
        .filter_map(|raw| match Regex::new(&raw) {
            Ok(regex) => Some(CompiledPattern { raw, regex }),
            Err(error) => {
                warn!(pattern = %raw, kind, %error, "Skipping invalid pattern");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pattern: &str, enabled: bool) -> PatternEntry {
        PatternEntry {
            pattern: pattern.to_string(),
            enabled,
            description: None,
        }
    }

    #[test]
    fn disabled_entries_are_excluded() {
        let mut config = PatternConfig::default();
        config.sources.insert(
            "user_input".to_string(),
            vec![entry(r"\$_GET", true), entry(r"\$_POST", false)],
        );
        config
            .sinks
            .insert("exec".to_string(), vec![entry(r"exec\s*\(", true)]);

        assert_eq!(config.enabled_sources(), vec![r"\$_GET".to_string()]);
        assert_eq!(config.enabled_sinks(), vec![r"exec\s*\(".to_string()]);
    }

    #[test]
    fn invalid_patterns_are_skipped_not_fatal() {
        let set = PatternSet::compile(
            vec![r"\$_GET".to_string(), "[unclosed".to_string()],
            vec![r"eval\s*\(".to_string()],
        );
        assert_eq!(set.sources.len(), 1);
        assert_eq!(set.sources[0].raw, r"\$_GET");
        assert_eq!(set.sinks.len(), 1);
    }

    #[test]
    fn yaml_config_round_trip() {
        let yaml = r#"
sources:
  user_input:
    - pattern: '\$_GET'
      enabled: true
      description: "HTTP GET parameters"
    - pattern: '\$_COOKIE'
      enabled: false
sinks:
  command_execution:
    - pattern: 'exec\s*\('
      enabled: true
"#;
        let config: PatternConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.enabled_sources(), vec![r"\$_GET".to_string()]);
        assert_eq!(config.enabled_sinks(), vec![r"exec\s*\(".to_string()]);

        let set = config.compile();
        assert_eq!(set.sources.len(), 1);
        assert!(!set.is_empty());
    }
}
