//! Configuration management for fabex.

use crate::filter::{FilterKind, PathFilter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure for fabex.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the assembled source tree.
    pub source_root: PathBuf,

    /// Extract specification files, merged in the listed order.
    pub extract_specs: Vec<PathBuf>,

    /// File suffixes (without the dot) that make up the baseline set.
    pub source_suffixes: Vec<String>,

    /// Marker exclusions placed ahead of every other filter.
    pub default_exclusions: Vec<String>,

    /// Extra filters appended after the spec-derived ones.
    pub filters: Vec<FilterSpec>,

    /// How parsed rules are turned into filters.
    pub mapping: PathMapping,

    /// Performance settings.
    pub performance: PerformanceConfig,
}

/// Where rule paths are anchored in the source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    /// `source_root/prefix/<path>`
    #[default]
    Root,
    /// `source_root/prefix/<section>/<path>`
    Section,
}

/// Translation settings from parsed rules to filters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathMapping {
    /// Directory under the source root that holds the sections, e.g. `science`.
    pub prefix: PathBuf,

    /// Join point for rule paths.
    pub anchor: Anchor,

    /// Drop the first component of every rule path (`src/a/b` -> `a/b`).
    pub strip_leading: bool,

    /// Exclude rules exclude their whole section rather than the listed paths.
    pub exclude_whole_section: bool,
}

/// A filter written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub kind: FilterKind,

    /// Path (may use `~`, environment variables and `$source`) or marker text.
    pub path: String,

    /// Treat `path` as a substring marker instead of a path.
    #[serde(default)]
    pub marker: bool,
}

impl FilterSpec {
    /// Build the filter, expanding `$source` to `source_root`.
    pub fn to_filter(&self, source_root: &Path) -> crate::Result<PathFilter> {
        if self.marker {
            return Ok(PathFilter::marker(self.kind, self.path.clone()));
        }
        let path = expand_template(&self.path, Some(source_root))?;
        Ok(PathFilter::new(self.kind, path))
    }
}

/// Performance-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Number of threads used to compute per-file verdicts.
    pub scanner_threads: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            scanner_threads: num_cpus::get(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            extract_specs: Vec::new(),
            source_suffixes: ["f90", "F90", "f", "F", "x90", "X90", "c", "h", "inc"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_exclusions: vec!["unit-test".to_string(), "/test/".to_string()],
            filters: Vec::new(),
            mapping: PathMapping::default(),
            performance: PerformanceConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Relative `extract_specs` entries are resolved against the directory
    /// containing the configuration file.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;

        config.expand_paths(path.parent())?;
        config.validate()?;
        debug!(
            "Loaded configuration from {}: root {}, {} spec file(s)",
            path.display(),
            config.source_root.display(),
            config.extract_specs.len()
        );

        Ok(config)
    }

    /// Expand `~` and environment variables in all path fields.
    fn expand_paths(&mut self, base_dir: Option<&Path>) -> crate::Result<()> {
        self.source_root = expand_template(&self.source_root.to_string_lossy(), None)?;
        if let (true, Some(base)) = (self.source_root.is_relative(), base_dir) {
            self.source_root = base.join(&self.source_root);
        }

        let source_root = self.source_root.clone();
        self.extract_specs = self
            .extract_specs
            .iter()
            .map(|p| {
                let expanded = expand_template(&p.to_string_lossy(), Some(&source_root))?;
                Ok(match base_dir {
                    Some(base) if expanded.is_relative() => base.join(expanded),
                    _ => expanded,
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.source_suffixes.is_empty() {
            return Err(crate::Error::Config(
                "source_suffixes must not be empty".to_string(),
            ));
        }
        if self.performance.scanner_threads == 0 {
            return Err(crate::Error::Config(
                "performance.scanner_threads must be at least 1".to_string(),
            ));
        }
        if self.mapping.prefix.is_absolute() {
            return Err(crate::Error::Config(format!(
                "mapping.prefix must be relative to source_root, got {}",
                self.mapping.prefix.display()
            )));
        }
        Ok(())
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build the configured ad hoc filters.
    pub fn extra_filters(&self) -> crate::Result<Vec<PathFilter>> {
        self.filters
            .iter()
            .map(|f| f.to_filter(&self.source_root))
            .collect()
    }
}

/// Expand `~`, environment variables, and (when given) `$source`.
///
/// Unknown variables are left in place; the resulting path simply matches
/// nothing.
pub fn expand_template(input: &str, source_root: Option<&Path>) -> crate::Result<PathBuf> {
    let source = source_root.map(|p| p.to_string_lossy().into_owned());

    let expanded = shellexpand::full_with_context(
        input,
        || std::env::var("HOME").ok(),
        |var: &str| -> std::result::Result<Option<String>, std::env::VarError> {
            match (var, &source) {
                ("source", Some(root)) => Ok(Some(root.clone())),
                _ => Ok(std::env::var(var).ok()),
            }
        },
    )
    .map_err(|e| crate::Error::Config(format!("cannot expand '{input}': {e}")))?;

    Ok(PathBuf::from(expanded.as_ref()))
}
