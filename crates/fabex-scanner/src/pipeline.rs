//! End-to-end source selection: specs -> filters -> scan -> resolve.

use crate::{Baseline, Resolver, Scanner, Selection};
use fabex_core::{Config, PathFilter, Result};
use fabex_extract::{parse_with_report, Diagnostic, ExtractionSpec};
use std::path::Path;
use tracing::info;

/// Everything produced by one selection run.
#[derive(Debug, Clone)]
pub struct SourceSelection {
    /// Merged extract specification, for diagnostics.
    pub spec: ExtractionSpec,
    /// Line diagnostics from all parsed files.
    pub diagnostics: Vec<Diagnostic>,
    pub baseline: Baseline,
    pub selection: Selection,
}

/// Source selection driven by a [`Config`].
pub struct Pipeline {
    config: Config,
    extra: Vec<PathFilter>,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            extra: Vec::new(),
        }
    }

    /// Append caller filters after the configured ones.
    pub fn with_filters(mut self, filters: impl IntoIterator<Item = PathFilter>) -> Self {
        self.extra.extend(filters);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse and merge the configured spec files in order.
    pub fn load_spec(&self) -> Result<(ExtractionSpec, Vec<Diagnostic>)> {
        let mut spec = ExtractionSpec::new();
        let mut diagnostics = Vec::new();

        for path in &self.config.extract_specs {
            let report = parse_with_report(path)?;
            spec.merge(report.spec);
            diagnostics.extend(report.diagnostics);
        }

        Ok((spec, diagnostics))
    }

    /// Build the full filter chain for `spec`.
    ///
    /// Order: default exclusions, spec-derived filters, configured filters,
    /// then filters added with [`Pipeline::with_filters`].
    pub fn resolver(&self, spec: &ExtractionSpec) -> Result<Resolver> {
        let mut filters = spec.to_filters(&self.config.source_root, &self.config.mapping);
        filters.extend(self.config.extra_filters()?);
        filters.extend(self.extra.iter().cloned());

        Ok(
            Resolver::with_defaults(self.config.default_exclusions.as_slice(), filters)
                .with_threads(self.config.performance.scanner_threads),
        )
    }

    /// Run the whole selection.
    pub fn run(&self) -> Result<SourceSelection> {
        let (spec, diagnostics) = self.load_spec()?;
        let resolver = self.resolver(&spec)?;

        let baseline = Scanner::new(self.config.clone()).scan()?;
        let selection = resolver.resolve(&baseline)?;

        info!(
            "Selected {} source files from {} ({} spec sections)",
            selection.len(),
            self.config.source_root.display(),
            spec.len()
        );

        Ok(SourceSelection {
            spec,
            diagnostics,
            baseline,
            selection,
        })
    }

    /// Explain the verdict for one file.
    pub fn explain(&self, file: &Path) -> Result<Option<(usize, PathFilter)>> {
        let (spec, _) = self.load_spec()?;
        let resolver = self.resolver(&spec)?;
        Ok(resolver
            .explain(&self.config.source_root, file)
            .map(|(idx, filter)| (idx, filter.clone())))
    }
}

/// Run the selection described by `config`.
pub fn select(config: &Config) -> Result<SourceSelection> {
    Pipeline::new(config.clone()).run()
}
