//! Translation of parsed rules into rooted path filters.

use crate::spec::{ExtractionSpec, Rule};
use fabex_core::{Error, FilterKind, PathFilter, Result};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

pub use fabex_core::config::{Anchor, PathMapping};

/// Remove the first component of a relative rule path.
///
/// Upstream package listings record paths one level deeper than the section
/// directory (`src/atmosphere/x` for `<section>/atmosphere/x`). A path with
/// nothing left after the strip is an error.
pub fn strip_leading_component(path: &Path) -> Result<PathBuf> {
    let mut components = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)));

    let first = components.next();
    let rest: PathBuf = components.collect();

    match first {
        Some(_) if !rest.as_os_str().is_empty() => Ok(rest),
        _ => Err(Error::Normalize(format!(
            "cannot strip leading component from '{}': at least two components are needed",
            path.display()
        ))),
    }
}

/// A rule path made relative: a leading `/` means the anchor itself.
fn rule_relative(path: &Path) -> PathBuf {
    fabex_core::filter::normalize(
        &path
            .components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
            .collect::<PathBuf>(),
    )
}

/// Filters for one rule of `section`, in path order.
pub fn rule_filters(
    section: &str,
    rule: &Rule,
    source_root: &Path,
    mapping: &PathMapping,
) -> Vec<PathFilter> {
    let base = source_root.join(&mapping.prefix);
    let section_dir = base.join(section);

    if rule.kind == FilterKind::Exclude && mapping.exclude_whole_section {
        return vec![PathFilter::exclude(&section_dir)];
    }

    let anchor_dir = match mapping.anchor {
        Anchor::Root => &base,
        Anchor::Section => &section_dir,
    };

    rule.paths
        .iter()
        .map(|path| {
            let mut relative = rule_relative(path);
            if mapping.strip_leading {
                match strip_leading_component(&relative) {
                    Ok(stripped) => relative = stripped,
                    Err(e) => warn!("section '{section}': {e}; keeping the path as written"),
                }
            }
            PathFilter::new(rule.kind, anchor_dir.join(relative))
        })
        .collect()
}

impl ExtractionSpec {
    /// Flatten the spec into an ordered filter list.
    ///
    /// Order is section order, then rule order, then path order.
    pub fn to_filters(&self, source_root: &Path, mapping: &PathMapping) -> Vec<PathFilter> {
        let filters: Vec<PathFilter> = self
            .iter()
            .flat_map(move |(section, rules)| {
                rules
                    .iter()
                    .flat_map(move |rule| rule_filters(section, rule, source_root, mapping))
            })
            .collect();

        debug!(
            "Translated {} rules into {} filters",
            self.rule_count(),
            filters.len()
        );
        filters
    }
}
