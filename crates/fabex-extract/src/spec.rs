//! Parsed extract specifications.

use fabex_core::FilterKind;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;

/// One `extract.path-excl` / `extract.path-incl` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub kind: FilterKind,
    /// Paths relative to the section, in the order written.
    pub paths: Vec<PathBuf>,
}

impl Rule {
    pub fn exclude<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            kind: FilterKind::Exclude,
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn include<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            kind: FilterKind::Include,
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

/// Section name to rule list, both in first-appearance order.
///
/// Rules for a section only ever accumulate; nothing replaces an earlier rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtractionSpec {
    sections: IndexMap<String, Vec<Rule>>,
}

impl ExtractionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to `section`, creating the section on first use.
    ///
    /// Section names are case-folded to lower case.
    pub fn push(&mut self, section: &str, rule: Rule) {
        self.sections
            .entry(section.to_lowercase())
            .or_default()
            .push(rule);
    }

    /// Layer `other` on top of this spec.
    ///
    /// Sections present in both keep this spec's rules first, followed by
    /// `other`'s. New sections are appended in `other`'s order.
    pub fn merge(&mut self, other: ExtractionSpec) {
        for (section, rules) in other.sections {
            self.sections.entry(section).or_default().extend(rules);
        }
    }

    /// Merge specs in iteration order.
    pub fn merged<I>(specs: I) -> Self
    where
        I: IntoIterator<Item = ExtractionSpec>,
    {
        let mut merged = Self::new();
        for spec in specs {
            merged.merge(spec);
        }
        merged
    }

    /// Section names in first-appearance order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Rules recorded for `section` (any case).
    pub fn rules(&self, section: &str) -> Option<&[Rule]> {
        self.sections
            .get(&section.to_lowercase())
            .map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.sections
            .iter()
            .map(|(name, rules)| (name.as_str(), rules.as_slice()))
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total number of rules across all sections.
    pub fn rule_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }
}
