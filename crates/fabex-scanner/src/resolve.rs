//! Path-filter resolution.
//!
//! Every baseline file starts out selected. Filters are consulted in order and
//! the last one matching a file decides its fate, so an `Include` placed after
//! a broad `Exclude` re-admits the files under it and a later `Exclude` can
//! carve them out again. Filters are never reordered, deduplicated or split
//! into include/exclude sets.
//!
//! Includes only re-admit files the baseline scan found; a path that is not
//! in the tree matches nothing and changes nothing.

use crate::Baseline;
use fabex_core::filter::{normalize, tree_relative};
use fabex_core::{Error, PathFilter, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Marker exclusions applied ahead of all other filters.
pub const DEFAULT_EXCLUSIONS: &[&str] = &["unit-test", "/test/"];

/// Ordered filter chain.
#[derive(Debug, Clone)]
pub struct Resolver {
    filters: Vec<PathFilter>,
    threads: Option<usize>,
}

/// Outcome of resolving a baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Selected files, in baseline order.
    pub files: Vec<PathBuf>,
    /// Rejected files, in baseline order.
    pub excluded: Vec<PathBuf>,
    /// Per filter, how many files it decided.
    pub decided: Vec<usize>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f == path)
    }
}

impl Resolver {
    /// Chain [`DEFAULT_EXCLUSIONS`] followed by `filters`.
    pub fn new(filters: Vec<PathFilter>) -> Self {
        Self::with_defaults(DEFAULT_EXCLUSIONS, filters)
    }

    /// Chain the given marker exclusions followed by `filters`.
    pub fn with_defaults<S: AsRef<str>>(defaults: &[S], filters: Vec<PathFilter>) -> Self {
        let mut chain: Vec<PathFilter> = defaults
            .iter()
            .map(|m| PathFilter::exclude_marker(m.as_ref()))
            .collect();
        chain.extend(filters);
        Self::without_defaults(chain)
    }

    /// Use `filters` exactly as given.
    pub fn without_defaults(filters: Vec<PathFilter>) -> Self {
        Self {
            filters,
            threads: None,
        }
    }

    /// Compute verdicts on a dedicated pool of `threads` workers.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Append a filter after the existing ones.
    pub fn push(&mut self, filter: PathFilter) {
        self.filters.push(filter);
    }

    pub fn filters(&self) -> &[PathFilter] {
        &self.filters
    }

    /// Filters with relative paths rooted at `root`.
    fn anchored(&self, root: &Path) -> Vec<PathFilter> {
        self.filters.iter().map(|f| f.anchored(root)).collect()
    }

    /// Index of the last filter in `chain` matching `path`.
    ///
    /// Markers are matched against the file's location below `root`.
    fn deciding(chain: &[PathFilter], root: &Path, path: &Path) -> Option<usize> {
        let path = normalize(path);
        let in_tree = tree_relative(root, &path);
        chain
            .iter()
            .rposition(|f| f.matches_in_tree(&path, &in_tree))
    }

    /// Apply the chain to `baseline`.
    pub fn resolve(&self, baseline: &Baseline) -> Result<Selection> {
        let chain = self.anchored(&baseline.root);
        let root = normalize(&baseline.root);

        let verdicts: Vec<Option<usize>> = match self.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| Error::Scanner(format!("cannot start resolver pool: {e}")))?
                .install(|| Self::verdicts(&chain, &root, &baseline.files)),
            None => Self::verdicts(&chain, &root, &baseline.files),
        };

        let mut selection = Selection {
            decided: vec![0; chain.len()],
            ..Default::default()
        };

        for (file, verdict) in baseline.files.iter().zip(verdicts) {
            let selected = match verdict {
                Some(idx) => {
                    selection.decided[idx] += 1;
                    chain[idx].kind.selects()
                }
                None => true,
            };
            if selected {
                selection.files.push(file.clone());
            } else {
                selection.excluded.push(file.clone());
            }
        }

        for (filter, count) in chain.iter().zip(&selection.decided) {
            if *count == 0 {
                debug!("Filter '{}' decided no file", filter);
            }
        }

        info!(
            "Resolved {} of {} files ({} filters)",
            selection.files.len(),
            baseline.files.len(),
            chain.len()
        );
        if selection.is_empty() {
            warn!("No source files selected under {}", baseline.root.display());
        }

        Ok(selection)
    }

    fn verdicts(chain: &[PathFilter], root: &Path, files: &[PathBuf]) -> Vec<Option<usize>> {
        files
            .par_iter()
            .map(|file| Self::deciding(chain, root, file))
            .collect()
    }

    /// The filter deciding `path`, with its position in the chain.
    ///
    /// `None` means no filter matches and the file is selected by default.
    pub fn explain(&self, root: &Path, path: &Path) -> Option<(usize, &PathFilter)> {
        let chain = self.anchored(root);
        Self::deciding(&chain, &normalize(root), path).map(|idx| (idx, &self.filters[idx]))
    }
}
