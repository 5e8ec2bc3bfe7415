//! fabex-scanner: Baseline source scan and path-filter resolution.

pub mod pipeline;
pub mod resolve;
pub mod snapshot;

pub use pipeline::{select, Pipeline, SourceSelection};
pub use resolve::{Resolver, Selection, DEFAULT_EXCLUSIONS};
pub use snapshot::SelectionSnapshot;

use fabex_core::{Config, Error, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Every source file found under a root, before any filter is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    /// Root the scan started from, as given.
    pub root: PathBuf,
    /// Files in walk order (sorted by name within each directory).
    pub files: Vec<PathBuf>,
}

impl Baseline {
    pub fn new(root: impl Into<PathBuf>, files: Vec<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Scanner producing the baseline file set.
pub struct Scanner {
    config: Config,
    suffixes: HashSet<String>,
}

impl Scanner {
    /// Create a new scanner with the given configuration.
    pub fn new(config: Config) -> Self {
        let suffixes = config.source_suffixes.iter().cloned().collect();
        Self { config, suffixes }
    }

    /// Scan the configured source root.
    pub fn scan(&self) -> Result<Baseline> {
        self.scan_root(&self.config.source_root)
    }

    /// Scan a single root directory.
    ///
    /// A root that does not exist or cannot be read is fatal. Symbolic links
    /// are followed, so linked files and directories are part of the
    /// baseline. Unreadable entries and broken links are logged and skipped.
    pub fn scan_root(&self, root: &Path) -> Result<Baseline> {
        let metadata = std::fs::metadata(root).map_err(|e| Error::missing_input(root, e))?;
        if !metadata.is_dir() {
            return Err(Error::Scanner(format!(
                "source root {} is not a directory",
                root.display()
            )));
        }

        info!("Scanning source root: {}", root.display());

        let files: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) if e.loop_ancestor().is_some() => {
                    warn!("Skipping symlink loop: {}", e);
                    None
                }
                Err(e) => {
                    warn!("Skipping unreadable entry or broken link: {}", e);
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && self.is_source_file(e.path()))
            .map(|e| e.into_path())
            .collect();

        debug!("Found {} source files in {}", files.len(), root.display());

        Ok(Baseline::new(root, files))
    }

    /// Check if a path has one of the configured source suffixes.
    fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.suffixes.contains(ext))
    }
}
