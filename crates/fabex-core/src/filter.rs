//! Path filters: the ordered include/exclude entries consumed by the resolver.
//!
//! A filter either names a path (matching that path and everything below it)
//! or a marker string (matching any in-tree path whose text contains it).
//! Filters carry
//! no precedence of their own; the position of a filter in its list decides
//! which one wins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Whether a matching filter removes or (re-)admits a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Exclude,
    Include,
}

impl FilterKind {
    /// `true` if a file whose deciding filter has this kind is selected.
    pub fn selects(self) -> bool {
        matches!(self, FilterKind::Include)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::Exclude => "exclude",
            FilterKind::Include => "include",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a filter matches against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterPattern {
    /// A directory subtree or a single file, compared component-wise.
    Path(PathBuf),
    /// A substring of the path text, e.g. `unit-test` or `/test/`.
    Marker(String),
}

/// One ordered include/exclude entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathFilter {
    pub kind: FilterKind,
    pub pattern: FilterPattern,
}

impl PathFilter {
    /// Build a path filter. The path is normalized lexically.
    pub fn new(kind: FilterKind, path: impl AsRef<Path>) -> Self {
        Self {
            kind,
            pattern: FilterPattern::Path(normalize(path.as_ref())),
        }
    }

    pub fn exclude(path: impl AsRef<Path>) -> Self {
        Self::new(FilterKind::Exclude, path)
    }

    pub fn include(path: impl AsRef<Path>) -> Self {
        Self::new(FilterKind::Include, path)
    }

    /// Build a marker filter matching any path containing `marker`.
    pub fn marker(kind: FilterKind, marker: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: FilterPattern::Marker(marker.into()),
        }
    }

    pub fn exclude_marker(marker: impl Into<String>) -> Self {
        Self::marker(FilterKind::Exclude, marker)
    }

    pub fn include_marker(marker: impl Into<String>) -> Self {
        Self::marker(FilterKind::Include, marker)
    }

    /// Return a copy whose relative path pattern is rooted at `root`.
    ///
    /// Absolute paths and markers are returned unchanged.
    pub fn anchored(&self, root: &Path) -> Self {
        match &self.pattern {
            FilterPattern::Path(p) if p.is_relative() => Self {
                kind: self.kind,
                pattern: FilterPattern::Path(normalize(&root.join(p))),
            },
            _ => self.clone(),
        }
    }

    /// Return `true` if this filter covers `path`.
    ///
    /// `path` is expected to be normalized already (see [`normalize`]); the
    /// resolver does this once per file rather than once per filter.
    pub fn matches(&self, path: &Path) -> bool {
        match &self.pattern {
            FilterPattern::Path(prefix) => path.starts_with(prefix),
            FilterPattern::Marker(marker) => {
                !marker.is_empty() && path_text(path).contains(marker.as_str())
            }
        }
    }

    /// Match a file of a source tree.
    ///
    /// Path patterns compare against the absolute `path`; markers only see
    /// `in_tree`, the location below the tree root from [`tree_relative`].
    pub fn matches_in_tree(&self, path: &Path, in_tree: &Path) -> bool {
        match &self.pattern {
            FilterPattern::Path(_) => self.matches(path),
            FilterPattern::Marker(_) => self.matches(in_tree),
        }
    }
}

impl fmt::Display for PathFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pattern {
            FilterPattern::Path(p) => write!(f, "{} {}", self.kind, p.display()),
            FilterPattern::Marker(m) => write!(f, "{} *{}*", self.kind, m),
        }
    }
}

/// Lexically normalize a path.
///
/// Drops `.` components, folds `name/..` pairs, and collapses repeated or
/// trailing separators, so `a/b/`, `a//b` and `a/./b` all compare equal to
/// `a/b`. The filesystem is never consulted.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    out
}

/// Location of `path` inside the tree rooted at `root`, with a leading `/`.
///
/// `/test/` then matches a top-level `test` directory but never a directory
/// above the root. Paths outside `root` are returned unchanged.
pub fn tree_relative(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(rel) => Path::new("/").join(rel),
        Err(_) => path.to_path_buf(),
    }
}

/// Path text with `/` separators, used for marker matching.
fn path_text(path: &Path) -> String {
    let text = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        text.into_owned()
    } else {
        text.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trailing_separator() {
        assert_eq!(normalize(Path::new("science/um/")), PathBuf::from("science/um"));
        assert_eq!(normalize(Path::new("/src/science/")), PathBuf::from("/src/science"));
    }

    #[test]
    fn test_normalize_dot_and_parent() {
        assert_eq!(normalize(Path::new("a/./b//c")), PathBuf::from("a/b/c"));
        assert_eq!(normalize(Path::new("a/b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("./")), PathBuf::new());
    }

    #[test]
    fn test_path_filter_matches_subtree() {
        let filter = PathFilter::exclude("/src/science/um");

        assert!(filter.matches(Path::new("/src/science/um/atmos/x.F90")));
        assert!(filter.matches(Path::new("/src/science/um")));
        assert!(!filter.matches(Path::new("/src/science/jules/y.F90")));
    }

    #[test]
    fn test_path_filter_is_component_wise() {
        // REGRESSION TEST: "um" must not match the "umx" directory
        let filter = PathFilter::exclude("/src/science/um");

        assert!(!filter.matches(Path::new("/src/science/umx/z.F90")));
        assert!(!filter.matches(Path::new("/src/science/um_utils.F90")));
    }

    #[test]
    fn test_path_filter_trailing_separator_equivalent() {
        let with = PathFilter::include("/src/science/um/");
        let without = PathFilter::include("/src/science/um");

        assert_eq!(with, without);
        assert!(with.matches(Path::new("/src/science/um/a.F90")));
    }

    #[test]
    fn test_path_filter_single_file() {
        let filter = PathFilter::include("/src/driver/main.f90");

        assert!(filter.matches(Path::new("/src/driver/main.f90")));
        assert!(!filter.matches(Path::new("/src/driver/main.f90.bak")));
        assert!(!filter.matches(Path::new("/src/driver/other.f90")));
    }

    #[test]
    fn test_marker_filter_substring() {
        let unit_test = PathFilter::exclude_marker("unit-test");
        let test_dir = PathFilter::exclude_marker("/test/");

        assert!(unit_test.matches(Path::new("/src/core/unit-test/a_mod_test.pf")));
        assert!(test_dir.matches(Path::new("/src/core/test/helper.f90")));
        assert!(!test_dir.matches(Path::new("/src/core/testing/helper.f90")));
        assert!(!test_dir.matches(Path::new("/src/core/latest/helper.f90")));
    }

    #[test]
    fn test_tree_relative() {
        let root = Path::new("/ci/test/lfric/source");

        assert_eq!(
            tree_relative(root, Path::new("/ci/test/lfric/source/science/a.F90")),
            PathBuf::from("/science/a.F90")
        );
        assert_eq!(
            tree_relative(root, Path::new("/ci/test/lfric/source/test/b.F90")),
            PathBuf::from("/test/b.F90")
        );
        assert_eq!(
            tree_relative(root, Path::new("/elsewhere/c.F90")),
            PathBuf::from("/elsewhere/c.F90")
        );
    }

    #[test]
    fn test_marker_ignores_checkout_location() {
        // REGRESSION TEST: a root under a "test" directory must not trip "/test/"
        let root = Path::new("/home/ci/test/lfric/source");
        let file = root.join("science/a.F90");
        let test_dir = PathFilter::exclude_marker("/test/");

        assert!(test_dir.matches(&file));
        assert!(!test_dir.matches_in_tree(&file, &tree_relative(root, &file)));

        let nested = root.join("core/test/helper.F90");
        assert!(test_dir.matches_in_tree(&nested, &tree_relative(root, &nested)));
    }

    #[test]
    fn test_path_pattern_uses_absolute_path_in_tree() {
        let root = Path::new("/src");
        let file = Path::new("/src/science/um/a.F90");
        let filter = PathFilter::exclude("/src/science/um");

        assert!(filter.matches_in_tree(file, &tree_relative(root, file)));
        assert!(!PathFilter::exclude("/science/um").matches_in_tree(file, &tree_relative(root, file)));
    }

    #[test]
    fn test_empty_marker_matches_nothing() {
        let filter = PathFilter::exclude_marker("");
        assert!(!filter.matches(Path::new("/anything")));
    }

    #[test]
    fn test_anchored_relative_path() {
        let filter = PathFilter::include("science/gungho/").anchored(Path::new("/build/source"));

        assert_eq!(
            filter.pattern,
            FilterPattern::Path(PathBuf::from("/build/source/science/gungho"))
        );
    }

    #[test]
    fn test_anchored_leaves_absolute_and_markers() {
        let root = Path::new("/build/source");
        let absolute = PathFilter::exclude("/elsewhere/lib");
        let marker = PathFilter::exclude_marker("unit-test");

        assert_eq!(absolute.anchored(root), absolute);
        assert_eq!(marker.anchored(root), marker);
    }

    #[test]
    fn test_display() {
        assert_eq!(PathFilter::exclude("/a/b").to_string(), "exclude /a/b");
        assert_eq!(
            PathFilter::include_marker("driver").to_string(),
            "include *driver*"
        );
    }
}
