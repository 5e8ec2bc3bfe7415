//! Property tests for filter ordering.

use fabex_core::{FilterKind, PathFilter};
use fabex_scanner::{Baseline, Resolver};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const ROOT: &str = "/tree";

const FILES: &[&str] = &[
    "science/um/boundary_layer/bl_mod.F90",
    "science/um/boundary_layer/bl_kernel.F90",
    "science/um/convection/conv_mod.F90",
    "science/um/um_top.F90",
    "science/jules/soil.F90",
    "science/jules/snow/snow_mod.F90",
    "driver/main.F90",
];

/// Directories and files filters may point at, including one that is absent.
const TARGETS: &[&str] = &[
    "science",
    "science/um",
    "science/um/boundary_layer",
    "science/um/convection",
    "science/um/um_top.F90",
    "science/jules",
    "science/jules/snow/",
    "driver/main.F90",
    "science/um/absent",
];

fn baseline() -> Baseline {
    Baseline::new(ROOT, FILES.iter().map(|f| Path::new(ROOT).join(f)).collect())
}

fn filter_strategy() -> impl Strategy<Value = PathFilter> {
    (any::<bool>(), proptest::sample::select(TARGETS)).prop_map(|(exclude, target)| {
        let kind = if exclude {
            FilterKind::Exclude
        } else {
            FilterKind::Include
        };
        PathFilter::new(kind, Path::new(ROOT).join(target))
    })
}

/// Sequential model: walk the filters, removing and re-adding files.
fn apply_in_sequence(filters: &[PathFilter]) -> BTreeSet<PathBuf> {
    let base = baseline();
    let mut selected: BTreeSet<PathBuf> = base.files.iter().cloned().collect();

    for filter in filters {
        for file in &base.files {
            if filter.matches(file) {
                match filter.kind {
                    FilterKind::Exclude => {
                        selected.remove(file);
                    }
                    FilterKind::Include => {
                        selected.insert(file.clone());
                    }
                }
            }
        }
    }

    selected
}

fn resolve(filters: Vec<PathFilter>) -> BTreeSet<PathBuf> {
    Resolver::without_defaults(filters)
        .resolve(&baseline())
        .unwrap()
        .files
        .into_iter()
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Resolution equals applying every filter in order to a mutable set.
    #[test]
    fn property_last_match_equals_sequential_application(
        filters in proptest::collection::vec(filter_strategy(), 0..8)
    ) {
        prop_assert_eq!(resolve(filters.clone()), apply_in_sequence(&filters));
    }

    /// PROPERTY: Any permutation of a filter list resolves like the sequential model,
    /// and the filter placed last decides every file it covers.
    #[test]
    fn property_permutations_respect_order(
        filters in proptest::collection::vec(filter_strategy(), 1..8)
            .prop_flat_map(|v| Just(v).prop_shuffle())
    ) {
        let selected = resolve(filters.clone());
        prop_assert_eq!(&selected, &apply_in_sequence(&filters));

        let last = filters.last().unwrap();
        for file in baseline().files.iter().filter(|f| last.matches(f)) {
            prop_assert_eq!(selected.contains(file), last.kind.selects());
        }
    }

    /// PROPERTY: Exclude-then-Include admits a subtree, Include-then-Exclude drops it.
    #[test]
    fn property_swapping_include_and_exclude_flips_outcome(
        target in proptest::sample::select(TARGETS),
        prefix in proptest::collection::vec(filter_strategy(), 0..4)
    ) {
        let path = Path::new(ROOT).join(target);
        let covered: Vec<PathBuf> = baseline()
            .files
            .into_iter()
            .filter(|f| PathFilter::include(&path).matches(f))
            .collect();

        let mut exclude_then_include = prefix.clone();
        exclude_then_include.push(PathFilter::exclude(&path));
        exclude_then_include.push(PathFilter::include(&path));

        let mut include_then_exclude = prefix;
        include_then_exclude.push(PathFilter::include(&path));
        include_then_exclude.push(PathFilter::exclude(&path));

        let admitted = resolve(exclude_then_include);
        let dropped = resolve(include_then_exclude);

        for file in &covered {
            prop_assert!(admitted.contains(file));
            prop_assert!(!dropped.contains(file));
        }
    }
}
