//! Positive/negative partitioning of decomposed code units.
//!
//! Every `.code` unit under a repository's decomposition output is copied into
//! exactly one of `<smell>/positive` or `<smell>/negative`. The label store
//! only lists positives, so anything without a matching key (component, class
//! or method) is negative. Units are copied, never moved, so the same
//! decomposition serves every tracked smell.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::FsError;
use crate::labels::{LabelHierarchy, SmellKind};
use crate::repository::{Repository, WorkspaceLayout};
use crate::workdir::{copy_unit, ensure_directory, list_entries};

/// File suffix the decomposer gives every code unit.
pub const UNIT_SUFFIX: &str = ".code";

/// Joins the parts of a bucket file name: `solution_component_class[_method].code`.
pub const NAME_DELIMITER: &str = "_";

/// Counts from one partition call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartitionStats {
    pub positive: u64,
    pub negative: u64,
    /// Entries in the decomposition tree that were not code units.
    pub skipped: u64,
}

impl PartitionStats {
    pub fn total(&self) -> u64 {
        self.positive + self.negative
    }

    pub fn merge(&mut self, other: PartitionStats) {
        self.positive += other.positive;
        self.negative += other.negative;
        self.skipped += other.skipped;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Positive,
    Negative,
}

/// The `positive/` and `negative/` directories of one smell.
#[derive(Debug, Clone)]
pub struct SmellBuckets {
    pub root: PathBuf,
    pub positive: PathBuf,
    pub negative: PathBuf,
}

impl SmellBuckets {
    /// Create the smell's directories without clearing them, so output from
    /// earlier repositories accumulates.
    pub fn prepare(layout: &WorkspaceLayout, smell: &str) -> Result<Self, FsError> {
        let root = layout.smell_dir(smell);
        let buckets = Self {
            positive: root.join("positive"),
            negative: root.join("negative"),
            root,
        };
        ensure_directory(&buckets.root, false)?;
        ensure_directory(&buckets.positive, false)?;
        ensure_directory(&buckets.negative, false)?;
        Ok(buckets)
    }

    fn dir(&self, bucket: Bucket) -> &Path {
        match bucket {
            Bucket::Positive => &self.positive,
            Bucket::Negative => &self.negative,
        }
    }
}

/// Bucket paths already written in a batch.
///
/// One registry is shared by every partition call of a batch, so two units
/// that flatten to the same file name never overwrite each other, whether
/// they come from one repository or from two.
#[derive(Debug, Default)]
pub struct BucketNames {
    taken: Mutex<HashSet<PathBuf>>,
}

impl BucketNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a destination for `unit_file` in `dir`, adding `-N` before the
    /// suffix if the plain name is already taken.
    pub fn claim(&self, dir: &Path, prefix: &[&str], unit_file: &str) -> PathBuf {
        let mut taken = self.taken.lock().expect("bucket names mutex poisoned");
        let base = dir.join(bucket_file_name(prefix, unit_file));
        if taken.insert(base.clone()) {
            return base;
        }
        let stem = unit_name(unit_file);
        let mut n = 2;
        loop {
            let candidate = dir.join(bucket_file_name(prefix, &format!("{stem}-{n}{UNIT_SUFFIX}")));
            if taken.insert(candidate.clone()) {
                warn!(
                    name = %base.display(),
                    renamed = %candidate.display(),
                    "Bucket name collision"
                );
                return candidate;
            }
            n += 1;
        }
    }
}

/// Joins decomposed units against a label hierarchy and fills the buckets.
#[derive(Debug)]
pub struct Partitioner<'a> {
    layout: &'a WorkspaceLayout,
    names: &'a BucketNames,
}

impl<'a> Partitioner<'a> {
    pub fn new(layout: &'a WorkspaceLayout, names: &'a BucketNames) -> Self {
        Self { layout, names }
    }

    /// Partition `repo`'s units for one smell.
    ///
    /// `kind` selects the decomposition to walk (classes for design smells,
    /// methods for implementation smells). A hierarchy of another kind is
    /// rejected before anything is copied.
    #[instrument(skip_all, fields(solution_id = %repo.solution_id, smell = smell))]
    pub fn partition(
        &self,
        repo: &Repository,
        smell: &str,
        kind: SmellKind,
        hierarchy: &LabelHierarchy,
    ) -> crate::error::Result<PartitionStats> {
        hierarchy.ensure_kind(smell, kind)?;

        let buckets = SmellBuckets::prepare(self.layout, smell)?;
        let mut run = PartitionRun {
            buckets: &buckets,
            names: self.names,
            solution_id: &repo.solution_id,
            hierarchy,
            stats: PartitionStats::default(),
        };

        let root = match kind {
            SmellKind::Design => self.layout.class_units(repo),
            SmellKind::Implementation => self.layout.method_units(repo),
        };
        if !root.is_dir() {
            warn!(path = %root.display(), "No decomposition output, nothing to partition");
            return Ok(run.stats);
        }

        for component in run.subdirectories(&root)? {
            let component_path = root.join(&component);
            let component = component.to_string_lossy();
            match kind {
                SmellKind::Design => run.design_component(&component_path, &component)?,
                SmellKind::Implementation => {
                    run.implementation_component(&component_path, &component)?;
                }
            }
        }

        debug!(
            positive = run.stats.positive,
            negative = run.stats.negative,
            skipped = run.stats.skipped,
            "Partitioned"
        );
        Ok(run.stats)
    }
}

struct PartitionRun<'b> {
    buckets: &'b SmellBuckets,
    names: &'b BucketNames,
    solution_id: &'b str,
    hierarchy: &'b LabelHierarchy,
    stats: PartitionStats,
}

impl PartitionRun<'_> {
    fn design_component(&mut self, path: &Path, component: &str) -> Result<(), FsError> {
        if !self.hierarchy.has_component(component) {
            debug!(component, "No labels in component, every class is negative");
        }
        let prefix = [self.solution_id, component];
        for unit in self.units(path)? {
            let file = unit.to_string_lossy();
            let bucket = if self.hierarchy.has_class(component, unit_name(&file)) {
                Bucket::Positive
            } else {
                Bucket::Negative
            };
            self.place(&path.join(&unit), &prefix, &file, bucket)?;
        }
        Ok(())
    }

    fn implementation_component(&mut self, path: &Path, component: &str) -> Result<(), FsError> {
        if !self.hierarchy.has_component(component) {
            debug!(component, "No labels in component, every method is negative");
        }
        for class_entry in self.subdirectories(path)? {
            let class_path = path.join(&class_entry);
            let class_name = class_entry.to_string_lossy();
            let prefix = [self.solution_id, component, &*class_name];
            for unit in self.units(&class_path)? {
                let file = unit.to_string_lossy();
                let positive =
                    self.hierarchy
                        .is_positive_method(component, &class_name, unit_name(&file));
                let bucket = if positive {
                    Bucket::Positive
                } else {
                    Bucket::Negative
                };
                self.place(&class_path.join(&unit), &prefix, &file, bucket)?;
            }
        }
        Ok(())
    }

    /// Directory entries of `dir`; anything else is logged and skipped.
    fn subdirectories(&mut self, dir: &Path) -> Result<Vec<OsString>, FsError> {
        let mut dirs = Vec::new();
        for name in list_entries(dir)? {
            if dir.join(&name).is_dir() {
                dirs.push(name);
            } else {
                warn!(path = %dir.join(&name).display(), "Expected a directory, skipping");
                self.stats.skipped += 1;
            }
        }
        Ok(dirs)
    }

    /// `.code` files directly under `dir`.
    fn units(&mut self, dir: &Path) -> Result<Vec<OsString>, FsError> {
        let mut units = Vec::new();
        for name in list_entries(dir)? {
            let path = dir.join(&name);
            let has_suffix = {
                let file = name.to_string_lossy();
                file.len() > UNIT_SUFFIX.len() && file.ends_with(UNIT_SUFFIX)
            };
            if path.is_file() && has_suffix {
                units.push(name);
            } else {
                debug!(path = %path.display(), "Not a code unit, skipping");
                self.stats.skipped += 1;
            }
        }
        Ok(units)
    }

    fn place(
        &mut self,
        source: &Path,
        prefix: &[&str],
        unit_file: &str,
        bucket: Bucket,
    ) -> Result<(), FsError> {
        let target = self.names.claim(self.buckets.dir(bucket), prefix, unit_file);
        copy_unit(source, &target)?;
        match bucket {
            Bucket::Positive => self.stats.positive += 1,
            Bucket::Negative => self.stats.negative += 1,
        }
        Ok(())
    }
}

/// Unit name: the file name without the `.code` suffix.
pub fn unit_name(file: &str) -> &str {
    file.strip_suffix(UNIT_SUFFIX).unwrap_or(file)
}

/// File name a unit gets inside a bucket.
pub fn bucket_file_name(prefix: &[&str], unit_file: &str) -> String {
    let mut parts = prefix.to_vec();
    parts.push(unit_file);
    parts.join(NAME_DELIMITER)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::labels::SmellLabel;
    use chrono::Utc;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    /// (component, class, method) triples, each drawn from a small alphabet so
    /// labels and units overlap often.
    fn arb_units() -> impl Strategy<Value = BTreeSet<(u8, u8, u8)>> {
        prop::collection::btree_set((0u8..3, 0u8..3, 0u8..4), 1..20)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn partition_is_total_and_disjoint(
            units in arb_units(),
            labelled in prop::collection::btree_set((0u8..4, 0u8..3, 0u8..4), 0..12),
        ) {
            let tmp = tempfile::tempdir().unwrap();
            let layout = WorkspaceLayout::new(tmp.path());
            layout.prepare().unwrap();
            let repo = Repository::new("sol", "r", "/origin/r", Utc::now());
            let methods = layout.method_units(&repo);
            for (c, k, m) in &units {
                let dir = methods.join(format!("comp{c}")).join(format!("Class{k}"));
                std::fs::create_dir_all(&dir).unwrap();
                std::fs::write(dir.join(format!("m{m}.code")), "body").unwrap();
            }
            let labels: Vec<_> = labelled
                .iter()
                .map(|(c, k, m)| SmellLabel {
                    kind: SmellKind::Implementation,
                    class_name: format!("Class{k}"),
                    component: format!("comp{c}"),
                    method: Some(format!("m{m}")),
                })
                .collect();
            let hierarchy = LabelHierarchy::from_labels("Complex Method", &labels).unwrap();

            let stats = Partitioner::new(&layout, &BucketNames::new())
                .partition(&repo, "Complex Method", SmellKind::Implementation, &hierarchy)
                .unwrap();

            let smell = layout.smell_dir("Complex Method");
            let positive: BTreeSet<String> = list_entries(&smell.join("positive"))
                .unwrap()
                .into_iter()
                .map(|name| name.to_string_lossy().into_owned())
                .collect();
            let negative: BTreeSet<String> = list_entries(&smell.join("negative"))
                .unwrap()
                .into_iter()
                .map(|name| name.to_string_lossy().into_owned())
                .collect();

            prop_assert_eq!(positive.len() + negative.len(), units.len());
            prop_assert!(positive.is_disjoint(&negative));
            prop_assert_eq!(stats.total() as usize, units.len());

            let expected: BTreeSet<_> = units
                .intersection(&labelled)
                .map(|(c, k, m)| format!("sol_comp{c}_Class{k}_m{m}.code"))
                .collect();
            prop_assert_eq!(positive, expected);
        }
    }
}
