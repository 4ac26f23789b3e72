use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::config::SplitConfig;
use crate::error::FsError;
use crate::repository::SCRATCH_DIRS;
use crate::workdir::list_entries;

/// File counts of one smell's buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketCounts {
    pub positive: u64,
    pub negative: u64,
}

/// What a built dataset directory holds.
#[derive(Debug, Default, Serialize)]
pub struct DatasetSummary {
    pub smells: BTreeMap<String, BucketCounts>,
    /// Directories under the root that are not tracked smells.
    pub unrecognized: Vec<String>,
}

/// Count the units in every tracked smell's buckets under `root`.
///
/// Directories named after untracked smells are reported and skipped.
pub fn scan_dataset(root: &Path, config: &SplitConfig) -> Result<DatasetSummary, FsError> {
    let mut summary = DatasetSummary::default();
    for entry in list_entries(root)? {
        let dir = root.join(&entry);
        let name = entry.to_string_lossy().into_owned();
        if !dir.is_dir() || SCRATCH_DIRS.contains(&name.as_str()) {
            continue;
        }
        if config.smell(&name).is_none() {
            warn!(directory = %name, "Unrecognized smell, skipping");
            summary.unrecognized.push(name);
            continue;
        }
        let counts = BucketCounts {
            positive: count_files(&dir.join("positive"))?,
            negative: count_files(&dir.join("negative"))?,
        };
        summary.smells.insert(name, counts);
    }
    Ok(summary)
}

/// Run directories (`<unix-ts>`) under a timestamped workspace root, oldest first.
pub fn run_directories(root: &Path) -> Result<Vec<PathBuf>, FsError> {
    let mut runs: Vec<(u64, PathBuf)> = Vec::new();
    for entry in list_entries(root)? {
        let path = root.join(&entry);
        let stamp = entry.to_str().and_then(|name| name.parse::<u64>().ok());
        if let (Some(stamp), true) = (stamp, path.is_dir()) {
            runs.push((stamp, path));
        }
    }
    runs.sort();
    Ok(runs.into_iter().map(|(_, path)| path).collect())
}

fn count_files(dir: &Path) -> Result<u64, FsError> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut count = 0;
    for name in list_entries(dir)? {
        if dir.join(name).is_file() {
            count += 1;
        }
    }
    Ok(count)
}
