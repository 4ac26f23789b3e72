// Batch driver: runs each repository through checkout, decomposition, labels,
// partitioning and cleanup, one at a time. A failing repository is skipped.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::{error, info, instrument};

use crate::checkout::RepositorySource;
use crate::config::SplitConfig;
use crate::decompose::{DecomposeMode, Decomposer};
use crate::error::SplitError;
use crate::labels::{LabelHierarchy, SmellKind};
use crate::partition::{BucketNames, PartitionStats, Partitioner};
use crate::progress::{NoopReporter, ProgressReporter};
use crate::repository::{Repository, WorkspaceLayout};
use crate::store::LabelStore;

/// Step of a repository's processing, used to report where it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Checkout,
    DecomposeClasses,
    DecomposeMethods,
    Labels,
    Partition,
    Cleanup,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checkout => "checkout",
            Self::DecomposeClasses => "decompose:class",
            Self::DecomposeMethods => "decompose:method",
            Self::Labels => "labels",
            Self::Partition => "partition",
            Self::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repository that was skipped, and why.
#[derive(Debug)]
pub struct RepositoryFailure {
    pub solution_id: String,
    pub name: String,
    pub stage: Stage,
    pub error: SplitError,
}

impl fmt::Display for RepositoryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.stage, self.name, self.solution_id, self.error
        )
    }
}

/// Summary of a batch run.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Repositories in the requested page.
    pub attempted: usize,
    /// Solution ids that were fully processed, in processing order.
    pub succeeded: Vec<String>,
    pub failures: Vec<RepositoryFailure>,
    /// Units placed per smell. Includes repositories whose only failure was
    /// cleanup, since their units are already in the buckets.
    pub smells: BTreeMap<String, PartitionStats>,
    pub duration: Duration,
}

/// Orchestrates dataset construction over a page of candidate repositories.
pub struct DatasetPipeline<'a> {
    config: &'a SplitConfig,
    layout: WorkspaceLayout,
    store: &'a dyn LabelStore,
    source: &'a dyn RepositorySource,
    decomposer: &'a dyn Decomposer,
    /// Shared by every partition call so bucket names stay unique across repositories.
    names: BucketNames,
}

impl fmt::Debug for DatasetPipeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetPipeline")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

type StageResult<T> = Result<T, (Stage, SplitError)>;

fn at<T, E: Into<SplitError>>(stage: Stage, result: Result<T, E>) -> StageResult<T> {
    result.map_err(|e| (stage, e.into()))
}

impl<'a> DatasetPipeline<'a> {
    pub fn new(
        config: &'a SplitConfig,
        layout: WorkspaceLayout,
        store: &'a dyn LabelStore,
        source: &'a dyn RepositorySource,
        decomposer: &'a dyn Decomposer,
    ) -> Self {
        Self {
            config,
            layout,
            store,
            source,
            decomposer,
            names: BucketNames::new(),
        }
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    /// Build the dataset for one page of candidates, without progress output.
    pub async fn run(&self, offset: u64, limit: u64) -> crate::error::Result<BatchResult> {
        self.run_with_progress(offset, limit, &NoopReporter).await
    }

    /// Build the dataset for one page of candidates.
    ///
    /// Only workspace preparation and the candidate query can fail the whole
    /// run; every per-repository error is recorded in the result.
    pub async fn run_with_progress(
        &self,
        offset: u64,
        limit: u64,
        progress: &dyn ProgressReporter,
    ) -> crate::error::Result<BatchResult> {
        self.layout.prepare()?;
        info!(root = %self.layout.root.display(), "Using working directory");

        let repositories = self
            .store
            .fetch_candidates(&self.config.selection, offset, limit)
            .await?;
        info!(offset, limit, count = repositories.len(), "Fetched candidates");

        Ok(self.process_repositories(&repositories, progress).await)
    }

    /// Process repositories in order. Never fails: errors are collected per repository.
    pub async fn process_repositories(
        &self,
        repositories: &[Repository],
        progress: &dyn ProgressReporter,
    ) -> BatchResult {
        let start = Instant::now();
        let total = repositories.len() as u64;
        let mut result = BatchResult {
            attempted: repositories.len(),
            ..BatchResult::default()
        };

        progress.start("build", total);
        for (index, repo) in (1u64..).zip(repositories) {
            progress.repository(index, total, &repo.name);
            info!(index, total, repository = %repo.name, "Processing repository");

            // Units are in the buckets once partitioning succeeds, so their
            // counts are kept even if cleanup then fails.
            let outcome = self.process_repository(repo).await.and_then(|per_smell| {
                for (smell, stats) in per_smell {
                    result.smells.entry(smell).or_default().merge(stats);
                }
                at(Stage::Cleanup, self.layout.cleanup(repo))
            });

            match outcome {
                Ok(()) => result.succeeded.push(repo.solution_id.clone()),
                Err((stage, e)) => {
                    error!(
                        repository = %repo.name,
                        solution_id = %repo.solution_id,
                        stage = %stage,
                        error = %e,
                        "Cannot process repository, skipping"
                    );
                    progress.message(&format!("skipped {} ({stage}): {e}", repo.name));
                    result.failures.push(RepositoryFailure {
                        solution_id: repo.solution_id.clone(),
                        name: repo.name.clone(),
                        stage,
                        error: e,
                    });
                }
            }
            progress.advance();
        }
        progress.finish();

        result.duration = start.elapsed();
        info!(
            attempted = result.attempted,
            succeeded = result.succeeded.len(),
            failed = result.failures.len(),
            duration = ?result.duration,
            "Batch complete"
        );
        result
    }

    #[instrument(skip_all, fields(solution_id = %repo.solution_id))]
    async fn process_repository(
        &self,
        repo: &Repository,
    ) -> StageResult<BTreeMap<String, PartitionStats>> {
        at(Stage::Checkout, self.source.checkout(repo, &self.layout))?;

        let source = self.layout.repository_folder(repo);
        at(
            Stage::DecomposeClasses,
            self.decomposer
                .decompose(&source, DecomposeMode::Class, &self.layout.classes),
        )?;
        at(
            Stage::DecomposeMethods,
            self.decomposer
                .decompose(&source, DecomposeMode::Method, &self.layout.methods),
        )?;

        // All labels are fetched and checked before any unit is copied.
        let labels = self.fetch_all_labels(repo).await?;

        let partitioner = Partitioner::new(&self.layout, &self.names);
        let mut per_smell = BTreeMap::new();
        for (smell, kind, hierarchy) in &labels {
            let stats = at(
                Stage::Partition,
                partitioner.partition(repo, smell, *kind, hierarchy),
            )?;
            info!(
                smell = %smell,
                positive = stats.positive,
                negative = stats.negative,
                "Partitioned smell"
            );
            per_smell.insert(smell.clone(), stats);
        }
        Ok(per_smell)
    }

    async fn fetch_all_labels(
        &self,
        repo: &Repository,
    ) -> StageResult<Vec<(String, SmellKind, LabelHierarchy)>> {
        let mut labels = Vec::with_capacity(self.config.smells.len());
        for tracked in &self.config.smells {
            let hierarchy = at(
                Stage::Labels,
                self.store.fetch_labels(&repo.solution_id, &tracked.name).await,
            )?;
            at(Stage::Labels, hierarchy.ensure_kind(&tracked.name, tracked.kind))?;
            labels.push((tracked.name.clone(), tracked.kind, hierarchy));
        }
        Ok(labels)
    }
}
