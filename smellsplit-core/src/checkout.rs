use std::path::Path;
use std::process::Command;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::CheckoutError;
use crate::repository::{Repository, WorkspaceLayout};

/// The commit a working copy was pinned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRevision {
    pub branch: String,
    pub commit: String,
    pub committed_at: DateTime<Utc>,
}

/// Acquires a working copy of a repository at the revision its labels describe.
pub trait RepositorySource: Send + Sync {
    /// Produce `layout.repository_folder(repo)` checked out at the pinned revision.
    fn checkout(
        &self,
        repo: &Repository,
        layout: &WorkspaceLayout,
    ) -> crate::error::Result<ResolvedRevision>;
}

/// `RepositorySource` backed by the `git` CLI for transport and gix for history.
#[derive(Debug, Default)]
pub struct GitCheckout;

impl RepositorySource for GitCheckout {
    #[instrument(skip_all, fields(solution_id = %repo.solution_id))]
    fn checkout(
        &self,
        repo: &Repository,
        layout: &WorkspaceLayout,
    ) -> crate::error::Result<ResolvedRevision> {
        let url = repo.remote_url();
        let target = layout.repository_folder(repo);

        debug!(url = %url, target = %target.display(), "Cloning");
        run_git(
            &layout.repos,
            &["clone", "--quiet", "--single-branch", &url, &repo.solution_id],
        )
        .map_err(|message| CheckoutError::Clone {
            url: url.clone(),
            message,
        })?;

        let resolved = resolve_revision(&target, repo.upload_date)?;

        run_git(
            &target,
            &[
                "-c",
                "advice.detachedHead=false",
                "checkout",
                "--quiet",
                &resolved.commit,
            ],
        )
        .map_err(|message| CheckoutError::Checkout {
            revision: resolved.commit.clone(),
            message,
        })?;

        info!(
            branch = %resolved.branch,
            commit = %resolved.commit,
            committed_at = %resolved.committed_at,
            "Pinned working copy"
        );
        Ok(resolved)
    }
}

/// Find the newest commit on the checked-out branch whose committer time is at
/// or before `cutoff`.
pub fn resolve_revision(
    repo_path: &Path,
    cutoff: DateTime<Utc>,
) -> Result<ResolvedRevision, CheckoutError> {
    let repo = gix::open(repo_path).map_err(git_error)?;
    let branch = repo
        .head_name()
        .map_err(git_error)?
        .ok_or_else(|| CheckoutError::AmbiguousBranch(repo_path.to_path_buf()))?
        .shorten()
        .to_string();
    let head = repo.head_commit().map_err(git_error)?;

    let cutoff_seconds = cutoff.timestamp();
    let mut best: Option<(i64, gix::ObjectId)> = None;
    for info in head.ancestors().all().map_err(git_error)? {
        let info = info.map_err(git_error)?;
        let seconds = info
            .object()
            .map_err(git_error)?
            .time()
            .map_err(git_error)?
            .seconds;
        if seconds <= cutoff_seconds && best.is_none_or(|(newest, _)| seconds > newest) {
            best = Some((seconds, info.id));
        }
    }

    let (seconds, id) = best.ok_or_else(|| CheckoutError::NoRevisionBefore {
        branch: branch.clone(),
        cutoff: cutoff.to_rfc3339(),
    })?;
    Ok(ResolvedRevision {
        branch,
        commit: id.to_string(),
        committed_at: Utc.timestamp_opt(seconds, 0).single().unwrap_or(cutoff),
    })
}

fn git_error(e: impl std::fmt::Display) -> CheckoutError {
    CheckoutError::Git(e.to_string())
}

/// Run a git command, returning stderr as the error message on failure.
fn run_git(cwd: &Path, args: &[&str]) -> Result<String, String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map_err(|e| format!("cannot run git: {e}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("git {} failed: {}", args.join(" "), stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
