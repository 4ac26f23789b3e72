use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::WorkspaceSection;
use crate::error::FsError;
use crate::workdir::{ensure_directory, remove_directory};

/// A previously analysed repository, as recorded in the label store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Unique key; also the on-disk folder name for every per-repository path.
    pub solution_id: String,
    pub name: String,
    /// Remote location, normalised to SSH form for GitHub links.
    pub repository_link: String,
    /// Time the labelling analysis ran; the checkout is pinned to it.
    pub upload_date: DateTime<Utc>,
}

impl Repository {
    pub fn new(
        solution_id: impl Into<String>,
        name: impl Into<String>,
        repository_link: &str,
        upload_date: DateTime<Utc>,
    ) -> Self {
        Self {
            solution_id: solution_id.into(),
            name: name.into(),
            repository_link: normalize_link(repository_link),
            upload_date,
        }
    }

    /// URL handed to `git clone`.
    pub fn remote_url(&self) -> String {
        if self.repository_link.ends_with(".git") {
            self.repository_link.clone()
        } else {
            format!("{}.git", self.repository_link)
        }
    }
}

/// Rewrite HTTPS GitHub links to the SSH remote form.
pub fn normalize_link(link: &str) -> String {
    let link = link.trim().trim_end_matches('/');
    match link.strip_prefix("https://github.com") {
        Some(rest) => format!("ssh://git@github.com{rest}"),
        None => link.to_string(),
    }
}

/// Parse an analysis timestamp: RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS[.f]` taken as UTC.
pub fn parse_upload_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Directory layout of one batch run.
///
/// ```text
/// root/
///   repos/<solution_id>/           working copy
///   classes/<solution_id>/...      class decomposition
///   methods/<solution_id>/...      method decomposition
///   <smell name>/{positive,negative}/
/// ```
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    pub root: PathBuf,
    pub repos: PathBuf,
    pub classes: PathBuf,
    pub methods: PathBuf,
}

/// Names of the scratch folders under the root; everything else is dataset output.
pub const SCRATCH_DIRS: [&str; 3] = ["repos", "classes", "methods"];

impl WorkspaceLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            repos: root.join(SCRATCH_DIRS[0]),
            classes: root.join(SCRATCH_DIRS[1]),
            methods: root.join(SCRATCH_DIRS[2]),
        }
    }

    /// Layout for a run, honouring `timestamped` by nesting under `root/<unix-ts>`.
    pub fn from_config(section: &WorkspaceSection) -> Self {
        if section.timestamped {
            Self::new(&section.root.join(Utc::now().timestamp().to_string()))
        } else {
            Self::new(&section.root)
        }
    }

    /// Create the root (kept) and reset the scratch folders.
    pub fn prepare(&self) -> Result<(), FsError> {
        ensure_directory(&self.root, false)?;
        ensure_directory(&self.repos, true)?;
        ensure_directory(&self.classes, true)?;
        ensure_directory(&self.methods, true)?;
        Ok(())
    }

    pub fn repository_folder(&self, repo: &Repository) -> PathBuf {
        self.repos.join(&repo.solution_id)
    }

    pub fn class_units(&self, repo: &Repository) -> PathBuf {
        self.classes.join(&repo.solution_id)
    }

    pub fn method_units(&self, repo: &Repository) -> PathBuf {
        self.methods.join(&repo.solution_id)
    }

    pub fn smell_dir(&self, smell: &str) -> PathBuf {
        self.root.join(smell)
    }

    /// Reclaim the disk used by one repository's checkout and decomposition.
    pub fn cleanup(&self, repo: &Repository) -> Result<(), FsError> {
        remove_directory(&self.repository_folder(repo))?;
        remove_directory(&self.class_units(repo))?;
        remove_directory(&self.method_units(repo))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn github_https_links_become_ssh() {
        assert_eq!(
            normalize_link("https://github.com/acme/widgets"),
            "ssh://git@github.com/acme/widgets"
        );
        assert_eq!(
            normalize_link("https://gitlab.com/acme/widgets"),
            "https://gitlab.com/acme/widgets"
        );
    }

    #[test]
    fn remote_url_appends_git_suffix_once() {
        let date = Utc::now();
        let plain = Repository::new("s1", "widgets", "https://github.com/acme/widgets", date);
        assert_eq!(plain.remote_url(), "ssh://git@github.com/acme/widgets.git");
        let suffixed = Repository::new("s2", "local", "/srv/origin/widgets.git", date);
        assert_eq!(suffixed.remote_url(), "/srv/origin/widgets.git");
    }

    #[test]
    fn upload_dates_in_both_formats() {
        let expected = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(parse_upload_date("2021-03-04 05:06:07"), Some(expected));
        assert_eq!(parse_upload_date("2021-03-04T05:06:07Z"), Some(expected));
        assert_eq!(
            parse_upload_date("2021-03-04T07:06:07+02:00"),
            Some(expected)
        );
        assert!(parse_upload_date("2021-03-04 05:06:07.250").is_some());
        assert_eq!(parse_upload_date("yesterday"), None);
    }

    #[test]
    fn layout_keys_folders_by_solution_id() {
        let layout = WorkspaceLayout::new(Path::new("/work"));
        let repo = Repository::new("abc-123", "same-name", "/x", Utc::now());
        assert_eq!(layout.repository_folder(&repo), Path::new("/work/repos/abc-123"));
        assert_eq!(layout.class_units(&repo), Path::new("/work/classes/abc-123"));
        assert_eq!(layout.method_units(&repo), Path::new("/work/methods/abc-123"));
        assert_eq!(layout.smell_dir("Magic Number"), Path::new("/work/Magic Number"));
    }

    #[test]
    fn timestamped_layout_nests_under_root() {
        let section = WorkspaceSection {
            root: PathBuf::from("/work"),
            timestamped: true,
        };
        let layout = WorkspaceLayout::from_config(&section);
        assert_eq!(layout.root.parent(), Some(Path::new("/work")));
        assert!(layout.repos.starts_with(&layout.root));
    }

    #[test]
    fn prepare_keeps_dataset_and_resets_scratch() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::new(tmp.path());
        layout.prepare().unwrap();
        std::fs::create_dir_all(layout.smell_dir("Magic Number").join("positive")).unwrap();
        std::fs::write(layout.repos.join("stale"), "x").unwrap();

        layout.prepare().unwrap();
        assert!(layout.smell_dir("Magic Number").join("positive").is_dir());
        assert!(!layout.repos.join("stale").exists());
    }
}
