// Integration test utilities and fixtures for smellsplit.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use rusqlite::{Connection, params};
use smellsplit_core::decompose::{DecomposeMode, Decomposer};
use smellsplit_core::error::DecomposeError;
use smellsplit_core::store::schema::SCHEMA_SQL;
use smellsplit_core::store::sqlite::SqliteLabelStore;

/// An origin repository with commits at fixed dates.
///
/// Sources follow a `<component>/<Class>.java` layout so [`SourceDecomposer`]
/// can turn them into units.
#[derive(Debug)]
pub struct OriginRepo {
    pub dir: tempfile::TempDir,
    /// SHA of each commit, oldest first.
    pub commits: Vec<String>,
}

impl OriginRepo {
    /// Create a repository with one commit per `(date, files)` entry. Files are
    /// written (or overwritten) relative to the root before each commit.
    pub fn with_history(history: &[(&str, &[(&str, &str)])]) -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let root = dir.path().join("origin.git");
        std::fs::create_dir_all(&root).unwrap();
        git(&root, "2000-01-01T00:00:00+00:00", &["init", "--initial-branch=main"]);
        git(&root, "2000-01-01T00:00:00+00:00", &["config", "user.email", "test@smellsplit.dev"]);
        git(&root, "2000-01-01T00:00:00+00:00", &["config", "user.name", "Test"]);

        let mut commits = Vec::new();
        for (i, (date, files)) in history.iter().enumerate() {
            for (rel, content) in *files {
                let path = root.join(rel);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, content).unwrap();
            }
            git(&root, date, &["add", "."]);
            git(&root, date, &["commit", "-m", &format!("commit {i}")]);
            commits.push(git(&root, date, &["rev-parse", "HEAD"]));
        }
        Self { dir, commits }
    }

    /// A single-commit repository.
    pub fn single(date: &str, files: &[(&str, &str)]) -> Self {
        Self::with_history(&[(date, files)])
    }

    /// Link to store in the label database (a local path clonable by git).
    pub fn link(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("origin.git")
    }
}

fn git(dir: &Path, date: &str, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@smellsplit.dev")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@smellsplit.dev")
        .env("GIT_AUTHOR_DATE", date)
        .env("GIT_COMMITTER_DATE", date)
        .output()
        .unwrap_or_else(|e| panic!("git {}: {e}", args.join(" ")));
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("git {} failed: {stderr}", args.join(" "));
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Builder for a label database with the production schema.
#[derive(Debug)]
pub struct LabelFixture {
    conn: Connection,
}

impl Default for LabelFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelFixture {
    pub fn new() -> Self {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        conn.execute_batch(SCHEMA_SQL).expect("create schema");
        Self { conn }
    }

    /// Same schema, backed by a file (for driving the CLI).
    pub fn on_disk(path: &Path) -> Self {
        let conn = Connection::open(path).expect("open db file");
        conn.execute_batch(SCHEMA_SQL).expect("create schema");
        Self { conn }
    }

    /// Register a Java repository that passes the default selection
    /// (Multifaceted Abstraction severity 10).
    #[must_use]
    pub fn solution(self, solution_id: &str, name: &str, link: &str, upload_date: &str) -> Self {
        self.solution_with(solution_id, name, link, upload_date, "java", 10.0)
    }

    #[must_use]
    pub fn solution_with(
        self,
        solution_id: &str,
        name: &str,
        link: &str,
        upload_date: &str,
        language: &str,
        severity: f64,
    ) -> Self {
        self.conn
            .execute(
                "INSERT INTO solutions VALUES (?1, ?2, ?3, ?4, ?5)",
                params![solution_id, name, link, upload_date, language],
            )
            .unwrap();
        self.conn
            .execute(
                "INSERT INTO solution_smells VALUES (?1, 'Multifaceted Abstraction', ?2)",
                params![solution_id, severity],
            )
            .unwrap();
        self
    }

    #[must_use]
    pub fn design(self, solution_id: &str, smell: &str, component: &str, class_name: &str) -> Self {
        self.label(solution_id, smell, "design", component, class_name, None)
    }

    #[must_use]
    pub fn implementation(
        self,
        solution_id: &str,
        smell: &str,
        component: &str,
        class_name: &str,
        method: &str,
    ) -> Self {
        self.label(
            solution_id,
            smell,
            "implementation",
            component,
            class_name,
            Some(method),
        )
    }

    fn label(
        self,
        solution_id: &str,
        smell: &str,
        kind: &str,
        component: &str,
        class_name: &str,
        method: Option<&str>,
    ) -> Self {
        self.conn
            .execute(
                "INSERT INTO smells (solution_id, name, type, class, component, method)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![solution_id, smell, kind, class_name, component, method],
            )
            .unwrap();
        self
    }

    pub fn into_store(self) -> SqliteLabelStore {
        SqliteLabelStore::from_connection(self.conn)
    }
}

/// Decomposer that reads `<component>/<Class>.java` files from the checked-out
/// tree. Class mode emits one unit per file; method mode emits one unit per
/// line starting with `void name(`.
#[derive(Debug, Default)]
pub struct SourceDecomposer {
    failing: HashSet<String>,
}

impl SourceDecomposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit non-zero for this solution id, like a crashing external tool.
    #[must_use]
    pub fn failing_for(mut self, solution_id: &str) -> Self {
        self.failing.insert(solution_id.to_string());
        self
    }
}

impl Decomposer for SourceDecomposer {
    fn decompose(
        &self,
        source: &Path,
        mode: DecomposeMode,
        output: &Path,
    ) -> Result<(), DecomposeError> {
        let solution_id = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.failing.contains(&solution_id) {
            return Err(DecomposeError::Failed {
                mode: mode.to_string(),
                status: "exit status: 1".into(),
                stderr: "java.lang.OutOfMemoryError".into(),
            });
        }

        let target = output.join(&solution_id);
        for (component, class_name, body) in java_sources(source) {
            match mode {
                DecomposeMode::Class => {
                    let dir = target.join(&component);
                    std::fs::create_dir_all(&dir).unwrap();
                    std::fs::write(dir.join(format!("{class_name}.code")), &body).unwrap();
                }
                DecomposeMode::Method => {
                    let dir = target.join(&component).join(&class_name);
                    for line in body.lines() {
                        let Some(rest) = line.trim().strip_prefix("void ") else {
                            continue;
                        };
                        let Some((method, _)) = rest.split_once('(') else {
                            continue;
                        };
                        std::fs::create_dir_all(&dir).unwrap();
                        std::fs::write(dir.join(format!("{method}.code")), line.trim()).unwrap();
                    }
                }
            }
        }
        Ok(())
    }
}

fn java_sources(root: &Path) -> Vec<(String, String, String)> {
    let mut found = Vec::new();
    let Ok(components) = std::fs::read_dir(root) else {
        return found;
    };
    for component in components.flatten() {
        let name = component.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !component.path().is_dir() {
            continue;
        }
        for file in std::fs::read_dir(component.path()).unwrap().flatten() {
            let path = file.path();
            if path.extension().is_some_and(|e| e == "java") {
                let class_name = path.file_stem().unwrap().to_string_lossy().into_owned();
                let body = std::fs::read_to_string(&path).unwrap();
                found.push((name.clone(), class_name, body));
            }
        }
    }
    found
}

/// Sorted file names inside a bucket directory (empty if it does not exist).
pub fn bucket(root: &Path, smell: &str, side: &str) -> Vec<String> {
    let dir = root.join(smell).join(side);
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<_> = entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
