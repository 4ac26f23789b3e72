use std::path::PathBuf;

/// Top-level smellsplit error type.
///
/// All fallible operations in `smellsplit-core` return [`Result<T, SplitError>`](Result).
/// Each variant wraps a domain-specific error enum so the batch driver can
/// report which stage of a repository's processing failed.
#[derive(thiserror::Error, Debug)]
pub enum SplitError {
    /// Error from the label store (`SQLite` operations, row decoding).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error acquiring a repository at its pinned revision.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Error from the external structural decomposer.
    #[error("Decomposition error: {0}")]
    Decompose(#[from] DecomposeError),

    /// Label rows were inconsistent or malformed.
    #[error("Label error: {0}")]
    Label(#[from] LabelError),

    /// Filesystem operation failed (directory lifecycle, unit copy).
    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the label store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Underlying `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A row could not be mapped onto the domain model.
    #[error("Malformed row in {table}: {message}")]
    BadRow {
        /// Table or view the row came from.
        table: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

/// Errors while acquiring a repository at its analysed revision.
#[derive(thiserror::Error, Debug)]
pub enum CheckoutError {
    /// `git clone` failed (network, auth, missing remote).
    #[error("Clone of {url} failed: {message}")]
    Clone {
        /// Remote URL that was cloned.
        url: String,
        /// Captured stderr or spawn error.
        message: String,
    },

    /// HEAD is detached or unborn after clone, so there is no branch to pin.
    #[error("Cannot determine checked-out branch in {0}")]
    AmbiguousBranch(PathBuf),

    /// No commit on the branch is at or before the analysis timestamp.
    #[error("No commit on {branch} at or before {cutoff}")]
    NoRevisionBefore {
        /// Branch that was walked.
        branch: String,
        /// Analysis timestamp used as the cutoff.
        cutoff: String,
    },

    /// `git checkout` of the resolved revision failed.
    #[error("Checkout of {revision} failed: {message}")]
    Checkout {
        /// Commit that could not be checked out.
        revision: String,
        /// Captured stderr or spawn error.
        message: String,
    },

    /// Reading history through gix failed.
    #[error("Git error: {0}")]
    Git(String),
}

/// Errors from the external structural decomposer.
#[derive(thiserror::Error, Debug)]
pub enum DecomposeError {
    /// The configured command could not be started.
    #[error("Cannot start decomposer `{program}`: {source}")]
    Spawn {
        /// Program name (first element of the configured command).
        program: String,
        /// Underlying spawn error.
        source: std::io::Error,
    },

    /// The decomposer exited with a non-zero status.
    #[error("Decomposer ({mode}) exited with {status}: {stderr}")]
    Failed {
        /// Decomposition mode (`class` or `method`).
        mode: String,
        /// Exit status as reported by the OS.
        status: String,
        /// Captured stderr.
        stderr: String,
    },

    /// The decomposer was configured without a program.
    #[error("Decomposer command is empty")]
    EmptyCommand,
}

/// Errors in the label rows returned for a (repository, smell) pair.
#[derive(thiserror::Error, Debug)]
pub enum LabelError {
    /// Rows for one pair carry both design and implementation types.
    #[error("Labels for {smell} mix design and implementation rows")]
    MixedKinds {
        /// Smell name whose rows were inconsistent.
        smell: String,
    },

    /// A row carried a `type` that is neither `design` nor `implementation`.
    #[error("Unknown smell type: {0}")]
    UnknownKind(String),

    /// An implementation-level row has no method name.
    #[error("Implementation label for {component}/{class} has no method")]
    MissingMethod {
        /// Component of the offending row.
        component: String,
        /// Class of the offending row.
        class: String,
    },

    /// Labels are of a different kind than the one tracked for the smell.
    #[error("Labels for {smell} are {found} but {expected} was expected")]
    KindMismatch {
        /// Smell name.
        smell: String,
        /// Kind configured for the smell.
        expected: String,
        /// Kind found in the label rows.
        found: String,
    },
}

/// Filesystem errors, always carrying the path that failed.
#[derive(thiserror::Error, Debug)]
#[error("{action} {}: {source}", path.display())]
pub struct FsError {
    /// What was being attempted (e.g. "remove", "create", "copy to").
    pub action: &'static str,
    /// Path the operation failed on.
    pub path: PathBuf,
    /// Underlying IO error.
    pub source: std::io::Error,
}

impl FsError {
    pub fn new(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Errors in configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, SplitError>`.
pub type Result<T> = std::result::Result<T, SplitError>;
