use std::fmt;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::DecomposeError;

/// Granularity of a decomposition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecomposeMode {
    /// `output/<id>/<component>/<unit>.code`
    Class,
    /// `output/<id>/<component>/<class>/<unit>.code`
    Method,
}

impl DecomposeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Method => "method",
        }
    }
}

impl fmt::Display for DecomposeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits a checked-out source tree into class- or method-level units.
pub trait Decomposer: Send + Sync {
    /// Decompose `source` into `output`. The unit tree lands under
    /// `output/<source folder name>/`; returns only once the tool has exited.
    fn decompose(
        &self,
        source: &Path,
        mode: DecomposeMode,
        output: &Path,
    ) -> Result<(), DecomposeError>;
}

/// Runs an external decomposition tool as `command... -i <src> -m <mode> -o <out>`.
#[derive(Debug, Clone)]
pub struct ExternalDecomposer {
    command: Vec<String>,
}

impl ExternalDecomposer {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl Decomposer for ExternalDecomposer {
    #[instrument(skip_all, fields(mode = %mode, source = %source.display()))]
    fn decompose(
        &self,
        source: &Path,
        mode: DecomposeMode,
        output: &Path,
    ) -> Result<(), DecomposeError> {
        let (program, leading) = self
            .command
            .split_first()
            .ok_or(DecomposeError::EmptyCommand)?;

        let result = Command::new(program)
            .args(leading)
            .arg("-i")
            .arg(source)
            .arg("-m")
            .arg(mode.as_str())
            .arg("-o")
            .arg(output)
            .output()
            .map_err(|source| DecomposeError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(DecomposeError::Failed {
                mode: mode.to_string(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        debug!("Decomposition finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ExternalDecomposer::new(Vec::new())
            .decompose(tmp.path(), DecomposeMode::Class, tmp.path())
            .unwrap_err();
        assert!(matches!(err, DecomposeError::EmptyCommand));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ExternalDecomposer::new(vec!["smellsplit-no-such-tool".into()])
            .decompose(tmp.path(), DecomposeMode::Method, tmp.path())
            .unwrap_err();
        assert!(matches!(err, DecomposeError::Spawn { .. }), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ExternalDecomposer::new(vec!["false".into()])
            .decompose(tmp.path(), DecomposeMode::Class, tmp.path())
            .unwrap_err();
        assert!(matches!(err, DecomposeError::Failed { .. }), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn passes_source_mode_and_output() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("repos/sol-1");
        let output = tmp.path().join("classes");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::create_dir_all(&output).unwrap();

        // $0 is "split", then -i SRC -m MODE -o OUT
        let script = r#"mkdir -p "$6/$(basename "$2")/core" && echo "$4" > "$6/$(basename "$2")/core/Mode.code""#;
        ExternalDecomposer::new(vec!["sh".into(), "-c".into(), script.into(), "split".into()])
            .decompose(&source, DecomposeMode::Method, &output)
            .unwrap();

        let written = std::fs::read_to_string(output.join("sol-1/core/Mode.code")).unwrap();
        assert_eq!(written.trim(), "method");
    }
}
