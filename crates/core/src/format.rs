use jstubs_api::{Formatter, StubError, StubResult};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

/// Lint rules whose autofixes are applied to generated stubs.
pub const RUFF_RULES: &str = "E,W,F,I,UP,C4,B,RUF,TC,TID";

/// Applies `ruff` autofixes and formatting to generated stubs.
#[derive(Debug, Clone, Default)]
pub struct RuffFormatter {
    executable: Option<PathBuf>,
}

impl RuffFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executable(executable: PathBuf) -> Self {
        Self {
            executable: Some(executable),
        }
    }

    fn ruff_name() -> &'static str {
        if cfg!(windows) { "ruff.exe" } else { "ruff" }
    }

    fn executable(&self) -> Option<PathBuf> {
        if let Some(explicit) = &self.executable {
            return explicit.is_file().then(|| explicit.clone());
        }
        let path = std::env::var_os("PATH")?;
        std::env::split_paths(&path)
            .map(|dir| dir.join(Self::ruff_name()))
            .find(|candidate| candidate.is_file())
    }

    fn run(executable: &PathBuf, args: &[&str], files: &[PathBuf]) -> StubResult<()> {
        let output = Command::new(executable).args(args).args(files).output()?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(StubError::Generator(format!(
            "ruff {} exited with {}: {}",
            args.first().copied().unwrap_or_default(),
            output.status,
            stderr.trim()
        )))
    }
}

impl Formatter for RuffFormatter {
    fn name(&self) -> &str {
        "ruff"
    }

    fn is_available(&self) -> bool {
        self.executable().is_some()
    }

    fn format(&self, files: &[PathBuf]) -> StubResult<()> {
        if files.is_empty() {
            return Ok(());
        }
        let Some(ruff) = self.executable() else {
            warn!("ruff not found; skipping stub formatting");
            return Ok(());
        };

        debug!("Formatting {} stub files with {}", files.len(), ruff.display());
        let select = format!("--select={RUFF_RULES}");
        Self::run(
            &ruff,
            &["check", "--quiet", "--fix-only", "--unsafe-fixes", &select],
            files,
        )?;
        Self::run(&ruff, &["format", "--quiet"], files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let formatter = RuffFormatter::with_executable(dir.path().join("no-ruff"));
        assert!(!formatter.is_available());
        // Formatting is skipped rather than failing.
        assert!(formatter.format(&[dir.path().join("a.pyi")]).is_ok());
    }

    #[test]
    fn test_no_files_is_a_noop() {
        assert!(RuffFormatter::new().format(&[]).is_ok());
    }
}
