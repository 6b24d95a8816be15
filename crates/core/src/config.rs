use crate::shim::DEFAULT_RUNTIME_PACKAGE;
use jstubs_api::{Coordinate, StubError, StubResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for one stub generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StubgenConfig {
    /// Dependency coordinates (`group:artifact:version`).
    pub endpoints: Vec<String>,
    /// Explicit namespace roots; when set, archives are not inspected.
    pub prefixes: Vec<String>,
    pub output_dir: PathBuf,
    pub convert_strings: bool,
    pub include_javadoc: bool,
    pub add_runtime_imports: bool,
    pub remove_namespace_only_stubs: bool,
    pub runtime_package: String,
    pub java_home: Option<PathBuf>,
    pub maven_home: Option<PathBuf>,
    pub maven_repository: Option<PathBuf>,
    /// Resolve from local repositories only, without invoking Maven.
    pub offline: bool,
}

impl Default for StubgenConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            prefixes: Vec::new(),
            output_dir: PathBuf::from("stubs"),
            convert_strings: true,
            include_javadoc: true,
            add_runtime_imports: true,
            remove_namespace_only_stubs: false,
            runtime_package: DEFAULT_RUNTIME_PACKAGE.to_string(),
            java_home: None,
            maven_home: None,
            maven_repository: None,
            offline: false,
        }
    }
}

fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl StubgenConfig {
    pub fn from_json_file(path: &Path) -> StubResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| StubError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Fill unset tool locations from the environment.
    pub fn apply_env(&mut self) {
        if self.java_home.is_none() {
            self.java_home = std::env::var_os("JAVA_HOME").map(PathBuf::from);
        }
        if self.maven_home.is_none() {
            self.maven_home = std::env::var_os("MAVEN_HOME")
                .or_else(|| std::env::var_os("M2_HOME"))
                .map(PathBuf::from);
        }
        if self.maven_repository.is_none() {
            self.maven_repository = std::env::var_os("MAVEN_REPO").map(PathBuf::from);
        }
        if let Ok(value) = std::env::var("JSTUBS_OFFLINE") {
            self.offline |= env_flag(&value);
        }
    }

    pub fn coordinates(&self) -> StubResult<Vec<Coordinate>> {
        self.endpoints.iter().map(|e| Coordinate::parse(e)).collect()
    }
}
