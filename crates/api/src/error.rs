use std::path::PathBuf;

/// Error type for collaborator plumbing that has no better classification.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum StubError {
    #[error("Environment unavailable: {0}")]
    EnvironmentUnavailable(String),
    #[error("Runtime bootstrap failed: {0}")]
    Bootstrap(String),
    #[error("Unreadable archive {}: {reason}", path.display())]
    ArchiveUnreadable { path: PathBuf, reason: String },
    #[error("Cannot load namespace '{name}': {reason}")]
    NamespaceLoad { name: String, reason: String },
    #[error("module '{module}' has no attribute '{name}'")]
    AttributeNotFound { module: String, name: String },
    #[error("Failed to parse stub {}: {reason}", path.display())]
    StubParse { path: PathBuf, reason: String },
    #[error("Invalid coordinate '{0}', expected group:artifact:version")]
    InvalidCoordinate(String),
    #[error("Dependency resolution failed: {0}")]
    Resolution(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Declaration generator failed: {0}")]
    Generator(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BoxError> for StubError {
    fn from(err: BoxError) -> Self {
        StubError::Generator(err.to_string())
    }
}

impl StubError {
    /// An equivalent error value, so one failure can be reported to every
    /// caller that observed it. I/O errors keep their kind and message.
    pub fn duplicate(&self) -> StubError {
        match self {
            StubError::EnvironmentUnavailable(m) => StubError::EnvironmentUnavailable(m.clone()),
            StubError::Bootstrap(m) => StubError::Bootstrap(m.clone()),
            StubError::ArchiveUnreadable { path, reason } => StubError::ArchiveUnreadable {
                path: path.clone(),
                reason: reason.clone(),
            },
            StubError::NamespaceLoad { name, reason } => StubError::NamespaceLoad {
                name: name.clone(),
                reason: reason.clone(),
            },
            StubError::AttributeNotFound { module, name } => StubError::AttributeNotFound {
                module: module.clone(),
                name: name.clone(),
            },
            StubError::StubParse { path, reason } => StubError::StubParse {
                path: path.clone(),
                reason: reason.clone(),
            },
            StubError::InvalidCoordinate(m) => StubError::InvalidCoordinate(m.clone()),
            StubError::Resolution(m) => StubError::Resolution(m.clone()),
            StubError::Config(m) => StubError::Config(m.clone()),
            StubError::Generator(m) => StubError::Generator(m.clone()),
            StubError::Io(e) => StubError::Io(std::io::Error::new(e.kind(), e.to_string())),
        }
    }
}

pub type StubResult<T> = std::result::Result<T, StubError>;
