pub mod error;
pub mod generator;
pub mod models;
pub mod runtime;

// Re-export commonly used types
pub use error::{BoxError, StubError, StubResult};
pub use generator::{DeclarationGenerator, Formatter, GeneratorOptions};
pub use models::*;
pub use runtime::{DependencyResolver, NamespaceHandle, RuntimeLauncher, RuntimeSession};
