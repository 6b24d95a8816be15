//! Dependency resolution for Maven coordinates.
//!
//! - [`MavenResolver`] drives an installed `mvn` to compute the full
//!   transitive classpath.
//! - [`LocalRepositoryResolver`] looks coordinates up directly in the local
//!   Maven repository and the Gradle cache, without transitive resolution.
//! - [`MavenProvisioner`] installs a pinned Maven distribution into the user
//!   cache when no `mvn` is available.

pub mod local;
pub mod pom;
pub mod provision;
pub mod resolver;

pub use local::LocalRepositoryResolver;
pub use provision::{MavenDistribution, MavenProvisioner};
pub use resolver::MavenResolver;
