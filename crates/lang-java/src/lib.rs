//! Java side of stub generation: archive inspection, JDK lookup, a runtime
//! bridge over the resolved classpath and a class file based declaration
//! generator.

pub mod archive;
pub mod classpath;
pub mod jdk;
pub mod stubgen;

pub use archive::{is_class_entry, list_top_level_packages, namespace_roots};
pub use classpath::{ClasspathIndex, ClasspathRuntime, ClasspathSession, PackageHandle};
pub use jdk::{JavaHome, JdkLocator};
pub use stubgen::ClassfileStubGenerator;
