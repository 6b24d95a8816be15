pub mod coordinate;
pub mod namespace;
pub mod value;

pub use coordinate::Coordinate;
pub use namespace::{MODULE_MARKER, NamespaceRoot};
pub use value::{JavaClass, JavaClassKind, RuntimeValue, StartOptions};
