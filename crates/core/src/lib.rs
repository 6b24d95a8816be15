pub mod bootstrap;
pub mod config;
pub mod driver;
pub mod dynamic;
pub mod format;
pub mod logging;
pub mod pipeline;
pub mod reconcile;
pub mod shim;
pub mod stubfile;

pub use bootstrap::{Environment, EnvironmentState};
pub use config::StubgenConfig;
pub use driver::StubDriver;
pub use dynamic::{LazyModule, ModuleState, dynamic_import, dynamic_import_with};
pub use format::RuffFormatter;
pub use pipeline::{GenerateSummary, discover_roots, generate_stubs};
pub use reconcile::{ReconcileOptions, ReconcileReport, Reconciler, StubKind};
