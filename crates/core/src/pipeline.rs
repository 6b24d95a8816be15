//! The `generate_stubs` entry point: roots, driver, reconciler, formatter.

use crate::bootstrap::Environment;
use crate::config::StubgenConfig;
use crate::driver::StubDriver;
use crate::reconcile::{ReconcileOptions, ReconcileReport, Reconciler};
use jstubs_api::{
    Coordinate, DeclarationGenerator, Formatter, NamespaceRoot, StubError, StubResult,
};
use jstubs_java::list_top_level_packages;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default)]
pub struct GenerateSummary {
    pub roots: BTreeSet<NamespaceRoot>,
    /// Stub files written by the declaration generator.
    pub generated: Vec<PathBuf>,
    pub report: ReconcileReport,
}

/// Whether a classpath archive was contributed by one of the requested
/// artifacts rather than pulled in transitively.
pub fn belongs_to_artifact(archive: &Path, coordinates: &[Coordinate]) -> bool {
    let Some(file_name) = archive.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    coordinates
        .iter()
        .any(|coordinate| file_name.starts_with(coordinate.artifact()))
}

/// Namespace roots of the requested artifacts' own archives.
pub fn discover_roots(
    classpath: &[PathBuf],
    coordinates: &[Coordinate],
) -> StubResult<BTreeSet<NamespaceRoot>> {
    let mut roots = BTreeSet::new();
    for archive in classpath {
        if !archive.is_file() || !belongs_to_artifact(archive, coordinates) {
            continue;
        }
        let found = list_top_level_packages(archive)?;
        if found.is_empty() {
            warn!("No classes found in {}", archive.display());
        }
        debug!("{}: {} namespace roots", archive.display(), found.len());
        roots.extend(found);
    }
    Ok(roots)
}

fn python_files(output_dir: &Path) -> StubResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(output_dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let is_python = matches!(
            entry.path().extension().and_then(|e| e.to_str()),
            Some("py" | "pyi")
        );
        if entry.file_type().is_file() && is_python {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

pub fn generate_stubs(
    config: &StubgenConfig,
    environment: &Environment,
    generator: &dyn DeclarationGenerator,
    formatter: Option<&dyn Formatter>,
) -> StubResult<GenerateSummary> {
    let coordinates = config.coordinates()?;
    if coordinates.is_empty() {
        return Err(StubError::Config("no endpoints given".to_string()));
    }
    if environment.options().convert_strings != config.convert_strings {
        warn!(
            "Runtime starts with convert_strings={}, stubs requested with {}",
            environment.options().convert_strings,
            config.convert_strings
        );
    }

    let session = environment.bootstrap(&coordinates)?;
    let roots = if config.prefixes.is_empty() {
        discover_roots(session.classpath(), &coordinates)?
    } else {
        config
            .prefixes
            .iter()
            .map(|p| NamespaceRoot::new(p.as_str()))
            .collect()
    };
    let endpoints: Vec<&str> = coordinates.iter().map(Coordinate::as_str).collect();
    info!("Using endpoints: {:?}", endpoints);

    let generated = StubDriver::new(generator).generate(
        session.as_ref(),
        &roots,
        &config.output_dir,
        config.include_javadoc,
    )?;

    let report = Reconciler::new(ReconcileOptions {
        remove_namespace_only: config.remove_namespace_only_stubs,
        add_runtime_imports: config.add_runtime_imports,
        coordinates,
        runtime_package: config.runtime_package.clone(),
    })
    .run(&config.output_dir)?;

    if let Some(formatter) = formatter {
        if formatter.is_available() {
            let files = python_files(&config.output_dir)?;
            info!(
                "Running {} on {} generated files in {}",
                formatter.name(),
                files.len(),
                config.output_dir.display()
            );
            if let Err(e) = formatter.format(&files) {
                warn!("Formatting with {} failed: {}", formatter.name(), e);
            }
        } else {
            warn!("{} not available; skipping formatting", formatter.name());
        }
    }

    Ok(GenerateSummary {
        roots,
        generated,
        report,
    })
}
