use clap::Args;
use jstubs_core::{StubgenConfig, generate_stubs};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Maven endpoints to resolve (e.g. org.myproject:myproject:1.0.0)
    #[arg(value_name = "ENDPOINT")]
    pub endpoints: Vec<String>,

    /// Package prefix to generate stubs for (e.g. org.myproject); may be repeated
    #[arg(long = "prefix", value_name = "PREFIX")]
    pub prefixes: Vec<String>,

    /// Directory to write stubs to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Type java.lang.String return values as Python str
    #[arg(long, conflicts_with = "no_convert_strings")]
    pub convert_strings: bool,

    /// Keep java.lang.String return values opaque, overriding the config file
    #[arg(long)]
    pub no_convert_strings: bool,

    /// Do not emit docstrings for generated classes
    #[arg(long)]
    pub no_javadoc: bool,

    /// Add runtime shims next to generated stubs (default)
    #[arg(long, conflicts_with = "no_runtime_imports")]
    pub runtime_imports: bool,

    /// Do not add runtime shims
    #[arg(long)]
    pub no_runtime_imports: bool,

    /// Remove stubs that declare nothing but the namespace marker, leaving
    /// implicit namespace directories
    #[arg(long)]
    pub remove_namespace_only_stubs: bool,

    /// Skip the ruff formatting pass
    #[arg(long)]
    pub no_format: bool,

    /// JSON configuration file; flags given on the command line take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Resolve from local repositories only
    #[arg(long)]
    pub offline: bool,

    #[arg(long, value_name = "DIR")]
    pub java_home: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    pub maven_home: Option<PathBuf>,

    /// Local Maven repository to resolve into
    #[arg(long, value_name = "DIR")]
    pub maven_repo: Option<PathBuf>,
}

impl GenerateArgs {
    pub fn into_config(self) -> Result<StubgenConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => StubgenConfig::from_json_file(path)?,
            None => StubgenConfig {
                convert_strings: false,
                ..Default::default()
            },
        };

        if !self.endpoints.is_empty() {
            config.endpoints = self.endpoints;
        }
        if !self.prefixes.is_empty() {
            config.prefixes = self.prefixes;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if self.convert_strings {
            config.convert_strings = true;
        }
        if self.no_convert_strings {
            config.convert_strings = false;
        }
        if self.no_javadoc {
            config.include_javadoc = false;
        }
        if self.runtime_imports {
            config.add_runtime_imports = true;
        }
        if self.no_runtime_imports {
            config.add_runtime_imports = false;
        }
        config.remove_namespace_only_stubs |= self.remove_namespace_only_stubs;
        config.offline |= self.offline;
        if self.java_home.is_some() {
            config.java_home = self.java_home;
        }
        if self.maven_home.is_some() {
            config.maven_home = self.maven_home;
        }
        if self.maven_repo.is_some() {
            config.maven_repository = self.maven_repo;
        }
        config.apply_env();

        if config.endpoints.is_empty() {
            return Err("at least one endpoint is required".into());
        }
        Ok(config)
    }
}

pub fn run(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let format = !args.no_format;
    let config = args.into_config()?;

    let environment = jstubs_runtime::install_environment(&config);
    let generator = jstubs_runtime::default_generator();
    let formatter = jstubs_runtime::default_formatter();

    let summary = generate_stubs(
        &config,
        &environment,
        &generator,
        format.then_some(&formatter as &dyn jstubs_api::Formatter),
    )?;

    info!(
        "Generated {} stub files for {} namespace roots in {}",
        summary.generated.len(),
        summary.roots.len(),
        config.output_dir.display()
    );
    info!(
        "{} real, {} namespace-only ({} removed), {} runtime shims written",
        summary.report.real.len(),
        summary.report.namespace_only.len(),
        summary.report.removed.len(),
        summary.report.shims_written.len()
    );
    Ok(())
}
