mod generate;
mod roots;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "jstubs",
    version,
    about = "Generate Python type stubs for Java libraries",
    long_about = "jstubs resolves Maven artifacts, inspects their class files and writes \
                  Python type stubs for the packages they contain. Optional runtime shims \
                  make the stub tree importable as a lazily bootstrapped package."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate stubs for Maven endpoints
    #[command(
        long_about = "Resolves the given endpoints, finds the top-level packages of their \
                            archives and writes one stub package per Java package."
    )]
    Generate(generate::GenerateArgs),
    /// List the namespace roots of Java archives
    Roots {
        /// Archives to inspect
        #[arg(value_name = "JAR", required = true)]
        archives: Vec<PathBuf>,
    },
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = jstubs_runtime::init_logging("cli", true);

    match cli.command {
        Commands::Generate(args) => generate::run(args),
        Commands::Roots { archives } => roots::run(&archives),
    }
}
