//! sdkgen CLI
//!
//! Command-line interface for building API models from OpenAPI and
//! Discovery documents and annotating them for Rust code generation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sdkgen_common::{Config, API};
use sdkgen_generator::{RustAnnotator, ServiceAnnotations};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sdkgen")]
#[command(version, about = "Build and annotate API models for client library generation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the document named by a configuration file and display the model
    #[command(after_help = "EXAMPLES:\n  \
        # Parse a Discovery document\n  \
        sdkgen parse --config compute.toml\n\n  \
        # Show every service and method\n  \
        sdkgen parse --config compute.toml --verbose")]
    Parse {
        /// Path to the TOML configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Parse and annotate a model for the Rust templates
    #[command(after_help = "EXAMPLES:\n  \
        # Annotate with the [codec] options of the configuration\n  \
        sdkgen annotate --config secretmanager.toml")]
    Annotate {
        /// Path to the TOML configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse { config } => parse_command(&config, cli.verbose)?,
        Commands::Annotate { config } => annotate_command(&config, cli.verbose)?,
    }

    Ok(())
}

/// Logs go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(config_path: &Path) -> Result<(Config, API)> {
    println!(
        "{} Loading configuration: {}",
        "→".cyan(),
        config_path.display()
    );
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    println!(
        "{} Parsing {} document: {}",
        "→".cyan(),
        config.general.specification_format.yellow(),
        config.general.specification_source
    );
    let model = sdkgen_parser::parse(&config).context("Failed to parse specification")?;
    Ok((config, model))
}

fn parse_command(config_path: &Path, verbose: bool) -> Result<()> {
    let (_, model) = load(config_path)?;

    println!("\n{}", "✓ Parse successful!".green().bold());
    print_model_summary(&model);

    if verbose {
        println!("\n{}", "Services:".bold());
        for id in &model.services {
            let service = &model.state[*id];
            println!("  • {} ({})", service.name.cyan(), service.id);
            for method in &service.methods {
                let method = &model.state[*method];
                let bindings: Vec<String> = method
                    .path_info
                    .bindings
                    .iter()
                    .map(|b| format!("{} /{}", b.verb, b.path_template))
                    .collect();
                println!("    {} {}", method.name, bindings.join(", ").dimmed());
            }
        }
    }

    Ok(())
}

fn annotate_command(config_path: &Path, verbose: bool) -> Result<()> {
    let (config, mut model) = load(config_path)?;

    println!("{} Annotating model for Rust", "→".cyan());
    let annotator =
        RustAnnotator::from_config(&config).context("Failed to read codec options")?;
    let annotations = annotator
        .annotate(&mut model)
        .context("Failed to annotate model")?;

    println!("\n{}", "✓ Annotation complete!".green().bold());
    print_model_summary(&model);
    println!("\n{}", "Crate:".bold());
    println!("  Name: {}", annotations.package_name.yellow());
    println!("  Version: {}", annotations.package_version);
    println!("  Release level: {}", annotations.release_level);
    println!("  Services: {}", annotations.services.len());
    println!("  LROs: {}", if annotations.has_lros { "yes" } else { "no" });
    if let Some(features) = &annotations.default_features {
        println!("  Default features: {}", features.join(", "));
    }
    if !annotations.required_packages.is_empty() {
        println!("\n{}", "Dependencies:".bold());
        for line in &annotations.required_packages {
            println!("  {line}");
        }
    }

    if verbose {
        println!("\n{}", "Services:".bold());
        for id in &annotations.services {
            let Some(service) = model.state[*id].codec.get::<ServiceAnnotations>() else {
                continue;
            };
            let marker = if service.incomplete { " (incomplete)" } else { "" };
            println!(
                "  • {}{} [{}]",
                service.name.cyan(),
                marker.yellow(),
                service.feature_name
            );
            println!("    Methods: {}", service.methods.len());
        }
    }

    Ok(())
}

fn print_model_summary(model: &API) {
    let methods: usize = model
        .services
        .iter()
        .map(|s| model.state[*s].methods.len())
        .sum();
    println!("\n{}", "Model:".bold());
    println!("  Name: {}", model.name.yellow());
    if !model.title.is_empty() {
        println!("  Title: {}", model.title);
    }
    if !model.package_name.is_empty() {
        println!("  Package: {}", model.package_name);
    }
    println!("  Messages: {}", model.all_messages().len());
    println!("  Enums: {}", model.all_enums().len());
    println!("  Services: {}", model.services.len());
    println!("  Methods: {methods}");
}
