//! Document schema to GraphQL CLI
//!
//! Command-line interface for building and checking types declared in a
//! definitions document.

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand, ValueEnum};
use docschema_graphql::{load_definitions_auto, print_sdl, GeneratedType, LoadError, TypeRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docschema-gql")]
#[command(about = "Generate GraphQL types from document schema definitions")]
#[command(version)]
struct Cli {
    /// Log generation steps to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the declared types and print them
    Build {
        /// Definitions source: file path or URL (http:// or https://)
        source: String,

        /// Only print these types (all declared types are still built)
        #[arg(long)]
        only: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Sdl)]
        format: Format,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Build the declared types and evaluate every field map
    Check {
        /// Definitions source: file path or URL (http:// or https://)
        source: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Sdl,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Build {
            source,
            only,
            format,
            pretty,
            output,
        } => run_build(&source, &only, format, pretty, output),
        Commands::Check { source, json } => run_check(&source, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_declared(
    source: &str,
    json_output: bool,
) -> Result<(TypeRegistry, Vec<Rc<GeneratedType>>), u8> {
    let definitions = load_definitions_auto(source).map_err(|e| {
        match &e {
            LoadError::InvalidDocument { errors } if json_output => {
                let output = serde_json::json!({ "valid": false, "errors": errors });
                println!("{}", output);
            }
            LoadError::InvalidDocument { errors } => {
                eprintln!("Invalid definitions document:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            _ => report_error(json_output, &e.to_string()),
        }
        e.exit_code() as u8
    })?;

    let registry = TypeRegistry::new();
    let generated = definitions.build_all(&registry).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;
    Ok((registry, generated))
}

fn run_build(
    source: &str,
    only: &[String],
    format: Format,
    pretty: bool,
    output: Option<PathBuf>,
) -> Result<(), u8> {
    let (_registry, generated) = build_declared(source, false)?;

    let unknown: Vec<&str> = only
        .iter()
        .map(String::as_str)
        .filter(|name| !generated.iter().any(|ty| ty.name() == *name))
        .collect();
    if !unknown.is_empty() {
        eprintln!("Error: --only names undeclared type(s): {}", unknown.join(", "));
        return Err(2);
    }

    let selected: Vec<Rc<GeneratedType>> = if only.is_empty() {
        generated
    } else {
        generated
            .into_iter()
            .filter(|ty| only.iter().any(|name| name == ty.name()))
            .collect()
    };

    let rendered = match format {
        Format::Sdl => print_sdl(&selected).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?,
        Format::Json => {
            let mut types = Vec::with_capacity(selected.len());
            for ty in &selected {
                types.push(ty.to_json().map_err(|e| {
                    eprintln!("Error: {}", e);
                    e.exit_code() as u8
                })?);
            }
            let value = serde_json::Value::Array(types);
            if pretty {
                serde_json::to_string_pretty(&value)
            } else {
                serde_json::to_string(&value)
            }
            .map_err(|e| {
                eprintln!("Error serializing output: {}", e);
                2u8
            })?
        }
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", rendered.trim_end());
        }
    }

    Ok(())
}

fn run_check(source: &str, json_output: bool) -> Result<(), u8> {
    let (registry, _generated) = build_declared(source, json_output)?;
    let failures = registry.evaluate_all();

    if failures.is_empty() {
        if json_output {
            let output = serde_json::json!({ "valid": true, "types": registry.names() });
            println!("{}", output);
        } else {
            println!("OK: {} types", registry.len());
        }
        return Ok(());
    }

    if json_output {
        let errors: Vec<serde_json::Value> = failures
            .iter()
            .map(|(name, e)| serde_json::json!({ "type": name, "message": e.to_string() }))
            .collect();
        println!("{}", serde_json::json!({ "valid": false, "errors": errors }));
    } else {
        eprintln!("Field evaluation failed:");
        for (name, e) in &failures {
            eprintln!("  {}: {}", name, e);
        }
    }
    Err(1)
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
