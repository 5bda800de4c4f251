//! Annotated Schema CLI
//!
//! Command-line interface for resolving catalog types into schemas,
//! validating payloads, and linting catalogs.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use annotated_schema::{
    lint, load_catalog_auto, load_json, load_options, resolve_type, validate, FileStatus,
    ResolveOptions, Severity, SynthesisStrategy, TypeDescriptor, TypeNaming, ValidateError,
};

#[derive(Parser)]
#[command(name = "annotated-schema")]
#[command(about = "Resolve property metadata of catalog types into OpenAPI schemas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the schema of a type and every model it reaches
    Resolve {
        /// Catalog source: file path or URL (http:// or https://)
        catalog: String,

        /// Root type to resolve (e.g., com.acme.Pet or list<com.acme.Pet>)
        #[arg(long = "type", short = 't')]
        type_name: String,

        /// Requested view (repeatable)
        #[arg(long = "view")]
        views: Vec<String>,

        /// How model-typed properties are embedded: ref, inline or allOf
        #[arg(long)]
        strategy: Option<String>,

        /// Name models by simple type name instead of the qualified name
        #[arg(long)]
        simple_names: bool,

        /// Resolution options file (JSON); flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a payload against the resolved schema of a type
    Validate {
        /// Payload file to validate
        payload: PathBuf,

        /// Catalog source: file path or URL
        #[arg(long)]
        catalog: String,

        /// Type the payload is an instance of
        #[arg(long = "type", short = 't')]
        type_name: String,

        /// Requested view (repeatable)
        #[arg(long = "view")]
        views: Vec<String>,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Lint catalog files for errors (syntax, unknown types, suspicious metadata)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            catalog,
            type_name,
            views,
            strategy,
            simple_names,
            config,
            output,
            pretty,
        } => build_options(config.as_deref(), views, strategy.as_deref(), simple_names)
            .and_then(|options| run_resolve(&catalog, &type_name, &options, output, pretty)),

        Commands::Validate {
            payload,
            catalog,
            type_name,
            views,
            json,
        } => run_validate(&payload, &catalog, &type_name, views, json),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Start from the config file (or defaults) and apply flag overrides.
fn build_options(
    config: Option<&Path>,
    views: Vec<String>,
    strategy: Option<&str>,
    simple_names: bool,
) -> Result<ResolveOptions, u8> {
    let mut options = match config {
        Some(path) => load_options(path).map_err(|e| {
            eprintln!("Error loading config: {}", e);
            e.exit_code() as u8
        })?,
        None => ResolveOptions::new(),
    };

    options.views.extend(views);
    if let Some(strategy) = strategy {
        options.strategy = SynthesisStrategy::parse(strategy).ok_or_else(|| {
            eprintln!(
                "Error: unknown strategy '{}' (expected ref, inline or allOf)",
                strategy
            );
            2u8
        })?;
    }
    if simple_names {
        options.naming = TypeNaming::Simple;
    }
    Ok(options)
}

fn parse_type(type_name: &str) -> Result<TypeDescriptor, String> {
    type_name.parse().map_err(|e| format!("{}", e))
}

fn run_resolve(
    catalog_source: &str,
    type_name: &str,
    options: &ResolveOptions,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), u8> {
    let ty = parse_type(type_name).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    let catalog = load_catalog_auto(catalog_source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let document = resolve_type(&catalog, &ty, options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let json_output = if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_validate(
    payload_path: &Path,
    catalog_source: &str,
    type_name: &str,
    views: Vec<String>,
    json_output: bool,
) -> Result<(), u8> {
    let payload = load_json(payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;

    let ty = parse_type(type_name).map_err(|e| {
        report_error(json_output, &e);
        2u8
    })?;

    let catalog = load_catalog_auto(catalog_source).map_err(|e| {
        report_error(json_output, &format!("loading catalog: {}", e));
        e.exit_code() as u8
    })?;

    let mut options = ResolveOptions::new();
    options.views = views;

    match validate(&catalog, &ty, &payload, &options) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(ValidateError::Resolve(e)) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let rendered = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", rendered);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
