//! CubePack CLI - Bridge interface for front ends
//!
//! Commands: families, validate, generate
//! Outputs JSON to stdout
//! Returns non-zero on validation or generation failure

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use base64::Engine as _;
use clap::{Parser, Subcommand};

use cubepack_core::{
    validation, ConfigValidator, FamilyCatalog, GenerationPipeline, GeneratorConfig,
};

#[derive(Parser)]
#[command(name = "cubepack-cli")]
#[command(about = "CubePack CLI - Azure RTOS Expansion Package Generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported hardware families
    Families,

    /// Validate a generator configuration
    Validate {
        /// JSON payload (GeneratorConfig)
        #[arg(short, long)]
        payload: String,
    },

    /// Generate artifacts and the package archive
    Generate {
        /// JSON payload (GeneratorConfig)
        #[arg(short, long)]
        payload: String,

        /// Restrict generation to one operation: pdsc, core or middleware
        #[arg(long)]
        only: Option<String>,

        /// Directory to write the archive into; omitted means base64 output
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Families => {
            let catalog = FamilyCatalog::new();
            let families: Vec<_> = catalog
                .families()
                .map(|(family, descriptor)| {
                    serde_json::json!({
                        "id": family,
                        "cores": descriptor.cores,
                        "series": descriptor.series,
                        "memoryVariants": descriptor.memory_variants,
                        "features": descriptor.features,
                        "boards": descriptor.boards,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&families).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Validate { payload } => {
            let config: GeneratorConfig = match GeneratorConfig::from_json(&payload) {
                Ok(c) => c,
                Err(e) => {
                    println!(r#"{{"valid": false, "error": "Invalid payload: {e}"}}"#);
                    return ExitCode::FAILURE;
                }
            };

            let errors = ConfigValidator::new().validate_config(&config);
            let output = serde_json::json!({
                "valid": errors.is_empty(),
                "errors": errors,
                "versionFormatValid":
                    validation::validate_version_format(&config.azure_rtos_version),
                "packageName": validation::derive_package_name(
                    &config.selected_family,
                    &config.azure_rtos_version,
                ),
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            if output["valid"].as_bool().unwrap_or(false) {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2) // Validation failure
            }
        }

        Commands::Generate { payload, only, out } => {
            let config: GeneratorConfig = match GeneratorConfig::from_json(&payload) {
                Ok(c) => c,
                Err(e) => {
                    println!(r#"{{"success": false, "error": "Invalid payload: {e}"}}"#);
                    return ExitCode::FAILURE;
                }
            };

            let mut pipeline = match GenerationPipeline::new(config) {
                Ok(p) => p,
                Err(e) => {
                    let output = serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                    });
                    println!("{}", serde_json::to_string(&output).unwrap());
                    return ExitCode::from(2);
                }
            };

            let result = match only.as_deref() {
                None => pipeline.generate_all(),
                Some("pdsc") => pipeline.generate_manifest(),
                Some("core") => pipeline.generate_core_config(),
                Some("middleware") => pipeline.generate_middleware_config(),
                Some(other) => {
                    println!(
                        r#"{{"success": false, "error": "Unknown operation: {other}"}}"#
                    );
                    return ExitCode::FAILURE;
                }
            };

            let mut output = serde_json::json!({
                "success": result.success,
                "message": result.message,
                "files": result.files,
                "status": pipeline.status(),
            });

            if let Some(blob) = pipeline.take_archive() {
                let archive = match &out {
                    Some(dir) => {
                        let path = dir.join(&blob.filename);
                        if let Err(e) = fs::write(&path, &blob.bytes) {
                            println!(
                                r#"{{"success": false, "error": "Failed to write archive: {e}"}}"#
                            );
                            return ExitCode::FAILURE;
                        }
                        serde_json::json!({
                            "filename": blob.filename,
                            "path": path,
                            "checksum": blob.checksum,
                            "size": blob.bytes.len(),
                        })
                    }
                    None => serde_json::json!({
                        "filename": blob.filename,
                        "checksum": blob.checksum,
                        "size": blob.bytes.len(),
                        "dataBase64": base64::engine::general_purpose::STANDARD.encode(&blob.bytes),
                    }),
                };
                output["archive"] = archive;
            }

            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2) // Generation failure
            }
        }
    }
}
