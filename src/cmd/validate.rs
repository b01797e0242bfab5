//! `gcs-helper validate` — check a configuration file for errors.
//!
//! Parses and validates the config file as written (no CLI or environment
//! overrides), reporting results in either human-readable text or
//! machine-readable JSON format.

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::sources::parse_config_str;
use crate::config::validation;
use crate::error::GcsHelperError;

pub fn execute(args: &ValidateArgs) -> Result<(), GcsHelperError> {
    let path = &args.config;

    if !path.exists() {
        return Err(GcsHelperError::ConfigFileNotFound { path: path.clone() });
    }

    let content = std::fs::read_to_string(path)?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config = parse_config_str(ext, &content, &path.display().to_string())?;

    if let Err(errors) = validation::validate(&config) {
        match args.format {
            ValidateFormat::Text => {
                eprintln!("\u{2717} {} has {} errors\n", path.display(), errors.len());
                for error in &errors {
                    eprintln!("{error}");
                }
            }
            ValidateFormat::Json => {
                let json_errors: Vec<serde_json::Value> = errors
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "field": e.field,
                            "message": e.message,
                            "suggestion": e.suggestion,
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "valid": false,
                        "errors": json_errors,
                    })
                );
            }
        }
        return Err(GcsHelperError::ConfigValidation { errors });
    }

    match args.format {
        ValidateFormat::Text => {
            println!(
                "\u{2713} {}",
                validation::format_validation_report(&path.display().to_string(), &config)
            );
        }
        ValidateFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "listen": config.listen,
                    "proxy_endpoint": config.proxy.endpoint,
                    "map_endpoint": config.map_endpoint(),
                    "bucket_on_path": config.proxy.bucket_on_path,
                    "timeout_ms": config.request_timeout().as_millis(),
                })
            );
        }
    }

    Ok(())
}
