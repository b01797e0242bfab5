//! `gcs-helper init` — generate a starter configuration file.
//!
//! Creates a YAML, JSON, or TOML config file with either minimal
//! or fully documented templates. Never overwrites an existing file.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::GcsHelperError;

pub fn execute(args: &InitArgs) -> Result<(), GcsHelperError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("gcs-helper.{}", args.format.extension())));

    if output.exists() {
        return Err(GcsHelperError::FileExists { path: output });
    }

    std::fs::write(&output, template(&args.format, args.full))?;
    println!("Created {}", output.display());
    Ok(())
}

const fn template(format: &ConfigFormat, full: bool) -> &'static str {
    match (format, full) {
        (ConfigFormat::Yaml, false) => YAML_MINIMAL,
        (ConfigFormat::Yaml, true) => YAML_FULL,
        (ConfigFormat::Json, false) => JSON_MINIMAL,
        (ConfigFormat::Json, true) => JSON_FULL,
        (ConfigFormat::Toml, false) => TOML_MINIMAL,
        (ConfigFormat::Toml, true) => TOML_FULL,
    }
}

const YAML_MINIMAL: &str = r#"# gcs-helper config

bucket_name: "my-bucket"

proxy:
  endpoint: "/proxy"
"#;

const YAML_FULL: &str = r#"# gcs-helper config
#
# Every key can also be set with a flag or an environment variable
# (see `gcs-helper run --help`). Values shown are defaults.

listen: "0.0.0.0:8080"
bucket_name: "my-bucket"
log_level: debug              # error | warn | info | debug | trace

# upstream:
#   scheme: "https"
#   host: "storage.googleapis.com"

client:
  timeout: 2000               # Overall upstream request timeout in ms
  idle_conn_timeout: 120000   # Idle pooled connection lifetime in ms
  max_idle_conns: 10
  # access_token: "..."       # Prefer GCS_HELPER_ACCESS_TOKEN

proxy:
  endpoint: "/proxy"
  timeout: 10000              # Per-request deadline in ms (capped by client.timeout)
  log_headers: []             # e.g. ["X-Request-Id", "User-Agent"]
  bucket_on_path: false       # true: first path segment names the bucket

# map:
#   endpoint: "/map"
"#;

const JSON_MINIMAL: &str = r#"{
  "bucket_name": "my-bucket",
  "proxy": {
    "endpoint": "/proxy"
  }
}
"#;

const JSON_FULL: &str = r#"{
  "listen": "0.0.0.0:8080",
  "bucket_name": "my-bucket",
  "log_level": "debug",
  "upstream": {
    "scheme": "https",
    "host": "storage.googleapis.com"
  },
  "client": {
    "timeout": 2000,
    "idle_conn_timeout": 120000,
    "max_idle_conns": 10
  },
  "proxy": {
    "endpoint": "/proxy",
    "timeout": 10000,
    "log_headers": [],
    "bucket_on_path": false
  },
  "map": {}
}
"#;

const TOML_MINIMAL: &str = r#"# gcs-helper config

bucket_name = "my-bucket"

[proxy]
endpoint = "/proxy"
"#;

const TOML_FULL: &str = r#"# gcs-helper config
#
# Every key can also be set with a flag or an environment variable
# (see `gcs-helper run --help`). Values shown are defaults.

listen = "0.0.0.0:8080"
bucket_name = "my-bucket"
log_level = "debug"

# [upstream]
# scheme = "https"
# host = "storage.googleapis.com"

[client]
timeout = 2000
idle_conn_timeout = 120000
max_idle_conns = 10
# access_token = "..."

[proxy]
endpoint = "/proxy"
timeout = 10000
log_headers = []
bucket_on_path = false

# [map]
# endpoint = "/map"
"#;
