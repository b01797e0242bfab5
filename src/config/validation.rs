//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a resolved [`Config`] (file plus
//! CLI/environment overrides) for problems such as missing endpoints,
//! a missing bucket name, zero timeouts, unparsable addresses, and
//! invalid header names. Returns every [`ValidationError`] found, with
//! per-field suggestions where one is obvious.

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use url::Url;

use super::model::Config;
use crate::error::ValidationError;

/// Validate an endpoint prefix. Returns `Ok(())` or a human-readable error.
pub fn validate_endpoint(endpoint: &str) -> Result<(), String> {
    if endpoint.is_empty() {
        return Err("endpoint cannot be empty".into());
    }
    if !endpoint.starts_with('/') {
        return Err(format!(
            "endpoint must start with '/' (did you mean '/{endpoint}'?)"
        ));
    }
    Ok(())
}

/// Validate the upstream base URL. Returns `Ok(())` or a human-readable error.
pub fn validate_upstream(scheme: &str, host: &str) -> Result<(), String> {
    if scheme != "http" && scheme != "https" {
        return Err(format!(
            "unsupported scheme '{scheme}' (expected http or https)"
        ));
    }
    match Url::parse(&format!("{scheme}://{host}/")) {
        Ok(parsed) if parsed.host_str().is_some() && parsed.path() == "/" => Ok(()),
        _ => Err(format!("'{host}' is not a valid host")),
    }
}

fn error(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.into(),
        message: message.into(),
        suggestion: None,
    }
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listen.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listen".into(),
            message: format!("'{}' is not a valid socket address", config.listen),
            suggestion: config
                .listen
                .strip_prefix(':')
                .map(|port| format!("did you mean '0.0.0.0:{port}'?")),
        });
    }

    if let Err(msg) = validate_endpoint(&config.proxy.endpoint) {
        let endpoint = &config.proxy.endpoint;
        errors.push(ValidationError {
            field: "proxy.endpoint".into(),
            message: msg,
            suggestion: if !endpoint.is_empty() && !endpoint.starts_with('/') {
                Some(format!("did you mean '/{endpoint}'?"))
            } else {
                None
            },
        });
    }

    if let Some(endpoint) = config.map_endpoint() {
        if let Err(msg) = validate_endpoint(endpoint) {
            errors.push(error("map.endpoint", msg));
        }
    }

    if !config.proxy.bucket_on_path {
        if config.bucket_name.is_empty() {
            errors.push(ValidationError {
                field: "bucket_name".into(),
                message: "bucket name is required unless proxy.bucket_on_path is set".into(),
                suggestion: Some("set GCS_HELPER_BUCKET_NAME".into()),
            });
        } else if config.bucket_name.contains('/')
            || config.bucket_name.chars().any(char::is_whitespace)
        {
            errors.push(error(
                "bucket_name",
                format!("'{}' is not a valid bucket name", config.bucket_name),
            ));
        }
    }

    if config.proxy.timeout == 0 {
        errors.push(error("proxy.timeout", "timeout must be greater than zero"));
    }
    if config.client.timeout == 0 {
        errors.push(error("client.timeout", "timeout must be greater than zero"));
    }

    for name in &config.proxy.log_headers {
        if name.parse::<HeaderName>().is_err() {
            errors.push(error(
                "proxy.log_headers",
                format!("'{name}' is not a valid header name"),
            ));
        }
    }

    if let Err(msg) = validate_upstream(&config.upstream.scheme, &config.upstream.host) {
        errors.push(error("upstream", msg));
    }

    if let Some(token) = &config.client.access_token {
        if HeaderValue::from_str(&format!("Bearer {token}")).is_err() {
            errors.push(error(
                "client.access_token",
                "token contains characters not allowed in a header",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let bucket = if config.proxy.bucket_on_path {
        "(taken from request path)".to_string()
    } else {
        config.bucket_name.clone()
    };
    let lines = [
        format!("  listen:   {}", config.listen),
        format!(
            "  proxy:    {} -> {}://{} (timeout {}ms)",
            config.proxy.endpoint,
            config.upstream.scheme,
            config.upstream.host,
            config.request_timeout().as_millis()
        ),
        format!("  bucket:   {bucket}"),
        format!("  map:      {}", config.map_endpoint().unwrap_or("disabled")),
        format!("  log:      {}", config.log_level),
    ];

    format!("{} is valid\n{}", path, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Config {
        let mut config = Config::default();
        config.bucket_name = "assets".into();
        config.proxy.endpoint = "/proxy".into();
        config
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn missing_proxy_endpoint_fails() {
        let mut config = minimal_config();
        config.proxy.endpoint = String::new();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "proxy.endpoint");
    }

    #[test]
    fn endpoint_without_slash_suggests_fix() {
        let mut config = minimal_config();
        config.proxy.endpoint = "proxy".into();
        let errors = validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.suggestion.as_deref() == Some("did you mean '/proxy'?")));
    }

    #[test]
    fn bucket_required_unless_on_path() {
        let mut config = minimal_config();
        config.bucket_name = String::new();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "bucket_name"));

        config.proxy.bucket_on_path = true;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn bucket_with_slash_fails() {
        let mut config = minimal_config();
        config.bucket_name = "a/b".into();
        let errors = validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.message.contains("not a valid bucket name")));
    }

    #[test]
    fn port_only_listen_address_suggests_fix() {
        let mut config = minimal_config();
        config.listen = ":8080".into();
        let errors = validate(&config).unwrap_err();
        assert_eq!(
            errors[0].suggestion.as_deref(),
            Some("did you mean '0.0.0.0:8080'?")
        );
    }

    #[test]
    fn zero_timeouts_fail() {
        let mut config = minimal_config();
        config.proxy.timeout = 0;
        config.client.timeout = 0;
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn invalid_log_header_fails() {
        let mut config = minimal_config();
        config.proxy.log_headers = vec!["X-Request-Id".into(), "bad header".into()];
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("bad header"));
    }

    #[test]
    fn upstream_scheme_and_host_checked() {
        assert!(validate_upstream("https", "storage.googleapis.com").is_ok());
        assert!(validate_upstream("http", "127.0.0.1:9000").is_ok());
        assert!(validate_upstream("ftp", "storage.googleapis.com").is_err());
        assert!(validate_upstream("https", "host/with/path").is_err());
    }

    #[test]
    fn map_endpoint_without_slash_fails() {
        let mut config = minimal_config();
        config.map.endpoint = Some("map".into());
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors[0].field, "map.endpoint");
    }

    #[test]
    fn report_mentions_endpoints() {
        let report = format_validation_report("gcs-helper.yaml", &minimal_config());
        assert!(report.starts_with("gcs-helper.yaml is valid"));
        assert!(report.contains("/proxy -> https://storage.googleapis.com"));
        assert!(report.contains("map:      disabled"));
    }
}
