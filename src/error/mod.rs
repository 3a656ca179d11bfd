//! Error types and handling for combres
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`config`]: Configuration errors
//! - [`identifier`]: Resource identifier errors
//! - [`resource`]: Resource lookup errors
//! - [`bundle`]: Bundle id errors
//! - [`document`]: Document loading errors
//! - [`fs`]: File system errors

pub mod bundle;
pub mod config;
pub mod document;
pub mod fs;
pub mod identifier;
pub mod resource;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for combres operations
#[derive(Error, Diagnostic, Debug)]
pub enum CombresError {
    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(combres::config::not_found),
        help("Pass --config <file> or set COMBRES_CONFIG")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to read configuration file: {path}: {reason}")]
    #[diagnostic(code(combres::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(combres::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(combres::config::invalid))]
    ConfigInvalid { message: String },

    #[error("Invalid CDN entry '{entry}': {reason}")]
    #[diagnostic(
        code(combres::config::invalid_cdn_entry),
        help("CDN entries look like 'library:name=URL' or 'library:*=https://host/path/*'")
    )]
    InvalidCdnEntry { entry: String, reason: String },

    // Identifier errors
    #[error("Invalid resource identifier '{input}': {reason}")]
    #[diagnostic(
        code(combres::identifier::invalid),
        help("Identifiers look like 'library:name' or a bare 'name'")
    )]
    InvalidIdentifier { input: String, reason: String },

    // Resource errors
    #[error("Resource '{identifier}' not found")]
    #[diagnostic(code(combres::resource::not_found))]
    ResourceNotFound { identifier: String },

    #[error("Resource '{identifier}' is served from {url}")]
    #[diagnostic(
        code(combres::resource::external),
        help("CDN-hosted resources have no local content")
    )]
    ExternalResource { identifier: String, url: String },

    // Bundle errors
    #[error("Invalid bundle id '{id}': {reason}")]
    #[diagnostic(code(combres::bundle::invalid_id))]
    InvalidBundleId { id: String, reason: String },

    #[error("Cannot build a bundle id from an empty member list")]
    #[diagnostic(code(combres::bundle::empty))]
    EmptyBundle,

    // Document errors
    #[error("Failed to parse document: {path}: {reason}")]
    #[diagnostic(code(combres::document::parse_failed))]
    DocumentParseFailed { path: String, reason: String },

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(combres::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(combres::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(combres::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for CombresError {
    fn from(err: std::io::Error) -> Self {
        CombresError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CombresError {
    fn from(err: serde_yaml::Error) -> Self {
        CombresError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CombresError {
    fn from(err: serde_json::Error) -> Self {
        CombresError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, CombresError>;

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_error_contains {
        ($test_name:ident, $err:expr, $($contains:expr),+ $(,)?) => {
            #[test]
            fn $test_name() {
                let err = $err;
                let error_string = err.to_string();
                $(
                    assert!(error_string.contains($contains),
                        "Error message should contain '{}', got: {}",
                        $contains,
                        error_string
                    );
                )+
            }
        };
    }

    #[test]
    fn test_error_code() {
        let err = identifier::invalid("a:b|c", "contains '|'");
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("combres::identifier::invalid".to_string())
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CombresError = io_err.into();
        assert!(matches!(err, CombresError::IoError { .. }));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let parse_result: std::result::Result<serde_yaml::Value, _> =
            serde_yaml::from_str("invalid: yaml: content: [unclosed");
        let err: CombresError = parse_result.unwrap_err().into();
        assert!(matches!(err, CombresError::ConfigParseFailed { .. }));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("invalid json content");
        let err: CombresError = parse_result.unwrap_err().into();
        assert!(matches!(err, CombresError::ConfigParseFailed { .. }));
    }

    test_error_contains!(
        test_cdn_entry_error,
        config::invalid_cdn_entry("lib:*=https://cdn", "wildcard URL must contain '*'"),
        "lib:*=https://cdn",
        "wildcard URL"
    );

    test_error_contains!(
        test_resource_not_found_error,
        resource::not_found("lib:a.css"),
        "Resource 'lib:a.css' not found"
    );

    test_error_contains!(
        test_external_resource_error,
        resource::external("jquery:jquery.js", "https://code.jquery.com/jquery.js"),
        "code.jquery.com"
    );

    test_error_contains!(
        test_invalid_bundle_id_error,
        bundle::invalid_id("abc!", "not base64"),
        "abc!",
        "not base64"
    );

    test_error_contains!(
        test_document_parse_error,
        document::parse_failed("page.yaml", "missing field"),
        "page.yaml"
    );

    test_error_contains!(
        test_file_read_error,
        fs::read_failed("/tmp/x.css", "permission denied"),
        "/tmp/x.css",
        "permission denied"
    );
}
