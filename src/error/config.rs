//! Configuration errors

use super::CombresError;

/// Creates a config not found error
pub fn not_found(path: impl Into<String>) -> CombresError {
    CombresError::ConfigNotFound { path: path.into() }
}

/// Creates a config parse failed error
pub fn parse_failed(path: impl Into<String>, reason: impl Into<String>) -> CombresError {
    CombresError::ConfigParseFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an invalid config error
pub fn invalid(message: impl Into<String>) -> CombresError {
    CombresError::ConfigInvalid {
        message: message.into(),
    }
}

/// Creates a config read failed error
pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> CombresError {
    CombresError::ConfigReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an invalid CDN entry error
pub fn invalid_cdn_entry(entry: impl Into<String>, reason: impl Into<String>) -> CombresError {
    CombresError::InvalidCdnEntry {
        entry: entry.into(),
        reason: reason.into(),
    }
}
