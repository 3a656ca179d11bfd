//! File system errors

use super::CombresError;

/// Creates a file not found error
pub fn not_found(path: impl Into<String>) -> CombresError {
    CombresError::FileNotFound { path: path.into() }
}

/// Creates a file read failed error
pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> CombresError {
    CombresError::FileReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}
