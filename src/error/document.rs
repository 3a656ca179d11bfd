//! Document loading errors

use super::CombresError;

/// Creates a document parse failed error
pub fn parse_failed(path: impl Into<String>, reason: impl Into<String>) -> CombresError {
    CombresError::DocumentParseFailed {
        path: path.into(),
        reason: reason.into(),
    }
}
