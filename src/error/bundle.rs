//! Bundle id errors

use super::CombresError;

/// Creates an invalid bundle id error
pub fn invalid_id(id: impl Into<String>, reason: impl Into<String>) -> CombresError {
    CombresError::InvalidBundleId {
        id: id.into(),
        reason: reason.into(),
    }
}
