//! Resource identifier errors

use super::CombresError;

/// Creates an invalid identifier error
pub fn invalid(input: impl Into<String>, reason: impl Into<String>) -> CombresError {
    CombresError::InvalidIdentifier {
        input: input.into(),
        reason: reason.into(),
    }
}
