//! Resource lookup errors

use super::CombresError;

/// Creates a resource not found error
pub fn not_found(identifier: impl Into<String>) -> CombresError {
    CombresError::ResourceNotFound {
        identifier: identifier.into(),
    }
}

/// Creates an error for a resource that only exists behind a CDN URL
pub fn external(identifier: impl Into<String>, url: impl Into<String>) -> CombresError {
    CombresError::ExternalResource {
        identifier: identifier.into(),
        url: url.into(),
    }
}
