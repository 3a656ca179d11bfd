//! Command implementations for the combres CLI

pub mod bundle;
pub mod cat;
pub mod completions;
pub mod decode;
pub mod helpers;
pub mod integrity;
pub mod resolve;
pub mod version;
