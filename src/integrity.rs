//! SHA-384 subresource integrity hashes
//!
//! Hashes are computed lazily from resource content and cached per identifier string.
//! Entries derived from a bundle are dropped again when that bundle's content changes.

use std::io::{self, Read};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dashmap::DashMap;
use sha2::{Digest, Sha384};

use crate::error::Result;
use crate::resource::ResourceIdentifier;
use crate::store::{ByteStream, read_and_close};

/// Prefix of integrity values, as expected by the `integrity` HTML attribute
pub const INTEGRITY_PREFIX: &str = "sha384-";

/// Anything that can produce the final bytes served for an identifier
pub trait ContentSource {
    fn open_content(&self, id: &ResourceIdentifier) -> Result<Box<dyn ByteStream>>;
}

/// Calculate the integrity value of a byte stream
pub fn hash_stream(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha384::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!(
        "{}{}",
        INTEGRITY_PREFIX,
        STANDARD.encode(hasher.finalize())
    ))
}

/// Process-wide cache of integrity values keyed by identifier string form
#[derive(Debug, Default)]
pub struct IntegrityCache {
    entries: DashMap<String, String>,
}

impl IntegrityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached integrity value, computing it on first use
    ///
    /// Never fails: a resource that cannot be read yields an empty string, which is not
    /// cached so that a later call can succeed.
    pub fn integrity(&self, id: &ResourceIdentifier, source: &dyn ContentSource) -> String {
        let key = id.to_string();
        if let Some(cached) = self.entries.get(&key) {
            return cached.clone();
        }

        let computed = source
            .open_content(id)
            .and_then(|stream| Ok(read_and_close(stream, |stream| hash_stream(stream))?));

        match computed {
            Ok(hash) => {
                self.entries.insert(key, hash.clone());
                hash
            }
            Err(e) => {
                tracing::warn!(resource = %id, error = %e, "unable to compute integrity hash");
                String::new()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    /// Drop every entry whose key starts with `prefix`, returning how many were removed
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
