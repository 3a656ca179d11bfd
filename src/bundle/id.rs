//! Reversible bundle ids
//!
//! A bundle id is the bundle's ordered member list joined with `|`, DEFLATE-compressed,
//! Base64-encoded and made URL-safe by substituting `/`, `+` and `=`. Decoding needs no
//! registry, so an id stays valid across restarts and between processes.

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::error::{CombresError, Result, bundle};
use crate::resource::ResourceIdentifier;
use crate::resource::identifier::MEMBER_DELIMITER;

/// Upper bound on the inflated member list, against decompression bombs in forged ids
const MAX_DECODED_LEN: u64 = 64 * 1024;

const URL_SAFE_SUBSTITUTIONS: [(char, char); 3] = [('/', '~'), ('+', '-'), ('=', '_')];

/// Encode an ordered member list into a bundle id
pub fn build_id<'a>(members: impl IntoIterator<Item = &'a ResourceIdentifier>) -> Result<String> {
    let joined = members
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&MEMBER_DELIMITER.to_string());
    if joined.is_empty() {
        return Err(CombresError::EmptyBundle);
    }

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(joined.as_bytes())?;
    let compressed = encoder.finish()?;

    let mut id = STANDARD.encode(compressed);
    for (from, to) in URL_SAFE_SUBSTITUTIONS {
        id = id.replace(from, &to.to_string());
    }
    Ok(id)
}

/// Decode a bundle id back into its ordered member list
///
/// Any malformed input, including ids that were tampered with, is an error; callers that
/// serve requests treat it as "not found".
pub fn decode_id(id: &str) -> Result<Vec<ResourceIdentifier>> {
    let mut encoded = id.to_string();
    for (to, from) in URL_SAFE_SUBSTITUTIONS {
        encoded = encoded.replace(from, &to.to_string());
    }

    let compressed = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| bundle::invalid_id(id, e.to_string()))?;

    let mut joined = String::new();
    DeflateDecoder::new(compressed.as_slice())
        .take(MAX_DECODED_LEN + 1)
        .read_to_string(&mut joined)
        .map_err(|e| bundle::invalid_id(id, e.to_string()))?;
    if joined.len() as u64 > MAX_DECODED_LEN {
        return Err(bundle::invalid_id(id, "member list too long"));
    }
    if joined.is_empty() {
        return Err(bundle::invalid_id(id, "no members"));
    }

    joined
        .split(MEMBER_DELIMITER)
        .map(|member| {
            ResourceIdentifier::parse(member).map_err(|e| bundle::invalid_id(id, e.to_string()))
        })
        .collect()
}
