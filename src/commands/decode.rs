//! Decode command implementation

use crate::cli::DecodeArgs;
use combres::bundle::{BUNDLE_LIBRARY, BundleKind, decode_id};
use combres::error::Result;

pub fn run(args: DecodeArgs) -> Result<()> {
    let id = bare_id(&args.bundle_id);
    let members = decode_id(id)?;

    if args.json {
        let members: Vec<String> = members.iter().map(ToString::to_string).collect();
        println!("{}", serde_json::to_string_pretty(&members)?);
        return Ok(());
    }

    for member in members {
        println!("{member}");
    }
    Ok(())
}

/// Strip the bundle library and extension from a bundle reference
fn bare_id(raw: &str) -> &str {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix(BUNDLE_LIBRARY)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(raw);
    BundleKind::split_name(raw).map_or(raw, |(id, _)| id)
}
