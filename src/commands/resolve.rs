//! Resolve command implementation

use console::Style;
use indexmap::IndexMap;
use serde::Serialize;

use crate::cli::ResolveArgs;
use crate::commands::helpers::{GlobalOptions, open_session, parse_identifier};
use combres::error::{Result, resource};
use combres::resource::ResourceSummary;

#[derive(Serialize)]
struct ResolveOutput {
    #[serde(flatten)]
    resource: ResourceSummary,
    headers: IndexMap<String, String>,
}

pub fn run(options: &GlobalOptions, args: ResolveArgs) -> Result<()> {
    let id = parse_identifier(&args.identifier)?;
    let session = open_session(options)?;
    let resolved = session
        .handler
        .resolve(&id)
        .ok_or_else(|| resource::not_found(id.to_string()))?;
    let headers = session.handler.response_headers(&resolved);

    if args.json {
        let output = ResolveOutput {
            resource: resolved.summary(),
            headers,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", Style::new().bold().apply_to(&resolved.request_path));
    let name_style = Style::new().cyan();
    for (name, value) in &headers {
        println!("  {}: {}", name_style.apply_to(name), value);
    }
    if let combres::resource::ResourceOrigin::Bundle { resolved: members, .. } = &resolved.origin
    {
        println!("{}", Style::new().green().bold().apply_to("Members:"));
        for member in &members.resources {
            println!("  {} ({} bytes)", member.identifier, member.content_length);
        }
    }

    Ok(())
}
