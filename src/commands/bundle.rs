//! Bundle command implementation

use console::Style;

use crate::cli::BundleArgs;
use crate::commands::helpers::{GlobalOptions, open_session};
use combres::document::Document;
use combres::error::Result;

pub fn run(options: &GlobalOptions, args: BundleArgs) -> Result<()> {
    let session = open_session(options)?;
    let mut document = Document::load(&args.document)?;
    let report = session.handler.build(&mut document)?;

    if args.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    let yaml = document.to_yaml()?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, yaml)?;
            eprintln!(
                "{} {} bundle(s) into {}",
                Style::new().green().bold().apply_to("Wrote"),
                report.bundles.len(),
                path.display()
            );
        }
        None if !args.report => print!("{yaml}"),
        None => {}
    }

    Ok(())
}
