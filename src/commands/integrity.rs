//! Integrity command implementation

use console::Style;

use crate::cli::IntegrityArgs;
use crate::commands::helpers::{GlobalOptions, open_session, parse_identifier};
use combres::error::Result;

pub fn run(options: &GlobalOptions, args: IntegrityArgs) -> Result<()> {
    let session = open_session(options)?;
    let ids = if args.all {
        session.store.identifiers()
    } else {
        args.identifiers
            .iter()
            .map(|raw| parse_identifier(raw))
            .collect::<Result<Vec<_>>>()?
    };

    let missing = Style::new().red();
    for id in ids {
        let hash = session.handler.integrity(&id);
        if hash.is_empty() {
            println!("{}  {}", missing.apply_to("unavailable"), id);
        } else {
            println!("{hash}  {id}");
        }
    }

    Ok(())
}
