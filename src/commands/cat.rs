//! Cat command implementation

use std::io::{self, Write};

use crate::cli::CatArgs;
use crate::commands::helpers::{GlobalOptions, open_session, parse_identifier};
use combres::error::{Result, resource};

pub fn run(options: &GlobalOptions, args: CatArgs) -> Result<()> {
    let id = parse_identifier(&args.identifier)?;
    let session = open_session(options)?;
    let resolved = session
        .handler
        .resolve(&id)
        .ok_or_else(|| resource::not_found(id.to_string()))?;

    let mut stream = session.handler.open(&resolved)?;
    let mut stdout = io::stdout().lock();
    io::copy(&mut stream, &mut stdout)?;
    stream.close()?;
    stdout.flush()?;

    Ok(())
}
