use clap::Parser;

/// Arguments for the resolve command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Resolve a library resource:\n    combres resolve libA:a.css\n\n\
                  Resolve with a template variable:\n    combres --var cdn.off=true resolve jquery:jquery.js\n\n\
                  Machine-readable output:\n    combres resolve app.js --json")]
pub struct ResolveArgs {
    /// Resource identifier, 'library:name' or 'name'
    pub identifier: String,

    /// Print the resolved resource as JSON
    #[arg(long)]
    pub json: bool,
}
