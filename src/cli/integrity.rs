use clap::Parser;

/// Arguments for the integrity command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Hash selected resources:\n    combres integrity libA:a.css app.js\n\n\
                  Hash everything under the resource root:\n    combres integrity --all")]
pub struct IntegrityArgs {
    /// Resource identifiers to hash
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub identifiers: Vec<String>,

    /// Hash every resource under the resource root
    #[arg(long)]
    pub all: bool,
}
