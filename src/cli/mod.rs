//! CLI definitions using clap derive API
//!
//! Each command's argument type lives in its own submodule.

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod bundle;
pub mod cat;
pub mod completions;
pub mod decode;
pub mod integrity;
pub mod resolve;

pub use bundle::BundleArgs;
pub use cat::CatArgs;
pub use completions::CompletionsArgs;
pub use decode::DecodeArgs;
pub use integrity::IntegrityArgs;
pub use resolve::ResolveArgs;

/// Combres - resource bundling and caching engine
///
/// Collapse the stylesheets and scripts of server-rendered documents into bundles and
/// serve them from a resource directory.
#[derive(Parser, Debug)]
#[command(
    name = "combres",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Resource bundling, versioning and caching engine",
    long_about = "Combres rewrites documents so that runs of stylesheets and scripts collapse into \
                  bundles, resolves resources through CDN, source map and versioning rules, and \
                  serves bundle content by concatenating the members.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  combres bundle page.yaml                 \x1b[90m# Rewrite a document to use bundles\x1b[0m\n   \
                  combres resolve libA:a.css               \x1b[90m# Show request path and headers\x1b[0m\n   \
                  combres cat combres:<id>.js              \x1b[90m# Print concatenated bundle content\x1b[0m\n   \
                  combres decode <id>                      \x1b[90m# List the members of a bundle id\x1b[0m\n   \
                  combres integrity --all                  \x1b[90m# Integrity hashes of every resource\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Configuration file (defaults to <config dir>/combres/combres.yaml)
    #[arg(long, short = 'c', global = true, env = "COMBRES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Resource root directory
    #[arg(
        long,
        short = 'r',
        global = true,
        env = "COMBRES_ROOT",
        default_value = "."
    )]
    pub root: PathBuf,

    /// Template variable for #{name} placeholders
    #[arg(
        long = "var",
        global = true,
        value_name = "NAME=VALUE",
        value_parser = parse_variable
    )]
    pub vars: Vec<(String, String)>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite a document to reference bundles
    Bundle(BundleArgs),

    /// Resolve a resource and show its request path and headers
    Resolve(ResolveArgs),

    /// Write the content of a resource to stdout
    Cat(CatArgs),

    /// List the members encoded in a bundle id
    Decode(DecodeArgs),

    /// Print subresource integrity hashes
    Integrity(IntegrityArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

fn parse_variable(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}
