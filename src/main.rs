//! Combres - resource bundling and caching engine
//!
//! Command line front end over the `combres` library: rewrite documents to reference
//! bundles and inspect how resources resolve from a resource directory.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::helpers::GlobalOptions;

/// Log to stderr; `RUST_LOG` wins unless `--verbose` asks for debug output
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("combres=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = GlobalOptions {
        config: cli.config,
        root: cli.root,
        vars: cli.vars,
    };

    let result = match cli.command {
        Commands::Bundle(args) => commands::bundle::run(&options, args),
        Commands::Resolve(args) => commands::resolve::run(&options, args),
        Commands::Cat(args) => commands::cat::run(&options, args),
        Commands::Decode(args) => commands::decode::run(args),
        Commands::Integrity(args) => commands::integrity::run(&options, args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
