use clap::Parser;
use std::path::PathBuf;

/// Arguments for the bundle command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Rewrite a document and print it:\n    combres bundle page.yaml\n\n\
                  Rewrite a document in place:\n    combres bundle page.yaml -o page.yaml\n\n\
                  Show what was bundled:\n    combres bundle page.yaml --report")]
pub struct BundleArgs {
    /// Document to rewrite (YAML regions of resource nodes)
    pub document: PathBuf,

    /// Write the rewritten document to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Print a JSON report of created bundles instead of the document
    #[arg(long)]
    pub report: bool,
}
