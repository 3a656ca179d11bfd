use clap::Parser;

/// Arguments for the cat command
#[derive(Parser, Debug)]
pub struct CatArgs {
    /// Resource identifier; bundles are addressed as 'combres:<id>.css' or 'combres:<id>.js'
    pub identifier: String,
}
