use clap::Parser;

/// Arguments for the decode command
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// Bundle id, with or without the 'combres:' library and extension
    pub bundle_id: String,

    /// Print the members as a JSON array
    #[arg(long)]
    pub json: bool,
}
