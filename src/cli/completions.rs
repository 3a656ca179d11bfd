use clap::Parser;
use clap_complete::Shell;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    combres completions bash > ~/.bash_completion.d/combres\n\n\
                  Generate zsh completions:\n    combres completions zsh > ~/.zfunc/_combres\n\n\
                  Generate fish completions:\n    combres completions fish > ~/.config/fish/completions/combres.fish")]
pub struct CompletionsArgs {
    /// Shell type
    #[arg(value_enum, ignore_case = true)]
    pub shell: Shell,
}
