//! `completions`: print a shell completion script for `litesync`.

use crate::cli::Cli;
use crate::error::CliError;
use crate::utils::GlobalOptions;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io;

const BIN_NAME: &str = "litesync";

/// Generate shell completion scripts
#[derive(Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    /// Execute the completions command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        if !global.quiet {
            if let Some(hint) = load_hint(self.shell) {
                eprintln!("# load with: {hint}");
            }
        }
        let mut cmd = Cli::command();
        generate(self.shell, &mut cmd, BIN_NAME, &mut io::stdout().lock());
        Ok(())
    }
}

/// How the generated script is usually loaded in `shell`.
fn load_hint(shell: Shell) -> Option<String> {
    let hint = match shell {
        Shell::Bash => format!("eval \"$({BIN_NAME} completions bash)\""),
        Shell::Zsh => format!("{BIN_NAME} completions zsh > ~/.zsh/completions/_{BIN_NAME}"),
        Shell::Fish => format!("{BIN_NAME} completions fish | source"),
        Shell::PowerShell => {
            format!("{BIN_NAME} completions powershell | Out-String | Invoke-Expression")
        }
        _ => return None,
    };
    Some(hint)
}
