use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{
    generate,
    shells::{Bash, Fish, Zsh},
};
use std::io;

use crate::Cli;

pub fn run(shell: String) -> Result<()> {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    match shell.as_str() {
        "bash" => generate(Bash, &mut cmd, bin, &mut io::stdout()),
        "zsh" => generate(Zsh, &mut cmd, bin, &mut io::stdout()),
        "fish" => generate(Fish, &mut cmd, bin, &mut io::stdout()),
        other => anyhow::bail!("unsupported shell '{other}', choose: bash, zsh, fish"),
    }
    Ok(())
}
