use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

pub mod apis;
pub mod completions;
pub mod doctor;
pub mod init;
pub mod run;

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Run test-case files through the plugin binaries")]
    Run {
        /// Test-case YAML files, executed in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Directory holding the runtime-test-plugin-* binaries
        #[arg(long)]
        plugins_dir: Option<PathBuf>,
        /// Per-plugin deadline in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Print a JSON summary instead of one line per test case
        #[arg(long)]
        json: bool,
    },
    #[command(about = "Report which plugin binaries are present")]
    Doctor {
        #[arg(long)]
        plugins_dir: Option<PathBuf>,
    },
    #[command(about = "Print the APIs each runtime version supports")]
    Apis {
        #[arg(long)]
        version: Option<String>,
    },
    #[command(about = "Scaffold a sample test-case file")]
    Init { path: Option<PathBuf> },
    #[command(about = "Emit shell completion scripts (bash/zsh/fish)")]
    Completions { shell: String },
}

pub async fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Run {
            files,
            plugins_dir,
            timeout,
            json,
        } => run::run(files, plugins_dir, timeout, json).await,
        Commands::Doctor { plugins_dir } => doctor::run(plugins_dir),
        Commands::Apis { version } => apis::run(version),
        Commands::Init { path } => init::run(path),
        Commands::Completions { shell } => completions::run(shell),
    }
}
