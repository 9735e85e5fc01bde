//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aeb - extension bundle installer
///
/// Install, remove and recover application extension bundles.
#[derive(Parser, Debug)]
#[command(
    name = "aeb",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Transactional installer for application extension bundles",
    long_about = "aeb installs extension bundles (.aeb archives or loose install.rdf trees) into a \
                  host application's directories. Installs are all-or-nothing, shared files are \
                  reference counted, and interrupted installs are recovered on the next run.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  aeb install viewer.aeb                 \x1b[90m# Install a bundle archive\x1b[0m\n   \
                  aeb install ./viewer/install.rdf       \x1b[90m# Install a loose bundle\x1b[0m\n   \
                  aeb uninstall viewer@example.com --now \x1b[90m# Remove an extension right away\x1b[0m\n   \
                  aeb list --detailed                    \x1b[90m# Show installed extensions\x1b[0m\n   \
                  aeb status                             \x1b[90m# Show splash screens and help entries\x1b[0m\n   \
                  aeb process-pending                    \x1b[90m# Finish scheduled removals\x1b[0m"
)]
pub struct Cli {
    /// Application home directory
    #[arg(long, global = true, env = "AEB_HOME", value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Configuration file (YAML)
    #[arg(long, global = true, env = "AEB_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Hide progress bars
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install extension bundles
    Install(InstallArgs),

    /// Schedule an extension for removal
    Uninstall(UninstallArgs),

    /// List installed extensions
    List(ListArgs),

    /// Show extension information
    Show(ShowArgs),

    /// Remove scheduled extensions and recover interrupted installs
    ProcessPending,

    /// Show what the host application loads at startup
    Status(StatusArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Install a bundle archive:\n    aeb install viewer.aeb\n\n\
                   Install several bundles in order:\n    aeb install base.aeb addon.aeb\n\n\
                   Install a loose bundle directory:\n    aeb install ./viewer")]
pub struct InstallArgs {
    /// Bundle archives, loose install.rdf files or directories holding one
    #[arg(required = true, num_args = 1..)]
    pub bundles: Vec<PathBuf>,
}

/// Arguments for the uninstall command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Schedule an extension for removal:\n    aeb uninstall viewer@example.com\n\n\
                  Remove without confirmation, right away:\n    aeb uninstall viewer@example.com -y --now\n\n\
                  Remove every extension:\n    aeb uninstall --all -y")]
pub struct UninstallArgs {
    /// Extension id to uninstall
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub id: Option<String>,

    /// Uninstall every installed extension
    #[arg(long)]
    pub all: bool,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Process the removal immediately instead of leaving it pending
    #[arg(long)]
    pub now: bool,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  List installed extensions:\n    aeb list\n\n\
                  Show detailed information:\n    aeb list --detailed\n\n\
                  Machine readable output:\n    aeb list --json")]
pub struct ListArgs {
    /// Show detailed output
    #[arg(long)]
    pub detailed: bool,

    /// Print JSON instead of text
    #[arg(long, conflicts_with = "detailed")]
    pub json: bool,
}

/// Arguments for the show command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show an installed extension:\n    aeb show viewer@example.com\n\n\
                  Inspect a bundle before installing it:\n    aeb show ./viewer.aeb")]
pub struct ShowArgs {
    /// Installed extension id or path of a bundle
    pub target: String,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show scheduled removals, splash screens and help entries:\n    aeb status\n\n\
                  Include bundles offered for installation:\n    aeb status downloads/*.aeb")]
pub struct StatusArgs {
    /// Bundles offered for installation; unreadable or invalid ones are skipped
    pub bundles: Vec<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    aeb completions --shell bash > ~/.bash_completion.d/aeb\n\n\
                  Generate zsh completions:\n    aeb completions --shell zsh > ~/.zfunc/_aeb")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long)]
    pub shell: String,
}
