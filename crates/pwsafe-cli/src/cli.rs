use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use pwsafe_core::VERSION;

/// Pwsafe - read and edit Password Safe v3 databases from the terminal
#[derive(Parser, Debug)]
#[command(name = "pwsafe")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the .psafe3 file
    #[arg(short, long, global = true, env = "PWSAFE_PATH")]
    pub safe: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true, env = "PWSAFE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new empty safe
    Init(InitArgs),

    /// Show safe metadata
    Info,

    /// List entries
    List(ListArgs),

    /// Show one entry
    Show(ShowArgs),

    /// Add an entry
    Add(AddArgs),

    /// Remove an entry
    Remove(EntryRef),

    /// Change the safe passphrase
    Passwd,

    /// List named password policies
    Policies,

    /// Print the expanded autotype sequence of an entry
    Autotype(EntryRef),

    /// Manage the config file
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

/// Arguments for the `init` command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where the safe will be created
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Database name
    #[arg(long)]
    pub name: Option<String>,

    /// Database description
    #[arg(long)]
    pub description: Option<String>,

    /// Key stretching iterations (at least 2048)
    #[arg(long)]
    pub iterations: Option<u32>,
}

/// Arguments for the `list` command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only entries in this group
    #[arg(short, long)]
    pub group: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// An entry selected by title and optional group
#[derive(Args, Debug)]
pub struct EntryRef {
    /// Entry title
    #[arg(value_name = "TITLE")]
    pub title: String,

    /// Entry group (dot separated)
    #[arg(short, long)]
    pub group: Option<String>,
}

/// Arguments for the `show` command
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub entry: EntryRef,

    /// Print the password
    #[arg(long)]
    pub reveal: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `add` command
#[derive(Args, Debug)]
pub struct AddArgs {
    #[command(flatten)]
    pub entry: EntryRef,

    /// User name
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password (prompted for when omitted on a terminal)
    #[arg(long)]
    pub password: Option<String>,

    /// URL
    #[arg(long)]
    pub url: Option<String>,

    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective config
    Show,
}
