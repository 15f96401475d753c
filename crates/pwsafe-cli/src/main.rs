//! Pwsafe CLI - inspect and edit Password Safe v3 databases
//!
//! A thin command-line shell over `pwsafe-core`.

use clap::Parser;

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod logging;
mod output;

use app::{resolve_config_path, AppContext};
use cli::{Cli, Commands, ConfigCommand};
use config::load_config;
use errors::CliError;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        if let Some(cli_error) = err.downcast_ref::<CliError>() {
            cli_error.exit();
        }
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config_path = resolve_config_path(cli.config.as_deref())?;
    let config = load_config(&config_path)?;
    logging::init(cli.verbose, &config);
    let ctx = AppContext::new(cli, config, config_path);

    match &cli.command {
        Commands::Init(args) => commands::handle_init(&ctx, args),
        Commands::Info => commands::handle_info(&ctx),
        Commands::List(args) => commands::handle_list(&ctx, args),
        Commands::Show(args) => commands::handle_show(&ctx, args),
        Commands::Add(args) => commands::handle_add(&ctx, args),
        Commands::Remove(args) => commands::handle_remove(&ctx, args),
        Commands::Passwd => commands::handle_passwd(&ctx),
        Commands::Policies => commands::handle_policies(&ctx),
        Commands::Autotype(args) => commands::handle_autotype(&ctx, args),
        Commands::Config(ConfigCommand::Init { force }) => {
            commands::handle_config_init(&ctx, *force)
        }
        Commands::Config(ConfigCommand::Show) => commands::handle_config_show(&ctx),
        Commands::Completions { shell } => {
            commands::handle_completions(*shell);
            Ok(())
        }
    }
}
