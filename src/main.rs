mod cleanup;
mod cli;
mod dedupe;
mod error;
mod models;
mod normalize;
mod prompt;
mod rules;
mod settings;
mod ynab;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, RulesCommands};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ynab_tidy=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::DedupePayees { mode, interactive } => cli::dedupe::run(mode, interactive),
        Commands::CleanupPayees { mode, interactive } => cli::cleanup::run(mode, interactive),
        Commands::Rules { command } => match command {
            RulesCommands::Add {
                name,
                description,
                priority,
                any,
                conditions,
                actions,
                disabled,
            } => cli::rules::add(&name, &description, priority, any, &conditions, &actions, disabled),
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Show { id } => cli::rules::show(&id),
            RulesCommands::Delete { id } => cli::rules::delete(&id),
            RulesCommands::Enable { id } => cli::rules::set_enabled(&id, true),
            RulesCommands::Disable { id } => cli::rules::set_enabled(&id, false),
            RulesCommands::Process { mode } => cli::rules::process(mode),
        },
    };

    if let Err(e) = result {
        if e.is_config() {
            eprintln!("Configuration error: {e}");
        } else {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}
