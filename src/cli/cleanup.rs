use chrono::Local;
use colored::Colorize;

use super::RunMode;
use crate::cleanup::{self, CleanupEvent};
use crate::error::Result;
use crate::prompt::{Prompter, TerminalPrompter};
use crate::settings::Config;
use crate::ynab::YnabClient;

pub fn run(mode: RunMode, interactive: bool) -> Result<()> {
    let config = Config::load()?;
    let dry_run = mode.resolve(config.payee_cleanup_dry_run);
    let client = YnabClient::new(&config)?;

    let started = Local::now();
    let label = if dry_run { "DRY RUN" } else { "LIVE MODE" };
    println!("{}", format!("YNAB Payee Cleanup - {label}").bold());
    println!("{}", "=".repeat(40));
    println!("Finding unused payees...");

    let mut terminal = TerminalPrompter;
    let prompter: Option<&mut dyn Prompter> = if interactive {
        Some(&mut terminal)
    } else {
        None
    };

    let summary = cleanup::run(&client, dry_run, prompter, |event| match event {
        CleanupEvent::Found(0) => println!("{}", "No unused payees found. Nothing to clean up.".green()),
        CleanupEvent::Found(n) => println!("Found {n} unused payees"),
        CleanupEvent::Deleted(p) if dry_run => println!("Would delete payee: {}", p.name),
        CleanupEvent::Deleted(p) => println!("{} {}", "Deleted payee:".green(), p.name),
        CleanupEvent::Skipped(p) => println!("{} {}", "Skipping payee:".yellow(), p.name),
        CleanupEvent::Aborted => println!("{}", "Stopped. Remaining payees left untouched.".yellow()),
    })?;

    let elapsed = (Local::now() - started).num_milliseconds() as f64 / 1000.0;
    println!();
    println!("{}", "=".repeat(40));
    println!("Cleanup completed in {elapsed:.2} seconds");
    println!("Total unused payees found: {}", summary.total_found);
    println!(
        "Payees {}: {}",
        if dry_run { "that would be deleted" } else { "deleted" },
        summary.deleted
    );
    println!("Payees skipped: {}", summary.skipped);
    Ok(())
}
