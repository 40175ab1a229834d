use colored::Colorize;

use super::RunMode;
use crate::dedupe::{self, DedupeEvent};
use crate::error::Result;
use crate::prompt::{Prompter, TerminalPrompter};
use crate::settings::Config;
use crate::ynab::YnabClient;

pub fn run(mode: RunMode, interactive: bool) -> Result<()> {
    let config = Config::load()?;
    let dry_run = mode.resolve(config.duplicate_cleanup_dry_run);
    let client = YnabClient::new(&config)?;

    let title = if dry_run {
        "YNAB Duplicate Payee Cleanup (DRY RUN)"
    } else {
        "YNAB Duplicate Payee Cleanup"
    };
    println!("{}", title.bold());
    println!("{}", "=".repeat(60));

    let mut terminal = TerminalPrompter;
    let prompter: Option<&mut dyn Prompter> = if interactive {
        Some(&mut terminal)
    } else {
        None
    };

    let summary = dedupe::run(&client, dry_run, prompter, |event| match event {
        DedupeEvent::Planned(0) => println!("{}", "No duplicate payees found!".green()),
        DedupeEvent::Planned(n) => println!("Found {n} groups of duplicate payees:\n"),
        DedupeEvent::Group(plan) => {
            println!("Group '{}' ({} payees):", plan.key, plan.members.len());
            for (i, p) in plan.members.iter().enumerate() {
                println!("  {}. {}", i + 1, p.name);
            }
            println!("  {} {}", "\u{2192} Keeping:".cyan(), plan.target.name);
        }
        DedupeEvent::Merged(plan, merged) => println!(
            "  Payee: {} \u{2192} {} ({} transactions)",
            merged.source.name, plan.target.name, merged.transactions
        ),
        DedupeEvent::Skipped(plan) => {
            println!("  {} '{}'", "Skipped group".yellow(), plan.key)
        }
        DedupeEvent::Aborted => {
            println!("{}", "Stopped. Remaining groups left untouched.".yellow())
        }
    })?;

    if summary.groups_found == 0 {
        return Ok(());
    }

    let verb = if dry_run { "would be" } else { "were" };
    println!();
    println!(
        "{}",
        format!(
            "Complete! {} groups ({} payees, {} transactions) {verb} merged.",
            summary.groups_merged, summary.payees_merged, summary.transactions_moved
        )
        .green()
    );
    println!("Groups skipped: {}", summary.groups_skipped);
    if dry_run {
        println!();
        println!("This was a dry run. No changes were made to your YNAB budget.");
        println!("Pass --apply (or set YNAB_DUPLICATE_CLEANUP_DRY_RUN=false) to make changes.");
    }
    Ok(())
}
