pub mod cleanup;
pub mod dedupe;
pub mod rules;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ynab-tidy",
    version,
    about = "Housekeeping for YNAB budgets: duplicate payees, unused payees, transaction rules."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// `--dry-run` / `--apply`; neither falls back to the environment default.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct RunMode {
    /// Report what would change without touching the budget
    #[arg(long = "dry-run", conflicts_with = "apply")]
    pub dry_run: bool,
    /// Make the changes
    #[arg(long)]
    pub apply: bool,
}

impl RunMode {
    pub fn resolve(&self, env_default: bool) -> bool {
        if self.apply {
            false
        } else if self.dry_run {
            true
        } else {
            env_default
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge payees whose names differ only by emoji, spacing or case.
    DedupePayees {
        #[command(flatten)]
        mode: RunMode,
        /// Confirm each duplicate group before merging it
        #[arg(long)]
        interactive: bool,
    },
    /// Delete payees that no transaction uses.
    CleanupPayees {
        #[command(flatten)]
        mode: RunMode,
        /// Confirm each payee before deleting it
        #[arg(long)]
        interactive: bool,
    },
    /// Manage and run transaction rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a rule.
    Add {
        /// Rule name, shown in reports
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Rule priority (higher runs first)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        priority: i64,
        /// Match when any condition holds instead of all
        #[arg(long)]
        any: bool,
        /// Condition: "<field> <operator> <value>", e.g. "payee_name contains amazon"
        #[arg(long = "when", required = true)]
        conditions: Vec<String>,
        /// Action: "<field> <operation> [value]", e.g. "category_name set Shopping"
        #[arg(long = "then", required = true)]
        actions: Vec<String>,
        /// Store the rule switched off
        #[arg(long)]
        disabled: bool,
    },
    /// List all rules.
    List,
    /// Show one rule in full.
    Show {
        /// Rule ID or unique prefix (shown in `ynab-tidy rules list`)
        id: String,
    },
    /// Delete a rule.
    Delete {
        id: String,
    },
    /// Switch a rule on.
    Enable {
        id: String,
    },
    /// Switch a rule off.
    Disable {
        id: String,
    },
    /// Run the rules over every transaction in the budget.
    Process {
        #[command(flatten)]
        mode: RunMode,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_resolution() {
        assert!(RunMode::default().resolve(true));
        assert!(!RunMode::default().resolve(false));
        let forced_dry = RunMode { dry_run: true, apply: false };
        assert!(forced_dry.resolve(false));
        let forced_live = RunMode { dry_run: false, apply: true };
        assert!(!forced_live.resolve(true));
    }

    #[test]
    fn test_dry_run_and_apply_conflict() {
        let parsed = Cli::try_parse_from(["ynab-tidy", "dedupe-payees", "--dry-run", "--apply"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parse_rules_add() {
        let cli = Cli::try_parse_from([
            "ynab-tidy",
            "rules",
            "add",
            "--name",
            "Fuel",
            "--priority",
            "-1",
            "--when",
            "payee_name contains shell",
            "--when",
            "outflow greater_than 20",
            "--then",
            "category_name set Fuel",
        ])
        .unwrap();
        match cli.command {
            Commands::Rules {
                command: RulesCommands::Add { priority, conditions, actions, any, .. },
            } => {
                assert_eq!(priority, -1);
                assert_eq!(conditions.len(), 2);
                assert_eq!(actions, vec!["category_name set Fuel"]);
                assert!(!any);
            }
            _ => panic!("expected rules add"),
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
