use colored::Colorize;
use comfy_table::{Cell, Table};

use super::RunMode;
use crate::error::{Result, TidyError};
use crate::rules::{self, Action, Condition, LogicOperator, Rule, RuleStorage, RulesEngine};
use crate::settings::{rules_path, Config};
use crate::ynab::YnabClient;

fn storage() -> RuleStorage {
    RuleStorage::new(rules_path())
}

#[allow(clippy::too_many_arguments)]
pub fn add(
    name: &str,
    description: &str,
    priority: i64,
    any: bool,
    conditions: &[String],
    actions: &[String],
    disabled: bool,
) -> Result<()> {
    let conditions = conditions
        .iter()
        .map(|c| Condition::parse(c))
        .collect::<Result<Vec<_>>>()?;
    let actions = actions
        .iter()
        .map(|a| Action::parse(a))
        .collect::<Result<Vec<_>>>()?;
    if name.trim().is_empty() {
        return Err(TidyError::InvalidRule("rule name cannot be empty".to_string()));
    }

    let mut rule = Rule::new(name.trim(), conditions, actions);
    rule.description = description.to_string();
    rule.priority = priority;
    rule.enabled = !disabled;
    if any {
        rule.logic_operator = LogicOperator::Or;
    }

    storage().save(&rule)?;
    println!("Added rule {} '{}'", rule.short_id().cyan(), rule.name);
    Ok(())
}

pub fn list() -> Result<()> {
    let storage = storage();
    let engine = RulesEngine::new(storage.all()?);
    if engine.rules().is_empty() {
        println!("No rules found in {}.", storage.path().display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "On", "Priority", "Name", "Match", "Conditions", "Actions"]);
    for rule in engine.rules() {
        table.add_row(vec![
            Cell::new(rule.short_id()),
            Cell::new(if rule.enabled { "\u{2713}" } else { "\u{2717}" }),
            Cell::new(rule.priority),
            Cell::new(&rule.name),
            Cell::new(match rule.logic_operator {
                LogicOperator::And => "all",
                LogicOperator::Or => "any",
            }),
            Cell::new(join_lines(&rule.conditions)),
            Cell::new(join_lines(&rule.actions)),
        ]);
    }
    println!("Rules\n{table}");
    Ok(())
}

fn join_lines<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn show(id: &str) -> Result<()> {
    let rule = storage().resolve(id)?;
    println!("{} {}", "Rule".bold(), rule.id);
    println!("  Name:        {}", rule.name);
    if !rule.description.is_empty() {
        println!("  Description: {}", rule.description);
    }
    println!("  Enabled:     {}", if rule.enabled { "yes" } else { "no" });
    println!("  Priority:    {}", rule.priority);
    println!(
        "  Conditions ({}):",
        match rule.logic_operator {
            LogicOperator::And => "all must match",
            LogicOperator::Or => "any may match",
        }
    );
    for c in &rule.conditions {
        println!("    - {c}");
    }
    println!("  Actions:");
    for a in &rule.actions {
        println!("    - {a}");
    }
    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let storage = storage();
    let rule = storage.resolve(id)?;
    storage.delete(&rule.id)?;
    println!("Deleted rule {} '{}'", rule.short_id(), rule.name);
    Ok(())
}

pub fn set_enabled(id: &str, enabled: bool) -> Result<()> {
    let storage = storage();
    let mut rule = storage.resolve(id)?;
    if rule.enabled == enabled {
        let state = if enabled { "enabled" } else { "disabled" };
        println!("Rule {} is already {state}", rule.short_id());
        return Ok(());
    }
    rule.enabled = enabled;
    storage.save(&rule)?;
    let state = if enabled { "Enabled" } else { "Disabled" };
    println!("{state} rule {} '{}'", rule.short_id(), rule.name);
    Ok(())
}

pub fn process(mode: RunMode) -> Result<()> {
    let config = Config::load()?;
    let dry_run = mode.resolve(config.rules_dry_run);
    let engine = RulesEngine::new(storage().all()?);
    if engine.rules().iter().all(|r| !r.enabled) {
        println!("{}", "No enabled rules; nothing to do.".yellow());
        return Ok(());
    }

    let client = YnabClient::new(&config)?;
    let report = rules::process(&client, &engine, dry_run)?;

    println!("\nProcessed {} transactions", report.total_transactions);
    println!("Modified: {}", report.modified_transactions);

    if report.modified_transactions == 0 {
        return Ok(());
    }

    println!("\nRules applied:");
    for (name, count) in &report.rules_applied {
        println!("- {name}: {count} transaction(s)");
    }

    let mut table = Table::new();
    table.set_header(vec!["Transaction", "Payee", "Field", "Old", "New"]);
    for m in &report.modifications {
        for change in &m.changes {
            table.add_row(vec![
                Cell::new(&m.transaction_id),
                Cell::new(m.payee_name.as_deref().unwrap_or_default()),
                Cell::new(change.field),
                Cell::new(change.old.as_deref().unwrap_or_default()),
                Cell::new(change.new.as_deref().unwrap_or_default()),
            ]);
        }
    }
    println!("\n{table}");

    if dry_run {
        println!("\nThis was a dry run. No changes were applied.");
    } else {
        println!(
            "{}",
            format!("\nApplied changes to {} transactions in YNAB.", report.changes_applied).green()
        );
    }
    Ok(())
}
