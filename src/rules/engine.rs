use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use super::action::ActionField;
use super::rule::Rule;
use crate::error::{Result, TidyError};
use crate::models::{Transaction, TransactionUpdate};
use crate::ynab::BudgetService;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: ActionField,
    pub old: Option<String>,
    pub new: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Modification {
    pub transaction_id: String,
    pub payee_name: Option<String>,
    pub applied_rules: Vec<String>,
    pub changes: Vec<FieldChange>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessReport {
    pub total_transactions: usize,
    pub modified_transactions: usize,
    pub rules_applied: BTreeMap<String, usize>,
    pub modifications: Vec<Modification>,
    pub dry_run: bool,
    pub changes_applied: usize,
}

pub struct RulesEngine {
    rules: Vec<Rule>,
}

impl RulesEngine {
    /// Rules run highest priority first; equal priorities keep stored order.
    pub fn new(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|r| Reverse(r.priority));
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Feed the transaction through every enabled rule, each seeing the
    /// previous rule's output. Only rules that changed something are named.
    pub fn process_transaction(&self, txn: &Transaction) -> (Transaction, Vec<String>) {
        let mut current = txn.clone();
        let mut applied = Vec::new();

        for rule in self.rules.iter().filter(|r| r.enabled) {
            if !rule.evaluate(&current) {
                continue;
            }
            let next = rule.apply(&current);
            if next != current {
                tracing::debug!(rule = %rule.name, transaction = %txn.id, "rule applied");
                applied.push(rule.name.clone());
                current = next;
            }
        }

        (current, applied)
    }

    pub fn process_transactions(&self, transactions: &[Transaction], dry_run: bool) -> ProcessReport {
        let mut report = ProcessReport {
            total_transactions: transactions.len(),
            dry_run,
            ..Default::default()
        };

        for txn in transactions {
            let (modified, applied) = self.process_transaction(txn);
            if applied.is_empty() {
                continue;
            }
            report.modified_transactions += 1;
            for name in &applied {
                *report.rules_applied.entry(name.clone()).or_insert(0) += 1;
            }
            let changes = diff(txn, &modified);
            if !changes.is_empty() {
                report.modifications.push(Modification {
                    transaction_id: txn.id.clone(),
                    payee_name: txn.payee_name.clone(),
                    applied_rules: applied,
                    changes,
                });
            }
        }

        report
    }
}

fn diff(before: &Transaction, after: &Transaction) -> Vec<FieldChange> {
    ActionField::ALL
        .iter()
        .filter(|f| f.get(before) != f.get(after))
        .map(|f| FieldChange {
            field: *f,
            old: f.get(before).map(str::to_string),
            new: f.get(after).map(str::to_string),
        })
        .collect()
}

/// Turn a modification into the body YNAB expects. Category names are
/// resolved against the budget's categories, case-insensitively.
fn to_update(
    modification: &Modification,
    categories: &HashMap<String, String>,
) -> Result<TransactionUpdate> {
    let mut update = TransactionUpdate::default();
    for change in &modification.changes {
        let value = change.new.clone().unwrap_or_default();
        match change.field {
            ActionField::PayeeName => update.payee_name = Some(value),
            ActionField::Memo => update.memo = Some(value),
            ActionField::CategoryName if value.is_empty() => {
                tracing::warn!(
                    transaction = %modification.transaction_id,
                    "clearing a category is not supported, leaving it as is"
                );
            }
            ActionField::CategoryName => {
                let id = categories
                    .get(&value.to_lowercase())
                    .ok_or_else(|| TidyError::UnknownCategory(value.clone()))?;
                update.category_id = Some(id.clone());
            }
        }
    }
    Ok(update)
}

/// Send every modification in the report to YNAB. Returns how many
/// transactions were updated.
pub fn apply_modifications(service: &dyn BudgetService, report: &ProcessReport) -> Result<usize> {
    let needs_categories = report
        .modifications
        .iter()
        .flat_map(|m| &m.changes)
        .any(|c| c.field == ActionField::CategoryName);

    let categories: HashMap<String, String> = if needs_categories {
        service
            .list_categories()?
            .into_iter()
            .filter(|c| !c.deleted)
            .map(|c| (c.name.to_lowercase(), c.id))
            .collect()
    } else {
        HashMap::new()
    };

    let mut applied = 0;
    for modification in &report.modifications {
        let update = to_update(modification, &categories)?;
        if update.is_empty() {
            continue;
        }
        service.update_transaction(&modification.transaction_id, &update)?;
        applied += 1;
    }
    Ok(applied)
}

/// Load live transactions, run the rules over them and, unless this is a dry
/// run, push the results back.
pub fn process(service: &dyn BudgetService, engine: &RulesEngine, dry_run: bool) -> Result<ProcessReport> {
    let transactions: Vec<Transaction> = service
        .list_transactions()?
        .into_iter()
        .filter(|t| !t.deleted)
        .collect();

    let mut report = engine.process_transactions(&transactions, dry_run);
    if !dry_run {
        report.changes_applied = apply_modifications(service, &report)?;
    } else if !report.modifications.is_empty() {
        tracing::warn!(
            count = report.modifications.len(),
            "dry run, not updating transactions"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::rules::action::Action;
    use crate::rules::condition::Condition;
    use crate::ynab::fake::{captured_logs, Call, MemoryBudget};

    fn txn(id: &str, payee: &str, amount: i64) -> Transaction {
        Transaction {
            id: id.to_string(),
            payee_name: Some(payee.to_string()),
            amount,
            ..Default::default()
        }
    }

    fn rule(name: &str, priority: i64, when: &str, then: &[&str]) -> Rule {
        let mut r = Rule::new(
            name,
            vec![Condition::parse(when).unwrap()],
            then.iter().map(|a| Action::parse(a).unwrap()).collect(),
        );
        r.priority = priority;
        r
    }

    #[test]
    fn test_priority_order() {
        let engine = RulesEngine::new(vec![
            rule("low", 1, "payee_name contains shell", &["memo set low"]),
            rule("high", 10, "payee_name contains shell", &["memo set high"]),
            rule("mid", 5, "payee_name contains shell", &["memo set mid"]),
        ]);
        let names: Vec<&str> = engine.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);

        let (out, applied) = engine.process_transaction(&txn("t1", "Shell", -1000));
        assert_eq!(out.memo.as_deref(), Some("low"));
        assert_eq!(applied, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_later_rules_see_earlier_output() {
        let engine = RulesEngine::new(vec![
            rule("rename", 10, "payee_name contains amzn", &["payee_name set Amazon"]),
            rule("categorize", 5, "payee_name equals amazon", &["category_name set Shopping"]),
        ]);
        let (out, applied) = engine.process_transaction(&txn("t1", "AMZN Mktp US", -2000));
        assert_eq!(out.payee_name.as_deref(), Some("Amazon"));
        assert_eq!(out.category_name.as_deref(), Some("Shopping"));
        assert_eq!(applied.len(), 2);
    }

    #[test]
    fn test_disabled_and_no_op_rules_not_recorded() {
        let mut disabled = rule("off", 10, "payee_name contains shell", &["memo set off"]);
        disabled.enabled = false;
        let engine = RulesEngine::new(vec![
            disabled,
            rule("same", 5, "payee_name contains shell", &["payee_name set Shell"]),
        ]);
        let (out, applied) = engine.process_transaction(&txn("t1", "Shell", -1000));
        assert!(applied.is_empty());
        assert!(out.memo.is_none());
    }

    #[test]
    fn test_report_counts_and_changes() {
        let engine = RulesEngine::new(vec![rule(
            "fuel",
            0,
            "payee_name contains shell",
            &["category_name set Fuel", "memo append #car"],
        )]);
        let txns = vec![
            txn("t1", "Shell Oil", -40_000),
            txn("t2", "Walmart", -10_000),
            txn("t3", "SHELL", -30_000),
        ];
        let report = engine.process_transactions(&txns, true);
        assert_eq!(report.total_transactions, 3);
        assert_eq!(report.modified_transactions, 2);
        assert_eq!(report.rules_applied.get("fuel"), Some(&2));
        assert!(report.dry_run);

        let first = &report.modifications[0];
        assert_eq!(first.transaction_id, "t1");
        assert_eq!(
            first.changes,
            vec![
                FieldChange {
                    field: ActionField::CategoryName,
                    old: None,
                    new: Some("Fuel".to_string()),
                },
                FieldChange {
                    field: ActionField::Memo,
                    old: None,
                    new: Some("#car".to_string()),
                },
            ]
        );
    }

    fn budget() -> MemoryBudget {
        let mut gone = txn("t9", "Shell", -1000);
        gone.deleted = true;
        MemoryBudget {
            categories: vec![Category {
                id: "c-fuel".to_string(),
                name: "Fuel".to_string(),
                deleted: false,
            }],
            ..MemoryBudget::new(vec![], vec![txn("t1", "Shell", -40_000), txn("t2", "Walmart", -1), gone])
        }
    }

    #[test]
    fn test_process_applies_updates() {
        let budget = budget();
        let engine = RulesEngine::new(vec![rule(
            "fuel",
            0,
            "payee_name contains shell",
            &["category_name set fuel", "memo set car"],
        )]);
        let report = process(&budget, &engine, false).unwrap();
        assert_eq!(report.total_transactions, 2);
        assert_eq!(report.changes_applied, 1);
        assert_eq!(
            *budget.calls.borrow(),
            vec![Call::Update {
                transaction: "t1".to_string(),
                update: TransactionUpdate {
                    category_id: Some("c-fuel".to_string()),
                    memo: Some("car".to_string()),
                    ..Default::default()
                },
            }]
        );
    }

    #[test]
    fn test_process_dry_run_sends_nothing() {
        let budget = budget();
        let engine = RulesEngine::new(vec![rule("fuel", 0, "payee_name contains shell", &["memo set car"])]);
        let report = process(&budget, &engine, true).unwrap();
        assert_eq!(report.modified_transactions, 1);
        assert_eq!(report.changes_applied, 0);
        assert_eq!(budget.mutation_count(), 0);
    }

    #[test]
    fn test_unknown_category_is_an_error() {
        let budget = budget();
        let engine = RulesEngine::new(vec![rule(
            "bad",
            0,
            "payee_name contains shell",
            &["category_name set Nope"],
        )]);
        let err = process(&budget, &engine, false).unwrap_err();
        assert!(matches!(err, TidyError::UnknownCategory(name) if name == "Nope"));
        assert_eq!(budget.mutation_count(), 0);
    }

    #[test]
    fn test_dry_run_process_warns_and_leaves_budget() {
        let budget = MemoryBudget::new(vec![], vec![txn("t1", "Shell", -1000)]);
        let engine = RulesEngine::new(vec![rule("fuel", 0, "payee_name contains shell", &["memo set gas"])]);
        let logs = captured_logs(|| {
            let report = process(&budget, &engine, true).unwrap();
            assert_eq!(report.modified_transactions, 1);
            assert_eq!(report.changes_applied, 0);
        });
        assert_eq!(budget.mutation_count(), 0);
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("dry run, not updating transactions"));
    }
}
