use std::collections::HashMap;

use crate::error::Result;
use crate::models::Payee;
use crate::normalize::{has_emoji, normalize};
use crate::prompt::{Decision, Prompter};
use crate::ynab::BudgetService;

/// Live payees sharing one normalized key; always two or more.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    pub key: String,
    pub payees: Vec<Payee>,
}

/// Group live payees by normalized name. Groups come back in the order their
/// key was first seen and members keep their listing order. Names that
/// normalize to nothing are left out.
pub fn find_duplicates(payees: &[Payee]) -> Vec<DuplicateGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for payee in payees.iter().filter(|p| !p.deleted) {
        let key = normalize(&payee.name);
        if key.is_empty() {
            continue;
        }
        match index.get(&key) {
            Some(&i) => groups[i].payees.push(payee.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(DuplicateGroup {
                    key,
                    payees: vec![payee.clone()],
                });
            }
        }
    }

    groups.retain(|g| g.payees.len() > 1);
    groups
}

/// First member whose name carries an emoji, else the first member.
pub fn select_target(group: &[Payee]) -> Option<&Payee> {
    group
        .iter()
        .find(|p| has_emoji(&p.name))
        .or_else(|| group.first())
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    pub key: String,
    pub members: Vec<Payee>,
    pub target: Payee,
    pub sources: Vec<Payee>,
}

impl MergePlan {
    pub fn for_group(group: &DuplicateGroup) -> Option<Self> {
        let target = select_target(&group.payees)?.clone();
        let sources = group
            .payees
            .iter()
            .filter(|p| p.id != target.id)
            .cloned()
            .collect();
        Some(Self {
            key: group.key.clone(),
            members: group.payees.clone(),
            target,
            sources,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceMerge {
    pub source: Payee,
    pub transactions: usize,
}

/// Move one source's transactions onto the target, then retire the source.
/// A dry run still reads the transactions so counts match a live run.
pub fn merge_source(
    service: &dyn BudgetService,
    target: &Payee,
    source: &Payee,
    dry_run: bool,
) -> Result<SourceMerge> {
    let transactions = service.list_transactions_by_payee(&source.id)?;

    if dry_run {
        tracing::warn!(
            source = %source.id,
            target = %target.id,
            count = transactions.len(),
            "dry run, leaving payee untouched"
        );
    } else {
        for txn in &transactions {
            service.update_transaction_payee(&txn.id, &target.id)?;
        }
        service.set_payee_deleted(&source.id, true)?;
        tracing::info!(
            source = %source.id,
            target = %target.id,
            count = transactions.len(),
            "merged payee"
        );
    }

    Ok(SourceMerge {
        source: source.clone(),
        transactions: transactions.len(),
    })
}

/// Run `merge_source` for every source of the plan, reporting each as it lands.
pub fn execute_plan<F>(
    service: &dyn BudgetService,
    plan: &MergePlan,
    dry_run: bool,
    mut on_merged: F,
) -> Result<Vec<SourceMerge>>
where
    F: FnMut(&SourceMerge),
{
    let mut merged = Vec::with_capacity(plan.sources.len());
    for source in &plan.sources {
        let result = merge_source(service, &plan.target, source, dry_run)?;
        on_merged(&result);
        merged.push(result);
    }
    Ok(merged)
}

#[derive(Debug)]
pub enum DedupeEvent<'a> {
    Planned(usize),
    Group(&'a MergePlan),
    Merged(&'a MergePlan, &'a SourceMerge),
    Skipped(&'a MergePlan),
    Aborted,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DedupeSummary {
    pub groups_found: usize,
    pub groups_merged: usize,
    pub groups_skipped: usize,
    pub payees_merged: usize,
    pub transactions_moved: usize,
    pub dry_run: bool,
    pub aborted: bool,
}

/// Fetch payees once, plan every duplicate group, and merge them one after
/// another. With a prompter each group is confirmed, skipped or ends the run.
/// Service failures stop the run where they happen; nothing is rolled back.
pub fn run<F>(
    service: &dyn BudgetService,
    dry_run: bool,
    mut prompter: Option<&mut dyn Prompter>,
    mut on_event: F,
) -> Result<DedupeSummary>
where
    F: FnMut(DedupeEvent<'_>),
{
    let payees = service.list_payees()?;
    let plans: Vec<MergePlan> = find_duplicates(&payees)
        .iter()
        .filter_map(MergePlan::for_group)
        .collect();
    tracing::debug!(payees = payees.len(), groups = plans.len(), "grouped payees");

    let mut summary = DedupeSummary {
        groups_found: plans.len(),
        dry_run,
        ..Default::default()
    };

    on_event(DedupeEvent::Planned(plans.len()));
    for plan in &plans {
        on_event(DedupeEvent::Group(plan));

        if let Some(p) = prompter.as_deref_mut() {
            let question = format!(
                "Merge {} payee(s) into '{}'?",
                plan.sources.len(),
                plan.target.name
            );
            match p.decide(&question) {
                Decision::Confirm => {}
                Decision::Decline => {
                    summary.groups_skipped += 1;
                    on_event(DedupeEvent::Skipped(plan));
                    continue;
                }
                Decision::Abort => {
                    summary.aborted = true;
                    on_event(DedupeEvent::Aborted);
                    break;
                }
            }
        }

        let merged = execute_plan(service, plan, dry_run, |m| {
            on_event(DedupeEvent::Merged(plan, m))
        })?;
        summary.groups_merged += 1;
        summary.payees_merged += merged.len();
        summary.transactions_moved += merged.iter().map(|m| m.transactions).sum::<usize>();
    }

    Ok(summary)
}
