use std::collections::HashSet;

use crate::error::Result;
use crate::models::Payee;
use crate::prompt::{Decision, Prompter};
use crate::ynab::BudgetService;

/// Payees YNAB manages for account transfers; never pruned.
const TRANSFER_PREFIX: &str = "Transfer";

/// Live, named, non-transfer payees that no transaction points at.
pub fn find_unused_payees(service: &dyn BudgetService) -> Result<Vec<Payee>> {
    let payees = service.list_payees()?;
    let transactions = service.list_transactions()?;

    let used: HashSet<&str> = transactions
        .iter()
        .filter_map(|t| t.payee_id.as_deref())
        .collect();

    Ok(payees
        .iter()
        .filter(|p| {
            let name = p.name.trim();
            !p.deleted
                && !name.is_empty()
                && !name.starts_with(TRANSFER_PREFIX)
                && !used.contains(p.id.as_str())
        })
        .cloned()
        .collect())
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CleanupSummary {
    pub total_found: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub dry_run: bool,
    pub aborted: bool,
}

#[derive(Debug)]
pub enum CleanupEvent<'a> {
    Found(usize),
    Deleted(&'a Payee),
    Skipped(&'a Payee),
    Aborted,
}

pub fn run<F>(
    service: &dyn BudgetService,
    dry_run: bool,
    mut prompter: Option<&mut dyn Prompter>,
    mut on_event: F,
) -> Result<CleanupSummary>
where
    F: FnMut(CleanupEvent<'_>),
{
    let unused = find_unused_payees(service)?;
    on_event(CleanupEvent::Found(unused.len()));

    let mut summary = CleanupSummary {
        total_found: unused.len(),
        dry_run,
        ..Default::default()
    };

    for payee in &unused {
        if let Some(p) = prompter.as_deref_mut() {
            match p.decide(&format!("Delete '{}'?", payee.name)) {
                Decision::Confirm => {}
                Decision::Decline => {
                    summary.skipped += 1;
                    on_event(CleanupEvent::Skipped(payee));
                    continue;
                }
                Decision::Abort => {
                    summary.aborted = true;
                    on_event(CleanupEvent::Aborted);
                    break;
                }
            }
        }

        if dry_run {
            tracing::warn!(payee = %payee.id, "dry run, not deleting");
        } else {
            service.set_payee_deleted(&payee.id, true)?;
            tracing::info!(payee = %payee.id, "deleted unused payee");
        }
        summary.deleted += 1;
        on_event(CleanupEvent::Deleted(payee));
    }

    Ok(summary)
}
