use serde::{Deserialize, Serialize};

use super::action::Action;
use super::condition::Condition;
use crate::models::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicOperator {
    /// Every condition must hold.
    #[default]
    And,
    /// At least one condition must hold.
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub logic_operator: LogicOperator,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    pub fn new(name: &str, conditions: Vec<Condition>, actions: Vec<Action>) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            description: String::new(),
            conditions,
            actions,
            enabled: true,
            priority: 0,
            logic_operator: LogicOperator::And,
        }
    }

    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    /// A rule without conditions never matches.
    pub fn evaluate(&self, txn: &Transaction) -> bool {
        if self.conditions.is_empty() {
            return false;
        }
        match self.logic_operator {
            LogicOperator::And => self.conditions.iter().all(|c| c.evaluate(txn)),
            LogicOperator::Or => self.conditions.iter().any(|c| c.evaluate(txn)),
        }
    }

    /// Run every action in order when the rule matches; otherwise a plain copy.
    pub fn apply(&self, txn: &Transaction) -> Transaction {
        if !self.evaluate(txn) {
            return txn.clone();
        }
        self.actions
            .iter()
            .fold(txn.clone(), |current, action| action.apply(&current))
    }
}
