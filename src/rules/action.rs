use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::condition::next_token;
use crate::error::TidyError;
use crate::models::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionField {
    PayeeName,
    CategoryName,
    Memo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOperation {
    Set,
    Append,
    Prepend,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub field: ActionField,
    pub operation: ActionOperation,
    #[serde(default)]
    pub value: String,
}

impl ActionField {
    pub const ALL: [ActionField; 3] = [
        ActionField::PayeeName,
        ActionField::CategoryName,
        ActionField::Memo,
    ];

    pub fn get<'a>(&self, txn: &'a Transaction) -> Option<&'a str> {
        match self {
            ActionField::PayeeName => txn.payee_name.as_deref(),
            ActionField::CategoryName => txn.category_name.as_deref(),
            ActionField::Memo => txn.memo.as_deref(),
        }
    }

    fn slot<'a>(&self, txn: &'a mut Transaction) -> &'a mut Option<String> {
        match self {
            ActionField::PayeeName => &mut txn.payee_name,
            ActionField::CategoryName => &mut txn.category_name,
            ActionField::Memo => &mut txn.memo,
        }
    }
}

impl Action {
    pub fn new(field: ActionField, operation: ActionOperation, value: &str) -> Self {
        Self {
            field,
            operation,
            value: value.to_string(),
        }
    }

    pub fn apply(&self, txn: &Transaction) -> Transaction {
        let mut out = txn.clone();
        let current = self.field.get(txn).unwrap_or_default();
        let next = match self.operation {
            ActionOperation::Set => self.value.clone(),
            ActionOperation::Append if current.is_empty() => self.value.clone(),
            ActionOperation::Append => format!("{current} {}", self.value),
            ActionOperation::Prepend if current.is_empty() => self.value.clone(),
            ActionOperation::Prepend => format!("{} {current}", self.value),
            ActionOperation::Clear => String::new(),
        };
        *self.field.slot(&mut out) = Some(next);
        out
    }

    /// Parse `"<field> <operation> [value]"`, e.g. `memo append #subscription`.
    pub fn parse(spec: &str) -> Result<Self, TidyError> {
        let (field, rest) = next_token(spec);
        let (operation, value) = next_token(rest);
        let field: ActionField = field.parse()?;
        let operation: ActionOperation = operation.parse()?;
        let value = value.trim();
        if value.is_empty() && operation != ActionOperation::Clear {
            return Err(TidyError::InvalidRule(format!(
                "action '{spec}' needs a value"
            )));
        }
        Ok(Self::new(field, operation, value))
    }
}

impl FromStr for ActionField {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payee_name" => Ok(ActionField::PayeeName),
            "category_name" => Ok(ActionField::CategoryName),
            "memo" => Ok(ActionField::Memo),
            other => Err(TidyError::InvalidRule(format!(
                "unknown action field '{other}' (payee_name, category_name, memo)"
            ))),
        }
    }
}

impl FromStr for ActionOperation {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set" => Ok(ActionOperation::Set),
            "append" => Ok(ActionOperation::Append),
            "prepend" => Ok(ActionOperation::Prepend),
            "clear" => Ok(ActionOperation::Clear),
            other => Err(TidyError::InvalidRule(format!(
                "unknown operation '{other}' (set, append, prepend, clear)"
            ))),
        }
    }
}

impl fmt::Display for ActionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionField::PayeeName => "payee_name",
            ActionField::CategoryName => "category_name",
            ActionField::Memo => "memo",
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.operation {
            ActionOperation::Set => "set",
            ActionOperation::Append => "append",
            ActionOperation::Prepend => "prepend",
            ActionOperation::Clear => return write!(f, "{} clear", self.field),
        };
        write!(f, "{} {op} {}", self.field, self.value)
    }
}
