use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payee {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(default)]
    pub date: Option<String>,
    /// Milliunits: 1000 = one currency unit, negative for outflows.
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub payee_id: Option<String>,
    #[serde(default)]
    pub payee_name: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
}

/// Partial transaction body; only the populated fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        self.payee_id.is_none()
            && self.payee_name.is_none()
            && self.category_id.is_none()
            && self.memo.is_none()
    }
}
