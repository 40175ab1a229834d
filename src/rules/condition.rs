use std::fmt;
use std::str::FromStr;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::error::TidyError;
use crate::models::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionField {
    PayeeName,
    AccountName,
    Outflow,
    Inflow,
    Memo,
    CategoryName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    Regex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: ConditionField,
    pub operator: ConditionOperator,
    pub value: String,
}

fn milliunits_to_units(amount: i64) -> f64 {
    amount as f64 / 1000.0
}

impl ConditionField {
    /// The transaction's value for this field, as text. Amount fields are
    /// always present; text fields may be missing.
    pub fn read(&self, txn: &Transaction) -> Option<String> {
        match self {
            ConditionField::PayeeName => txn.payee_name.clone(),
            ConditionField::AccountName => txn.account_name.clone(),
            ConditionField::Memo => txn.memo.clone(),
            ConditionField::CategoryName => txn.category_name.clone(),
            ConditionField::Outflow => {
                Some(milliunits_to_units(txn.amount.saturating_neg().max(0)).to_string())
            }
            ConditionField::Inflow => Some(milliunits_to_units(txn.amount.max(0)).to_string()),
        }
    }
}

impl Condition {
    pub fn new(field: ConditionField, operator: ConditionOperator, value: &str) -> Self {
        Self {
            field,
            operator,
            value: value.to_string(),
        }
    }

    pub fn evaluate(&self, txn: &Transaction) -> bool {
        let Some(actual) = self.field.read(txn) else {
            return false;
        };
        let actual_lower = actual.to_lowercase();
        let expected_lower = self.value.to_lowercase();

        match self.operator {
            ConditionOperator::Equals => actual_lower == expected_lower,
            ConditionOperator::Contains => actual_lower.contains(&expected_lower),
            ConditionOperator::StartsWith => actual_lower.starts_with(&expected_lower),
            ConditionOperator::EndsWith => actual_lower.ends_with(&expected_lower),
            ConditionOperator::GreaterThan => numeric(&actual, &self.value, |a, b| a > b),
            ConditionOperator::LessThan => numeric(&actual, &self.value, |a, b| a < b),
            ConditionOperator::Regex => RegexBuilder::new(&self.value)
                .case_insensitive(true)
                .build()
                .map(|re| re.is_match(&actual))
                .unwrap_or(false),
        }
    }

    /// Parse `"<field> <operator> <value>"`, e.g. `payee_name contains amazon`.
    pub fn parse(spec: &str) -> Result<Self, TidyError> {
        let (field, rest) = next_token(spec);
        let (operator, value) = next_token(rest);
        let value = value.trim();
        if value.is_empty() {
            return Err(TidyError::InvalidRule(format!(
                "condition '{spec}' needs a field, an operator and a value"
            )));
        }
        Ok(Self::new(field.parse()?, operator.parse()?, value))
    }
}

/// Split off the first whitespace-delimited token, returning it and the rest
/// with leading whitespace removed.
pub(crate) fn next_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim_start()),
        None => (text, ""),
    }
}

fn numeric(actual: &str, expected: &str, cmp: fn(f64, f64) -> bool) -> bool {
    match (actual.trim().parse::<f64>(), expected.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => cmp(a, b),
        _ => false,
    }
}

impl FromStr for ConditionField {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payee_name" => Ok(ConditionField::PayeeName),
            "account_name" => Ok(ConditionField::AccountName),
            "outflow" => Ok(ConditionField::Outflow),
            "inflow" => Ok(ConditionField::Inflow),
            "memo" => Ok(ConditionField::Memo),
            "category_name" => Ok(ConditionField::CategoryName),
            other => Err(TidyError::InvalidRule(format!(
                "unknown condition field '{other}' (payee_name, account_name, outflow, inflow, memo, category_name)"
            ))),
        }
    }
}

impl FromStr for ConditionOperator {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(ConditionOperator::Equals),
            "contains" => Ok(ConditionOperator::Contains),
            "starts_with" => Ok(ConditionOperator::StartsWith),
            "ends_with" => Ok(ConditionOperator::EndsWith),
            "greater_than" => Ok(ConditionOperator::GreaterThan),
            "less_than" => Ok(ConditionOperator::LessThan),
            "regex" => Ok(ConditionOperator::Regex),
            other => Err(TidyError::InvalidRule(format!(
                "unknown operator '{other}' (equals, contains, starts_with, ends_with, greater_than, less_than, regex)"
            ))),
        }
    }
}

impl fmt::Display for ConditionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConditionField::PayeeName => "payee_name",
            ConditionField::AccountName => "account_name",
            ConditionField::Outflow => "outflow",
            ConditionField::Inflow => "inflow",
            ConditionField::Memo => "memo",
            ConditionField::CategoryName => "category_name",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::Contains => "contains",
            ConditionOperator::StartsWith => "starts_with",
            ConditionOperator::EndsWith => "ends_with",
            ConditionOperator::GreaterThan => "greater_than",
            ConditionOperator::LessThan => "less_than",
            ConditionOperator::Regex => "regex",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn() -> Transaction {
        Transaction {
            id: "t1".to_string(),
            amount: -42_500,
            payee_name: Some("AMAZON Marketplace".to_string()),
            account_name: Some("Visa".to_string()),
            ..Default::default()
        }
    }

    fn check(field: ConditionField, op: ConditionOperator, value: &str) -> bool {
        Condition::new(field, op, value).evaluate(&txn())
    }

    #[test]
    fn test_text_operators_ignore_case() {
        use ConditionOperator::*;
        assert!(check(ConditionField::PayeeName, Equals, "amazon marketplace"));
        assert!(check(ConditionField::PayeeName, Contains, "market"));
        assert!(check(ConditionField::PayeeName, StartsWith, "Amazon"));
        assert!(check(ConditionField::PayeeName, EndsWith, "PLACE"));
        assert!(!check(ConditionField::PayeeName, Equals, "amazon"));
    }

    #[test]
    fn test_missing_field_never_matches() {
        assert!(!check(ConditionField::Memo, ConditionOperator::Contains, ""));
        assert!(!check(ConditionField::CategoryName, ConditionOperator::Regex, ".*"));
    }

    #[test]
    fn test_amount_fields() {
        assert!(check(ConditionField::Outflow, ConditionOperator::GreaterThan, "40"));
        assert!(check(ConditionField::Outflow, ConditionOperator::LessThan, "42.51"));
        assert!(check(ConditionField::Inflow, ConditionOperator::Equals, "0"));
        assert!(!check(ConditionField::Inflow, ConditionOperator::GreaterThan, "0"));
    }

    #[test]
    fn test_non_numeric_comparison_is_false() {
        assert!(!check(ConditionField::Outflow, ConditionOperator::GreaterThan, "lots"));
        assert!(!check(ConditionField::PayeeName, ConditionOperator::LessThan, "10"));
    }

    #[test]
    fn test_regex() {
        assert!(check(ConditionField::PayeeName, ConditionOperator::Regex, r"^amazon\s+m"));
        assert!(!check(ConditionField::PayeeName, ConditionOperator::Regex, r"^market"));
        assert!(!check(ConditionField::PayeeName, ConditionOperator::Regex, r"(unclosed"));
    }

    #[test]
    fn test_parse() {
        let c = Condition::parse("payee_name contains whole foods").unwrap();
        assert_eq!(c.field, ConditionField::PayeeName);
        assert_eq!(c.operator, ConditionOperator::Contains);
        assert_eq!(c.value, "whole foods");
        assert!(Condition::parse("payee_name contains").is_err());
        assert!(Condition::parse("payee contains x").is_err());
        assert!(Condition::parse("memo like x").is_err());
    }

    #[test]
    fn test_serde_names() {
        let c = Condition::new(ConditionField::CategoryName, ConditionOperator::StartsWith, "Gro");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"field": "category_name", "operator": "starts_with", "value": "Gro"})
        );
    }

    #[test]
    fn test_display_parses_back() {
        for c in [
            Condition::new(ConditionField::PayeeName, ConditionOperator::Contains, "walmart"),
            Condition::new(ConditionField::Memo, ConditionOperator::Regex, r"^rent\s+\d+"),
            Condition::new(ConditionField::Outflow, ConditionOperator::GreaterThan, "20.5"),
            Condition::new(ConditionField::AccountName, ConditionOperator::Equals, "Joint  Checking"),
        ] {
            assert_eq!(Condition::parse(&c.to_string()).unwrap(), c, "{c}");
        }
        assert_eq!(
            Condition::new(ConditionField::PayeeName, ConditionOperator::Contains, "walmart").to_string(),
            "payee_name contains walmart"
        );
    }

    #[test]
    fn test_parse_tolerates_repeated_whitespace() {
        let c = Condition::parse("  payee_name  contains \t whole  foods ").unwrap();
        assert_eq!(c.field, ConditionField::PayeeName);
        assert_eq!(c.operator, ConditionOperator::Contains);
        assert_eq!(c.value, "whole  foods");
    }

    #[test]
    fn test_extreme_amounts_do_not_overflow() {
        let t = Transaction {
            amount: i64::MIN,
            ..Default::default()
        };
        let outflow = ConditionField::Outflow.read(&t).unwrap();
        assert!(outflow.parse::<f64>().unwrap() > 0.0);
        assert_eq!(ConditionField::Inflow.read(&t).as_deref(), Some("0"));
    }
}
