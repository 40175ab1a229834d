//! User-defined transaction rules: conditions select transactions, actions
//! rewrite payee, category or memo.

pub mod action;
pub mod condition;
pub mod engine;
pub mod rule;
pub mod storage;

pub use action::Action;
pub use condition::Condition;
pub use engine::{process, RulesEngine};
pub use rule::{LogicOperator, Rule};
pub use storage::RuleStorage;
