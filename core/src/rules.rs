//! Ruleset collaborator surface.
//!
//! A ruleset pushes named values into clocks with keys of the fixed shape
//! `Clock.<clockId>.<RuleName>`. The core never loads rule files itself.

use serde::{Deserialize, Serialize};

/// A rule value as pushed by the ruleset collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleValue {
    Text(String),
    Flag(bool),
    Integer(i64),
}

impl From<&str> for RuleValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for RuleValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for RuleValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Extract the rule name from `key` if it addresses the given clock,
/// i.e. the key is exactly `Clock.<clock_id>.<RuleName>`.
pub(crate) fn rule_for<'a>(key: &'a str, clock_id: &str) -> Option<&'a str> {
    key.strip_prefix("Clock.")?
        .strip_prefix(clock_id)?
        .strip_prefix('.')
}
