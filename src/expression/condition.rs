//! Key and sort-key conditions

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BlueprintError, Result};

/// Placeholder bound to the hash key value
pub const KEY_PLACEHOLDER: &str = ":key";
/// Placeholder bound to a single sort key value
pub const SORT_PLACEHOLDER: &str = ":sortVal";
/// Placeholder bound to the lower bound of a `BETWEEN`
pub const START_PLACEHOLDER: &str = ":start";
/// Placeholder bound to the upper bound of a `BETWEEN`
pub const END_PLACEHOLDER: &str = ":end";

/// "Field `name` takes `value`"
///
/// Used for the hash key of a query or lookup and for each assignment of an
/// update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    pub value: Value,
}

impl Condition {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Comparison applied to a sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RangeOperator {
    Equal,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Between,
    StartsWith,
}

impl RangeOperator {
    /// Infix symbol for the comparison operators
    fn symbol(&self) -> Option<&'static str> {
        match self {
            RangeOperator::Equal => Some("="),
            RangeOperator::LessThan => Some("<"),
            RangeOperator::LessThanOrEqual => Some("<="),
            RangeOperator::GreaterThan => Some(">"),
            RangeOperator::GreaterThanOrEqual => Some(">="),
            RangeOperator::Between | RangeOperator::StartsWith => None,
        }
    }
}

/// Condition on a sort key
///
/// `value` holds the operand, or the lower bound for `Between`; `upper` holds
/// the upper bound of a `Between` and is empty for every other operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortKeyCondition {
    pub name: String,
    pub operator: RangeOperator,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<Value>,
}

impl SortKeyCondition {
    fn single(name: impl Into<String>, operator: RangeOperator, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            operator,
            value: value.into(),
            upper: None,
        }
    }

    pub fn equal(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::single(name, RangeOperator::Equal, value)
    }

    pub fn less_than(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::single(name, RangeOperator::LessThan, value)
    }

    pub fn less_than_or_equal(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::single(name, RangeOperator::LessThanOrEqual, value)
    }

    pub fn greater_than(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::single(name, RangeOperator::GreaterThan, value)
    }

    pub fn greater_than_or_equal(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::single(name, RangeOperator::GreaterThanOrEqual, value)
    }

    /// Prefix match, rendered as `begins_with(field, :sortVal)`
    pub fn begins_with(name: impl Into<String>, prefix: impl Into<Value>) -> Self {
        Self::single(name, RangeOperator::StartsWith, prefix)
    }

    /// Inclusive range, rendered as `field BETWEEN :start AND :end`
    pub fn between(
        name: impl Into<String>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            operator: RangeOperator::Between,
            value: start.into(),
            upper: Some(end.into()),
        }
    }

    /// Whether the condition binds a single `:sortVal`
    pub fn is_simple(&self) -> bool {
        self.operator != RangeOperator::Between
    }

    /// Check operand shape against the operator
    pub fn validate(&self) -> Result<()> {
        match (self.operator, &self.upper) {
            (RangeOperator::Between, None) => Err(BlueprintError::invalid_condition(format!(
                "BETWEEN on '{}' requires an upper bound",
                self.name
            ))),
            (RangeOperator::Between, Some(_)) => Ok(()),
            (_, Some(_)) => Err(BlueprintError::invalid_condition(format!(
                "Only BETWEEN on '{}' takes an upper bound",
                self.name
            ))),
            (RangeOperator::StartsWith, None) if !self.value.is_string() => {
                Err(BlueprintError::invalid_condition(format!(
                    "begins_with on '{}' requires a string prefix",
                    self.name
                )))
            }
            (_, None) => Ok(()),
        }
    }

    /// Range part of a key condition
    pub fn expression(&self) -> String {
        match self.operator.symbol() {
            Some(symbol) => format!("{} {} {}", self.name, symbol, SORT_PLACEHOLDER),
            None if self.operator == RangeOperator::StartsWith => {
                format!("begins_with({}, {})", self.name, SORT_PLACEHOLDER)
            }
            None => format!(
                "{} BETWEEN {} AND {}",
                self.name, START_PLACEHOLDER, END_PLACEHOLDER
            ),
        }
    }
}
