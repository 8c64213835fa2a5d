//! Expression compilation
//!
//! Turns a [`Schema`](crate::schema::Schema) plus caller conditions into the
//! fragments a store client sends: key maps, key-condition strings, `SET`
//! update clauses and their `#name` / `:value` placeholder maps.
//!
//! | Sort key operator | Rendered as |
//! |---|---|
//! | equal / ordering | `SK = :sortVal`, `SK < :sortVal`, ... |
//! | prefix | `begins_with(SK, :sortVal)` |
//! | between | `SK BETWEEN :start AND :end` |
//!
//! The hash key is always rendered as `PK = :key`.

mod builder;
mod compiler;
mod condition;

pub use builder::ExpressionBuilder;
pub use compiler::{
    CompiledExpression, ExpressionCompiler, for_get, for_put, for_query, for_update, key_map,
};
pub use condition::{
    Condition, END_PLACEHOLDER, KEY_PLACEHOLDER, RangeOperator, SORT_PLACEHOLDER,
    START_PLACEHOLDER, SortKeyCondition,
};
