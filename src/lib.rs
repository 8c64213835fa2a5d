//! # dynamo-blueprint
//!
//! Schema extraction and expression compilation for partitioned key-value
//! tables.
//!
//! This crate turns a record description into a table schema (hash and range
//! keys, secondary indexes, attribute types) and compiles caller conditions
//! into the request fragments a store client sends: key maps, key-condition
//! strings, `SET` update clauses and their placeholder maps. It performs no
//! I/O; executing requests is left to whichever client you use.
//!
//! ## Features
//!
//! - **Declarative Field Annotations**: `hash`, `range`, `type:<kind>`,
//!   `gsi:<name>`, `lsi:<name>` and `keyPairs:<hash>=<range>` per field
//! - **Index Assembly**: one definition per index name, with the store's limits
//!   of 20 global and 5 local indexes enforced
//! - **Key Conditions**: equality, ordering, prefix and between on the sort key
//! - **Updates and Puts**: typed attribute values inferred from record data
//! - **Table Definitions**: create-table descriptions with billing and class settings
//!
//! ## Quick Start
//!
//! ```rust
//! use dynamo_blueprint::{
//!     Condition, ExpressionBuilder, FieldDescriptor, RecordDescriptor, ScalarKind,
//!     SchemaExtractor, SortKeyCondition, TableConfig, TableDefinition,
//! };
//!
//! # fn main() -> dynamo_blueprint::Result<()> {
//! let course = RecordDescriptor::new("Course")
//!     .field(FieldDescriptor::new("PK").scalar(ScalarKind::Number).hash())
//!     .field(FieldDescriptor::new("SK").scalar(ScalarKind::String).range())
//!     .tagged_field("Owner", "type:string;gsi:CourseOwnerIndex;keyPairs:Owner=SK");
//!
//! let schema = SchemaExtractor::new().extract_descriptor(&course)?;
//!
//! // Create-table description
//! let config = TableConfig::builder("courses").build();
//! let definition = TableDefinition::from_schema(&schema, &config)?;
//! assert_eq!(definition.global_secondary_indexes.len(), 1);
//!
//! // Query an index
//! let query = ExpressionBuilder::new(&schema)
//!     .with_index("CourseOwnerIndex")
//!     .where_key(Condition::new("Owner", "alice"))
//!     .and_where(SortKeyCondition::between("SK", "2024-01", "2024-12"))
//!     .build_query()?;
//! assert_eq!(
//!     query.key_condition_expression.as_deref(),
//!     Some("Owner = :key and SK BETWEEN :start AND :end")
//! );
//!
//! // Update one item
//! let update = ExpressionBuilder::new(&schema)
//!     .where_key(Condition::new("PK", 1))
//!     .and_where(SortKeyCondition::equal("SK", "META"))
//!     .update(vec![Condition::new("Title", "Intro to Rust")])
//!     .build_update()?;
//! assert_eq!(update.update_expression.as_deref(), Some("SET #Title = :Title"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Validation
//!
//! Extraction is strict by default: two fields claiming the same key role and
//! unknown `type:` values are errors. [`ExtractOptions::lenient`] restores the
//! permissive behavior (last field wins, unknown types become strings) and
//! logs a warning for each fallback.
//!
//! ## Logging
//!
//! Diagnostics are emitted with `tracing`. The crate never installs a
//! subscriber.

pub mod annotation;
pub mod attribute;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod expression;
pub mod resolver;
pub mod schema;
pub mod table;
pub mod types;

// Re-export main types for convenience
pub use attribute::{AttributeValue, Item};
pub use config::{
    ExtractOptions, KeyConflictPolicy, TableConfig, TableConfigBuilder, UnknownTypePolicy,
};
pub use descriptor::{FieldDescriptor, Record, RecordDescriptor};
pub use error::{BlueprintError, Result};
pub use expression::{
    CompiledExpression, Condition, ExpressionBuilder, ExpressionCompiler, RangeOperator,
    SortKeyCondition, for_get, for_put, for_query, for_update, key_map,
};
pub use resolver::{AttributeResolver, Encoder};
pub use schema::{Schema, SchemaExtractor, SchemaProvider, extract, extract_with};
pub use table::{Table, TableDefinition};
pub use types::{
    BillingMode, IndexKind, KeyType, ProjectionType, ProvisionedThroughput, ScalarAttributeType,
    ScalarKind, SecondaryIndex, TableClass,
};
