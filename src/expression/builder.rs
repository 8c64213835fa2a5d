//! Chained expression builder
//!
//! Collects the pieces of one logical operation and compiles them on demand.
//! A builder belongs to a single request; create a new one per operation.

use std::collections::HashMap;

use serde::Serialize;

use crate::attribute::{AttributeValue, Item};
use crate::error::{BlueprintError, Result};
use crate::resolver::{AttributeResolver, Encoder};
use crate::schema::{Schema, SchemaProvider};

use super::compiler::{CompiledExpression, ExpressionCompiler};
use super::condition::{Condition, RangeOperator, SortKeyCondition};

/// Builder for get, query, put and update fragments
///
/// # Example
/// ```
/// use dynamo_blueprint::{
///     Condition, ExpressionBuilder, RecordDescriptor, SchemaExtractor, SortKeyCondition,
/// };
///
/// let record = RecordDescriptor::new("Course")
///     .tagged_field("PK", "type:string;hash")
///     .tagged_field("SK", "type:string;range");
/// let schema = SchemaExtractor::new().extract_descriptor(&record).unwrap();
///
/// let query = ExpressionBuilder::new(&schema)
///     .where_key(Condition::new("PK", "COURSE#1"))
///     .and_where(SortKeyCondition::begins_with("SK", "LESSON#"))
///     .build_query()
///     .unwrap();
///
/// assert_eq!(
///     query.key_condition_expression.as_deref(),
///     Some("PK = :key and begins_with(SK, :sortVal)")
/// );
/// ```
#[derive(Debug)]
pub struct ExpressionBuilder<'a, E: Encoder = AttributeResolver> {
    schema: &'a Schema,
    compiler: ExpressionCompiler<E>,
    index_name: Option<String>,
    key: Option<Condition>,
    sort_key: Option<SortKeyCondition>,
    assignments: Vec<Condition>,
    item: Option<Item>,
}

impl<'a> ExpressionBuilder<'a> {
    pub fn new<P>(provider: &'a P) -> Self
    where
        P: SchemaProvider + ?Sized,
    {
        Self::with_encoder(provider, AttributeResolver)
    }
}

impl<'a, E: Encoder> ExpressionBuilder<'a, E> {
    pub fn with_encoder<P>(provider: &'a P, encoder: E) -> Self
    where
        P: SchemaProvider + ?Sized,
    {
        Self {
            schema: provider.schema(),
            compiler: ExpressionCompiler::with_encoder(encoder),
            index_name: None,
            key: None,
            sort_key: None,
            assignments: Vec::new(),
            item: None,
        }
    }

    /// Set the hash key condition
    pub fn where_key(mut self, condition: Condition) -> Self {
        self.key = Some(condition);
        self
    }

    /// Set the sort key condition
    pub fn and_where(mut self, condition: SortKeyCondition) -> Self {
        self.sort_key = Some(condition);
        self
    }

    /// Query a secondary index instead of the table
    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Fields to assign in an update
    pub fn update(mut self, assignments: Vec<Condition>) -> Self {
        self.assignments = assignments;
        self
    }

    /// Record to write with a put
    ///
    /// Values of fields with a declared type must resolve to that type.
    pub fn item<T>(mut self, record: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        self.item = Some(self.compiler.for_typed_put(self.schema, record)?);
        Ok(self)
    }

    /// Key map of the conditions set so far
    pub fn key(&self) -> Result<Item> {
        self.compiler.key_map(self.key.as_ref(), self.sort_key.as_ref())
    }

    /// Key condition string of the query
    pub fn key_condition(&self) -> Result<String> {
        self.build_query()?
            .key_condition_expression
            .ok_or_else(|| BlueprintError::invalid_condition("query has no key condition"))
    }

    /// Compile a query
    pub fn build_query(&self) -> Result<CompiledExpression> {
        let key = self.require_key()?;
        self.compiler.for_query(
            self.schema,
            key,
            self.sort_key.as_ref(),
            self.index_name.as_deref(),
        )
    }

    /// Compile an update of the item identified by the key conditions
    ///
    /// Key attributes cannot be assigned.
    pub fn build_update(&self) -> Result<CompiledExpression> {
        let key_fields = [Some(self.schema.hash_key()), self.schema.range_key()];
        if let Some(assignment) = self
            .assignments
            .iter()
            .find(|a| key_fields.contains(&Some(a.name.as_str())))
        {
            return Err(BlueprintError::invalid_condition(format!(
                "key attribute '{}' cannot be updated",
                assignment.name
            )));
        }

        let mut compiled = self.compiler.for_update(&self.assignments)?;
        compiled.key = self.item_key()?;
        Ok(compiled)
    }

    /// Attribute map of the record set with [`item`](Self::item)
    pub fn build_put(&self) -> Result<Item> {
        self.item
            .clone()
            .ok_or_else(|| BlueprintError::invalid_item_shape("no record set for put"))
    }

    /// Value placeholders: the update's when assignments are set, else the query's
    pub fn values(&self) -> Result<HashMap<String, AttributeValue>> {
        let compiled = if self.assignments.is_empty() {
            self.build_query()?
        } else {
            self.compiler.for_update(&self.assignments)?
        };
        Ok(compiled.expression_attribute_values)
    }

    /// Name placeholders of the update
    pub fn names(&self) -> Result<HashMap<String, String>> {
        Ok(self.compiler.for_update(&self.assignments)?.expression_attribute_names)
    }

    fn require_key(&self) -> Result<&Condition> {
        self.key
            .as_ref()
            .ok_or_else(|| BlueprintError::invalid_condition("no hash key condition set"))
    }

    /// Primary key of exactly one item
    fn item_key(&self) -> Result<Item> {
        let key = self.require_key()?;
        if key.name != self.schema.hash_key() {
            return Err(BlueprintError::key_mismatch(self.schema.hash_key(), &key.name));
        }

        let range = match &self.sort_key {
            None => match self.schema.range_key() {
                Some(range_key) => {
                    return Err(BlueprintError::invalid_condition(format!(
                        "range key '{}' is required to identify an item",
                        range_key
                    )));
                }
                None => None,
            },
            Some(sort) if sort.operator == RangeOperator::Equal && sort.upper.is_none() => {
                let range_key = self
                    .schema
                    .range_key()
                    .ok_or(BlueprintError::MissingRangeKey)?;
                if sort.name != range_key {
                    return Err(BlueprintError::key_mismatch(range_key, &sort.name));
                }
                Some(&sort.value)
            }
            Some(sort) => {
                return Err(BlueprintError::invalid_condition(format!(
                    "'{}' must be matched by equality to identify an item",
                    sort.name
                )));
            }
        };

        self.compiler.for_get(self.schema, &key.value, range)
    }
}
