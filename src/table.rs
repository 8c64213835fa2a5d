//! Table definitions
//!
//! A [`TableDefinition`] is the create-table description of a schema: typed
//! attribute definitions for every key attribute, the primary key schema,
//! secondary index key schemas and the pass-through table settings from
//! [`TableConfig`]. It serializes with the store's request field names.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::TableConfig;
use crate::descriptor::Record;
use crate::error::{BlueprintError, Result};
use crate::expression::ExpressionBuilder;
use crate::schema::{Schema, SchemaExtractor, SchemaProvider};
use crate::types::{
    BillingMode, KeyType, ProjectionType, ProvisionedThroughput, ScalarAttributeType,
    SecondaryIndex, TableClass,
};

/// Name and type of a key attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: ScalarAttributeType,
}

/// One element of a key schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Projection {
    pub projection_type: ProjectionType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalSecondaryIndexDefinition {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Projection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<ProvisionedThroughput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalSecondaryIndexDefinition {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Projection,
}

/// Create-table description derived from a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDefinition {
    pub table_name: String,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeySchemaElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_secondary_indexes: Vec<GlobalSecondaryIndexDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_secondary_indexes: Vec<LocalSecondaryIndexDefinition>,
    pub billing_mode: BillingMode,
    pub table_class: TableClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<ProvisionedThroughput>,
}

impl TableDefinition {
    /// Build the definition of `provider`'s schema under `config`
    ///
    /// Every key attribute (table or index) needs a declared `type:`;
    /// otherwise this fails with `MissingAttributeType`.
    pub fn from_schema<P>(provider: &P, config: &TableConfig) -> Result<Self>
    where
        P: SchemaProvider + ?Sized,
    {
        let schema = provider.schema();
        let provisioned = config.billing_mode == BillingMode::Provisioned;
        let projection = Projection {
            projection_type: config.projection,
        };

        let global_secondary_indexes = schema
            .global_indexes()
            .iter()
            .map(|index| GlobalSecondaryIndexDefinition {
                index_name: index.name.clone(),
                key_schema: index_key_schema(index),
                projection: projection.clone(),
                provisioned_throughput: provisioned.then_some(index.throughput),
            })
            .collect();

        let local_secondary_indexes = schema
            .local_indexes()
            .iter()
            .map(|index| {
                if index.hash_field != schema.hash_key() {
                    return Err(BlueprintError::key_mismatch(
                        schema.hash_key(),
                        &index.hash_field,
                    ));
                }
                Ok(LocalSecondaryIndexDefinition {
                    index_name: index.name.clone(),
                    key_schema: index_key_schema(index),
                    projection: projection.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            table_name: config.table_name.clone(),
            attribute_definitions: attribute_definitions(schema)?,
            key_schema: key_schema(schema.hash_key(), schema.range_key()),
            global_secondary_indexes,
            local_secondary_indexes,
            billing_mode: config.billing_mode,
            table_class: config.table_class,
            provisioned_throughput: provisioned.then_some(config.throughput),
        })
    }
}

/// Attribute definitions for the table keys, then every index key, without
/// repeats
fn attribute_definitions(schema: &Schema) -> Result<Vec<AttributeDefinition>> {
    let index_keys = schema
        .global_indexes()
        .iter()
        .chain(schema.local_indexes())
        .flat_map(|index| {
            std::iter::once(index.hash_field.as_str()).chain(index.range_field.as_deref())
        });

    let mut definitions: Vec<AttributeDefinition> = Vec::new();

    for name in std::iter::once(schema.hash_key())
        .chain(schema.range_key())
        .chain(index_keys)
    {
        if definitions.iter().any(|def| def.attribute_name == name) {
            continue;
        }

        let kind = schema
            .field_type(name)
            .ok_or_else(|| BlueprintError::MissingAttributeType(name.to_string()))?;
        let attribute_type = kind.attribute_type();

        trace!(attribute = name, ?kind, ?attribute_type, "attribute definition");

        definitions.push(AttributeDefinition {
            attribute_name: name.to_string(),
            attribute_type,
        });
    }

    Ok(definitions)
}

fn key_schema(hash: &str, range: Option<&str>) -> Vec<KeySchemaElement> {
    let mut elements = vec![KeySchemaElement {
        attribute_name: hash.to_string(),
        key_type: KeyType::Hash,
    }];

    if let Some(range) = range {
        elements.push(KeySchemaElement {
            attribute_name: range.to_string(),
            key_type: KeyType::Range,
        });
    }

    elements
}

fn index_key_schema(index: &SecondaryIndex) -> Vec<KeySchemaElement> {
    key_schema(&index.hash_field, index.range_field.as_deref())
}

/// A named table and the schema of the records it stores
#[derive(Debug, Clone)]
pub struct Table {
    schema: Schema,
    config: TableConfig,
}

impl Table {
    pub fn new(schema: Schema, config: TableConfig) -> Self {
        Self { schema, config }
    }

    /// Extract the schema of `R` with strict options
    pub fn for_record<R: Record>(config: TableConfig) -> Result<Self> {
        Ok(Self::new(SchemaExtractor::new().extract::<R>()?, config))
    }

    pub fn name(&self) -> &str {
        &self.config.table_name
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Create-table description
    pub fn definition(&self) -> Result<TableDefinition> {
        TableDefinition::from_schema(&self.schema, &self.config)
    }

    /// Start an expression against this table
    pub fn expression(&self) -> ExpressionBuilder<'_> {
        ExpressionBuilder::new(self)
    }
}

impl SchemaProvider for Table {
    fn schema(&self) -> &Schema {
        &self.schema
    }
}
