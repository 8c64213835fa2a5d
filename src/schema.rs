//! Table schemas and their extraction from record descriptors
//!
//! [`SchemaExtractor`] walks a record's fields in declaration order and runs
//! three passes over each field's annotations:
//!
//! 1. keys: `hash` / `range` set the table's primary key fields
//! 2. indexes: `gsi:` / `lsi:` open (or revisit) one index per name, and a
//!    `keyPairs:` on the same field sets that index's hash/range fields
//! 3. types: `type:` records the declared attribute type of the field
//!
//! Once every field is processed, indexes without a name or hash field are
//! dropped and the per-kind limits (20 global, 5 local) are enforced.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::annotation::{Annotation, validate_identifier};
use crate::config::{ExtractOptions, KeyConflictPolicy, UnknownTypePolicy};
use crate::descriptor::{Record, RecordDescriptor};
use crate::error::{BlueprintError, Result};
use crate::types::{IndexKind, KeyType, ScalarKind, SecondaryIndex};

/// Key layout and attribute types of a table
///
/// Built once per record type and read-only afterwards; share it freely
/// between threads.
///
/// Deserialized schemas are held to the same rules as extracted ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SchemaParts")]
pub struct Schema {
    hash_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    range_key: Option<String>,
    global_indexes: Vec<SecondaryIndex>,
    local_indexes: Vec<SecondaryIndex>,
    field_types: BTreeMap<String, ScalarKind>,
}

impl Schema {
    /// Hash (partition) key field
    pub fn hash_key(&self) -> &str {
        &self.hash_key
    }

    /// Range (sort) key field, if the table has one
    pub fn range_key(&self) -> Option<&str> {
        self.range_key.as_deref()
    }

    /// Global secondary indexes in first-declared order
    pub fn global_indexes(&self) -> &[SecondaryIndex] {
        &self.global_indexes
    }

    /// Local secondary indexes in first-declared order
    pub fn local_indexes(&self) -> &[SecondaryIndex] {
        &self.local_indexes
    }

    /// Declared attribute types by field
    pub fn field_types(&self) -> &BTreeMap<String, ScalarKind> {
        &self.field_types
    }

    /// Declared attribute type of one field
    pub fn field_type(&self, field: &str) -> Option<ScalarKind> {
        self.field_types.get(field).copied()
    }

    /// Look up a secondary index of either kind by name
    pub fn index(&self, name: &str) -> Option<(IndexKind, &SecondaryIndex)> {
        self.global_indexes
            .iter()
            .find(|idx| idx.name == name)
            .map(|idx| (IndexKind::Global, idx))
            .or_else(|| {
                self.local_indexes
                    .iter()
                    .find(|idx| idx.name == name)
                    .map(|idx| (IndexKind::Local, idx))
            })
    }

    /// Hash and range fields queried through `index_name`, or the table's
    /// primary key when no index is given
    pub fn key_fields(&self, index_name: Option<&str>) -> Result<(&str, Option<&str>)> {
        match index_name {
            None => Ok((self.hash_key(), self.range_key())),
            Some(name) => {
                let (_, index) = self
                    .index(name)
                    .ok_or_else(|| BlueprintError::UnknownIndex(name.to_string()))?;
                Ok((index.hash_field.as_str(), index.range_field.as_deref()))
            }
        }
    }
}

/// Unchecked wire form of a [`Schema`]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaParts {
    hash_key: String,
    #[serde(default)]
    range_key: Option<String>,
    #[serde(default)]
    global_indexes: Vec<SecondaryIndex>,
    #[serde(default)]
    local_indexes: Vec<SecondaryIndex>,
    #[serde(default)]
    field_types: BTreeMap<String, ScalarKind>,
}

impl TryFrom<SchemaParts> for Schema {
    type Error = BlueprintError;

    fn try_from(parts: SchemaParts) -> Result<Self> {
        finalize(
            "schema",
            Extraction {
                hash_key: Some(parts.hash_key).filter(|key| !key.is_empty()),
                range_key: parts.range_key.filter(|key| !key.is_empty()),
                global_indexes: parts.global_indexes,
                local_indexes: parts.local_indexes,
                field_types: parts.field_types,
            },
        )
    }
}

/// Anything that exposes a table schema
pub trait SchemaProvider {
    fn schema(&self) -> &Schema;
}

impl SchemaProvider for Schema {
    fn schema(&self) -> &Schema {
        self
    }
}

/// Extract a schema from a record type with strict options
pub fn extract<R: Record>() -> Result<Schema> {
    SchemaExtractor::new().extract::<R>()
}

/// Extract a schema from a record type with custom options
pub fn extract_with<R: Record>(options: ExtractOptions) -> Result<Schema> {
    SchemaExtractor::with_options(options).extract::<R>()
}

/// Builds [`Schema`] values from record descriptors
#[derive(Debug, Clone, Default)]
pub struct SchemaExtractor {
    options: ExtractOptions,
}

/// Mutable state of one extraction run
#[derive(Default)]
struct Extraction {
    hash_key: Option<String>,
    range_key: Option<String>,
    global_indexes: Vec<SecondaryIndex>,
    local_indexes: Vec<SecondaryIndex>,
    field_types: BTreeMap<String, ScalarKind>,
}

impl SchemaExtractor {
    /// Extractor with strict defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor with custom options
    pub fn with_options(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract the schema of a record type
    pub fn extract<R: Record>(&self) -> Result<Schema> {
        self.extract_descriptor(&R::descriptor())
    }

    /// Extract the schema described by `record`
    pub fn extract_descriptor(&self, record: &RecordDescriptor) -> Result<Schema> {
        let started = Instant::now();
        let mut state = Extraction::default();

        for field in record.fields().iter().filter(|f| f.is_annotated()) {
            validate_identifier(field.name())?;
            let annotations = field.annotations()?;

            self.extract_keys(&mut state, field.name(), &annotations)?;
            self.extract_indexes(&mut state, &annotations);
            self.extract_types(&mut state, field.name(), &annotations)?;
        }

        let schema = finalize(record.name(), state)?;

        debug!(
            record = record.name(),
            fields = record.fields().len(),
            global_indexes = schema.global_indexes.len(),
            local_indexes = schema.local_indexes.len(),
            elapsed = ?started.elapsed(),
            "schema extracted"
        );

        Ok(schema)
    }

    fn extract_keys(
        &self,
        state: &mut Extraction,
        field: &str,
        annotations: &[Annotation],
    ) -> Result<()> {
        for annotation in annotations {
            let (role, slot) = match annotation {
                Annotation::Hash => (KeyType::Hash, &mut state.hash_key),
                Annotation::Range => (KeyType::Range, &mut state.range_key),
                _ => continue,
            };

            if let Some(existing) = slot.as_deref() {
                if existing != field {
                    match self.options.key_conflicts {
                        KeyConflictPolicy::Reject => {
                            return Err(BlueprintError::DuplicateKeyRole {
                                role,
                                first: existing.to_string(),
                                second: field.to_string(),
                            });
                        }
                        KeyConflictPolicy::LastWins => {
                            warn!(%role, previous = existing, field, "key role overwritten");
                        }
                    }
                }
            }

            *slot = Some(field.to_string());
        }

        Ok(())
    }

    fn extract_indexes(&self, state: &mut Extraction, annotations: &[Annotation]) {
        let key_pair = annotations.iter().rev().find_map(|annotation| match annotation {
            Annotation::KeyPair { hash, range } => Some((hash.as_str(), range.clone())),
            _ => None,
        });

        for annotation in annotations {
            let (indexes, name) = match annotation {
                Annotation::GlobalIndex(name) => (&mut state.global_indexes, name),
                Annotation::LocalIndex(name) => (&mut state.local_indexes, name),
                _ => continue,
            };

            let position = match indexes.iter().position(|idx| &idx.name == name) {
                Some(position) => position,
                None => {
                    indexes.push(SecondaryIndex::new(name.as_str(), self.options.index_throughput));
                    indexes.len() - 1
                }
            };

            if let Some((hash, range)) = &key_pair {
                let index = &mut indexes[position];
                index.hash_field = hash.to_string();
                index.range_field = range.clone();
            }
        }
    }

    fn extract_types(
        &self,
        state: &mut Extraction,
        field: &str,
        annotations: &[Annotation],
    ) -> Result<()> {
        for annotation in annotations {
            let Annotation::Type(kind) = annotation else {
                continue;
            };

            let scalar = match kind.parse::<ScalarKind>() {
                Ok(scalar) => scalar,
                Err(_) => match self.options.unknown_types {
                    UnknownTypePolicy::Reject => {
                        return Err(BlueprintError::UnknownAttributeType {
                            field: field.to_string(),
                            kind: kind.clone(),
                        });
                    }
                    UnknownTypePolicy::FallbackToString => {
                        warn!(field, kind = kind.as_str(), "unknown attribute type, using string");
                        ScalarKind::String
                    }
                },
            };

            state.field_types.insert(field.to_string(), scalar);
        }

        Ok(())
    }
}

fn finalize(record: &str, state: Extraction) -> Result<Schema> {
    let global_indexes = complete_indexes(state.global_indexes, IndexKind::Global)?;
    let local_indexes = complete_indexes(state.local_indexes, IndexKind::Local)?;

    let hash_key = state
        .hash_key
        .ok_or_else(|| BlueprintError::MissingHashKey(record.to_string()))?;

    Ok(Schema {
        hash_key,
        range_key: state.range_key,
        global_indexes,
        local_indexes,
        field_types: state.field_types,
    })
}

/// Drop partially specified indexes and enforce the per-kind limit
fn complete_indexes(
    indexes: Vec<SecondaryIndex>,
    kind: IndexKind,
) -> Result<Vec<SecondaryIndex>> {
    let complete: Vec<SecondaryIndex> = indexes
        .into_iter()
        .filter(SecondaryIndex::is_complete)
        .collect();

    if complete.len() > kind.limit() {
        return Err(BlueprintError::TooManyIndexes {
            kind,
            limit: kind.limit(),
        });
    }

    Ok(complete)
}
