//! Core type definitions
//!
//! Includes scalar kinds, key roles, secondary index definitions and the
//! provisioning/billing enums passed through to table definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum number of global secondary indexes per table
pub const MAX_GLOBAL_INDEXES: usize = 20;

/// Maximum number of local secondary indexes per table
pub const MAX_LOCAL_INDEXES: usize = 5;

// ============================================================================
// Scalar kinds
// ============================================================================

/// Attribute category a field or value is encoded as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarKind {
    /// Text (`S`)
    String,
    /// Decimal number, string-encoded on the wire (`N`)
    Number,
    /// Boolean (`BOOL`)
    Boolean,
    /// Set of strings (`SS`)
    StringSet,
    /// Raw bytes (`B`)
    Binary,
}

impl ScalarKind {
    /// Attribute type used when this kind appears in a key attribute definition.
    ///
    /// Only `S`, `N` and `B` are valid key types: booleans collapse to `S`,
    /// collections to `B`.
    pub fn attribute_type(&self) -> ScalarAttributeType {
        match self {
            ScalarKind::Number => ScalarAttributeType::N,
            ScalarKind::Binary | ScalarKind::StringSet => ScalarAttributeType::B,
            ScalarKind::String | ScalarKind::Boolean => ScalarAttributeType::S,
        }
    }

    /// Name used in `type:<kind>` annotations
    pub fn tag_name(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Number => "number",
            ScalarKind::Boolean => "boolean",
            ScalarKind::StringSet => "stringset",
            ScalarKind::Binary => "binary",
        }
    }

    /// Wire type descriptor (`S`, `N`, `BOOL`, `SS`, `B`)
    pub fn descriptor(&self) -> &'static str {
        match self {
            ScalarKind::String => "S",
            ScalarKind::Number => "N",
            ScalarKind::Boolean => "BOOL",
            ScalarKind::StringSet => "SS",
            ScalarKind::Binary => "B",
        }
    }
}

impl FromStr for ScalarKind {
    type Err = String;

    /// Parse the value of a `type:<kind>` annotation
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "s" => Ok(ScalarKind::String),
            "number" | "n" => Ok(ScalarKind::Number),
            "binary" | "b" => Ok(ScalarKind::Binary),
            "boolean" | "bool" => Ok(ScalarKind::Boolean),
            "stringset" | "ss" => Ok(ScalarKind::StringSet),
            other => Err(format!("unknown scalar kind '{}'", other)),
        }
    }
}

/// Key attribute type in a table's attribute definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarAttributeType {
    S,
    N,
    B,
}

// ============================================================================
// Keys and indexes
// ============================================================================

/// Role of a field in a key schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    Hash,
    Range,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Hash => write!(f, "hash"),
            KeyType::Range => write!(f, "range"),
        }
    }
}

/// Category of a secondary index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Global,
    Local,
}

impl IndexKind {
    /// Hard limit on the number of indexes of this kind
    pub fn limit(&self) -> usize {
        match self {
            IndexKind::Global => MAX_GLOBAL_INDEXES,
            IndexKind::Local => MAX_LOCAL_INDEXES,
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Global => write!(f, "global"),
            IndexKind::Local => write!(f, "local"),
        }
    }
}

/// Provisioned read/write capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

impl ProvisionedThroughput {
    pub fn new(read_capacity_units: i64, write_capacity_units: i64) -> Self {
        Self {
            read_capacity_units,
            write_capacity_units,
        }
    }
}

impl Default for ProvisionedThroughput {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Secondary index definition (global or local)
///
/// One instance exists per distinct index name declared on a record.
/// `hash_field` and `range_field` name the index's key attributes, which need
/// not be the field that carries the index annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryIndex {
    /// Index name
    pub name: String,
    /// Partition key attribute of the index
    pub hash_field: String,
    /// Optional sort key attribute of the index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_field: Option<String>,
    /// Provisioned capacity
    pub throughput: ProvisionedThroughput,
}

impl SecondaryIndex {
    /// Create an index with no key pair yet
    pub fn new(name: impl Into<String>, throughput: ProvisionedThroughput) -> Self {
        Self {
            name: name.into(),
            hash_field: String::new(),
            range_field: None,
            throughput,
        }
    }

    /// Set the hash/range key pair
    pub fn with_key_pair(
        mut self,
        hash_field: impl Into<String>,
        range_field: Option<String>,
    ) -> Self {
        self.hash_field = hash_field.into();
        self.range_field = range_field;
        self
    }

    /// An index is usable only when both its name and hash field are set
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.hash_field.is_empty()
    }
}

// ============================================================================
// Table-level pass-through settings
// ============================================================================

/// Billing mode of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingMode {
    #[default]
    Provisioned,
    PayPerRequest,
}

/// Storage class of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableClass {
    #[default]
    Standard,
    StandardInfrequentAccess,
}

/// Attributes copied into a secondary index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionType {
    #[default]
    All,
    KeysOnly,
}
