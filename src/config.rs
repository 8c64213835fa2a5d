//! Configuration for schema extraction and table definitions
//!
//! [`ExtractOptions`] controls how strictly annotations are validated;
//! [`TableConfig`] carries the table-level settings passed through to a
//! [`TableDefinition`](crate::table::TableDefinition).

use crate::types::{BillingMode, ProjectionType, ProvisionedThroughput, TableClass};

/// What to do when two fields claim the same key role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyConflictPolicy {
    /// Fail extraction with `DuplicateKeyRole`
    #[default]
    Reject,
    /// Keep the last field in declaration order
    LastWins,
}

/// What to do with a `type:` annotation naming an unknown kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTypePolicy {
    /// Fail extraction with `UnknownAttributeType`
    #[default]
    Reject,
    /// Record the field as a string
    FallbackToString,
}

/// Options for [`SchemaExtractor`](crate::schema::SchemaExtractor)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractOptions {
    /// Duplicate `hash` / `range` handling
    pub key_conflicts: KeyConflictPolicy,
    /// Unknown `type:` handling
    pub unknown_types: UnknownTypePolicy,
    /// Capacity assigned to every secondary index (default: 1 read / 1 write)
    pub index_throughput: ProvisionedThroughput,
}

impl ExtractOptions {
    /// Strict defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that reproduce the lenient tag-mapper behavior:
    /// last duplicate key wins and unknown types fall back to string
    pub fn lenient() -> Self {
        Self::default()
            .key_conflicts(KeyConflictPolicy::LastWins)
            .unknown_types(UnknownTypePolicy::FallbackToString)
    }

    /// Set the duplicate key policy
    pub fn key_conflicts(mut self, policy: KeyConflictPolicy) -> Self {
        self.key_conflicts = policy;
        self
    }

    /// Set the unknown type policy
    pub fn unknown_types(mut self, policy: UnknownTypePolicy) -> Self {
        self.unknown_types = policy;
        self
    }

    /// Set the capacity assigned to secondary indexes
    pub fn index_throughput(mut self, read: i64, write: i64) -> Self {
        self.index_throughput = ProvisionedThroughput::new(read, write);
        self
    }
}

/// Table-level settings
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Physical table name
    pub table_name: String,
    /// Billing mode (default: provisioned)
    pub billing_mode: BillingMode,
    /// Table class (default: standard)
    pub table_class: TableClass,
    /// Table capacity when provisioned (default: 1 read / 1 write)
    pub throughput: ProvisionedThroughput,
    /// Projection of every secondary index (default: all attributes)
    pub projection: ProjectionType,
}

impl TableConfig {
    /// Create a new configuration builder
    pub fn builder(table_name: impl Into<String>) -> TableConfigBuilder {
        TableConfigBuilder::new(table_name)
    }
}

/// Builder for TableConfig
#[derive(Debug)]
pub struct TableConfigBuilder {
    table_name: String,
    billing_mode: BillingMode,
    table_class: TableClass,
    throughput: ProvisionedThroughput,
    projection: ProjectionType,
}

impl TableConfigBuilder {
    /// Create a new builder with the table name
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            billing_mode: BillingMode::default(),
            table_class: TableClass::default(),
            throughput: ProvisionedThroughput::default(),
            projection: ProjectionType::default(),
        }
    }

    /// Set the billing mode
    pub fn billing_mode(mut self, mode: BillingMode) -> Self {
        self.billing_mode = mode;
        self
    }

    /// Shorthand for on-demand billing
    pub fn pay_per_request(self) -> Self {
        self.billing_mode(BillingMode::PayPerRequest)
    }

    /// Set the table class
    pub fn table_class(mut self, class: TableClass) -> Self {
        self.table_class = class;
        self
    }

    /// Set the provisioned table capacity
    pub fn throughput(mut self, read: i64, write: i64) -> Self {
        self.throughput = ProvisionedThroughput::new(read, write);
        self
    }

    /// Set the projection used by secondary indexes
    pub fn projection(mut self, projection: ProjectionType) -> Self {
        self.projection = projection;
        self
    }

    /// Build the configuration
    pub fn build(self) -> TableConfig {
        TableConfig {
            table_name: self.table_name,
            billing_mode: self.billing_mode,
            table_class: self.table_class,
            throughput: self.throughput,
            projection: self.projection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // ExtractOptions Tests
    // =========================================================================

    #[test]
    fn test_extract_options_default_is_strict() {
        let options = ExtractOptions::default();
        assert_eq!(options.key_conflicts, KeyConflictPolicy::Reject);
        assert_eq!(options.unknown_types, UnknownTypePolicy::Reject);
        assert_eq!(options.index_throughput, ProvisionedThroughput::new(1, 1));
    }

    #[test]
    fn test_extract_options_lenient() {
        let options = ExtractOptions::lenient();
        assert_eq!(options.key_conflicts, KeyConflictPolicy::LastWins);
        assert_eq!(options.unknown_types, UnknownTypePolicy::FallbackToString);
    }

    #[test]
    fn test_extract_options_index_throughput() {
        let options = ExtractOptions::new().index_throughput(5, 3);
        assert_eq!(options.index_throughput.read_capacity_units, 5);
        assert_eq!(options.index_throughput.write_capacity_units, 3);
    }

    // =========================================================================
    // TableConfig Tests
    // =========================================================================

    #[test]
    fn test_default_table_config() {
        let config = TableConfig::builder("courses").build();

        assert_eq!(config.table_name, "courses");
        assert_eq!(config.billing_mode, BillingMode::Provisioned);
        assert_eq!(config.table_class, TableClass::Standard);
        assert_eq!(config.throughput, ProvisionedThroughput::new(1, 1));
        assert_eq!(config.projection, ProjectionType::All);
    }

    #[test]
    fn test_full_custom_table_config() {
        let config = TableConfig::builder(String::from("lessons"))
            .pay_per_request()
            .table_class(TableClass::StandardInfrequentAccess)
            .throughput(10, 4)
            .projection(ProjectionType::KeysOnly)
            .build();

        assert_eq!(config.table_name, "lessons");
        assert_eq!(config.billing_mode, BillingMode::PayPerRequest);
        assert_eq!(config.table_class, TableClass::StandardInfrequentAccess);
        assert_eq!(config.throughput, ProvisionedThroughput::new(10, 4));
        assert_eq!(config.projection, ProjectionType::KeysOnly);
    }

    #[test]
    fn test_builder_debug() {
        let builder = TableConfig::builder("courses");
        let debug_str = format!("{:?}", builder);
        assert!(debug_str.contains("TableConfigBuilder"));
    }
}
