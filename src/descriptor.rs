//! Record descriptions
//!
//! A [`RecordDescriptor`] lists a record type's fields in declaration order,
//! each with its annotation string. Fields can be described with a raw tag
//! string or with the typed builder methods, which produce the same tokens:
//!
//! ```
//! use dynamo_blueprint::{FieldDescriptor, RecordDescriptor, ScalarKind};
//!
//! let course = RecordDescriptor::new("Course")
//!     .field(FieldDescriptor::tagged("PK", "type:number;hash"))
//!     .field(FieldDescriptor::new("SK").scalar(ScalarKind::String).range())
//!     .field(
//!         FieldDescriptor::new("Owner")
//!             .scalar(ScalarKind::String)
//!             .global_index("CourseOwnerIndex")
//!             .key_pair("PK", "Owner"),
//!     );
//!
//! assert_eq!(course.fields().len(), 3);
//! assert_eq!(course.fields()[1].tags(), "type:string;range");
//! ```

use crate::annotation::{Annotation, parse_annotations};
use crate::error::Result;
use crate::types::ScalarKind;

/// A record type that can describe its own fields
pub trait Record {
    /// Field layout of the record type
    fn descriptor() -> RecordDescriptor;
}

/// One field of a record and its annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    tags: String,
}

impl FieldDescriptor {
    /// Create a field with no annotations
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: String::new(),
        }
    }

    /// Create a field from a raw annotation string, e.g. `"type:string;range"`
    pub fn tagged(name: impl Into<String>, tags: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: tags.into(),
        }
    }

    /// Mark as the table's hash key
    pub fn hash(self) -> Self {
        self.push("hash")
    }

    /// Mark as the table's range key
    pub fn range(self) -> Self {
        self.push("range")
    }

    /// Declare the attribute type
    pub fn scalar(self, kind: ScalarKind) -> Self {
        self.push(&format!("type:{}", kind.tag_name()))
    }

    /// Attach to a global secondary index
    pub fn global_index(self, index_name: &str) -> Self {
        self.push(&format!("gsi:{}", index_name))
    }

    /// Attach to a local secondary index
    pub fn local_index(self, index_name: &str) -> Self {
        self.push(&format!("lsi:{}", index_name))
    }

    /// Set the hash/range key pair of the index named on this field
    pub fn key_pair(self, hash_field: &str, range_field: &str) -> Self {
        self.push(&format!("keyPairs:{}={}", hash_field, range_field))
    }

    /// Set a hash-only key pair of the index named on this field
    pub fn hash_only_key_pair(self, hash_field: &str) -> Self {
        self.push(&format!("keyPairs:{}", hash_field))
    }

    fn push(mut self, token: &str) -> Self {
        if !self.tags.is_empty() {
            self.tags.push(';');
        }
        self.tags.push_str(token);
        self
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw annotation string
    pub fn tags(&self) -> &str {
        &self.tags
    }

    /// Whether the field carries any annotation
    pub fn is_annotated(&self) -> bool {
        !self.tags.trim().is_empty()
    }

    /// Parse the field's annotations
    pub fn annotations(&self) -> Result<Vec<Annotation>> {
        parse_annotations(&self.name, &self.tags)
    }
}

/// Field layout of a record type, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    /// Create an empty descriptor
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a field described by a raw annotation string
    pub fn tagged_field(self, name: impl Into<String>, tags: impl Into<String>) -> Self {
        self.field(FieldDescriptor::tagged(name, tags))
    }

    /// Record name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}
