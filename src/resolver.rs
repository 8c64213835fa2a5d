//! Runtime attribute type resolution
//!
//! Maps a dynamic value to one of the store's attribute categories and encodes
//! it as an [`AttributeValue`]. Rules, in priority order:
//!
//! 1. numbers become `N`, rendered as their decimal string
//! 2. booleans become `BOOL`
//! 3. arrays whose elements are all strings become `SS`
//! 4. everything else becomes `S` using the value's default string rendering
//!
//! Rule 3 also matches an empty array, which encodes as an empty `SS`. The
//! store rejects empty sets, so puts leave empty arrays out.
//!
//! Rule 4 never fails. A value that should have been a number but arrives as
//! text is silently stored as a string, so callers that care should declare
//! field types on the schema and check them against [`resolve`].

use serde_json::Value;

use crate::attribute::AttributeValue;
use crate::error::{BlueprintError, Result};
use crate::types::ScalarKind;

/// Capability for turning dynamic values into attribute values
pub trait Encoder {
    /// Attribute category the value will be encoded as
    fn resolve(&self, value: &Value) -> ScalarKind;

    /// Encode the value
    fn encode(&self, value: &Value) -> AttributeValue;

    /// Encode a value bound to `field`, rejecting nulls
    fn encode_required(&self, field: &str, value: &Value) -> Result<AttributeValue> {
        if value.is_null() {
            return Err(BlueprintError::NilValue(field.to_string()));
        }
        Ok(self.encode(value))
    }
}

/// Default [`Encoder`] implementing the resolution rules above
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeResolver;

impl Encoder for AttributeResolver {
    fn resolve(&self, value: &Value) -> ScalarKind {
        resolve(value)
    }

    fn encode(&self, value: &Value) -> AttributeValue {
        encode(value)
    }
}

/// Resolve the attribute category of a value
pub fn resolve(value: &Value) -> ScalarKind {
    match value {
        Value::Number(_) => ScalarKind::Number,
        Value::Bool(_) => ScalarKind::Boolean,
        Value::Array(items) if is_string_array(items) => ScalarKind::StringSet,
        _ => ScalarKind::String,
    }
}

/// Encode a value according to its resolved category
pub fn encode(value: &Value) -> AttributeValue {
    match value {
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Array(items) if is_string_array(items) => AttributeValue::Ss(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        ),
        other => AttributeValue::S(value_to_string(other)),
    }
}

fn is_string_array(items: &[Value]) -> bool {
    items.iter().all(Value::is_string)
}

/// Default string rendering used by the string fallback
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => value.to_string(),
    }
}
