//! Compilation of conditions into request fragments
//!
//! Every function here is a pure transformation of a schema and the caller's
//! conditions. Nothing is cached between calls; compile once per request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::annotation::is_placeholder_safe;
use crate::attribute::{AttributeValue, Item};
use crate::error::{BlueprintError, Result};
use crate::resolver::{AttributeResolver, Encoder};
use crate::schema::SchemaProvider;
use crate::types::ScalarKind;

use super::condition::{
    Condition, END_PLACEHOLDER, KEY_PLACEHOLDER, SORT_PLACEHOLDER, START_PLACEHOLDER,
    SortKeyCondition,
};

/// Request fragments for a single get, query or update
///
/// Field names follow the store's request parameters, so the value can be
/// serialized straight into a request body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompiledExpression {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub key: Item,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_condition_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_expression: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_values: HashMap<String, AttributeValue>,
}

/// Compiles conditions with a pluggable [`Encoder`]
#[derive(Debug, Clone, Default)]
pub struct ExpressionCompiler<E: Encoder = AttributeResolver> {
    encoder: E,
}

impl ExpressionCompiler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: Encoder> ExpressionCompiler<E> {
    pub fn with_encoder(encoder: E) -> Self {
        Self { encoder }
    }

    /// Primary key of a single item
    pub fn for_get<P>(&self, provider: &P, hash: &Value, range: Option<&Value>) -> Result<Item>
    where
        P: SchemaProvider + ?Sized,
    {
        let schema = provider.schema();
        let mut key = Item::new();

        key.insert(
            schema.hash_key().to_string(),
            self.encoder.encode_required(schema.hash_key(), hash)?,
        );

        if let Some(range) = range {
            let range_key = schema.range_key().ok_or(BlueprintError::MissingRangeKey)?;
            key.insert(
                range_key.to_string(),
                self.encoder.encode_required(range_key, range)?,
            );
        }

        Ok(key)
    }

    /// Key condition over the table, or over `index_name` when given
    pub fn for_query<P>(
        &self,
        provider: &P,
        key: &Condition,
        sort: Option<&SortKeyCondition>,
        index_name: Option<&str>,
    ) -> Result<CompiledExpression>
    where
        P: SchemaProvider + ?Sized,
    {
        let index_name = index_name.filter(|name| !name.is_empty());
        let (hash_field, range_field) = provider.schema().key_fields(index_name)?;

        if key.name != hash_field {
            return Err(BlueprintError::key_mismatch(hash_field, &key.name));
        }

        let mut compiled = CompiledExpression {
            index_name: index_name.map(str::to_string),
            ..Default::default()
        };

        let key_value = self.encoder.encode_required(&key.name, &key.value)?;
        compiled.key.insert(key.name.clone(), key_value.clone());
        compiled
            .expression_attribute_values
            .insert(KEY_PLACEHOLDER.to_string(), key_value);

        let mut condition = format!("{} = {}", key.name, KEY_PLACEHOLDER);

        if let Some(sort) = sort {
            sort.validate()?;
            let range_field = range_field.ok_or(BlueprintError::MissingRangeKey)?;
            if sort.name != range_field {
                return Err(BlueprintError::key_mismatch(range_field, &sort.name));
            }

            condition = format!("{} and {}", condition, sort.expression());
            self.bind_sort_key(sort, &mut compiled)?;
        }

        trace!(
            index = compiled.index_name.as_deref(),
            condition = condition.as_str(),
            "compiled key condition"
        );

        compiled.key_condition_expression = Some(condition);
        Ok(compiled)
    }

    fn bind_sort_key(
        &self,
        sort: &SortKeyCondition,
        compiled: &mut CompiledExpression,
    ) -> Result<()> {
        let values = &mut compiled.expression_attribute_values;

        match &sort.upper {
            None => {
                let value = self.encoder.encode_required(&sort.name, &sort.value)?;
                compiled.key.insert(sort.name.clone(), value.clone());
                values.insert(SORT_PLACEHOLDER.to_string(), value);
            }
            Some(upper) => {
                values.insert(
                    START_PLACEHOLDER.to_string(),
                    self.encoder.encode_required(&sort.name, &sort.value)?,
                );
                values.insert(
                    END_PLACEHOLDER.to_string(),
                    self.encoder.encode_required(&sort.name, upper)?,
                );
            }
        }

        Ok(())
    }

    /// Attribute map of a whole record
    ///
    /// The record must serialize to an object. Null fields and empty arrays
    /// are left out, since the store rejects empty sets.
    pub fn for_put<T>(&self, record: &T) -> Result<Item>
    where
        T: Serialize + ?Sized,
    {
        Ok(writable_fields(record)?
            .map(|(name, value)| {
                let encoded = self.encoder.encode(&value);
                (name, encoded)
            })
            .collect())
    }

    /// [`for_put`](Self::for_put), checking values against the schema
    ///
    /// A field with a declared type must resolve to that type, else
    /// `TypeMismatch`. Binary fields are not checked: no runtime value
    /// resolves to binary.
    pub fn for_typed_put<P, T>(&self, provider: &P, record: &T) -> Result<Item>
    where
        P: SchemaProvider + ?Sized,
        T: Serialize + ?Sized,
    {
        let schema = provider.schema();
        let mut item = Item::new();

        for (name, value) in writable_fields(record)? {
            let declared = schema
                .field_type(&name)
                .filter(|kind| *kind != ScalarKind::Binary);

            if let Some(declared) = declared {
                let found = self.encoder.resolve(&value);
                if found != declared {
                    return Err(BlueprintError::TypeMismatch {
                        field: name,
                        expected: declared.descriptor(),
                        found: found.descriptor(),
                    });
                }
            }

            let encoded = self.encoder.encode(&value);
            item.insert(name, encoded);
        }

        Ok(item)
    }

    /// `SET` clause assigning each condition's value to its field, in order
    pub fn for_update(&self, assignments: &[Condition]) -> Result<CompiledExpression> {
        if assignments.is_empty() {
            return Err(BlueprintError::EmptyUpdate);
        }

        let mut compiled = CompiledExpression::default();
        let mut clauses = Vec::with_capacity(assignments.len());

        for assignment in assignments {
            let name = assignment.name.as_str();
            if !is_placeholder_safe(name) {
                return Err(BlueprintError::invalid_identifier(format!(
                    "Field '{}' cannot be used in an update placeholder",
                    name
                )));
            }

            let name_placeholder = format!("#{}", name);
            let value_placeholder = format!(":{}", name);

            if compiled
                .expression_attribute_names
                .insert(name_placeholder.clone(), name.to_string())
                .is_some()
            {
                return Err(BlueprintError::DuplicateAssignment(name.to_string()));
            }

            compiled.expression_attribute_values.insert(
                value_placeholder.clone(),
                self.encoder.encode_required(name, &assignment.value)?,
            );
            clauses.push(format!("{} = {}", name_placeholder, value_placeholder));
        }

        let expression = format!("SET {}", clauses.join(", "));
        trace!(expression = expression.as_str(), "compiled update");

        compiled.update_expression = Some(expression);
        Ok(compiled)
    }

    /// Key map from the hash and sort key conditions that carry a name
    pub fn key_map(
        &self,
        key: Option<&Condition>,
        sort: Option<&SortKeyCondition>,
    ) -> Result<Item> {
        let mut item = Item::new();

        if let Some(key) = key.filter(|k| !k.name.is_empty()) {
            item.insert(
                key.name.clone(),
                self.encoder.encode_required(&key.name, &key.value)?,
            );
        }

        if let Some(sort) = sort.filter(|s| !s.name.is_empty()) {
            if !sort.is_simple() {
                return Err(BlueprintError::invalid_condition(format!(
                    "BETWEEN on '{}' does not identify a single key",
                    sort.name
                )));
            }
            item.insert(
                sort.name.clone(),
                self.encoder.encode_required(&sort.name, &sort.value)?,
            );
        }

        Ok(item)
    }
}

/// Fields of a record worth writing: not null and not an empty array
fn writable_fields<T>(record: &T) -> Result<impl Iterator<Item = (String, Value)>>
where
    T: Serialize + ?Sized,
{
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields.into_iter().filter(|(_, value)| match value {
            Value::Null => false,
            Value::Array(items) => !items.is_empty(),
            _ => true,
        })),
        other => Err(BlueprintError::invalid_item_shape(format!(
            "expected a record, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// [`ExpressionCompiler::for_get`] with the default encoder
pub fn for_get<P>(provider: &P, hash: &Value, range: Option<&Value>) -> Result<Item>
where
    P: SchemaProvider + ?Sized,
{
    ExpressionCompiler::new().for_get(provider, hash, range)
}

/// [`ExpressionCompiler::for_query`] with the default encoder
pub fn for_query<P>(
    provider: &P,
    key: &Condition,
    sort: Option<&SortKeyCondition>,
    index_name: Option<&str>,
) -> Result<CompiledExpression>
where
    P: SchemaProvider + ?Sized,
{
    ExpressionCompiler::new().for_query(provider, key, sort, index_name)
}

/// [`ExpressionCompiler::for_put`] with the default encoder
pub fn for_put<T>(record: &T) -> Result<Item>
where
    T: Serialize + ?Sized,
{
    ExpressionCompiler::new().for_put(record)
}

/// [`ExpressionCompiler::for_update`] with the default encoder
pub fn for_update(assignments: &[Condition]) -> Result<CompiledExpression> {
    ExpressionCompiler::new().for_update(assignments)
}

/// [`ExpressionCompiler::key_map`] with the default encoder
pub fn key_map(key: Option<&Condition>, sort: Option<&SortKeyCondition>) -> Result<Item> {
    ExpressionCompiler::new().key_map(key, sort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::RecordDescriptor;
    use crate::schema::{Schema, SchemaExtractor};
    use serde_json::json;

    fn course_schema() -> Schema {
        let record = RecordDescriptor::new("Course")
            .tagged_field("PK", "type:string;hash")
            .tagged_field("SK", "type:string;range")
            .tagged_field("Owner", "type:string;gsi:CourseOwnerIndex;keyPairs:Owner=SK")
            .tagged_field("Slug", "type:string;gsi:SlugIndex;keyPairs:Slug");
        SchemaExtractor::new().extract_descriptor(&record).unwrap()
    }

    fn hash_only_schema() -> Schema {
        let record = RecordDescriptor::new("Counter").tagged_field("Id", "hash");
        SchemaExtractor::new().extract_descriptor(&record).unwrap()
    }

    // =========================================================================
    // for_get Tests
    // =========================================================================

    #[test]
    fn test_for_get_hash_and_range() {
        let key = for_get(&course_schema(), &json!("COURSE#1"), Some(&json!("META"))).unwrap();

        assert_eq!(key.len(), 2);
        assert_eq!(key["PK"], AttributeValue::S("COURSE#1".to_string()));
        assert_eq!(key["SK"], AttributeValue::S("META".to_string()));
    }

    #[test]
    fn test_for_get_encodes_numbers() {
        let key = for_get(&hash_only_schema(), &json!(42), None).unwrap();
        assert_eq!(key["Id"], AttributeValue::N("42".to_string()));
    }

    #[test]
    fn test_for_get_rejects_null_hash() {
        let err = for_get(&course_schema(), &Value::Null, None).unwrap_err();
        assert!(matches!(err, BlueprintError::NilValue(field) if field == "PK"));
    }

    #[test]
    fn test_for_get_range_without_range_key() {
        let err = for_get(&hash_only_schema(), &json!(1), Some(&json!(2))).unwrap_err();
        assert!(matches!(err, BlueprintError::MissingRangeKey));
    }

    // =========================================================================
    // for_query Tests
    // =========================================================================

    #[test]
    fn test_for_query_hash_only() {
        let compiled =
            for_query(&course_schema(), &Condition::new("PK", "abc"), None, None).unwrap();

        assert_eq!(compiled.key_condition_expression.as_deref(), Some("PK = :key"));
        assert_eq!(compiled.expression_attribute_values.len(), 1);
        assert_eq!(
            compiled.expression_attribute_values[":key"],
            AttributeValue::S("abc".to_string())
        );
        assert_eq!(compiled.index_name, None);
    }

    #[test]
    fn test_for_query_with_sort_operator() {
        let compiled = for_query(
            &course_schema(),
            &Condition::new("PK", "abc"),
            Some(&SortKeyCondition::begins_with("SK", "LESSON#")),
            None,
        )
        .unwrap();

        assert_eq!(
            compiled.key_condition_expression.as_deref(),
            Some("PK = :key and begins_with(SK, :sortVal)")
        );
        assert_eq!(
            compiled.expression_attribute_values[":sortVal"],
            AttributeValue::S("LESSON#".to_string())
        );
        assert_eq!(compiled.key.len(), 2);
    }

    #[test]
    fn test_for_query_between() {
        let compiled = for_query(
            &course_schema(),
            &Condition::new("PK", "abc"),
            Some(&SortKeyCondition::between("SK", 1, 10)),
            None,
        )
        .unwrap();

        let condition = compiled.key_condition_expression.unwrap();
        assert!(condition.contains("SK BETWEEN :start AND :end"));
        assert_eq!(
            compiled.expression_attribute_values[":start"],
            AttributeValue::N("1".to_string())
        );
        assert_eq!(
            compiled.expression_attribute_values[":end"],
            AttributeValue::N("10".to_string())
        );
        assert!(!compiled.expression_attribute_values.contains_key(":sortVal"));
        assert!(!compiled.key.contains_key("SK"));
    }

    #[test]
    fn test_for_query_on_index() {
        let compiled = for_query(
            &course_schema(),
            &Condition::new("Owner", "alice"),
            Some(&SortKeyCondition::greater_than_or_equal("SK", "2024")),
            Some("CourseOwnerIndex"),
        )
        .unwrap();

        assert_eq!(compiled.index_name.as_deref(), Some("CourseOwnerIndex"));
        assert_eq!(
            compiled.key_condition_expression.as_deref(),
            Some("Owner = :key and SK >= :sortVal")
        );
    }

    #[test]
    fn test_for_query_empty_index_name_targets_table() {
        let compiled =
            for_query(&course_schema(), &Condition::new("PK", "abc"), None, Some("")).unwrap();
        assert_eq!(compiled.index_name, None);
    }

    #[test]
    fn test_for_query_key_mismatch() {
        let err =
            for_query(&course_schema(), &Condition::new("Owner", "x"), None, None).unwrap_err();
        assert!(matches!(
            err,
            BlueprintError::KeyMismatch { ref expected, ref found }
                if expected == "PK" && found == "Owner"
        ));

        let err = for_query(
            &course_schema(),
            &Condition::new("PK", "x"),
            Some(&SortKeyCondition::equal("Owner", "y")),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BlueprintError::KeyMismatch { .. }));
    }

    #[test]
    fn test_for_query_unknown_index() {
        let err = for_query(&course_schema(), &Condition::new("PK", "x"), None, Some("Nope"))
            .unwrap_err();
        assert!(matches!(err, BlueprintError::UnknownIndex(name) if name == "Nope"));
    }

    #[test]
    fn test_for_query_sort_on_hash_only_index() {
        let err = for_query(
            &course_schema(),
            &Condition::new("Slug", "intro"),
            Some(&SortKeyCondition::equal("SK", "x")),
            Some("SlugIndex"),
        )
        .unwrap_err();
        assert!(matches!(err, BlueprintError::MissingRangeKey));
    }

    #[test]
    fn test_for_query_null_values() {
        let err = for_query(&course_schema(), &Condition::new("PK", Value::Null), None, None)
            .unwrap_err();
        assert!(matches!(err, BlueprintError::NilValue(_)));

        let err = for_query(
            &course_schema(),
            &Condition::new("PK", "x"),
            Some(&SortKeyCondition::between("SK", 1, Value::Null)),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BlueprintError::NilValue(field) if field == "SK"));
    }

    // =========================================================================
    // for_put Tests
    // =========================================================================

    #[derive(Serialize)]
    struct Lesson {
        #[serde(rename = "PK")]
        pk: String,
        #[serde(rename = "Position")]
        position: u32,
        #[serde(rename = "Published")]
        published: bool,
        #[serde(rename = "Tags")]
        tags: Vec<String>,
        #[serde(rename = "Summary")]
        summary: Option<String>,
    }

    #[test]
    fn test_for_put_record() {
        let item = for_put(&Lesson {
            pk: "LESSON#1".to_string(),
            position: 3,
            published: true,
            tags: vec!["rust".to_string()],
            summary: None,
        })
        .unwrap();

        assert_eq!(item["PK"], AttributeValue::S("LESSON#1".to_string()));
        assert_eq!(item["Position"], AttributeValue::N("3".to_string()));
        assert_eq!(item["Published"], AttributeValue::Bool(true));
        assert_eq!(item["Tags"], AttributeValue::Ss(vec!["rust".to_string()]));
        assert!(!item.contains_key("Summary"));
    }

    #[test]
    fn test_for_put_json_object() {
        let item = for_put(&json!({"PK": "a", "Meta": {"k": 1}})).unwrap();
        assert_eq!(item["Meta"], AttributeValue::S("{\"k\":1}".to_string()));
    }

    #[test]
    fn test_for_put_skips_empty_sets() {
        let item = for_put(&json!({"PK": "a", "Tags": [], "Owners": ["x"]})).unwrap();

        assert!(!item.contains_key("Tags"));
        assert_eq!(item["Owners"], AttributeValue::Ss(vec!["x".to_string()]));
    }

    #[test]
    fn test_for_typed_put_accepts_declared_types() {
        let item = ExpressionCompiler::new()
            .for_typed_put(&course_schema(), &json!({"PK": "a", "SK": "b", "Extra": 3}))
            .unwrap();

        assert_eq!(item.len(), 3);
        assert_eq!(item["Extra"], AttributeValue::N("3".to_string()));
    }

    #[test]
    fn test_for_typed_put_rejects_mismatch() {
        let err = ExpressionCompiler::new()
            .for_typed_put(&course_schema(), &json!({"PK": "a", "Owner": true}))
            .unwrap_err();

        assert!(matches!(
            err,
            BlueprintError::TypeMismatch { ref field, expected: "S", found: "BOOL" }
                if field == "Owner"
        ));
    }

    #[test]
    fn test_for_put_rejects_non_record() {
        let err = for_put(&42).unwrap_err();
        assert!(matches!(err, BlueprintError::InvalidItemShape(msg) if msg.contains("number")));

        assert!(for_put(&vec!["a", "b"]).is_err());
    }

    // =========================================================================
    // for_update Tests
    // =========================================================================

    #[test]
    fn test_for_update_preserves_order() {
        let compiled =
            for_update(&[Condition::new("Title", "x"), Condition::new("Owner", "y")]).unwrap();

        assert_eq!(
            compiled.update_expression.as_deref(),
            Some("SET #Title = :Title, #Owner = :Owner")
        );
        assert_eq!(compiled.expression_attribute_names["#Title"], "Title");
        assert_eq!(compiled.expression_attribute_names["#Owner"], "Owner");
        assert_eq!(
            compiled.expression_attribute_values[":Title"],
            AttributeValue::S("x".to_string())
        );
        assert_eq!(
            compiled.expression_attribute_values[":Owner"],
            AttributeValue::S("y".to_string())
        );
    }

    #[test]
    fn test_for_update_empty() {
        assert!(matches!(for_update(&[]), Err(BlueprintError::EmptyUpdate)));
    }

    #[test]
    fn test_for_update_duplicate_field() {
        let err =
            for_update(&[Condition::new("Title", "a"), Condition::new("Title", "b")]).unwrap_err();
        assert!(matches!(err, BlueprintError::DuplicateAssignment(field) if field == "Title"));
    }

    #[test]
    fn test_for_update_unsafe_name() {
        let err = for_update(&[Condition::new("created-at", 1)]).unwrap_err();
        assert!(matches!(err, BlueprintError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_for_update_null_value() {
        let err = for_update(&[Condition::new("Title", Value::Null)]).unwrap_err();
        assert!(matches!(err, BlueprintError::NilValue(_)));
    }

    // =========================================================================
    // key_map Tests
    // =========================================================================

    #[test]
    fn test_key_map() {
        let key = Condition::new("PK", "a");
        let sort = SortKeyCondition::equal("SK", 5);
        let item = key_map(Some(&key), Some(&sort)).unwrap();

        assert_eq!(item["PK"], AttributeValue::S("a".to_string()));
        assert_eq!(item["SK"], AttributeValue::N("5".to_string()));
    }

    #[test]
    fn test_key_map_skips_unnamed() {
        let item = key_map(Some(&Condition::new("", "a")), None).unwrap();
        assert!(item.is_empty());
    }

    #[test]
    fn test_key_map_rejects_between() {
        let sort = SortKeyCondition::between("SK", 1, 2);
        assert!(matches!(
            key_map(None, Some(&sort)),
            Err(BlueprintError::InvalidCondition(_))
        ));
    }

    // =========================================================================
    // Encoder Tests
    // =========================================================================

    struct UppercaseEncoder;

    impl Encoder for UppercaseEncoder {
        fn resolve(&self, _value: &Value) -> ScalarKind {
            ScalarKind::String
        }

        fn encode(&self, value: &Value) -> AttributeValue {
            AttributeValue::S(value.as_str().unwrap_or_default().to_uppercase())
        }
    }

    #[test]
    fn test_custom_encoder() {
        let compiler = ExpressionCompiler::with_encoder(UppercaseEncoder);
        let key = compiler.for_get(&course_schema(), &json!("abc"), None).unwrap();
        assert_eq!(key["PK"], AttributeValue::S("ABC".to_string()));
    }

    #[test]
    fn test_compiled_expression_serialization() {
        let compiled =
            for_query(&course_schema(), &Condition::new("PK", "abc"), None, None).unwrap();
        let json = serde_json::to_value(&compiled).unwrap();

        assert_eq!(json["KeyConditionExpression"], json!("PK = :key"));
        assert_eq!(json["ExpressionAttributeValues"][":key"], json!({"S": "abc"}));
        assert!(json.get("UpdateExpression").is_none());
        assert!(json.get("IndexName").is_none());
    }
}
