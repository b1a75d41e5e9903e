//! Field definitions
//!
//! Project types describe the shape of report and finding data with a
//! tree of field definitions. Imported data blobs are normalized against
//! that tree with [`ensure_defined_structure`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field types understood by the report designer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Markdown,
    Cvss,
    Cwe,
    Date,
    Number,
    Boolean,
    Enum,
    Combobox,
    User,
    Object,
    List,
}

/// A single field definition
///
/// Only the keys the structure walk needs are typed; everything else
/// (choices, suggestions, origin, ...) is preserved verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Nested fields of an `object` field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<FieldDefinitions>,

    /// Item definition of a `list` field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldDefinition>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDefinition {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            label: None,
            default: None,
            properties: None,
            items: None,
            extra: Map::new(),
        }
    }

    pub fn object(properties: FieldDefinitions) -> Self {
        Self {
            properties: Some(properties),
            ..Self::new(FieldType::Object)
        }
    }

    pub fn list(items: FieldDefinition) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::new(FieldType::List)
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Field id -> definition
pub type FieldDefinitions = BTreeMap<String, FieldDefinition>;

/// What to put in place of a defined field that is missing from the value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleUndefined {
    /// Use `null` (empty list for list fields)
    FillNone,
    /// Use the definition's default
    FillDefault,
}

/// Normalize `value` against `definition`.
///
/// Every defined field is present in the result. Missing fields are
/// filled according to `handle_undefined`. Keys in `value` that are not
/// defined are kept only when `include_undefined` is set.
pub fn ensure_defined_structure(
    value: &Map<String, Value>,
    definition: &FieldDefinitions,
    handle_undefined: HandleUndefined,
    include_undefined: bool,
) -> Map<String, Value> {
    let mut out = if include_undefined {
        value.clone()
    } else {
        Map::new()
    };

    for (id, field) in definition {
        let normalized = ensure_field(value.get(id), field, handle_undefined, include_undefined);
        out.insert(id.clone(), normalized);
    }

    out
}

fn ensure_field(
    value: Option<&Value>,
    field: &FieldDefinition,
    handle_undefined: HandleUndefined,
    include_undefined: bool,
) -> Value {
    match field.field_type {
        FieldType::Object => {
            let empty = Map::new();
            let nested = value.and_then(Value::as_object).unwrap_or(&empty);
            let properties = field.properties.clone().unwrap_or_default();
            Value::Object(ensure_defined_structure(
                nested,
                &properties,
                handle_undefined,
                include_undefined,
            ))
        }
        FieldType::List => match (value, field.items.as_deref()) {
            (Some(Value::Array(items)), Some(item_def)) => Value::Array(
                items
                    .iter()
                    .map(|item| ensure_field(Some(item), item_def, handle_undefined, include_undefined))
                    .collect(),
            ),
            (Some(Value::Array(items)), None) => Value::Array(items.clone()),
            _ => match handle_undefined {
                HandleUndefined::FillDefault => field
                    .default
                    .clone()
                    .filter(Value::is_array)
                    .unwrap_or_else(|| Value::Array(Vec::new())),
                HandleUndefined::FillNone => Value::Array(Vec::new()),
            },
        },
        _ => match value {
            Some(v) => v.clone(),
            None => match handle_undefined {
                HandleUndefined::FillDefault => field.default.clone().unwrap_or(Value::Null),
                HandleUndefined::FillNone => Value::Null,
            },
        },
    }
}
