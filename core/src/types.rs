//! Request payloads for record endpoints.
//!
//! # Design
//! Record fields are free-form JSON since table schemas live on the backend.
//! `UpsertInput` accepts exactly a single record or a list of records; any
//! other JSON shape is rejected when converting from a `Value`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Query parameters sent as the literal strings `"true"` / `"false"`.
pub const BOOLEAN_PARAMS: [&str; 4] = ["desc", "new", "updated", "ids"];

/// One record to insert or update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordInput {
    /// Existing record id to update; omitted to insert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub fields: Map<String, Value>,
}

impl RecordInput {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { id: None, fields }
    }

    pub fn with_id(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: Some(id.into()),
            fields,
        }
    }

    fn from_object(mut obj: Map<String, Value>) -> Result<Self> {
        let id = match obj.remove("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                return Err(Error::InvalidRecords(format!(
                    "record id must be a string or number, got {other}"
                )))
            }
        };
        match obj.remove("fields") {
            Some(Value::Object(fields)) => Ok(Self { id, fields }),
            Some(other) => Err(Error::InvalidRecords(format!(
                "record fields must be an object, got {other}"
            ))),
            None => Err(Error::InvalidRecords("record is missing `fields`".into())),
        }
    }
}

/// Records accepted by upsert: one record or a list.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertInput {
    One(RecordInput),
    Many(Vec<RecordInput>),
}

impl UpsertInput {
    /// The request body: always a list.
    pub fn into_records(self) -> Vec<RecordInput> {
        match self {
            UpsertInput::One(record) => vec![record],
            UpsertInput::Many(records) => records,
        }
    }
}

impl From<RecordInput> for UpsertInput {
    fn from(record: RecordInput) -> Self {
        UpsertInput::One(record)
    }
}

impl From<Vec<RecordInput>> for UpsertInput {
    fn from(records: Vec<RecordInput>) -> Self {
        UpsertInput::Many(records)
    }
}

impl TryFrom<Value> for UpsertInput {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(obj) => Ok(UpsertInput::One(RecordInput::from_object(obj)?)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(obj) => RecordInput::from_object(obj),
                    other => Err(Error::InvalidRecords(format!(
                        "list entries must be record objects, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(UpsertInput::Many),
            other => Err(Error::InvalidRecords(format!(
                "expected a record object or a list of records, got {other}"
            ))),
        }
    }
}

/// Query parameters for listing records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    params: Map<String, Value>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an arbitrary parameter map.
    pub fn from_map(params: Map<String, Value>) -> Self {
        Self { params }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn per_page(self, n: u32) -> Self {
        self.param("perPage", n)
    }

    pub fn page(self, n: u32) -> Self {
        self.param("page", n)
    }

    pub fn order(self, field: &str) -> Self {
        self.param("order", field)
    }

    pub fn desc(self, desc: bool) -> Self {
        self.param("desc", desc)
    }

    /// Field filter; objects and arrays are sent JSON-encoded.
    pub fn filters(self, filters: Value) -> Self {
        self.param("filters", filters)
    }

    /// Parameters as sent on the wire.
    pub fn to_params(&self) -> Result<Map<String, Value>> {
        let mut params = self.params.clone();
        for key in BOOLEAN_PARAMS {
            if let Some(value) = params.get_mut(key) {
                let flag = if is_truthy(value) { "true" } else { "false" };
                *value = Value::String(flag.to_string());
            }
        }
        if let Some(filters) = params.get_mut("filters") {
            if filters.is_object() || filters.is_array() {
                *filters = Value::String(serde_json::to_string(filters)?);
            }
        }
        Ok(params)
    }
}

/// Loose truthiness: null, false, zero, `""`, `"0"`, `"false"` and empty
/// containers are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
