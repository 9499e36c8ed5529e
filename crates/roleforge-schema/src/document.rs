//! Typed extraction over a schema-free YAML document.
//!
//! Release manifests are loosely structured, so they are first parsed into a
//! `serde_yaml::Value` tree and then read field by field. Every accessor is a
//! single fallible operation that names the field and the expected type when
//! the document doesn't match.

use crate::SchemaError;
use serde_yaml::{Mapping, Value};

/// A mapping node inside a parsed document, tagged with a human-readable
/// context (e.g. `package 'ntp'`) used in error messages.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    context: String,
    map: &'a Mapping,
}

impl<'a> Document<'a> {
    pub fn new(context: impl Into<String>, value: &'a Value) -> Result<Self, SchemaError> {
        let context = context.into();
        match value {
            Value::Mapping(map) => Ok(Self { context, map }),
            _ => Err(SchemaError::NotAMapping { context }),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        match self.map.get(field) {
            None | Some(Value::Null) => None,
            Some(v) => Some(v),
        }
    }

    fn missing(&self, field: &str) -> SchemaError {
        SchemaError::MissingField {
            context: self.context.clone(),
            field: field.to_owned(),
        }
    }

    fn wrong_type(&self, field: &str, expected: &'static str) -> SchemaError {
        SchemaError::FieldType {
            context: self.context.clone(),
            field: field.to_owned(),
            expected,
        }
    }

    pub fn str(&self, field: &str) -> Result<&'a str, SchemaError> {
        self.opt_str(field)?.ok_or_else(|| self.missing(field))
    }

    pub fn opt_str(&self, field: &str) -> Result<Option<&'a str>, SchemaError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.wrong_type(field, "string")),
        }
    }

    pub fn bool(&self, field: &str) -> Result<bool, SchemaError> {
        match self.get(field) {
            None => Err(self.missing(field)),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.wrong_type(field, "bool")),
        }
    }

    pub fn seq(&self, field: &str) -> Result<&'a [Value], SchemaError> {
        match self.get(field) {
            None => Err(self.missing(field)),
            Some(Value::Sequence(items)) => Ok(items.as_slice()),
            Some(_) => Err(self.wrong_type(field, "list")),
        }
    }

    /// Like [`seq`](Self::seq), but an absent field reads as an empty list.
    pub fn opt_seq(&self, field: &str) -> Result<&'a [Value], SchemaError> {
        if self.get(field).is_none() {
            return Ok(&[]);
        }
        self.seq(field)
    }

    pub fn opt_map(&self, field: &str) -> Result<Option<Document<'a>>, SchemaError> {
        match self.get(field) {
            None => Ok(None),
            Some(value @ Value::Mapping(_)) => {
                Document::new(format!("{} {field}", self.context), value).map(Some)
            }
            Some(_) => Err(self.wrong_type(field, "mapping")),
        }
    }

    /// Optional list of strings, taken verbatim. Absent reads as empty.
    pub fn string_list(&self, field: &str) -> Result<Vec<String>, SchemaError> {
        self.opt_seq(field)?
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(self.wrong_type(field, "list of strings")),
            })
            .collect()
    }
}
