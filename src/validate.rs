use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::schema::{FieldType, Schema};

/// Allowed values of each enum table, as loaded at validation time.
#[derive(Clone, Debug, Default)]
pub struct DynamicEnums {
    values: HashMap<String, Vec<String>>,
}

impl DynamicEnums {
    pub fn insert(&mut self, table: &str, values: Vec<String>) {
        self.values.insert(table.to_owned(), values);
    }

    pub fn values(&self, table: &str) -> Option<&[String]> {
        self.values.get(table).map(Vec::as_slice)
    }

    pub fn contains(&self, table: &str, value: &str) -> bool {
        self.values(table)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("{field}: Must be a string")]
    WrongType { field: String },
    #[error("{field}: Must be {max} characters or fewer")]
    TooLong { field: String, max: usize },
    #[error("{field}: Invalid value '{value}'. Must be one of: {allowed}")]
    NotInEnum {
        field: String,
        value: String,
        allowed: String,
    },
    #[error("{field}: Unknown enumeration '{table}'")]
    UnknownEnum { field: String, table: String },
    #[error("Record must be a JSON object")]
    NotAnObject,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{}", join_messages(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn join_messages(errors: &[FieldError]) -> String {
    let messages: Vec<_> = errors.iter().map(ToString::to_string).collect();
    messages.join("; ")
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

/// Checks `record` against `schema`. Fields the schema doesn't name are
/// left alone; `null` and absent fields are accepted.
pub fn validate(
    schema: &Schema,
    record: &Value,
    enums: &DynamicEnums,
) -> Result<(), ValidationErrors> {
    let Some(object) = record.as_object() else {
        return Err(ValidationErrors(vec![FieldError::NotAnObject]));
    };

    let mut errors = Vec::new();
    for (name, field) in schema.iter() {
        let value = match object.get(name) {
            None | Some(Value::Null) => continue,
            Some(value) => value,
        };

        let text = match (field.field_type, value) {
            (FieldType::String, Value::String(text)) => text,
            (FieldType::String, _) => {
                errors.push(FieldError::WrongType {
                    field: name.to_owned(),
                });
                continue;
            }
        };

        if let Some(max) = field.max_length {
            if text.chars().count() > max {
                errors.push(FieldError::TooLong {
                    field: name.to_owned(),
                    max,
                });
            }
        }

        if let Some(table) = field.dynamic_enum.as_deref() {
            match enums.values(table) {
                None => errors.push(FieldError::UnknownEnum {
                    field: name.to_owned(),
                    table: table.to_owned(),
                }),
                Some(allowed) if !enums.contains(table, text) => {
                    errors.push(FieldError::NotInEnum {
                        field: name.to_owned(),
                        value: text.clone(),
                        allowed: allowed.join(", "),
                    })
                }
                Some(_) => {}
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}
