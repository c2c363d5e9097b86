//! Field descriptor for the media extension of the container record.
//!
//! Serializes to the same JSON shape the form renderer and validator read:
//! field name mapped to `{"type", "dynamic_enum", "maxLength"}`.

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

pub use migration::{MEDIA_DENSITY_ENUM, MEDIA_FORMAT_ENUM};

pub const MEDIA_LABEL_TRANSCRIPTION_MAX_LENGTH: usize = 16384;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Lookup table the stored id points into; the field itself is exposed
    /// as the value string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_enum: Option<String>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl FieldSchema {
    pub fn string() -> Self {
        Self {
            field_type: FieldType::String,
            dynamic_enum: None,
            max_length: None,
        }
    }

    pub fn dynamic_enum(mut self, table: &str) -> Self {
        self.dynamic_enum = Some(table.to_owned());
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

/// Ordered field name to descriptor mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<(String, FieldSchema)>,
}

impl Schema {
    pub fn field(mut self, name: &str, schema: FieldSchema) -> Self {
        self.fields.push((name.to_owned(), schema));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, schema)| schema)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    /// Enum tables referenced by any field, without duplicates.
    pub fn dynamic_enums(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = Vec::new();
        for (_, schema) in self.iter() {
            if let Some(table) = schema.dynamic_enum.as_deref() {
                if !tables.contains(&table) {
                    tables.push(table);
                }
            }
        }
        tables
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, schema) in &self.fields {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }
}

pub fn container_ext() -> Schema {
    Schema::default()
        .field(
            "media_format",
            FieldSchema::string().dynamic_enum(MEDIA_FORMAT_ENUM),
        )
        .field(
            "media_density",
            FieldSchema::string().dynamic_enum(MEDIA_DENSITY_ENUM),
        )
        .field(
            "media_label_transcription",
            FieldSchema::string().max_length(MEDIA_LABEL_TRANSCRIPTION_MAX_LENGTH),
        )
        .field("media_manufacturer", FieldSchema::string())
        .field("media_serial_number", FieldSchema::string())
}
