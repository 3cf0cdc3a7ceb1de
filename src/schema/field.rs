//! Field definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The type of a collection field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Bool,
    Email,
    Url,
    Editor,
    Date,
    Autodate,
    Select,
    File,
    Relation,
    Json,
    Password,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Editor => "editor",
            FieldType::Date => "date",
            FieldType::Autodate => "autodate",
            FieldType::Select => "select",
            FieldType::File => "file",
            FieldType::Relation => "relation",
            FieldType::Json => "json",
            FieldType::Password => "password",
        };
        f.write_str(name)
    }
}

/// A single typed attribute of a collection
///
/// The `id` is stable for the lifetime of the field; `name` may change
/// between migrations but is unique among sibling fields. Type-specific
/// settings (`values`, `maxSelect`, `onCreate`, ...) live in `options` and are
/// serialized inline with the common attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,

    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default)]
    pub presentable: bool,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub system: bool,

    /// Type-specific settings
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl Field {
    /// Create a field with default flags and no options
    pub fn new(id: impl Into<String>, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            field_type,
            hidden: false,
            presentable: false,
            required: false,
            system: false,
            options: Map::new(),
        }
    }

    /// Set a type-specific option
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn system(mut self, system: bool) -> Self {
        self.system = system;
        self
    }

    /// A `select` field accepting up to `max_select` of `values`
    pub fn select<I, S>(id: impl Into<String>, name: impl Into<String>, values: I, max_select: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Value> = values.into_iter().map(|v| Value::String(v.into())).collect();
        Self::new(id, name, FieldType::Select)
            .with_option("maxSelect", max_select)
            .with_option("values", values)
    }

    /// An `autodate` field set on create and/or update
    pub fn autodate(id: impl Into<String>, name: impl Into<String>, on_create: bool, on_update: bool) -> Self {
        Self::new(id, name, FieldType::Autodate)
            .with_option("onCreate", on_create)
            .with_option("onUpdate", on_update)
    }

    /// Look up a type-specific option
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    #[allow(clippy::expect_used)] // Test code - expect is acceptable
    fn test_field_deserializes_pocketbase_shape() {
        let raw = json!({
            "hidden": false,
            "id": "select1655102503",
            "maxSelect": 1,
            "name": "priority",
            "presentable": false,
            "required": false,
            "system": false,
            "type": "select",
            "values": ["low", "medium", "high"]
        });

        let field: Field = serde_json::from_value(raw).expect("field should deserialize");
        assert_eq!(field.id, "select1655102503");
        assert_eq!(field.name, "priority");
        assert_eq!(field.field_type, FieldType::Select);
        assert_eq!(field.option("maxSelect"), Some(&json!(1)));
        assert_eq!(field.option("values"), Some(&json!(["low", "medium", "high"])));
        // Common attributes must not leak into options
        assert!(field.option("name").is_none());
        assert!(field.option("type").is_none());
    }

    #[test]
    #[allow(clippy::expect_used)] // Test code - expect is acceptable
    fn test_field_serializes_options_inline() {
        let field = Field::autodate("autodate2990389176", "created", true, false);
        let value = serde_json::to_value(&field).expect("field should serialize");

        assert_eq!(value["type"], json!("autodate"));
        assert_eq!(value["onCreate"], json!(true));
        assert_eq!(value["onUpdate"], json!(false));
        assert!(value.get("options").is_none());
    }

    #[test]
    fn test_select_builder() {
        let field = Field::select("select1", "tags", ["work", "personal"], 6);
        assert_eq!(field.field_type, FieldType::Select);
        assert_eq!(field.option("maxSelect"), Some(&serde_json::json!(6)));
        assert_eq!(field.option("values"), Some(&serde_json::json!(["work", "personal"])));
    }

    #[test]
    fn test_field_type_display_matches_serde_name() {
        assert_eq!(FieldType::Autodate.to_string(), "autodate");
        assert_eq!(FieldType::Json.to_string(), "json");
    }
}
