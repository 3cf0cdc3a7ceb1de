//! Declarative migrations loaded from JSON scripts
//!
//! A script lists the field edits for each direction:
//!
//! ```json
//! {
//!   "up":   [{ "op": "rename_field", "id": "select1542800728", "name": "tags" }],
//!   "down": [{ "op": "rename_field", "id": "select1542800728", "name": "field" }]
//! }
//! ```

use crate::migration::{calculate_checksum, Migration, MigrationError, SchemaManager};
use crate::schema::{Field, FieldType, SchemaError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single edit step inside a migration script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldEdit {
    AddField {
        index: usize,
        field: Field,
    },
    /// Insert, or overwrite the field with the same id
    ReplaceField {
        index: usize,
        field: Field,
    },
    RemoveField {
        id: String,
    },
    RenameField {
        id: String,
        name: String,
    },
    RetypeField {
        id: String,
        #[serde(rename = "type")]
        field_type: FieldType,
        #[serde(default)]
        options: Map<String, Value>,
    },
    RenameCollection {
        name: String,
    },
}

impl FieldEdit {
    /// Run this edit through the manager
    pub fn apply(&self, manager: &mut SchemaManager<'_>) -> Result<(), SchemaError> {
        match self {
            FieldEdit::AddField { index, field } => manager.add_field(*index, field.clone()),
            FieldEdit::ReplaceField { index, field } => manager.replace_field(*index, field.clone()),
            FieldEdit::RemoveField { id } => manager.remove_field(id),
            FieldEdit::RenameField { id, name } => manager.rename_field(id, name),
            FieldEdit::RetypeField { id, field_type, options } => {
                manager.retype_field(id, *field_type, options.clone())
            }
            FieldEdit::RenameCollection { name } => {
                manager.rename_collection(name);
                Ok(())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScriptBody {
    #[serde(default)]
    name: Option<String>,
    up: Vec<FieldEdit>,
    #[serde(default)]
    down: Vec<FieldEdit>,
}

/// A migration whose edits come from a JSON script
#[derive(Debug, Clone)]
pub struct ScriptedMigration {
    version: i64,
    name: String,
    checksum: String,
    up: Vec<FieldEdit>,
    down: Vec<FieldEdit>,
}

impl ScriptedMigration {
    /// Parse a script body
    ///
    /// `name` is used unless the script declares its own.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::InvalidFormat` if the body is not a valid script.
    pub fn parse(version: i64, name: impl Into<String>, content: &str) -> Result<Self, MigrationError> {
        let body: ScriptBody = serde_json::from_str(content).map_err(|e| {
            MigrationError::InvalidFormat(format!("migration {version} has an invalid script: {e}"))
        })?;

        Ok(Self {
            version,
            name: body.name.unwrap_or_else(|| name.into()),
            checksum: calculate_checksum(content.as_bytes()),
            up: body.up,
            down: body.down,
        })
    }

    pub fn up_edits(&self) -> &[FieldEdit] {
        &self.up
    }

    pub fn down_edits(&self) -> &[FieldEdit] {
        &self.down
    }
}

impl Migration for ScriptedMigration {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn up(&self, manager: &mut SchemaManager<'_>) -> Result<(), SchemaError> {
        self.up.iter().try_for_each(|edit| edit.apply(manager))
    }

    fn down(&self, manager: &mut SchemaManager<'_>) -> Result<(), SchemaError> {
        self.down.iter().try_for_each(|edit| edit.apply(manager))
    }

    fn checksum(&self) -> Option<&str> {
        Some(&self.checksum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationDirection;
    use crate::schema::CollectionSchema;

    const RENAME_SCRIPT: &str = r#"{
        "up":   [{ "op": "rename_field", "id": "select1542800728", "name": "tags" }],
        "down": [{ "op": "rename_field", "id": "select1542800728", "name": "field" }]
    }"#;

    #[test]
    fn test_parse_script() {
        let migration = ScriptedMigration::parse(1742024685, "updated_tasks", RENAME_SCRIPT).unwrap();
        assert_eq!(migration.version(), 1742024685);
        assert_eq!(migration.name(), "updated_tasks");
        assert_eq!(migration.up_edits().len(), 1);
        assert_eq!(migration.checksum().map(str::len), Some(64));
    }

    #[test]
    fn test_script_name_overrides_file_name() {
        let migration =
            ScriptedMigration::parse(1, "file_name", r#"{"name": "rename_tags", "up": []}"#).unwrap();
        assert_eq!(migration.name(), "rename_tags");
        assert!(migration.down_edits().is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_op() {
        let err = ScriptedMigration::parse(7, "bad", r#"{"up": [{"op": "drop_table"}]}"#).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidFormat(msg) if msg.contains("migration 7")));
    }

    #[test]
    fn test_add_field_edit_carries_options() {
        let edit: FieldEdit = serde_json::from_str(
            r#"{
                "op": "add_field",
                "index": 5,
                "field": {
                    "hidden": false,
                    "id": "date3275789471",
                    "max": "",
                    "min": "",
                    "name": "dueDate",
                    "presentable": false,
                    "required": false,
                    "system": false,
                    "type": "date"
                }
            }"#,
        )
        .unwrap();

        match edit {
            FieldEdit::AddField { index, field } => {
                assert_eq!(index, 5);
                assert_eq!(field.field_type, FieldType::Date);
                assert_eq!(field.option("max"), Some(&Value::String(String::new())));
            }
            other => panic!("Expected AddField, got {other:?}"),
        }
    }

    #[test]
    fn test_up_then_down_restores_name() {
        let migration = ScriptedMigration::parse(1742024685, "updated_tasks", RENAME_SCRIPT).unwrap();
        let mut schema = CollectionSchema::with_fields(
            "pbc_3577811883",
            "tasks",
            [Field::select("select1542800728", "field", ["work", "personal"], 6)],
        )
        .unwrap();
        let original = schema.clone();

        migration.up(&mut SchemaManager::new(&mut schema, MigrationDirection::Up)).unwrap();
        assert_eq!(schema.field("select1542800728").map(|f| f.name.as_str()), Some("tags"));

        migration.down(&mut SchemaManager::new(&mut schema, MigrationDirection::Down)).unwrap();
        assert_eq!(schema, original);
    }
}
