//! Collection schema and its field edit primitives

use crate::schema::{Field, FieldType, SchemaError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named, ordered set of typed fields
///
/// Fields are addressed by `id`. Order only matters for display and for the
/// target index of an insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub fields: Vec<Field>,
}

impl CollectionSchema {
    /// Create an empty collection
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Create a collection with an initial field list
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::DuplicateFieldId` or `SchemaError::DuplicateFieldName`
    /// if the list breaks the uniqueness invariants.
    pub fn with_fields(
        id: impl Into<String>,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Result<Self, SchemaError> {
        let mut schema = Self::new(id, name);
        for field in fields {
            let end = schema.fields.len();
            schema.add_field(end, field)?;
        }
        Ok(schema)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get a field by id
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Get a field by its current name
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Index of the field with this id
    pub fn position(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == id)
    }

    fn position_or_missing(&self, id: &str) -> Result<usize, SchemaError> {
        self.position(id)
            .ok_or_else(|| SchemaError::FieldNotFound(id.to_string()))
    }

    fn ensure_name_free(&self, name: &str, except_id: Option<&str>) -> Result<(), SchemaError> {
        let taken = self.fields.iter()
            .any(|f| f.name == name && Some(f.id.as_str()) != except_id);
        if taken {
            return Err(SchemaError::DuplicateFieldName(name.to_string()));
        }
        Ok(())
    }

    /// Insert a new field at `index`, clamped to `[0, len]`
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::DuplicateFieldId` if the id is already present and
    /// `SchemaError::DuplicateFieldName` if the name is taken.
    pub fn add_field(&mut self, index: usize, field: Field) -> Result<(), SchemaError> {
        if self.position(&field.id).is_some() {
            return Err(SchemaError::DuplicateFieldId(field.id));
        }
        self.ensure_name_free(&field.name, None)?;

        let index = index.min(self.fields.len());
        self.fields.insert(index, field);
        Ok(())
    }

    /// Insert `field` at `index`, replacing any existing field with the same id
    ///
    /// The existing definition is removed first, so the index refers to the
    /// list without it. The name check ignores the field being replaced.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::DuplicateFieldName` if a different field uses the name.
    pub fn replace_field(&mut self, index: usize, field: Field) -> Result<Option<Field>, SchemaError> {
        self.ensure_name_free(&field.name, Some(&field.id))?;

        let previous = self.position(&field.id).map(|pos| self.fields.remove(pos));
        let index = index.min(self.fields.len());
        self.fields.insert(index, field);
        Ok(previous)
    }

    /// Remove the field with this id and return it
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::FieldNotFound` if no field has the id.
    pub fn remove_field(&mut self, id: &str) -> Result<Field, SchemaError> {
        let pos = self.position_or_missing(id)?;
        Ok(self.fields.remove(pos))
    }

    /// Change the name of a field in place
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::FieldNotFound` if no field has the id and
    /// `SchemaError::DuplicateFieldName` if a sibling already uses the name.
    pub fn rename_field(&mut self, id: &str, name: impl Into<String>) -> Result<(), SchemaError> {
        let name = name.into();
        let pos = self.position_or_missing(id)?;
        self.ensure_name_free(&name, Some(id))?;
        self.fields[pos].name = name;
        Ok(())
    }

    /// Change the type and type-specific options of a field in place
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::FieldNotFound` if no field has the id.
    pub fn retype_field(
        &mut self,
        id: &str,
        field_type: FieldType,
        options: Map<String, Value>,
    ) -> Result<(), SchemaError> {
        let pos = self.position_or_missing(id)?;
        let field = &mut self.fields[pos];
        field.field_type = field_type;
        field.options = options;
        Ok(())
    }

    /// Rename the collection itself
    pub fn rename_collection(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> CollectionSchema {
        CollectionSchema::with_fields(
            "pbc_3577811883",
            "tasks",
            [
                Field::new("text3208210256", "id", FieldType::Text).system(true),
                Field::new("text724990059", "title", FieldType::Text).required(true),
                Field::new("text1843675174", "description", FieldType::Text),
                Field::new("bool1260321794", "completed", FieldType::Bool),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_add_field_at_index() {
        let mut schema = base();
        let priority = Field::select("select1655102503", "priority", ["low", "medium", "high"], 1);

        schema.add_field(4, priority.clone()).unwrap();

        assert_eq!(schema.position("select1655102503"), Some(4));
        assert_eq!(schema.fields[4], priority);
    }

    #[test]
    fn test_add_field_clamps_index() {
        let mut schema = CollectionSchema::new("c", "empty");
        schema.add_field(4, Field::new("f1", "a", FieldType::Text)).unwrap();
        assert_eq!(schema.position("f1"), Some(0));

        let mut schema = base();
        schema.add_field(99, Field::new("f2", "last", FieldType::Json)).unwrap();
        assert_eq!(schema.position("f2"), Some(4));
    }

    #[test]
    fn test_add_field_rejects_duplicate_id() {
        let mut schema = base();
        let err = schema
            .add_field(0, Field::new("text724990059", "other", FieldType::Text))
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateFieldId("text724990059".to_string()));
        assert_eq!(schema, base());
    }

    #[test]
    fn test_add_field_rejects_duplicate_name() {
        let mut schema = base();
        let err = schema
            .add_field(0, Field::new("text999", "title", FieldType::Text))
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateFieldName("title".to_string()));
    }

    #[test]
    fn test_remove_field() {
        let mut schema = base();
        let removed = schema.remove_field("text1843675174").unwrap();
        assert_eq!(removed.name, "description");
        assert_eq!(schema.len(), 3);
        assert!(schema.field("text1843675174").is_none());

        assert_eq!(
            schema.remove_field("text1843675174").unwrap_err(),
            SchemaError::FieldNotFound("text1843675174".to_string())
        );
    }

    #[test]
    fn test_rename_field_keeps_id_and_position() {
        let mut schema = base();
        schema.rename_field("text1843675174", "details").unwrap();

        let field = schema.field("text1843675174").unwrap();
        assert_eq!(field.name, "details");
        assert_eq!(schema.position("text1843675174"), Some(2));

        // Renaming to its own name is allowed
        schema.rename_field("text1843675174", "details").unwrap();
    }

    #[test]
    fn test_rename_field_errors() {
        let mut schema = base();
        assert_eq!(
            schema.rename_field("missing", "x").unwrap_err(),
            SchemaError::FieldNotFound("missing".to_string())
        );
        assert_eq!(
            schema.rename_field("text1843675174", "title").unwrap_err(),
            SchemaError::DuplicateFieldName("title".to_string())
        );
    }

    #[test]
    fn test_retype_field() {
        let mut schema = base();
        let mut options = Map::new();
        options.insert("maxSize".to_string(), Value::from(0));

        schema.retype_field("text1843675174", FieldType::Json, options).unwrap();

        let field = schema.field("text1843675174").unwrap();
        assert_eq!(field.field_type, FieldType::Json);
        assert_eq!(field.option("maxSize"), Some(&Value::from(0)));
        assert_eq!(field.name, "description");
    }

    #[test]
    fn test_replace_field_upserts_by_id() {
        let mut schema = base();
        schema
            .add_field(4, Field::select("select1542800728", "field", ["work"], 6))
            .unwrap();

        let previous = schema
            .replace_field(4, Field::select("select1542800728", "tags", ["work"], 6))
            .unwrap();

        assert_eq!(previous.map(|f| f.name), Some("field".to_string()));
        assert_eq!(schema.len(), 5);
        assert_eq!(schema.fields[4].name, "tags");

        // Unknown id behaves like an insertion
        let previous = schema
            .replace_field(0, Field::new("json1", "meta", FieldType::Json))
            .unwrap();
        assert!(previous.is_none());
        assert_eq!(schema.position("json1"), Some(0));
    }

    #[test]
    fn test_rename_collection() {
        let mut schema = base();
        schema.rename_collection("Task");
        assert_eq!(schema.name, "Task");
        assert_eq!(schema.id, "pbc_3577811883");
    }
}
