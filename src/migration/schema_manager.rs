//! SchemaManager - the handle migrations use to edit a collection

use crate::migration::MigrationDirection;
use crate::schema::{CollectionSchema, Field, FieldType, SchemaError};
use serde_json::{Map, Value};

/// SchemaManager provides the field edit operations available to migrations
///
/// It borrows the collection loaded for the current step and knows which
/// direction the step runs in. While rolling back, removing a field that
/// does not exist is logged and recorded as a warning instead of failing,
/// so a rollback can proceed over a partially applied earlier pass.
pub struct SchemaManager<'a> {
    schema: &'a mut CollectionSchema,
    direction: MigrationDirection,
    warnings: Vec<String>,
}

impl<'a> SchemaManager<'a> {
    /// Create a new SchemaManager over a loaded collection
    pub fn new(schema: &'a mut CollectionSchema, direction: MigrationDirection) -> Self {
        Self {
            schema,
            direction,
            warnings: Vec::new(),
        }
    }

    /// Direction of the step being executed
    pub fn direction(&self) -> MigrationDirection {
        self.direction
    }

    /// Read-only view of the collection being edited
    pub fn schema(&self) -> &CollectionSchema {
        self.schema
    }

    /// Soft failures tolerated during this step
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub(crate) fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    /// Insert a field at `index`
    pub fn add_field(&mut self, index: usize, field: Field) -> Result<(), SchemaError> {
        self.schema.add_field(index, field)
    }

    /// Insert or overwrite a field at `index`
    pub fn replace_field(&mut self, index: usize, field: Field) -> Result<(), SchemaError> {
        self.schema.replace_field(index, field).map(|_| ())
    }

    /// Remove a field by id
    pub fn remove_field(&mut self, id: &str) -> Result<(), SchemaError> {
        match self.schema.remove_field(id) {
            Ok(_) => Ok(()),
            Err(SchemaError::FieldNotFound(missing)) if self.direction == MigrationDirection::Down => {
                let warning = format!("field '{missing}' was already absent during rollback");
                log::warn!("{} (collection {})", warning, self.schema.id);
                self.warnings.push(warning);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn rename_field(&mut self, id: &str, name: &str) -> Result<(), SchemaError> {
        self.schema.rename_field(id, name)
    }

    pub fn retype_field(
        &mut self,
        id: &str,
        field_type: FieldType,
        options: Map<String, Value>,
    ) -> Result<(), SchemaError> {
        self.schema.retype_field(id, field_type, options)
    }

    pub fn rename_collection(&mut self, name: &str) {
        self.schema.rename_collection(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_missing_field_is_soft_on_down() {
        let mut schema = CollectionSchema::new("c", "tasks");
        let mut manager = SchemaManager::new(&mut schema, MigrationDirection::Down);

        manager.remove_field("json1874629670").unwrap();

        assert_eq!(manager.warnings().len(), 1);
        assert!(manager.warnings()[0].contains("json1874629670"));
    }

    #[test]
    fn test_remove_missing_field_fails_on_up() {
        let mut schema = CollectionSchema::new("c", "tasks");
        let mut manager = SchemaManager::new(&mut schema, MigrationDirection::Up);

        let err = manager.remove_field("json1874629670").unwrap_err();
        assert_eq!(err, SchemaError::FieldNotFound("json1874629670".to_string()));
        assert!(manager.warnings().is_empty());
    }

    #[test]
    fn test_rename_missing_field_still_fails_on_down() {
        let mut schema = CollectionSchema::new("c", "tasks");
        let mut manager = SchemaManager::new(&mut schema, MigrationDirection::Down);
        assert!(manager.rename_field("select1542800728", "field").is_err());
    }
}
