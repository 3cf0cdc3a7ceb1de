//! In-memory collection schema and the field edit primitives migrations use.
//!
//! Nothing in this module performs I/O. Loading and persisting a
//! [`CollectionSchema`] is the job of a [`crate::store::SchemaStore`].

pub mod collection;
pub mod error;
pub mod field;

pub use collection::CollectionSchema;
pub use error::SchemaError;
pub use field::{Field, FieldType};
