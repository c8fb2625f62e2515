//! Features Module - Relay Feature Schemas
//!
//! Schema registry, single-row input records and form specs.
//! Adding a field to a relay layout changes what every classifier sees.

pub mod form;
pub mod layout;
pub mod record;


// Re-export common types
pub use form::{FormError, FormField, FormSpec};
pub use layout::{
    overall_schema, relay_schema, schema_for, FeatureKind, FeatureSchema, FeatureSpec,
    LayoutInfo, LayoutMismatchError, RelayId, SchemaKey,
};
pub use record::{InputRecord, InputValue};
