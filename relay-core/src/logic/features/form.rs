//! Form Specs - numeric inputs per schema
//!
//! Every field of a schema becomes one numeric input keyed
//! `{namespace}_{feature}`. Submitted text is only coerced to a number.

use std::collections::HashMap;

use serde::Serialize;

use super::layout::{FeatureKind, FeatureSchema};
use super::record::{InputRecord, InputValue};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("Field '{key}' is not a number: '{value}'")]
    InvalidNumber { key: String, value: String },

    #[error("Unknown feature '{0}'")]
    UnknownFeature(String),
}

/// One numeric input control
#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    /// Unique control key, `{namespace}_{feature}`
    pub key: String,
    /// Feature name shown as the label
    pub label: String,
    pub kind: FeatureKind,
    pub default: InputValue,
    /// `Some(1)` for whole-number inputs
    pub step: Option<u32>,
}

/// Numeric inputs + submit control for one schema
#[derive(Debug, Clone)]
pub struct FormSpec {
    schema: &'static FeatureSchema,
    namespace: &'static str,
    submit_label: String,
    fields: Vec<FormField>,
}

impl FormSpec {
    /// `integer_status` controls whether `:S` fields get whole-number inputs;
    /// when false every field is entered as a real number.
    pub fn new(
        schema: &'static FeatureSchema,
        namespace: &'static str,
        title: &str,
        integer_status: bool,
    ) -> Self {
        let fields = schema
            .features()
            .iter()
            .map(|feature| {
                let kind = if integer_status { feature.kind } else { FeatureKind::Real };
                FormField {
                    key: field_key(namespace, &feature.name),
                    label: feature.name.clone(),
                    kind,
                    default: InputValue::default_for(kind),
                    step: (kind == FeatureKind::Integer).then_some(1),
                }
            })
            .collect();

        Self {
            schema,
            namespace,
            submit_label: format!("Predict {}", title),
            fields,
        }
    }

    pub fn schema(&self) -> &'static FeatureSchema {
        self.schema
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn submit_label(&self) -> &str {
        &self.submit_label
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Record holding each field's default
    pub fn defaults(&self) -> InputRecord {
        let mut record = InputRecord::defaults(self.schema);
        for (index, field) in self.fields.iter().enumerate() {
            record.set_at(index, field.default);
        }
        record
    }

    /// Parse a submission keyed by control key.
    /// Missing or blank fields keep their default.
    pub fn parse_submission(
        &self,
        submitted: &HashMap<String, String>,
    ) -> Result<InputRecord, FormError> {
        let mut record = self.defaults();

        for (index, field) in self.fields.iter().enumerate() {
            let Some(text) = submitted.get(&field.key) else {
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            let value = InputValue::parse(field.kind, text).map_err(|_| FormError::InvalidNumber {
                key: field.key.clone(),
                value: text.clone(),
            })?;
            record.set_at(index, value);
        }

        Ok(record)
    }
}

/// `{namespace}_{feature}`
pub fn field_key(namespace: &str, feature: &str) -> String {
    format!("{}_{}", namespace, feature)
}
