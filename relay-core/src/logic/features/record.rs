//! Input Record - Single-row ML input
//!
//! Values are held in schema order. Nothing is validated beyond the numeric
//! type; out-of-range readings are forwarded to the classifier as entered.

use std::collections::HashMap;
use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::form::FormError;
use super::layout::{FeatureKind, FeatureSchema, SchemaKey};

/// One entered value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Integer(i64),
    Real(f64),
}

impl InputValue {
    pub fn default_for(kind: FeatureKind) -> Self {
        match kind {
            FeatureKind::Integer => InputValue::Integer(0),
            FeatureKind::Real => InputValue::Real(0.0),
        }
    }

    /// Parse text entered for a field of the given kind
    pub fn parse(kind: FeatureKind, text: &str) -> Result<Self, std::num::ParseFloatError> {
        let text = text.trim();
        match kind {
            FeatureKind::Integer => match text.parse::<i64>() {
                Ok(v) => Ok(InputValue::Integer(v)),
                // "3.0" from a number widget is still a whole number;
                // anything outside the i64 range stays real
                Err(_) => {
                    let v = text.parse::<f64>()?;
                    if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                        Ok(InputValue::Integer(v as i64))
                    } else {
                        Ok(InputValue::Real(v))
                    }
                }
            },
            FeatureKind::Real => text.parse::<f64>().map(InputValue::Real),
        }
    }

    /// Coerce to the real-number type every classifier consumes
    pub fn as_f32(self) -> f32 {
        match self {
            InputValue::Integer(v) => v as f32,
            InputValue::Real(v) => v as f32,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            InputValue::Integer(v) => v as f64,
            InputValue::Real(v) => v,
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Integer(v) => write!(f, "{}", v),
            InputValue::Real(v) => write!(f, "{:?}", v),
        }
    }
}

/// Schema-ordered values for one submission
#[derive(Debug, Clone)]
pub struct InputRecord {
    schema: &'static FeatureSchema,
    values: Vec<InputValue>,
}

impl InputRecord {
    /// Zeroed record (`0` for integer fields, `0.0` otherwise)
    pub fn defaults(schema: &'static FeatureSchema) -> Self {
        let values = schema
            .features()
            .iter()
            .map(|f| InputValue::default_for(f.kind))
            .collect();
        Self { schema, values }
    }

    /// Build from named numbers; missing names keep their default
    pub fn from_named(
        schema: &'static FeatureSchema,
        named: &HashMap<String, f64>,
    ) -> Result<Self, FormError> {
        let mut record = Self::defaults(schema);
        for (name, value) in named {
            if !record.set(name, InputValue::Real(*value)) {
                return Err(FormError::UnknownFeature(name.clone()));
            }
        }
        Ok(record)
    }

    pub fn schema(&self) -> &'static FeatureSchema {
        self.schema
    }

    pub fn key(&self) -> SchemaKey {
        self.schema.key()
    }

    pub fn values(&self) -> &[InputValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<InputValue> {
        self.schema.index_of(name).map(|i| self.values[i])
    }

    /// Set feature by name
    pub fn set(&mut self, name: &str, value: InputValue) -> bool {
        match self.schema.index_of(name) {
            Some(index) => {
                self.values[index] = value;
                true
            }
            None => false,
        }
    }

    pub fn set_at(&mut self, index: usize, value: InputValue) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }

    /// (name, value) pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, InputValue)> + '_ {
        self.schema.names().zip(self.values.iter().copied())
    }

    /// All values as `f32`, schema order
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.values.iter().map(|v| v.as_f32()).collect()
    }

    /// `1 x n` row, every column coerced to `f32`
    pub fn to_row(&self) -> Array2<f32> {
        let n = self.values.len();
        Array2::from_shape_fn((1, n), |(_, j)| self.values[j].as_f32())
    }

    /// JSON-serializable form for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "schema": self.key().slug(),
            "layout_hash": self.schema.layout_hash(),
            "named_values": self
                .iter()
                .map(|(name, value)| (name.to_string(), serde_json::json!(value.as_f64())))
                .collect::<serde_json::Map<String, serde_json::Value>>(),
        })
    }
}
