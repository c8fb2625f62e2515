//! Central Configuration Constants
//!
//! Single source of truth for artifact names and defaults.
//! To rename a classifier artifact, only edit this file.

use crate::logic::features::{RelayId, SchemaKey};

/// Relay 1 classifier (XGBoost)
pub const RELAY1_MODEL_FILE: &str = "xgboost.onnx";

/// Relay 2 classifier (random forest)
pub const RELAY2_MODEL_FILE: &str = "random_forest_model.onnx";

/// Relay 3 classifier (random forest)
pub const RELAY3_MODEL_FILE: &str = "random_forest_model_3.onnx";

/// Relay 4 classifier (random forest)
pub const RELAY4_MODEL_FILE: &str = "random_forest_model_4.onnx";

/// Overall classifier (XGBoost over all relays)
pub const OVERALL_MODEL_FILE: &str = "xgboost_overall_model.onnx";

/// Suffix of the optional training-layout manifest next to each artifact
pub const MANIFEST_SUFFIX: &str = ".features.json";

/// Default analytics dataset
pub const DEFAULT_ANALYTICS_FILE: &str = "analytics.csv";

/// Maximum rows kept in a session accumulator
pub const ACCUMULATOR_CAPACITY: usize = 10_000;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Relay Input & Analytics Dashboard";

/// Artifact file name bound to a schema
pub fn artifact_name(key: SchemaKey) -> &'static str {
    match key {
        SchemaKey::Relay(RelayId::R1) => RELAY1_MODEL_FILE,
        SchemaKey::Relay(RelayId::R2) => RELAY2_MODEL_FILE,
        SchemaKey::Relay(RelayId::R3) => RELAY3_MODEL_FILE,
        SchemaKey::Relay(RelayId::R4) => RELAY4_MODEL_FILE,
        SchemaKey::Overall => OVERALL_MODEL_FILE,
    }
}

/// Manifest file name for an artifact (`xgboost.onnx` -> `xgboost.features.json`)
pub fn manifest_name(artifact: &str) -> String {
    let stem = artifact.strip_suffix(".onnx").unwrap_or(artifact);
    format!("{}{}", stem, MANIFEST_SUFFIX)
}
