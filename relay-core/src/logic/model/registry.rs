//! Model Registry - the five classifiers, one per schema
//!
//! Loading is all-or-nothing: every section needs a classifier, so a missing
//! or unreadable artifact aborts startup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::inference::{predict, Classifier, InferenceError, InferenceStats, OnnxClassifier, PredictionOutcome};
use crate::constants::{artifact_name, manifest_name};
use crate::logic::features::{schema_for, FeatureSchema, InputRecord, LayoutMismatchError, RelayId, SchemaKey};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to load model {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Failed to read feature manifest {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),
}

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub schema: String,
    pub source: String,
    pub feature_count: usize,
    pub layout_hash: u32,
    /// A training manifest was found and matched
    pub manifest_verified: bool,
    pub loaded_at: DateTime<Utc>,
}

/// Model status for the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    #[serde(flatten)]
    pub metadata: ModelMetadata,
    pub inference_count: u64,
    pub avg_latency_ms: f32,
}

/// A classifier bound to its schema
pub struct LoadedModel {
    classifier: Arc<dyn Classifier>,
    schema: &'static FeatureSchema,
    metadata: ModelMetadata,
    stats: InferenceStats,
}

impl LoadedModel {
    fn new(key: SchemaKey, classifier: Arc<dyn Classifier>, manifest_verified: bool) -> Self {
        let schema = schema_for(key);
        let metadata = ModelMetadata {
            schema: key.slug().to_string(),
            source: classifier.describe(),
            feature_count: schema.len(),
            layout_hash: schema.layout_hash(),
            manifest_verified,
            loaded_at: Utc::now(),
        };
        Self {
            classifier,
            schema,
            metadata,
            stats: InferenceStats::default(),
        }
    }

    pub fn schema(&self) -> &'static FeatureSchema {
        self.schema
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            metadata: self.metadata.clone(),
            inference_count: self.stats.count(),
            avg_latency_ms: self.stats.avg_latency_ms(),
        }
    }
}

/// The five classifiers, read-only after load
pub struct ModelRegistry {
    relays: [LoadedModel; 4],
    overall: LoadedModel,
}

impl ModelRegistry {
    /// Load all five ONNX artifacts from `dir`
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        log::info!("Loading classifiers from {}", dir.display());

        let registry = Self {
            relays: [
                load_one(dir, SchemaKey::Relay(RelayId::R1))?,
                load_one(dir, SchemaKey::Relay(RelayId::R2))?,
                load_one(dir, SchemaKey::Relay(RelayId::R3))?,
                load_one(dir, SchemaKey::Relay(RelayId::R4))?,
            ],
            overall: load_one(dir, SchemaKey::Overall)?,
        };

        for key in SchemaKey::ALL {
            let metadata = registry.get(key).metadata();
            log::info!(
                "{} -> {} ({} features, layout {:08x}, manifest verified: {})",
                metadata.schema,
                metadata.source,
                metadata.feature_count,
                metadata.layout_hash,
                metadata.manifest_verified
            );
        }
        log::info!("All {} classifiers loaded", SchemaKey::ALL.len());
        Ok(registry)
    }

    /// Registry over arbitrary classifiers (relay1..relay4, overall)
    pub fn from_classifiers(relays: [Arc<dyn Classifier>; 4], overall: Arc<dyn Classifier>) -> Self {
        let [c1, c2, c3, c4] = relays;
        Self {
            relays: [
                LoadedModel::new(SchemaKey::Relay(RelayId::R1), c1, false),
                LoadedModel::new(SchemaKey::Relay(RelayId::R2), c2, false),
                LoadedModel::new(SchemaKey::Relay(RelayId::R3), c3, false),
                LoadedModel::new(SchemaKey::Relay(RelayId::R4), c4, false),
            ],
            overall: LoadedModel::new(SchemaKey::Overall, overall, false),
        }
    }

    pub fn get(&self, key: SchemaKey) -> &LoadedModel {
        match key {
            SchemaKey::Relay(relay) => &self.relays[usize::from(relay.number() - 1)],
            SchemaKey::Overall => &self.overall,
        }
    }

    /// Predict with the classifier bound to the record's schema
    pub fn predict(&self, title: &str, record: &InputRecord) -> Result<PredictionOutcome, InferenceError> {
        let model = self.get(record.key());
        let outcome = predict(model.classifier.as_ref(), title, record)?;
        model.stats.record(outcome.inference_time_us);
        Ok(outcome)
    }

    pub fn status(&self) -> Vec<ModelStatus> {
        SchemaKey::ALL.iter().map(|key| self.get(*key).status()).collect()
    }
}

fn load_one(dir: &Path, key: SchemaKey) -> Result<LoadedModel, ModelError> {
    let path = dir.join(artifact_name(key));
    if !path.exists() {
        log::error!("Classifier for {} missing: {}", key, path.display());
        return Err(ModelError::NotFound(path));
    }

    let manifest_verified = check_manifest(&path, schema_for(key))?;
    if !manifest_verified {
        log::warn!("No feature manifest for {}; layout cannot be verified", path.display());
    }

    let classifier = OnnxClassifier::load(&path).map_err(|e| ModelError::Load {
        path: path.clone(),
        reason: e.0,
    })?;

    Ok(LoadedModel::new(key, Arc::new(classifier), manifest_verified))
}

/// Compare `<stem>.features.json` (training column order) with the schema.
/// Returns `Ok(false)` when no manifest exists.
pub fn check_manifest(artifact: &Path, schema: &FeatureSchema) -> Result<bool, ModelError> {
    let file_name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let manifest = artifact.with_file_name(manifest_name(&file_name));

    if !manifest.exists() {
        return Ok(false);
    }

    let contents = std::fs::read_to_string(&manifest).map_err(|e| ModelError::Manifest {
        path: manifest.clone(),
        reason: e.to_string(),
    })?;
    let names: Vec<String> = serde_json::from_str(&contents).map_err(|e| ModelError::Manifest {
        path: manifest.clone(),
        reason: e.to_string(),
    })?;

    schema.validate_names(&names)?;
    log::info!("Feature manifest verified: {}", manifest.display());
    Ok(true)
}
