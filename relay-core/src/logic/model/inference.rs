//! Inference Engine - ONNX Runtime Integration
//!
//! Loads exported relay classifiers and runs single-row predictions.
//! Raw label `0` means a natural event; anything else is an attack.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::logic::features::InputRecord;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, thiserror::Error)]
#[error("InferenceError: {0}")]
pub struct InferenceError(pub String);

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Two-valued classifier verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionLabel {
    Natural,
    Attack,
}

impl PredictionLabel {
    pub fn from_raw(raw: i64) -> Self {
        if raw == 0 {
            PredictionLabel::Natural
        } else {
            PredictionLabel::Attack
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PredictionLabel::Natural => "Natural",
            PredictionLabel::Attack => "Attack",
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prediction output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionOutcome {
    /// Section title, e.g. "Relay 1"
    pub title: String,
    pub label: PredictionLabel,
    pub raw: i64,
    pub inference_time_us: u64, // Microseconds
}

impl PredictionOutcome {
    /// "Relay 1 Prediction: Attack"
    pub fn message(&self) -> String {
        format!("{} Prediction: {}", self.title, self.label)
    }
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Opaque single-row classifier (ONNX, test stubs, etc.)
pub trait Classifier: Send + Sync {
    /// Predict the raw class label of a `1 x n` row
    fn predict_one(&self, row: &Array2<f32>) -> Result<i64, InferenceError>;

    /// Where the classifier came from, for logs and status
    fn describe(&self) -> String;
}

/// Run a classifier on a record and map the raw label
pub fn predict(
    classifier: &dyn Classifier,
    title: &str,
    record: &InputRecord,
) -> Result<PredictionOutcome, InferenceError> {
    let start_time = std::time::Instant::now();

    let row = record.to_row();
    let raw = classifier.predict_one(&row)?;
    let label = PredictionLabel::from_raw(raw);
    let inference_time = start_time.elapsed().as_micros() as u64;

    log::debug!(
        "{} prediction: raw={} label={} ({}us, {} features)",
        title,
        raw,
        label,
        inference_time,
        record.len()
    );

    Ok(PredictionOutcome {
        title: title.to_string(),
        label,
        raw,
        inference_time_us: inference_time,
    })
}

// ============================================================================
// LATENCY STATS
// ============================================================================

/// Per-classifier latency stats
#[derive(Debug, Default)]
pub struct InferenceStats {
    latency_sum_us: AtomicU64,
    count: AtomicU64,
}

impl InferenceStats {
    pub fn record(&self, inference_time_us: u64) {
        self.latency_sum_us.fetch_add(inference_time_us, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn avg_latency_ms(&self) -> f32 {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.count();
        if count > 0 {
            (sum as f32 / count as f32) / 1000.0
        } else {
            0.0
        }
    }
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

/// Classifier exported to ONNX (sklearn / XGBoost converters).
/// The first output is the int64 label tensor.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    output_name: String,
    path: PathBuf,
}

impl OnnxClassifier {
    /// Load ONNX model from file
    pub fn load(model_path: &Path) -> Result<Self, InferenceError> {
        log::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(InferenceError(format!("Model not found: {}", model_path.display())));
        }

        let session = Session::builder()
            .map_err(|e| InferenceError(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| InferenceError(format!("Failed to load model: {}", e)))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError("No output defined".to_string()))?;

        log::info!("ONNX model loaded: {} (label output '{}')", model_path.display(), output_name);

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            path: model_path.to_path_buf(),
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict_one(&self, row: &Array2<f32>) -> Result<i64, InferenceError> {
        let input_tensor = Value::from_array(row.clone())
            .map_err(|e| InferenceError(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| InferenceError("No output".to_string()))?;

        let (_, labels) = output
            .try_extract_tensor::<i64>()
            .map_err(|e| InferenceError(format!("Extract error: {}", e)))?;

        labels
            .first()
            .copied()
            .ok_or_else(|| InferenceError("Empty label tensor".to_string()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
