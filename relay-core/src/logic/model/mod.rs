//! Model Module - Classifier Loading & Inference
//!
//! Each schema is bound to exactly one classifier.
//! The `Classifier` trait keeps ONNX swappable for stubs in tests.

pub mod inference;
pub mod registry;

// Re-export common types
pub use inference::{Classifier, InferenceError, OnnxClassifier, PredictionLabel, PredictionOutcome};
pub use registry::{LoadedModel, ModelError, ModelMetadata, ModelRegistry, ModelStatus};
