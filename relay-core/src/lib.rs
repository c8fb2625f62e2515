//! Relay Guard Core
//!
//! Feature schemas, classifier loading, prediction and analytics charts
//! for the relay attack detection dashboard.
//!
//! ```text
//!  section choice ──► Section ──► FormSpec ──► InputRecord ──► Classifier ──► Attack / Natural
//!                        │
//!                        └──────► ChartKind ──► analytics.csv ──► Plot / Warning
//! ```

pub mod constants;
pub mod logic;

pub use logic::analytics::{AnalyticsSource, ChartKind, ChartOutcome, ChartPanel};
pub use logic::dashboard::{DashboardView, Section, SessionContext, Transition};
pub use logic::features::{FeatureSchema, InputRecord, InputValue, RelayId, SchemaKey};
pub use logic::model::{Classifier, ModelRegistry, PredictionLabel, PredictionOutcome};
