//! Analytics Module - descriptive charts over the analytics file

pub mod charts;
pub mod dataset;
pub mod density;

pub use charts::{all_charts, ChartKind, ChartOutcome, ChartPanel};
pub use dataset::{AnalyticsDataset, AnalyticsError, AnalyticsSource};
