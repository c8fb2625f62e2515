//! Logic Module
//!
//! - `features`: schema registry, input records, form specs
//! - `model`: classifier loading and single-row inference
//! - `analytics`: descriptive charts over the analytics file
//! - `dashboard`: section router and per-session state machine

pub mod analytics;
pub mod dashboard;
pub mod features;
pub mod model;
