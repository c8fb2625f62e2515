//! Dashboard State Machine
//!
//! One `SessionContext` per browser session. `apply` is the only mutation
//! path; `view` derives everything the page shows from state plus the
//! analytics file.

use serde::Serialize;

use super::accumulator::SessionAccumulator;
use super::section::Section;
use crate::logic::analytics::{all_charts, AnalyticsSource, ChartPanel};
use crate::logic::features::{FormSpec, InputRecord};
use crate::logic::model::{InferenceError, ModelRegistry, PredictionOutcome};

/// Events that move the dashboard
#[derive(Debug, Clone)]
pub enum Transition {
    /// Selector changed; values reset to the new section's defaults
    ChangeSection(Section),
    /// Form submitted; the record's schema decides the section
    Submit(InputRecord),
}

/// Selected section, current form values and last prediction
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub section: Section,
    pub values: InputRecord,
    pub outcome: Option<PredictionOutcome>,
}

impl DashboardState {
    pub fn new(section: Section) -> Self {
        Self {
            section,
            values: section.form().defaults(),
            outcome: None,
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(Section::default())
    }
}

/// Per-session state plus the overall accumulator
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    state: DashboardState,
    accumulator: SessionAccumulator,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn accumulator(&self) -> &SessionAccumulator {
        &self.accumulator
    }

    pub fn section(&self) -> Section {
        self.state.section
    }

    /// Apply a transition. A failed prediction leaves the state untouched.
    pub fn apply(&mut self, transition: Transition, models: &ModelRegistry) -> Result<(), InferenceError> {
        match transition {
            Transition::ChangeSection(section) => {
                if section != self.state.section {
                    log::debug!("Section changed: {} -> {}", self.state.section, section);
                    self.state = DashboardState::new(section);
                }
                Ok(())
            }
            Transition::Submit(record) => {
                let section = Section::from(record.key());
                log::debug!("{} submission: {}", section.title(), record.to_log_entry());
                let outcome = models.predict(section.title(), &record)?;
                log::info!("{}", outcome.message());

                if section == Section::Overall {
                    if let Err(e) = self.accumulator.push(&record) {
                        log::warn!("Row not accumulated: {}", e);
                    }
                }

                self.state = DashboardState {
                    section,
                    values: record,
                    outcome: Some(outcome),
                };
                Ok(())
            }
        }
    }

    /// Everything the page shows for the current state
    pub fn view(&self, source: &AnalyticsSource) -> DashboardView {
        let section = self.state.section;
        let charts = match section {
            Section::Relay(_) => section
                .charts()
                .into_iter()
                .map(|kind| kind.panel(source, false))
                .collect(),
            Section::Overall => all_charts(source),
        };

        DashboardView {
            section,
            form: section.form(),
            values: self.state.values.clone(),
            outcome: self.state.outcome.clone(),
            echo: (section == Section::Overall).then(|| self.state.values.clone()),
            accumulated_rows: self.accumulator.len(),
            charts,
        }
    }
}

/// Render-ready snapshot of one session
pub struct DashboardView {
    pub section: Section,
    pub form: FormSpec,
    pub values: InputRecord,
    pub outcome: Option<PredictionOutcome>,
    /// Current overall values shown as a one-row table
    pub echo: Option<InputRecord>,
    pub accumulated_rows: usize,
    pub charts: Vec<ChartPanel>,
}

/// Short JSON summary of a view, for logs and the API
#[derive(Debug, Clone, Serialize)]
pub struct ViewSummary {
    pub section: &'static str,
    pub outcome: Option<String>,
    pub accumulated_rows: usize,
    pub rendered_charts: usize,
    pub warnings: Vec<String>,
}

impl DashboardView {
    pub fn summary(&self) -> ViewSummary {
        ViewSummary {
            section: self.section.slug(),
            outcome: self.outcome.as_ref().map(PredictionOutcome::message),
            accumulated_rows: self.accumulated_rows,
            rendered_charts: self.charts.iter().filter(|p| p.outcome.is_rendered()).count(),
            warnings: self
                .charts
                .iter()
                .filter_map(|p| p.outcome.warning().map(str::to_string))
                .collect(),
        }
    }
}
