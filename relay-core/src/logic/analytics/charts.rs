//! Analytics charts
//!
//! Each chart reads the analytics file itself and degrades to a warning on
//! its own: a missing column in one chart never blocks another.

use plotly::common::{Line, Mode};
use plotly::layout::{Axis, Layout};
use plotly::{Bar, Histogram, Plot, Scatter};

use super::dataset::{AnalyticsDataset, AnalyticsError, AnalyticsSource};
use super::density::{count_scaled_kde, histogram, sturges_bins};
use crate::logic::features::RelayId;

pub const MARKER_COLUMN: &str = "marker";
pub const FREQUENCY_COLUMN: &str = "R1:F";
pub const JOINT_X_COLUMN: &str = "R1-PA1:VH";
pub const JOINT_Y_COLUMN: &str = "R1-PM1:V";

/// Chart size (px), small like the dashboard's inline figures
const CHART_WIDTH: usize = 480;
const CHART_HEIGHT: usize = 320;

/// Result of one chart procedure
pub enum ChartOutcome {
    Rendered { caption: &'static str, plot: Box<Plot> },
    Warning(String),
}

impl ChartOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, ChartOutcome::Rendered { .. })
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            ChartOutcome::Warning(message) => Some(message),
            ChartOutcome::Rendered { .. } => None,
        }
    }
}

/// A chart with its optional heading (used by the combined view)
pub struct ChartPanel {
    pub kind: ChartKind,
    pub heading: Option<&'static str>,
    pub outcome: ChartOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Bar chart of `marker` category counts
    MarkerDistribution,
    /// Histogram + KDE of `R1:F`
    FrequencyHistogram,
    /// Mean `Rn-PM1:V` per relay
    VoltageMeans,
    /// `R1-PA1:VH` vs `R1-PM1:V` with marginals
    PhaseVoltageJoint,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::MarkerDistribution,
        ChartKind::FrequencyHistogram,
        ChartKind::VoltageMeans,
        ChartKind::PhaseVoltageJoint,
    ];

    /// The chart shown on a relay's own page
    pub fn for_relay(relay: RelayId) -> Self {
        match relay {
            RelayId::R1 => ChartKind::MarkerDistribution,
            RelayId::R2 => ChartKind::FrequencyHistogram,
            RelayId::R3 => ChartKind::VoltageMeans,
            RelayId::R4 => ChartKind::PhaseVoltageJoint,
        }
    }

    /// Heading in the combined view
    pub fn heading(self) -> &'static str {
        match self {
            ChartKind::MarkerDistribution => "1) Marker Distribution (Bar Chart)",
            ChartKind::FrequencyHistogram => "2) Histogram of R1:F",
            ChartKind::VoltageMeans => "3) Bar Chart of Average PM1:V per Relay",
            ChartKind::PhaseVoltageJoint => "4) Joint Plot: R1-PA1:VH vs R1-PM1:V",
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            ChartKind::MarkerDistribution => "Marker Distribution (Bar Chart)",
            ChartKind::FrequencyHistogram => "Histogram of R1:F",
            ChartKind::VoltageMeans => "Bar Chart: Average PM1:V per Relay",
            ChartKind::PhaseVoltageJoint => "Joint Plot: R1-PA1:VH vs R1-PM1:V",
        }
    }

    fn view_noun(self) -> &'static str {
        match self {
            ChartKind::MarkerDistribution => "the bar chart",
            ChartKind::FrequencyHistogram => "the histogram",
            ChartKind::VoltageMeans => "average PM1:V chart",
            ChartKind::PhaseVoltageJoint => "the joint plot",
        }
    }

    /// Read the dataset and build this chart, or a warning
    pub fn render(self, source: &AnalyticsSource) -> ChartOutcome {
        let file = source.display_name();

        let dataset = match source.load() {
            Ok(dataset) => dataset,
            Err(AnalyticsError::NotFound(path)) => {
                log::warn!("Analytics file missing: {}", path.display());
                return ChartOutcome::Warning(format!(
                    "{} not found. Provide the file to view {}.",
                    file,
                    self.view_noun()
                ));
            }
            Err(e) => {
                log::warn!("Analytics file unreadable: {}", e);
                return ChartOutcome::Warning(format!("{} could not be read: {}", file, e));
            }
        };

        let built = match self {
            ChartKind::MarkerDistribution => marker_distribution(&dataset, &file),
            ChartKind::FrequencyHistogram => frequency_histogram(&dataset, &file),
            ChartKind::VoltageMeans => voltage_means(&dataset, &file),
            ChartKind::PhaseVoltageJoint => phase_voltage_joint(&dataset, &file),
        };

        match built {
            Ok(plot) => ChartOutcome::Rendered {
                caption: self.caption(),
                plot: Box::new(plot),
            },
            Err(warning) => {
                log::debug!("{:?} skipped: {}", self, warning);
                ChartOutcome::Warning(warning)
            }
        }
    }

    pub fn panel(self, source: &AnalyticsSource, with_heading: bool) -> ChartPanel {
        ChartPanel {
            kind: self,
            heading: with_heading.then(|| self.heading()),
            outcome: self.render(source),
        }
    }
}

/// All four charts in fixed order, each under its heading
pub fn all_charts(source: &AnalyticsSource) -> Vec<ChartPanel> {
    ChartKind::ALL.iter().map(|kind| kind.panel(source, true)).collect()
}

// ============================================================================
// CHART BUILDERS
// ============================================================================

fn base_layout(title: &str) -> Layout {
    Layout::new().title(title).width(CHART_WIDTH).height(CHART_HEIGHT)
}

/// Category counts in order of first appearance; numeric categories sorted
pub fn category_counts(values: &[&str]) -> Vec<(String, u64)> {
    let mut counts: Vec<(String, u64)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(name, _)| name == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value.to_string(), 1)),
        }
    }

    let numeric: Option<Vec<f64>> = counts.iter().map(|(name, _)| name.parse::<f64>().ok()).collect();
    if let Some(keys) = numeric {
        let mut keyed: Vec<(f64, (String, u64))> = keys.into_iter().zip(counts).collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        counts = keyed.into_iter().map(|(_, entry)| entry).collect();
    }
    counts
}

fn marker_distribution(dataset: &AnalyticsDataset, file: &str) -> Result<Plot, String> {
    let markers = dataset
        .text_column(MARKER_COLUMN)
        .ok_or_else(|| format!("Column '{}' not found in {}.", MARKER_COLUMN, file))?;

    let (names, counts): (Vec<String>, Vec<u64>) = category_counts(&markers).into_iter().unzip();

    let mut plot = Plot::new();
    plot.add_trace(Bar::new(names, counts).name("count"));
    plot.set_layout(
        base_layout("Event Types Distribution")
            .x_axis(Axis::new().title(MARKER_COLUMN))
            .y_axis(Axis::new().title("count")),
    );
    Ok(plot)
}

fn frequency_histogram(dataset: &AnalyticsDataset, file: &str) -> Result<Plot, String> {
    let values = dataset
        .numeric_column(FREQUENCY_COLUMN)
        .ok_or_else(|| format!("Column '{}' not found in {}.", FREQUENCY_COLUMN, file))?;

    let mut plot = Plot::new();
    if let Some(bins) = histogram(&values, sturges_bins(values.len())) {
        plot.add_trace(
            Bar::new(bins.centers(), bins.counts.clone())
                .width(bins.width())
                .name("Count"),
        );
        if let Some((grid, density)) = count_scaled_kde(&values, &bins) {
            plot.add_trace(
                Scatter::new(grid, density)
                    .mode(Mode::Lines)
                    .name("KDE")
                    .line(Line::new().color("rgba(31, 119, 180, 1.0)")),
            );
        }
    }

    plot.set_layout(
        base_layout("R1:F Frequency")
            .bar_gap(0.0)
            .x_axis(Axis::new().title(FREQUENCY_COLUMN))
            .y_axis(Axis::new().title("Count")),
    );
    Ok(plot)
}

/// Mean of each relay's first voltage magnitude, for the columns present
pub fn relay_voltage_means(dataset: &AnalyticsDataset) -> Vec<(String, f64)> {
    RelayId::ALL
        .iter()
        .filter_map(|relay| {
            let values = dataset.numeric_column(&format!("{}-PM1:V", relay.prefix()))?;
            if values.is_empty() {
                return None;
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            Some((relay.prefix(), mean))
        })
        .collect()
}

fn voltage_means(dataset: &AnalyticsDataset, file: &str) -> Result<Plot, String> {
    let means = relay_voltage_means(dataset);
    if means.is_empty() {
        return Err(format!("Required PM1:V columns not found in {}.", file));
    }

    let (relays, values): (Vec<String>, Vec<f64>) = means.into_iter().unzip();

    let mut plot = Plot::new();
    plot.add_trace(Bar::new(relays, values).name("mean PM1:V"));
    plot.set_layout(base_layout("PM1:V by Relay"));
    Ok(plot)
}

fn phase_voltage_joint(dataset: &AnalyticsDataset, file: &str) -> Result<Plot, String> {
    let pairs = dataset
        .numeric_pairs(JOINT_X_COLUMN, JOINT_Y_COLUMN)
        .ok_or_else(|| {
            format!(
                "Columns '{}' or '{}' not found in {}.",
                JOINT_X_COLUMN, JOINT_Y_COLUMN, file
            )
        })?;

    let (x, y): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(x.clone(), y.clone())
            .mode(Mode::Markers)
            .name("samples"),
    );
    // Marginal distributions above and to the right of the scatter
    plot.add_trace(Histogram::new(x).name(JOINT_X_COLUMN).x_axis("x").y_axis("y2"));
    plot.add_trace(Histogram::new_vertical(y).name(JOINT_Y_COLUMN).x_axis("x2").y_axis("y"));

    plot.set_layout(
        Layout::new()
            .title("R1-PA1:VH vs R1-PM1:V")
            .width(CHART_HEIGHT + 40)
            .height(CHART_HEIGHT + 40)
            .show_legend(false)
            .bar_gap(0.0)
            .x_axis(Axis::new().title(JOINT_X_COLUMN).domain(&[0.0, 0.8]))
            .y_axis(Axis::new().title(JOINT_Y_COLUMN).domain(&[0.0, 0.8]))
            .x_axis2(Axis::new().domain(&[0.82, 1.0]).anchor("y").show_tick_labels(false))
            .y_axis2(Axis::new().domain(&[0.82, 1.0]).anchor("x").show_tick_labels(false)),
    );
    Ok(plot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const FULL: &str = "\
marker,R1:F,R1-PA1:VH,R1-PM1:V,R2-PM1:V,R3-PM1:V,R4-PM1:V
Natural,60.00,-10.5,131000,130000,129000,128000
Attack,59.98,12.0,130000,131000,,127000
Attack,60.02,8.5,129500,,,126000
";

    fn write(dir: &Path, contents: &str) -> AnalyticsSource {
        let path = dir.join("analytics.csv");
        std::fs::write(&path, contents).unwrap();
        AnalyticsSource::new(path)
    }

    #[test]
    fn test_all_charts_render_with_full_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let source = write(dir.path(), FULL);
        let panels = all_charts(&source);
        assert_eq!(panels.len(), 4);
        for panel in &panels {
            assert!(panel.outcome.is_rendered(), "{:?} should render", panel.kind);
        }
        let headings: Vec<_> = panels.iter().map(|p| p.heading.unwrap()).collect();
        assert_eq!(
            headings,
            vec![
                "1) Marker Distribution (Bar Chart)",
                "2) Histogram of R1:F",
                "3) Bar Chart of Average PM1:V per Relay",
                "4) Joint Plot: R1-PA1:VH vs R1-PM1:V",
            ]
        );
    }

    #[test]
    fn test_missing_file_warns_per_chart() {
        let dir = tempfile::tempdir().unwrap();
        let source = AnalyticsSource::new(dir.path().join("analytics.csv"));

        let expected = [
            "analytics.csv not found. Provide the file to view the bar chart.",
            "analytics.csv not found. Provide the file to view the histogram.",
            "analytics.csv not found. Provide the file to view average PM1:V chart.",
            "analytics.csv not found. Provide the file to view the joint plot.",
        ];
        for (kind, message) in ChartKind::ALL.iter().zip(expected) {
            assert_eq!(kind.render(&source).warning(), Some(message));
        }
    }

    #[test]
    fn test_missing_marker_column() {
        let dir = tempfile::tempdir().unwrap();
        let source = write(dir.path(), "R1:F\n60.0\n");
        let outcome = ChartKind::MarkerDistribution.render(&source);
        assert_eq!(outcome.warning(), Some("Column 'marker' not found in analytics.csv."));
        // the other column is still there for its own chart
        assert!(ChartKind::FrequencyHistogram.render(&source).is_rendered());
    }

    #[test]
    fn test_missing_frequency_column() {
        let dir = tempfile::tempdir().unwrap();
        let source = write(dir.path(), "marker\nAttack\n");
        let outcome = ChartKind::FrequencyHistogram.render(&source);
        assert_eq!(outcome.warning(), Some("Column 'R1:F' not found in analytics.csv."));
        assert!(ChartKind::MarkerDistribution.render(&source).is_rendered());
    }

    #[test]
    fn test_missing_voltage_columns() {
        let dir = tempfile::tempdir().unwrap();
        let source = write(dir.path(), "marker,R1:F\nAttack,60\n");
        let outcome = ChartKind::VoltageMeans.render(&source);
        assert_eq!(outcome.warning(), Some("Required PM1:V columns not found in analytics.csv."));
    }

    #[test]
    fn test_missing_joint_columns() {
        let dir = tempfile::tempdir().unwrap();
        let source = write(dir.path(), "R1-PA1:VH\n1.0\n");
        let outcome = ChartKind::PhaseVoltageJoint.render(&source);
        assert_eq!(
            outcome.warning(),
            Some("Columns 'R1-PA1:VH' or 'R1-PM1:V' not found in analytics.csv.")
        );
    }

    #[test]
    fn test_partial_dataset_degrades_independently() {
        let dir = tempfile::tempdir().unwrap();
        let source = write(dir.path(), "marker,R3-PM1:V\nNatural,1.0\n");
        let rendered: Vec<bool> = all_charts(&source).iter().map(|p| p.outcome.is_rendered()).collect();
        assert_eq!(rendered, vec![true, false, true, false]);
    }

    #[test]
    fn test_relay_voltage_means() {
        let ds = AnalyticsDataset::from_reader(FULL.as_bytes()).unwrap();
        let means = relay_voltage_means(&ds);
        assert_eq!(means.len(), 4);
        assert_eq!(means[0].0, "R1");
        assert!((means[0].1 - 390_500.0 / 3.0).abs() < 1e-6);
        assert_eq!(means[1], ("R2".to_string(), 130_500.0));
        assert_eq!(means[2], ("R3".to_string(), 129_000.0));
        assert_eq!(means[3], ("R4".to_string(), 127_000.0));
    }

    #[test]
    fn test_category_counts_order() {
        let counts = category_counts(&["Natural", "Attack", "Attack", "NoEvent"]);
        assert_eq!(
            counts,
            vec![
                ("Natural".to_string(), 1),
                ("Attack".to_string(), 2),
                ("NoEvent".to_string(), 1),
            ]
        );

        let numeric = category_counts(&["41", "1", "7", "1"]);
        let keys: Vec<&str> = numeric.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["1", "7", "41"]);
    }

    #[test]
    fn test_relay_chart_mapping() {
        assert_eq!(ChartKind::for_relay(RelayId::R1), ChartKind::MarkerDistribution);
        assert_eq!(ChartKind::for_relay(RelayId::R2), ChartKind::FrequencyHistogram);
        assert_eq!(ChartKind::for_relay(RelayId::R3), ChartKind::VoltageMeans);
        assert_eq!(ChartKind::for_relay(RelayId::R4), ChartKind::PhaseVoltageJoint);
    }
}
