//! HTML rendering (maud)

use maud::{html, Markup, PreEscaped, DOCTYPE};
use relay_core::constants::APP_NAME;
use relay_core::logic::features::{FeatureKind, FormField, InputRecord};
use relay_core::{ChartOutcome, ChartPanel, DashboardView, Section};

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

const STYLE: &str = "
body { font-family: sans-serif; margin: 0; display: flex; }
nav { width: 16rem; padding: 1rem; background: #f0f2f6; min-height: 100vh; }
main { flex: 1; padding: 1rem 2rem; }
.fields { display: grid; grid-template-columns: repeat(auto-fill, minmax(12rem, 1fr)); gap: 0.5rem 1rem; }
.fields label { display: block; font-size: 0.85rem; }
.fields input { width: 100%; }
.success { background: #d4edda; color: #155724; padding: 0.75rem; margin: 1rem 0; }
.warning { background: #fff3cd; color: #856404; padding: 0.75rem; margin: 1rem 0; }
.echo { overflow-x: auto; }
.echo table { border-collapse: collapse; font-size: 0.8rem; }
.echo td, .echo th { border: 1px solid #ccc; padding: 0.2rem 0.4rem; white-space: nowrap; }
";

/// Full dashboard page for one session view
pub fn page(view: &DashboardView) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (APP_NAME) }
                script src=(PLOTLY_JS) {}
                style { (PreEscaped(STYLE)) }
            }
            body {
                (sidebar(view.section))
                main {
                    h1 { (APP_NAME) }
                    (intro())
                    h2 { (section_heading(view.section)) }
                    @if view.section == Section::Overall {
                        p { "Enter all overall features for prediction. Ensure all fields are completed." }
                    }
                    (form(view))
                    @if let Some(outcome) = &view.outcome {
                        div.success { (outcome.title) " Prediction: " strong { (outcome.label.as_str()) } }
                    }
                    @if let Some(echo) = &view.echo {
                        (echo_table(echo, view.accumulated_rows))
                        h2 { "Analytics (All 4 Graphs)" }
                    }
                    @for (index, panel) in view.charts.iter().enumerate() {
                        (chart(index, panel))
                    }
                }
            }
        }
    }
}

fn intro() -> Markup {
    html! {
        p { "This application provides five sections:" }
        ol {
            @for section in Section::ALL {
                li {
                    (section.label()) ": "
                    (section.charts().iter().map(|kind| kind.caption()).collect::<Vec<_>>().join(", "))
                }
            }
        }
    }
}

fn section_heading(section: Section) -> &'static str {
    match section {
        Section::Relay(_) => section.title(),
        Section::Overall => section.label(),
    }
}

fn sidebar(current: Section) -> Markup {
    html! {
        nav {
            form method="get" action="/" {
                p { strong { "Choose an option" } }
                @for section in Section::ALL {
                    label {
                        input type="radio" name="section" value=(section.slug())
                            checked[section == current] onchange="this.form.submit()";
                        " " (section.label())
                    }
                    br;
                }
                noscript { button type="submit" { "Go" } }
            }
        }
    }
}

fn form(view: &DashboardView) -> Markup {
    let action = format!("/predict/{}", view.section.slug());
    html! {
        form method="post" action=(action) {
            div.fields {
                @for (field, value) in view.form.fields().iter().zip(view.values.values()) {
                    (number_input(field, &value.to_string()))
                }
            }
            p { button type="submit" { (view.form.submit_label()) } }
        }
    }
}

fn number_input(field: &FormField, value: &str) -> Markup {
    let step = match (field.kind, field.step) {
        (FeatureKind::Integer, Some(step)) => step.to_string(),
        _ => "any".to_string(),
    };
    html! {
        div {
            label for=(field.key) { (field.label) }
            input type="number" id=(field.key) name=(field.key) value=(value) step=(step);
        }
    }
}

fn echo_table(record: &InputRecord, accumulated_rows: usize) -> Markup {
    html! {
        h3 { "Overall Input Data" }
        div.echo {
            table {
                tr {
                    @for (name, _) in record.iter() {
                        th { (name) }
                    }
                }
                tr {
                    @for (_, value) in record.iter() {
                        td { (value.to_string()) }
                    }
                }
            }
        }
        p {
            "Predicted overall rows this session: " (accumulated_rows)
            @if accumulated_rows > 0 {
                " (" a href="/session/overall.csv" { "download CSV" } ")"
            }
        }
    }
}

fn chart(index: usize, panel: &ChartPanel) -> Markup {
    let div_id = format!("chart-{}", index);
    html! {
        section {
            @if let Some(heading) = panel.heading {
                h3 { (heading) }
            }
            @match &panel.outcome {
                ChartOutcome::Rendered { caption, plot } => {
                    @if panel.heading.is_none() {
                        p { strong { (caption) } }
                    }
                    (PreEscaped(plot.to_inline_html(Some(div_id.as_str()))))
                }
                ChartOutcome::Warning(message) => {
                    div.warning { (message) }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::stub_registry;
    use relay_core::{AnalyticsSource, RelayId, SessionContext, Transition};

    fn render(ctx: &SessionContext) -> String {
        let dir = tempfile::tempdir().unwrap();
        let source = AnalyticsSource::new(dir.path().join("analytics.csv"));
        page(&ctx.view(&source)).into_string()
    }

    #[test]
    fn test_overall_page() {
        let html = render(&SessionContext::new());
        assert!(html.contains("Overall Relay Prediction"));
        assert!(html.contains(r#"action="/predict/overall""#));
        assert!(html.contains(r#"name="overall_R1:F""#));
        assert!(html.contains("Predict Overall"));
        assert!(html.contains("Overall Input Data"));
        assert!(html.contains("analytics.csv not found. Provide the file to view the joint plot."));
        assert!(!html.contains("download CSV"));
    }

    #[test]
    fn test_relay_page_steps() {
        let models = stub_registry(0);
        let mut ctx = SessionContext::new();
        ctx.apply(Transition::ChangeSection(Section::Relay(RelayId::R1)), &models).unwrap();

        let html = render(&ctx);
        assert!(html.contains("<h2>Relay 1</h2>"));
        assert!(html.contains(r#"name="r1_R1:S" value="0" step="1""#));
        assert!(html.contains(r#"name="r1_R1:F" value="0.0" step="any""#));
        assert!(!html.contains("Overall Input Data"));
        assert!(html.contains("Provide the file to view the bar chart."));
    }

    #[test]
    fn test_intro_lists_each_section_charts() {
        let html = render(&SessionContext::new());
        assert!(html.contains("<li>Relay1 Prediction: Marker Distribution (Bar Chart)</li>"));
        assert!(html.contains("<li>Relay2 Prediction: Histogram of R1:F</li>"));
        assert!(html.contains("<li>Relay4 Prediction: Joint Plot: R1-PA1:VH vs R1-PM1:V</li>"));
        assert!(html.contains(
            "<li>Overall Relay Prediction: Marker Distribution (Bar Chart), Histogram of R1:F, \
             Bar Chart: Average PM1:V per Relay, Joint Plot: R1-PA1:VH vs R1-PM1:V</li>"
        ));
    }

    #[test]
    fn test_outcome_message() {
        let models = stub_registry(1);
        let mut ctx = SessionContext::new();
        let record = Section::Relay(RelayId::R3).form().defaults();
        ctx.apply(Transition::Submit(record), &models).unwrap();

        let html = render(&ctx);
        assert!(html.contains("Relay 3 Prediction: <strong>Attack</strong>"));
    }
}
