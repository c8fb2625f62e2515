//! Section router
//!
//! Five mutually exclusive sections; any unrecognised choice falls back to
//! the overall section.

use std::fmt;

use crate::logic::analytics::ChartKind;
use crate::logic::features::{schema_for, FeatureSchema, FormSpec, RelayId, SchemaKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Section {
    Relay(RelayId),
    #[default]
    Overall,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Relay(RelayId::R1),
        Section::Relay(RelayId::R2),
        Section::Relay(RelayId::R3),
        Section::Relay(RelayId::R4),
        Section::Overall,
    ];

    /// Map a selector choice (label or slug) to a section
    pub fn from_choice(choice: &str) -> Self {
        let choice = choice.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.label().eq_ignore_ascii_case(choice) || s.slug().eq_ignore_ascii_case(choice))
            .unwrap_or_default()
    }

    /// Exact slug lookup (URL paths)
    pub fn from_slug(slug: &str) -> Option<Self> {
        SchemaKey::from_slug(slug).map(Self::from)
    }

    /// Selector label
    pub fn label(self) -> &'static str {
        match self {
            Section::Relay(RelayId::R1) => "Relay1 Prediction",
            Section::Relay(RelayId::R2) => "Relay2 Prediction",
            Section::Relay(RelayId::R3) => "Relay3 Prediction",
            Section::Relay(RelayId::R4) => "Relay4 Prediction",
            Section::Overall => "Overall Relay Prediction",
        }
    }

    pub fn slug(self) -> &'static str {
        self.schema_key().slug()
    }

    /// Title used on the submit control and the result line
    pub fn title(self) -> &'static str {
        match self {
            Section::Relay(RelayId::R1) => "Relay 1",
            Section::Relay(RelayId::R2) => "Relay 2",
            Section::Relay(RelayId::R3) => "Relay 3",
            Section::Relay(RelayId::R4) => "Relay 4",
            Section::Overall => "Overall",
        }
    }

    /// Form key namespace
    pub fn namespace(self) -> &'static str {
        match self {
            Section::Relay(RelayId::R1) => "r1",
            Section::Relay(RelayId::R2) => "r2",
            Section::Relay(RelayId::R3) => "r3",
            Section::Relay(RelayId::R4) => "r4",
            Section::Overall => "overall",
        }
    }

    pub fn schema_key(self) -> SchemaKey {
        match self {
            Section::Relay(relay) => SchemaKey::Relay(relay),
            Section::Overall => SchemaKey::Overall,
        }
    }

    pub fn schema(self) -> &'static FeatureSchema {
        schema_for(self.schema_key())
    }

    /// Relay forms use whole-number status inputs; the overall form is all reals
    pub fn form(self) -> FormSpec {
        let integer_status = matches!(self, Section::Relay(_));
        FormSpec::new(self.schema(), self.namespace(), self.title(), integer_status)
    }

    /// Charts shown under the form
    pub fn charts(self) -> Vec<ChartKind> {
        match self {
            Section::Relay(relay) => vec![ChartKind::for_relay(relay)],
            Section::Overall => ChartKind::ALL.to_vec(),
        }
    }
}

impl From<SchemaKey> for Section {
    fn from(key: SchemaKey) -> Self {
        match key {
            SchemaKey::Relay(relay) => Section::Relay(relay),
            SchemaKey::Overall => Section::Overall,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
