//! Feature Layout - Relay Schema Registry
//!
//! **CRITICAL: This file controls the feature schemas**
//!
//! Every classifier was trained on exactly one of these layouts. Order and
//! membership must match the training frame; a mismatch still produces a
//! label, just a wrong one.
//!
//! ## Rules (NEVER break these):
//! 1. Add/remove/reorder a relay channel → increment FEATURE_VERSION
//! 2. Change the overall exclusion rule → increment FEATURE_VERSION
//! 3. Re-export the overall model after any per-relay change

use std::fmt;

use crc32fast::Hasher;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

/// Number of monitored relays
pub const RELAY_COUNT: usize = 4;

/// Phasor channels per relay (angle + magnitude each)
pub const PHASOR_CHANNELS: u8 = 12;

/// Fields per relay schema: 12 angle/magnitude pairs + F, DF, PA:Z, PA:ZH, S
pub const RELAY_FEATURE_COUNT: usize = PHASOR_CHANNELS as usize * 2 + 5;

/// Fields in the overall schema: all relays + one log field per relay - exclusion
pub const OVERALL_FEATURE_COUNT: usize = RELAY_COUNT * RELAY_FEATURE_COUNT + RELAY_COUNT - 1;

/// Suffix marking the integer-like relay status field
pub const STATUS_SUFFIX: &str = ":S";

/// The overall model was trained without relay 2's status field
pub const EXCLUDED_FROM_OVERALL: &str = "R2:S";

// ============================================================================
// KEYS
// ============================================================================

/// A monitored relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayId {
    R1,
    R2,
    R3,
    R4,
}

impl RelayId {
    pub const ALL: [RelayId; RELAY_COUNT] = [RelayId::R1, RelayId::R2, RelayId::R3, RelayId::R4];

    /// 1-based relay number
    pub fn number(self) -> u8 {
        match self {
            RelayId::R1 => 1,
            RelayId::R2 => 2,
            RelayId::R3 => 3,
            RelayId::R4 => 4,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    /// Column prefix, e.g. `R1`
    pub fn prefix(self) -> String {
        format!("R{}", self.number())
    }
}

/// Identifies one of the five schemas (and the classifier bound to it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKey {
    Relay(RelayId),
    Overall,
}

impl SchemaKey {
    pub const ALL: [SchemaKey; 5] = [
        SchemaKey::Relay(RelayId::R1),
        SchemaKey::Relay(RelayId::R2),
        SchemaKey::Relay(RelayId::R3),
        SchemaKey::Relay(RelayId::R4),
        SchemaKey::Overall,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            SchemaKey::Relay(RelayId::R1) => "relay1",
            SchemaKey::Relay(RelayId::R2) => "relay2",
            SchemaKey::Relay(RelayId::R3) => "relay3",
            SchemaKey::Relay(RelayId::R4) => "relay4",
            SchemaKey::Overall => "overall",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.slug() == slug)
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

/// How a field is entered and defaulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    /// Whole-number field (relay status)
    Integer,
    Real,
}

impl FeatureKind {
    pub fn for_name(name: &str) -> Self {
        if name.ends_with(STATUS_SUFFIX) {
            FeatureKind::Integer
        } else {
            FeatureKind::Real
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
}

/// Ordered, immutable feature layout a classifier expects
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    key: SchemaKey,
    features: Vec<FeatureSpec>,
}

impl FeatureSchema {
    fn from_names(key: SchemaKey, names: Vec<String>) -> Self {
        let features = names
            .into_iter()
            .map(|name| FeatureSpec { kind: FeatureKind::for_name(&name), name })
            .collect();
        Self { key, features }
    }

    pub fn key(&self) -> SchemaKey {
        self.key
    }

    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.features.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Get feature index by name (O(n) but schemas are small)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f.name == name)
    }

    /// CRC32 over version + ordered names
    pub fn layout_hash(&self) -> u32 {
        compute_layout_hash(self.names())
    }

    pub fn layout_info(&self) -> LayoutInfo {
        LayoutInfo {
            key: self.key.slug().to_string(),
            version: FEATURE_VERSION,
            hash: self.layout_hash(),
            feature_count: self.len(),
            feature_names: self.names().map(str::to_string).collect(),
        }
    }

    /// Validate a training-time column list against this layout
    pub fn validate_names<S: AsRef<str>>(&self, names: &[S]) -> Result<(), LayoutMismatchError> {
        let matches = names.len() == self.len()
            && names.iter().zip(self.names()).all(|(a, b)| a.as_ref() == b);
        if matches {
            return Ok(());
        }

        let first_difference = names
            .iter()
            .map(|n| Some(n.as_ref()))
            .chain(std::iter::repeat(None))
            .zip(self.names().map(Some).chain(std::iter::repeat(None)))
            .take(names.len().max(self.len()))
            .position(|(actual, expected)| actual != expected);

        Err(LayoutMismatchError {
            key: self.key,
            expected_count: self.len(),
            expected_hash: self.layout_hash(),
            actual_count: names.len(),
            actual_hash: compute_layout_hash(names.iter().map(|n| n.as_ref())),
            first_difference,
        })
    }
}

// ============================================================================
// SCHEMA GENERATION
// ============================================================================

/// Ordered field names for one relay
///
/// Channels 1-3 and 7-9 are voltage phasors (`VH`/`V`), 4-6 and 10-12 are
/// current phasors (`IH`/`I`).
pub fn relay_feature_names(relay: RelayId) -> Vec<String> {
    let r = relay.prefix();
    let mut names = Vec::with_capacity(RELAY_FEATURE_COUNT);

    for channel in 1..=PHASOR_CHANNELS {
        let voltage = ((channel - 1) / 3) % 2 == 0;
        let (angle, magnitude) = if voltage { ("VH", "V") } else { ("IH", "I") };
        names.push(format!("{r}-PA{channel}:{angle}"));
        names.push(format!("{r}-PM{channel}:{magnitude}"));
    }

    names.push(format!("{r}:F"));
    names.push(format!("{r}:DF"));
    names.push(format!("{r}-PA:Z"));
    names.push(format!("{r}-PA:ZH"));
    names.push(format!("{r}{STATUS_SUFFIX}"));
    names
}

/// Synthetic log-derived fields appended to the overall layout
pub fn log_feature_names() -> Vec<String> {
    RelayId::ALL
        .iter()
        .map(|r| format!("relay{}_log", r.number()))
        .collect()
}

/// Drop the field the overall model never saw during training
pub fn exclude_for_overall(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| name != EXCLUDED_FROM_OVERALL)
        .collect()
}

/// relay1 ++ relay2 ++ relay3 ++ relay4 ++ logs, minus the exclusion
pub fn overall_feature_names() -> Vec<String> {
    let mut names: Vec<String> = RelayId::ALL
        .iter()
        .flat_map(|r| relay_feature_names(*r))
        .collect();
    names.extend(log_feature_names());
    exclude_for_overall(names)
}

static SCHEMAS: Lazy<[FeatureSchema; 5]> = Lazy::new(|| {
    SchemaKey::ALL.map(|key| {
        let names = match key {
            SchemaKey::Relay(relay) => relay_feature_names(relay),
            SchemaKey::Overall => overall_feature_names(),
        };
        FeatureSchema::from_names(key, names)
    })
});

pub fn schema_for(key: SchemaKey) -> &'static FeatureSchema {
    let index = SchemaKey::ALL
        .iter()
        .position(|k| *k == key)
        .unwrap_or(SchemaKey::ALL.len() - 1);
    &SCHEMAS[index]
}

pub fn relay_schema(relay: RelayId) -> &'static FeatureSchema {
    schema_for(SchemaKey::Relay(relay))
}

pub fn overall_schema() -> &'static FeatureSchema {
    schema_for(SchemaKey::Overall)
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of a layout
/// Used to detect layout mismatches between artifacts and schemas
pub fn compute_layout_hash<'a>(names: impl IntoIterator<Item = &'a str>) -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in names {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub key: String,
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when a training layout doesn't match the schema
#[derive(Debug, Clone, thiserror::Error)]
#[error(
    "Feature layout mismatch for {key}: expected {expected_count} features (hash: {expected_hash:08x}), \
     got {actual_count} (hash: {actual_hash:08x}), first difference at {first_difference:?}"
)]
pub struct LayoutMismatchError {
    pub key: SchemaKey,
    pub expected_count: usize,
    pub expected_hash: u32,
    pub actual_count: usize,
    pub actual_hash: u32,
    pub first_difference: Option<usize>,
}
