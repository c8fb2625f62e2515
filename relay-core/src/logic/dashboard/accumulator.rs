//! Session Accumulator - overall rows predicted in this session
//!
//! Bounded: once full, the oldest row is dropped.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::constants::ACCUMULATOR_CAPACITY;
use crate::logic::features::{overall_schema, InputRecord, InputValue, SchemaKey};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Accumulator only holds overall rows, got {0}")]
pub struct WrongSchema(pub SchemaKey);

/// Typed table keyed by the overall schema
#[derive(Debug, Clone)]
pub struct SessionAccumulator {
    rows: VecDeque<Vec<InputValue>>,
    capacity: usize,
}

impl Default for SessionAccumulator {
    fn default() -> Self {
        Self::with_capacity(ACCUMULATOR_CAPACITY)
    }
}

impl SessionAccumulator {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append an overall record
    pub fn push(&mut self, record: &InputRecord) -> Result<(), WrongSchema> {
        if record.key() != SchemaKey::Overall {
            return Err(WrongSchema(record.key()));
        }

        self.rows.push_back(record.values().to_vec());
        while self.rows.len() > self.capacity {
            self.rows.pop_front();
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[InputValue]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn status(&self) -> AccumulatorStatus {
        AccumulatorStatus {
            rows: self.rows.len(),
            capacity: self.capacity,
            is_full: self.rows.len() >= self.capacity,
        }
    }

    /// CSV with the overall header row, one line per accumulated row
    pub fn to_csv(&self) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(overall_schema().names())?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|v| v.to_string()))?;
        }
        writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))
    }
}

/// Accumulator status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccumulatorStatus {
    pub rows: usize,
    pub capacity: usize,
    pub is_full: bool,
}
