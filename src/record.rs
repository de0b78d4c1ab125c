//! Sensor records and the record-source contract.
//!
//! A run consumes a finite, ordered stream of `(sensorValue, actualCategory)`
//! readings. Category `0` is the noise class — "no category". The stream ends
//! with an explicit end-of-stream signal (`Ok(None)`), never silent
//! truncation; reaching it is the only way a run completes.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The noise category: readings labeled `0` carry no real class.
pub const NOISE_CATEGORY: u32 = 0;

/// One raw reading from a sensor stream.
///
/// Immutable once produced. The record number is deliberately absent here:
/// the driver stamps ordinals itself so they are strictly increasing from 0
/// regardless of how the source was built.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Raw scalar sensor value.
    pub value: f64,
    /// Ground-truth category; [`NOISE_CATEGORY`] means noise.
    pub category: u32,
}

impl SensorReading {
    pub fn new(value: f64, category: u32) -> Self {
        Self { value, category }
    }

    /// Whether this reading belongs to the noise class.
    pub fn is_noise(&self) -> bool {
        self.category == NOISE_CATEGORY
    }
}

/// A reading stamped with its ordinal within one run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// 0-based position in the stream, strictly increasing by 1.
    pub number: u64,
    pub value: f64,
    pub category: u32,
}

impl Record {
    pub fn new(number: u64, reading: SensorReading) -> Self {
        Self {
            number,
            value: reading.value,
            category: reading.category,
        }
    }
}

/// An ordered, finite source of sensor readings.
///
/// `Ok(None)` is the explicit end-of-stream signal and the sole loop
/// termination condition of a run. Errors abort the run.
pub trait RecordSource {
    fn next_reading(&mut self) -> Result<Option<SensorReading>>;
}

/// In-memory replayable record source.
///
/// Holds the full sequence and hands readings out in order. [`reset`] rewinds
/// to the start so the same data can drive multiple independent runs.
///
/// [`reset`]: ReplaySource::reset
#[derive(Clone, Debug, Default)]
pub struct ReplaySource {
    readings: Vec<SensorReading>,
    cursor: usize,
}

impl ReplaySource {
    pub fn new(readings: Vec<SensorReading>) -> Self {
        Self {
            readings,
            cursor: 0,
        }
    }

    /// Build a source from `(value, category)` pairs.
    pub fn from_pairs(pairs: &[(f64, u32)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|&(value, category)| SensorReading::new(value, category))
                .collect(),
        )
    }

    /// Rewind to the first reading.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Total number of readings held (independent of the cursor).
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

impl RecordSource for ReplaySource {
    fn next_reading(&mut self) -> Result<Option<SensorReading>> {
        let reading = self.readings.get(self.cursor).copied();
        if reading.is_some() {
            self.cursor += 1;
        }
        Ok(reading)
    }
}
