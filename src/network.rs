//! Inference-network contract.
//!
//! The pipeline treats the pattern-recognition network (sensor →
//! spatial-pooling → temporal-memory → classifier stages) as an opaque
//! collaborator behind a trait seam, so alternate sequence-memory backends
//! can be substituted without touching the driver. Each [`compute`] call
//! advances the network by exactly one record and exposes that step's named
//! output channels.
//!
//! [`compute`]: InferenceNetwork::compute

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pattern::SparsePattern;
use crate::record::Record;

/// Named per-step output channels of an inference network.
///
/// Immutable once produced. Stage outputs are `None` when the corresponding
/// region is disabled in the network's topology.
#[derive(Clone, Debug)]
pub struct NetworkOutput {
    /// Raw sensor value echoed by the sensor stage (`sourceOut`).
    pub sensor_value: f64,
    /// Ground-truth category echoed by the sensor stage (`categoryOut`).
    pub actual_category: u32,
    /// Currently active cells of the sequence memory.
    pub active_cells: Option<SparsePattern>,
    /// Cells the sequence memory predicted would activate; input to
    /// clustering.
    pub predicted_active_cells: Option<SparsePattern>,
    /// How unexpected this input was, in [0, 1].
    pub anomaly_score: Option<f64>,
    /// Most-active cells of the pooling stage.
    pub pooled_active_cells: Option<SparsePattern>,
    /// Category inferred by the classifier stage (`categoriesOut`).
    pub classifier_inference: u32,
}

/// Derived network-topology metadata, recorded with each experiment result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkTopology {
    pub sp_enabled: bool,
    pub tm_enabled: bool,
    pub tp_enabled: bool,
    /// Classifier region kind, e.g. "KNN" or "SDR".
    pub classifier: String,
    /// Total sequence-memory cells (columns x cells per column).
    pub num_cells: usize,
}

/// An inference network that advances one record per invocation.
///
/// Any error is a collaborator failure: the run aborts, nothing is retried.
pub trait InferenceNetwork {
    /// Feed one record through every stage and return the step's outputs.
    fn compute(&mut self, record: &Record) -> Result<NetworkOutput>;

    /// Static topology of this network instance.
    fn topology(&self) -> NetworkTopology;
}
