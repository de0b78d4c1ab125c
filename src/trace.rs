//! Trace accumulator: the per-step record of everything a run observed.
//!
//! The trace holds fourteen parallel sequences, one per observed or derived
//! field, all index-aligned by record number. The columnar layout (rather
//! than one sequence of step structs) favors the aggregation and plotting
//! collaborators that consume whole columns after the run; steps still enter
//! as one [`TraceStep`] each, so a step is appended atomically or not at all.
//!
//! Append-only: nothing is ever mutated or removed once appended.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::pattern::SparsePattern;

/// Every field captured per step — the fixed fourteen-field schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceField {
    RecordNumber,
    SensorValue,
    ActualCategory,
    ActiveCells,
    PredictedActiveCells,
    AnomalyScore,
    PooledActiveCells,
    ClassificationInference,
    ClassificationAccuracy,
    ClusteringInference,
    PredictedClusterId,
    ClusteringAccuracy,
    ClusterHomogeneity,
    ClusteringConfidence,
}

impl TraceField {
    /// All fourteen fields, in schema order.
    pub const ALL: [TraceField; 14] = [
        TraceField::RecordNumber,
        TraceField::SensorValue,
        TraceField::ActualCategory,
        TraceField::ActiveCells,
        TraceField::PredictedActiveCells,
        TraceField::AnomalyScore,
        TraceField::PooledActiveCells,
        TraceField::ClassificationInference,
        TraceField::ClassificationAccuracy,
        TraceField::ClusteringInference,
        TraceField::PredictedClusterId,
        TraceField::ClusteringAccuracy,
        TraceField::ClusterHomogeneity,
        TraceField::ClusteringConfidence,
    ];

    /// Column name as exposed to persistence collaborators.
    pub fn name(&self) -> &'static str {
        match self {
            TraceField::RecordNumber => "recordNumber",
            TraceField::SensorValue => "sensorValue",
            TraceField::ActualCategory => "actualCategory",
            TraceField::ActiveCells => "activeCells",
            TraceField::PredictedActiveCells => "predictedActiveCells",
            TraceField::AnomalyScore => "anomalyScore",
            TraceField::PooledActiveCells => "pooledActiveCells",
            TraceField::ClassificationInference => "classificationInference",
            TraceField::ClassificationAccuracy => "classificationAccuracy",
            TraceField::ClusteringInference => "clusteringInference",
            TraceField::PredictedClusterId => "predictedClusterId",
            TraceField::ClusteringAccuracy => "clusteringAccuracy",
            TraceField::ClusterHomogeneity => "clusterHomogeneity",
            TraceField::ClusteringConfidence => "clusteringConfidence",
        }
    }
}

/// One step's worth of values, one per schema field.
///
/// Created by the driver after a record has flowed through every stage;
/// never mutated after creation. The clustering fields are `None` for every
/// step at or below the warm-up threshold.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceStep {
    pub record_number: u64,
    pub sensor_value: f64,
    pub actual_category: u32,
    pub active_cells: Option<SparsePattern>,
    pub predicted_active_cells: Option<SparsePattern>,
    pub anomaly_score: Option<f64>,
    pub pooled_active_cells: Option<SparsePattern>,
    pub classification_inference: u32,
    pub classification_accuracy: f64,
    pub clustering_inference: Option<u32>,
    pub predicted_cluster_id: Option<u64>,
    pub clustering_accuracy: f64,
    pub cluster_homogeneity: f64,
    pub clustering_confidence: Option<f64>,
}

/// Fourteen index-aligned, append-only columns.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Trace {
    record_number: Vec<u64>,
    sensor_value: Vec<f64>,
    actual_category: Vec<u32>,
    active_cells: Vec<Option<SparsePattern>>,
    predicted_active_cells: Vec<Option<SparsePattern>>,
    anomaly_score: Vec<Option<f64>>,
    pooled_active_cells: Vec<Option<SparsePattern>>,
    classification_inference: Vec<u32>,
    classification_accuracy: Vec<f64>,
    clustering_inference: Vec<Option<u32>>,
    predicted_cluster_id: Vec<Option<u64>>,
    clustering_accuracy: Vec<f64>,
    cluster_homogeneity: Vec<f64>,
    clustering_confidence: Vec<Option<f64>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one step to every column.
    ///
    /// The step's record number must equal the current length — that is the
    /// index-alignment invariant of the schema. A mismatch is a [`Shape`]
    /// error and fatal to the run.
    ///
    /// [`Shape`]: PipelineError::Shape
    pub fn append(&mut self, step: TraceStep) -> Result<()> {
        let expected = self.len() as u64;
        if step.record_number != expected {
            return Err(PipelineError::Shape {
                expected,
                got: step.record_number,
            });
        }

        self.record_number.push(step.record_number);
        self.sensor_value.push(step.sensor_value);
        self.actual_category.push(step.actual_category);
        self.active_cells.push(step.active_cells);
        self.predicted_active_cells.push(step.predicted_active_cells);
        self.anomaly_score.push(step.anomaly_score);
        self.pooled_active_cells.push(step.pooled_active_cells);
        self.classification_inference
            .push(step.classification_inference);
        self.classification_accuracy
            .push(step.classification_accuracy);
        self.clustering_inference.push(step.clustering_inference);
        self.predicted_cluster_id.push(step.predicted_cluster_id);
        self.clustering_accuracy.push(step.clustering_accuracy);
        self.cluster_homogeneity.push(step.cluster_homogeneity);
        self.clustering_confidence.push(step.clustering_confidence);
        Ok(())
    }

    /// Number of steps appended so far; every column shares this length.
    pub fn len(&self) -> usize {
        self.record_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_number.is_empty()
    }

    // =========================================================================
    // Typed column access
    // =========================================================================

    pub fn record_numbers(&self) -> &[u64] {
        &self.record_number
    }

    pub fn sensor_values(&self) -> &[f64] {
        &self.sensor_value
    }

    pub fn actual_categories(&self) -> &[u32] {
        &self.actual_category
    }

    pub fn active_cells(&self) -> &[Option<SparsePattern>] {
        &self.active_cells
    }

    pub fn predicted_active_cells(&self) -> &[Option<SparsePattern>] {
        &self.predicted_active_cells
    }

    pub fn anomaly_scores(&self) -> &[Option<f64>] {
        &self.anomaly_score
    }

    pub fn pooled_active_cells(&self) -> &[Option<SparsePattern>] {
        &self.pooled_active_cells
    }

    pub fn classification_inferences(&self) -> &[u32] {
        &self.classification_inference
    }

    pub fn classification_accuracies(&self) -> &[f64] {
        &self.classification_accuracy
    }

    pub fn clustering_inferences(&self) -> &[Option<u32>] {
        &self.clustering_inference
    }

    pub fn predicted_cluster_ids(&self) -> &[Option<u64>] {
        &self.predicted_cluster_id
    }

    pub fn clustering_accuracies(&self) -> &[f64] {
        &self.clustering_accuracy
    }

    pub fn cluster_homogeneities(&self) -> &[f64] {
        &self.cluster_homogeneity
    }

    pub fn clustering_confidences(&self) -> &[Option<f64>] {
        &self.clustering_confidence
    }

    /// Last classification accuracy, used pervasively by the rolling tracker.
    pub fn last_classification_accuracy(&self) -> Option<f64> {
        self.classification_accuracy.last().copied()
    }

    pub fn last_clustering_accuracy(&self) -> Option<f64> {
        self.clustering_accuracy.last().copied()
    }

    // =========================================================================
    // By-name access (persistence/plotting collaborators)
    // =========================================================================

    /// A whole column as JSON, addressed by field name.
    pub fn column_json(&self, field: TraceField) -> serde_json::Value {
        match field {
            TraceField::RecordNumber => serde_json::json!(self.record_number),
            TraceField::SensorValue => serde_json::json!(self.sensor_value),
            TraceField::ActualCategory => serde_json::json!(self.actual_category),
            TraceField::ActiveCells => serde_json::json!(self.active_cells),
            TraceField::PredictedActiveCells => {
                serde_json::json!(self.predicted_active_cells)
            }
            TraceField::AnomalyScore => serde_json::json!(self.anomaly_score),
            TraceField::PooledActiveCells => serde_json::json!(self.pooled_active_cells),
            TraceField::ClassificationInference => {
                serde_json::json!(self.classification_inference)
            }
            TraceField::ClassificationAccuracy => {
                serde_json::json!(self.classification_accuracy)
            }
            TraceField::ClusteringInference => serde_json::json!(self.clustering_inference),
            TraceField::PredictedClusterId => serde_json::json!(self.predicted_cluster_id),
            TraceField::ClusteringAccuracy => serde_json::json!(self.clustering_accuracy),
            TraceField::ClusterHomogeneity => serde_json::json!(self.cluster_homogeneity),
            TraceField::ClusteringConfidence => {
                serde_json::json!(self.clustering_confidence)
            }
        }
    }

    /// Last value of a column as JSON, `Null` when the trace is empty.
    pub fn last_json(&self, field: TraceField) -> serde_json::Value {
        match self.column_json(field) {
            serde_json::Value::Array(mut values) => {
                values.pop().unwrap_or(serde_json::Value::Null)
            }
            other => other,
        }
    }
}
