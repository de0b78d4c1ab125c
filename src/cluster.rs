//! Cluster-engine contract and cluster structure.
//!
//! Clustering runs inside an external engine: clusters are created, merged
//! and pruned entirely on its side. This core only passes parameters through
//! at construction, feeds it one gated step at a time, reads cluster
//! structure back, and writes majority-vote labels. The engine sits behind a
//! trait so clustering backends can be swapped without touching the driver.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::pattern::SparsePattern;

/// Engine thresholds, supplied once at construction and passed through
/// unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterParams {
    /// Distance under which two clusters merge.
    pub merge_threshold: f64,
    /// Anomaly score above which a step is treated as anomalous.
    pub anomalous_threshold: f64,
    /// Anomaly score below which the sequence memory is considered stable.
    pub stable_threshold: f64,
    /// Clusters smaller than this are candidates for pruning.
    pub min_cluster_size: usize,
    /// Point-to-cluster similarity required for assignment.
    pub similarity_threshold: f64,
    /// Prune every this-many clustered steps.
    pub pruning_frequency: u64,
}

impl ClusterParams {
    /// Validate thresholds. Malformed values are caller errors, caught here
    /// at construction time rather than mid-run.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.anomalous_threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "anomalous_threshold must be in [0, 1], got {}",
                self.anomalous_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.stable_threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "stable_threshold must be in [0, 1], got {}",
                self.stable_threshold
            )));
        }
        if self.merge_threshold < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "merge_threshold must be non-negative, got {}",
                self.merge_threshold
            )));
        }
        if self.similarity_threshold < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "similarity_threshold must be non-negative, got {}",
                self.similarity_threshold
            )));
        }
        if self.min_cluster_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "min_cluster_size must be > 0".into(),
            ));
        }
        if self.pruning_frequency == 0 {
            return Err(PipelineError::InvalidConfig(
                "pruning_frequency must be > 0".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            merge_threshold: 0.3,
            anomalous_threshold: 0.5,
            stable_threshold: 0.1,
            min_cluster_size: 1,
            similarity_threshold: 0.2,
            pruning_frequency: 20,
        }
    }
}

/// A point as frozen at assignment time: the pattern it was clustered on,
/// the anomaly score observed, and the ground-truth category of that step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterPoint {
    pub pattern: SparsePattern,
    pub anomaly_score: f64,
    pub category: u32,
}

impl ClusterPoint {
    pub fn new(pattern: SparsePattern, anomaly_score: f64, category: u32) -> Self {
        Self {
            pattern,
            anomaly_score,
            category,
        }
    }
}

/// A cluster as read back from the engine: an id, a growing set of points,
/// and a label assigned only by the labeling evaluator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cluster {
    id: u64,
    points: Vec<ClusterPoint>,
    label: Option<u32>,
}

impl Cluster {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            points: Vec::new(),
            label: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn points(&self) -> &[ClusterPoint] {
        &self.points
    }

    /// Add a point. Engines call this; the pipeline core never does.
    pub fn add_point(&mut self, point: ClusterPoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Majority label, unset until the labeling evaluator runs.
    pub fn label(&self) -> Option<u32> {
        self.label
    }

    pub fn set_label(&mut self, label: u32) {
        self.label = Some(label);
    }

    /// Frequency of each ground-truth category among this cluster's points,
    /// sorted ascending by category id.
    pub fn category_frequencies(&self) -> Vec<(u32, usize)> {
        let mut counts: std::collections::BTreeMap<u32, usize> = Default::default();
        for point in &self.points {
            *counts.entry(point.category).or_insert(0) += 1;
        }
        counts.into_iter().collect()
    }
}

/// The clustering collaborator.
///
/// Any error from [`cluster`] is a collaborator failure and aborts the run.
///
/// [`cluster`]: ClusterEngine::cluster
pub trait ClusterEngine {
    /// Feed one step: the step index, the predicted-active-cell pattern, the
    /// anomaly score and the ground-truth category. Returns the best-matching
    /// cluster id (or `None`) and a confidence score (or `None`).
    fn cluster(
        &mut self,
        step: u64,
        pattern: &SparsePattern,
        anomaly_score: f64,
        category: u32,
    ) -> Result<(Option<u64>, Option<f64>)>;

    /// Current clusters, read-only.
    fn clusters(&self) -> Vec<&Cluster>;

    /// Current clusters, mutable — the labeling evaluator writes labels
    /// through this.
    fn clusters_mut(&mut self) -> Vec<&mut Cluster>;

    fn cluster_by_id(&self, id: u64) -> Option<&Cluster>;

    /// Pairwise inter-cluster distances, for end-of-run diagnostics only.
    /// Engines with no meaningful distance metric may return an empty vec.
    fn inter_cluster_distances(&self) -> Vec<f64> {
        Vec::new()
    }
}
