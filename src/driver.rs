//! Experiment driver: one end-to-end run over a record stream.
//!
//! The driver is a small state machine (`NotStarted → Running → Completed`)
//! that pulls one record at a time through the inference network and, after a
//! warm-up threshold, the cluster engine; folds each step into the two
//! rolling-accuracy channels; and appends the full step to the trace. The
//! only recognized end condition is the record source signaling exhaustion —
//! there is no record-count limit and no mid-run cancellation.
//!
//! Fail-fast: any collaborator error propagates and aborts the run. A failed
//! run produces no trace; diagnostics emitted before the failure stay in the
//! logs but are not partial results.

use serde::{Deserialize, Serialize};

use crate::accuracy::RollingAccuracy;
use crate::cluster::{ClusterEngine, ClusterParams};
use crate::error::{PipelineError, Result};
use crate::labeling::{clustering_inference, label_clusters};
use crate::network::{InferenceNetwork, NetworkTopology};
use crate::observer::{NullObserver, RunObserver, StepSnapshot};
use crate::record::{Record, RecordSource};
use crate::trace::{Trace, TraceStep};

/// Lifecycle of one experiment run. `Completed` is the only terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentState {
    NotStarted,
    Running,
    Completed,
}

/// Per-run configuration, fixed before the first record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Warm-up threshold: clustering is skipped for every record with
    /// `number <= start_clustering_index`, while the sequence memory has not
    /// yet formed stable predictions.
    pub start_clustering_index: u64,
    /// Effective window of both rolling-accuracy channels.
    pub rolling_window: usize,
    /// Emit a diagnostic snapshot every this-many steps.
    pub snapshot_period: u64,
    /// Thresholds passed through to the cluster engine unchanged.
    pub cluster_params: ClusterParams,
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rolling_window == 0 {
            return Err(PipelineError::InvalidConfig(
                "rolling_window must be > 0".into(),
            ));
        }
        if self.snapshot_period == 0 {
            return Err(PipelineError::InvalidConfig(
                "snapshot_period must be > 0".into(),
            ));
        }
        self.cluster_params.validate()
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            start_clustering_index: 0,
            rolling_window: 10,
            snapshot_period: 50,
            cluster_params: ClusterParams::default(),
        }
    }
}

/// Summary record of one completed run, for downstream persistence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub experiment_id: String,
    pub trace: Trace,
    pub topology: NetworkTopology,
    pub config: ExperimentConfig,
}

impl ExperimentResult {
    /// Last classification accuracy of the run, `None` for an empty stream.
    pub fn final_classification_accuracy(&self) -> Option<f64> {
        self.trace.last_classification_accuracy()
    }
}

/// Identifier for one experiment: base name plus topology flags.
pub fn experiment_id(base_name: &str, topology: &NetworkTopology) -> String {
    format!(
        "{}_sp={}_tm={}_tp={}_{}",
        base_name, topology.sp_enabled, topology.tm_enabled, topology.tp_enabled,
        topology.classifier
    )
}

/// Orchestrates one run: record source → inference network → cluster engine
/// → rolling accuracies → trace.
///
/// Owns its trace, network and engine exclusively for the duration of the
/// run; independent runs share no mutable state and may execute in parallel
/// with independent instances.
pub struct ExperimentDriver {
    config: ExperimentConfig,
    source: Box<dyn RecordSource>,
    network: Box<dyn InferenceNetwork>,
    engine: Box<dyn ClusterEngine>,
    observer: Box<dyn RunObserver>,
    trace: Trace,
    classification_accuracy: RollingAccuracy,
    clustering_accuracy: RollingAccuracy,
    state: ExperimentState,
}

impl ExperimentDriver {
    /// Wire up a run. Configuration errors surface here, never mid-run.
    pub fn new(
        config: ExperimentConfig,
        source: Box<dyn RecordSource>,
        network: Box<dyn InferenceNetwork>,
        engine: Box<dyn ClusterEngine>,
    ) -> Result<Self> {
        config.validate()?;
        let classification_accuracy = RollingAccuracy::new(config.rolling_window)?;
        let clustering_accuracy = RollingAccuracy::new(config.rolling_window)?;
        Ok(Self {
            config,
            source,
            network,
            engine,
            observer: Box::new(NullObserver),
            trace: Trace::new(),
            classification_accuracy,
            clustering_accuracy,
            state: ExperimentState::NotStarted,
        })
    }

    /// Inject a diagnostics observer (defaults to [`NullObserver`]).
    pub fn with_observer(mut self, observer: Box<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> ExperimentState {
        self.state
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Run to natural exhaustion and hand back the completed trace.
    ///
    /// Steps are strictly sequential: step `i + 1` never begins before step
    /// `i`'s trace entry is appended, since both rolling accuracies and
    /// clustering depend on the immediately preceding entry.
    pub fn run(&mut self) -> Result<Trace> {
        if self.state != ExperimentState::NotStarted {
            return Err(PipelineError::InvalidConfig(
                "driver has already run; build a fresh driver per run".into(),
            ));
        }

        let mut record_number = 0u64;
        loop {
            let reading = match self.source.next_reading()? {
                Some(reading) => reading,
                None => break,
            };
            self.state = ExperimentState::Running;

            let record = Record::new(record_number, reading);
            self.step(&record)?;
            record_number += 1;
        }

        self.complete();
        Ok(std::mem::take(&mut self.trace))
    }

    /// Run and wrap the trace in a summary record.
    pub fn run_experiment(&mut self, base_name: &str) -> Result<ExperimentResult> {
        let topology = self.network.topology();
        let trace = self.run()?;
        Ok(ExperimentResult {
            experiment_id: experiment_id(base_name, &topology),
            trace,
            topology,
            config: self.config.clone(),
        })
    }

    /// One `Running → Running` transition: advance every stage by exactly
    /// one record and append the derived step.
    fn step(&mut self, record: &Record) -> Result<()> {
        let output = self.network.compute(record)?;

        // Warm-up gate: no clustering until the sequence memory has had
        // start_clustering_index records to stabilize on.
        let mut predicted_cluster = None;
        let mut clustering_confidence = None;
        if record.number > self.config.start_clustering_index {
            if let (Some(pattern), Some(anomaly_score)) =
                (&output.predicted_active_cells, output.anomaly_score)
            {
                let (cluster, confidence) = self.engine.cluster(
                    record.number,
                    pattern,
                    anomaly_score,
                    output.actual_category,
                )?;
                predicted_cluster = cluster;
                clustering_confidence = confidence;
            }
        }

        let classification_accuracy = self.classification_accuracy.update(
            Some(output.classifier_inference),
            output.actual_category,
            true,
        );

        let (clustering_label, predicted_cluster_id, cluster_homogeneity) =
            clustering_inference(predicted_cluster, self.engine.as_mut());
        let clustering_accuracy =
            self.clustering_accuracy
                .update(clustering_label, output.actual_category, true);

        let step = TraceStep {
            record_number: record.number,
            sensor_value: output.sensor_value,
            actual_category: output.actual_category,
            active_cells: output.active_cells,
            predicted_active_cells: output.predicted_active_cells,
            anomaly_score: output.anomaly_score,
            pooled_active_cells: output.pooled_active_cells,
            classification_inference: output.classifier_inference,
            classification_accuracy,
            clustering_inference: clustering_label,
            predicted_cluster_id,
            clustering_accuracy,
            cluster_homogeneity,
            clustering_confidence,
        };

        if record.number % self.config.snapshot_period == 0 {
            self.emit_snapshot(&step);
        }

        self.trace.append(step)
    }

    fn emit_snapshot(&mut self, step: &TraceStep) {
        let snapshot = StepSnapshot {
            record_number: step.record_number,
            sensor_value: step.sensor_value,
            actual_category: step.actual_category,
            anomaly_score: step.anomaly_score,
            classification_inference: step.classification_inference,
            classification_accuracy: step.classification_accuracy,
            clustering_inference: step.clustering_inference,
            predicted_cluster_id: step.predicted_cluster_id,
            clustering_accuracy: step.clustering_accuracy,
            cluster_homogeneity: step.cluster_homogeneity,
            clustering_confidence: step.clustering_confidence,
            num_clusters: self.engine.clusters().len(),
        };
        log::debug!(
            "record {}: value={} category={} anomaly={:?} \
             classification={}@{:.3} clustering={:?}@{:.3} \
             homogeneity={:.2} clusters={}",
            snapshot.record_number,
            snapshot.sensor_value,
            snapshot.actual_category,
            snapshot.anomaly_score,
            snapshot.classification_inference,
            snapshot.classification_accuracy,
            snapshot.clustering_inference,
            snapshot.clustering_accuracy,
            snapshot.cluster_homogeneity,
            snapshot.num_clusters,
        );
        self.observer.on_snapshot(&snapshot);
    }

    /// `Running → Completed`: label final clusters and log end-of-run
    /// diagnostics. Observational only — the trace is already final.
    fn complete(&mut self) {
        label_clusters(self.engine.as_mut());

        if log::log_enabled!(log::Level::Debug) {
            for cluster in self.engine.clusters() {
                log::debug!(
                    "cluster {} (label {:?}): category frequencies {:?}",
                    cluster.id(),
                    cluster.label(),
                    cluster.category_frequencies(),
                );
            }
            log::debug!(
                "inter-cluster distances: {:?}",
                self.engine.inter_cluster_distances()
            );
        }

        self.observer
            .on_completed(self.trace.len(), self.engine.clusters().len());
        self.state = ExperimentState::Completed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Cluster, ClusterPoint};
    use crate::network::NetworkOutput;
    use crate::observer::FnObserver;
    use crate::pattern::SparsePattern;
    use crate::record::ReplaySource;
    use std::collections::HashMap;

    const CELLS: usize = 64;

    /// Network double: perfect classifier, category-derived cell patterns,
    /// constant anomaly.
    struct EchoNetwork;

    impl InferenceNetwork for EchoNetwork {
        fn compute(&mut self, record: &Record) -> Result<NetworkOutput> {
            let base = (record.category as usize * 4) % (CELLS - 4);
            let pattern =
                SparsePattern::from_indices(vec![base, base + 1, base + 2], CELLS)?;
            Ok(NetworkOutput {
                sensor_value: record.value,
                actual_category: record.category,
                active_cells: Some(pattern.clone()),
                predicted_active_cells: Some(pattern),
                anomaly_score: Some(0.2),
                pooled_active_cells: None,
                classifier_inference: record.category,
            })
        }

        fn topology(&self) -> NetworkTopology {
            NetworkTopology {
                sp_enabled: true,
                tm_enabled: true,
                tp_enabled: false,
                classifier: "KNN".into(),
                num_cells: CELLS,
            }
        }
    }

    /// Network double that fails on a chosen record number.
    struct FailingNetwork {
        fail_at: u64,
        inner: EchoNetwork,
    }

    impl InferenceNetwork for FailingNetwork {
        fn compute(&mut self, record: &Record) -> Result<NetworkOutput> {
            if record.number == self.fail_at {
                return Err(PipelineError::Collaborator("sequence memory died".into()));
            }
            self.inner.compute(record)
        }

        fn topology(&self) -> NetworkTopology {
            self.inner.topology()
        }
    }

    /// Engine double: one cluster per ground-truth category.
    #[derive(Default)]
    struct PerCategoryEngine {
        clusters: Vec<Cluster>,
        by_category: HashMap<u32, u64>,
    }

    impl ClusterEngine for PerCategoryEngine {
        fn cluster(
            &mut self,
            _step: u64,
            pattern: &SparsePattern,
            anomaly_score: f64,
            category: u32,
        ) -> Result<(Option<u64>, Option<f64>)> {
            let id = match self.by_category.get(&category) {
                Some(&id) => id,
                None => {
                    let id = self.clusters.len() as u64;
                    self.clusters.push(Cluster::new(id));
                    self.by_category.insert(category, id);
                    id
                }
            };
            let cluster = self
                .clusters
                .iter_mut()
                .find(|c| c.id() == id)
                .expect("cluster for known category");
            cluster.add_point(ClusterPoint::new(pattern.clone(), anomaly_score, category));
            Ok((Some(id), Some(1.0)))
        }

        fn clusters(&self) -> Vec<&Cluster> {
            self.clusters.iter().collect()
        }

        fn clusters_mut(&mut self) -> Vec<&mut Cluster> {
            self.clusters.iter_mut().collect()
        }

        fn cluster_by_id(&self, id: u64) -> Option<&Cluster> {
            self.clusters.iter().find(|c| c.id() == id)
        }

        fn inter_cluster_distances(&self) -> Vec<f64> {
            vec![1.0; self.clusters.len().saturating_sub(1)]
        }
    }

    fn driver_over(pairs: &[(f64, u32)], config: ExperimentConfig) -> ExperimentDriver {
        ExperimentDriver::new(
            config,
            Box::new(ReplaySource::from_pairs(pairs)),
            Box::new(EchoNetwork),
            Box::new(PerCategoryEngine::default()),
        )
        .unwrap()
    }

    fn five_records() -> Vec<(f64, u32)> {
        vec![(0.1, 1), (0.2, 2), (0.3, 1), (0.4, 2), (0.5, 1)]
    }

    #[test]
    fn test_five_records_complete_with_aligned_trace() {
        let mut driver = driver_over(&five_records(), ExperimentConfig::default());
        assert_eq!(driver.state(), ExperimentState::NotStarted);

        let trace = driver.run().unwrap();
        assert_eq!(driver.state(), ExperimentState::Completed);
        assert_eq!(trace.len(), 5);
        assert_eq!(trace.record_numbers(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_warm_up_gates_clustering_fields() {
        let config = ExperimentConfig {
            start_clustering_index: 2,
            ..Default::default()
        };
        let mut driver = driver_over(&five_records(), config);
        let trace = driver.run().unwrap();

        for i in 0..=2 {
            assert_eq!(trace.predicted_cluster_ids()[i], None, "step {}", i);
            assert_eq!(trace.clustering_inferences()[i], None, "step {}", i);
            assert_eq!(trace.clustering_confidences()[i], None, "step {}", i);
        }
        for i in 3..5 {
            assert!(trace.predicted_cluster_ids()[i].is_some(), "step {}", i);
            assert!(trace.clustering_confidences()[i].is_some(), "step {}", i);
        }
    }

    #[test]
    fn test_accuracies_bounded_and_cold_start_zero() {
        let pairs: Vec<(f64, u32)> = (0..120)
            .map(|i| (i as f64 * 0.01, (i % 3) as u32))
            .collect();
        let mut driver = driver_over(&pairs, ExperimentConfig::default());
        let trace = driver.run().unwrap();

        assert_eq!(trace.classification_accuracies()[0], 0.0);
        assert_eq!(trace.clustering_accuracies()[0], 0.0);
        for i in 0..trace.len() {
            let c = trace.classification_accuracies()[i];
            let k = trace.clustering_accuracies()[i];
            assert!((0.0..=1.0).contains(&c), "classification[{}] = {}", i, c);
            assert!((0.0..=1.0).contains(&k), "clustering[{}] = {}", i, k);
            let h = trace.cluster_homogeneities()[i];
            assert!((0.0..=100.0).contains(&h), "homogeneity[{}] = {}", i, h);
        }
    }

    #[test]
    fn test_noise_steps_freeze_classification_accuracy() {
        let pairs = vec![(0.1, 1), (0.2, 1), (0.3, 0), (0.4, 0), (0.5, 1)];
        let mut driver = driver_over(&pairs, ExperimentConfig::default());
        let trace = driver.run().unwrap();

        let acc = trace.classification_accuracies();
        assert_eq!(acc[2], acc[1]);
        assert_eq!(acc[3], acc[2]);
        assert!(acc[4] > acc[3]);
    }

    #[test]
    fn test_collaborator_failure_aborts_without_trace() {
        let mut driver = ExperimentDriver::new(
            ExperimentConfig::default(),
            Box::new(ReplaySource::from_pairs(&five_records())),
            Box::new(FailingNetwork {
                fail_at: 3,
                inner: EchoNetwork,
            }),
            Box::new(PerCategoryEngine::default()),
        )
        .unwrap();

        let err = driver.run().unwrap_err();
        assert!(matches!(err, PipelineError::Collaborator(_)));
        assert_eq!(driver.state(), ExperimentState::Running);
    }

    #[test]
    fn test_snapshots_emitted_on_period() {
        let pairs: Vec<(f64, u32)> = (0..7).map(|i| (i as f64, 1)).collect();
        let config = ExperimentConfig {
            snapshot_period: 2,
            ..Default::default()
        };

        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut driver = ExperimentDriver::new(
            config,
            Box::new(ReplaySource::from_pairs(&pairs)),
            Box::new(EchoNetwork),
            Box::new(PerCategoryEngine::default()),
        )
        .unwrap()
        .with_observer(Box::new(FnObserver(move |s: &StepSnapshot| {
            sink.borrow_mut().push(s.record_number)
        })));

        driver.run().unwrap();
        assert_eq!(*seen.borrow(), vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_driver_runs_once() {
        let mut driver = driver_over(&five_records(), ExperimentConfig::default());
        driver.run().unwrap();
        assert!(driver.run().is_err());
    }

    #[test]
    fn test_empty_stream_completes_with_empty_trace() {
        let mut driver = driver_over(&[], ExperimentConfig::default());
        let trace = driver.run().unwrap();
        assert!(trace.is_empty());
        assert_eq!(driver.state(), ExperimentState::Completed);
    }

    #[test]
    fn test_experiment_result_summary() {
        let mut driver = driver_over(&five_records(), ExperimentConfig::default());
        let result = driver.run_experiment("ramp").unwrap();

        assert_eq!(result.experiment_id, "ramp_sp=true_tm=true_tp=false_KNN");
        assert_eq!(result.trace.len(), 5);
        assert_eq!(result.topology.num_cells, CELLS);
        assert_eq!(
            result.final_classification_accuracy(),
            result.trace.last_classification_accuracy()
        );
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = ExperimentConfig {
            rolling_window: 0,
            ..Default::default()
        };
        let built = ExperimentDriver::new(
            config,
            Box::new(ReplaySource::default()),
            Box::new(EchoNetwork),
            Box::new(PerCategoryEngine::default()),
        );
        assert!(matches!(built, Err(PipelineError::InvalidConfig(_))));
    }
}
