//! Streaming Run: a full experiment over a synthetic sensor stream.
//!
//! Three signal categories (distinct means) separated by noise gaps, replayed
//! through a toy threshold classifier and a nearest-prototype cluster engine.
//! Watch the rolling accuracies climb as the stream progresses and the
//! clusters settle on their majority labels.
//!
//! 1. Generate a seeded noisy stream: category phases + noise gaps
//! 2. Run the experiment driver to natural exhaustion
//! 3. Print periodic snapshots via an injected observer
//! 4. Report final accuracies and cluster homogeneity
//!
//! Run: RUST_LOG=debug cargo run --example streaming_run --release

use inflow::{
    Cluster, ClusterEngine, ClusterParams, ClusterPoint, ExperimentConfig, ExperimentDriver,
    FnObserver, InferenceNetwork, NetworkOutput, NetworkTopology, Record, ReplaySource, Result,
    SensorReading, SparsePattern, StepSnapshot,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const NUM_CELLS: usize = 256;
const ACTIVE_PER_PATTERN: usize = 8;

// =============================================================================
// Synthetic sensor stream
// =============================================================================

/// Category phases with distinct means, separated by noise gaps (category 0).
fn generate_stream(reps: usize, phase_len: usize, noise_len: usize) -> Vec<SensorReading> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let means = [2.0, 5.0, 8.0];

    let mut readings = Vec::new();
    for _ in 0..reps {
        for (i, &mean) in means.iter().enumerate() {
            for _ in 0..noise_len {
                readings.push(SensorReading::new(rng.gen_range(0.0..10.0), 0));
            }
            for _ in 0..phase_len {
                let value = mean + rng.gen_range(-0.4..0.4);
                readings.push(SensorReading::new(value, i as u32 + 1));
            }
        }
    }
    readings
}

// =============================================================================
// Toy inference network
// =============================================================================

/// Quantizes the sensor value into a sparse cell pattern and classifies by
/// nearest category mean. Anomaly spikes when the active pattern jumps.
struct ToyNetwork {
    previous_pattern: Option<SparsePattern>,
}

impl ToyNetwork {
    fn new() -> Self {
        Self {
            previous_pattern: None,
        }
    }

    fn encode(&self, value: f64) -> Result<SparsePattern> {
        let bucket = ((value / 10.0).clamp(0.0, 0.999) * 24.0) as usize;
        let base = bucket * ACTIVE_PER_PATTERN;
        let indices = (base..base + ACTIVE_PER_PATTERN)
            .map(|i| i % NUM_CELLS)
            .collect();
        SparsePattern::from_indices(indices, NUM_CELLS)
    }
}

impl InferenceNetwork for ToyNetwork {
    fn compute(&mut self, record: &Record) -> Result<NetworkOutput> {
        let pattern = self.encode(record.value)?;

        // Anomaly: how much the pattern moved since the last step.
        let anomaly = match &self.previous_pattern {
            Some(prev) => {
                1.0 - prev.overlap(&pattern) as f64 / ACTIVE_PER_PATTERN as f64
            }
            None => 1.0,
        };
        self.previous_pattern = Some(pattern.clone());

        // Threshold classifier over the category means.
        let inference = match record.value {
            v if (1.0..3.0).contains(&v) => 1,
            v if (4.0..6.0).contains(&v) => 2,
            v if (7.0..9.0).contains(&v) => 3,
            _ => 0,
        };

        Ok(NetworkOutput {
            sensor_value: record.value,
            actual_category: record.category,
            active_cells: Some(pattern.clone()),
            predicted_active_cells: Some(pattern),
            anomaly_score: Some(anomaly),
            pooled_active_cells: None,
            classifier_inference: inference,
        })
    }

    fn topology(&self) -> NetworkTopology {
        NetworkTopology {
            sp_enabled: false,
            tm_enabled: true,
            tp_enabled: false,
            classifier: "threshold".into(),
            num_cells: NUM_CELLS,
        }
    }
}

// =============================================================================
// Nearest-prototype cluster engine
// =============================================================================

/// Assigns each pattern to the cluster whose last pattern overlaps most,
/// creating a new cluster when nothing clears the similarity threshold.
/// Anomalous steps are left unassigned.
struct PrototypeEngine {
    params: ClusterParams,
    clusters: Vec<Cluster>,
    next_id: u64,
}

impl PrototypeEngine {
    fn new(params: ClusterParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            clusters: Vec::new(),
            next_id: 0,
        })
    }

    fn best_match(&self, pattern: &SparsePattern) -> Option<(u64, f64)> {
        self.clusters
            .iter()
            .filter_map(|cluster| {
                let last = &cluster.points().last()?.pattern;
                let similarity =
                    pattern.overlap(last) as f64 / pattern.active_count().max(1) as f64;
                Some((cluster.id(), similarity))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

impl ClusterEngine for PrototypeEngine {
    fn cluster(
        &mut self,
        _step: u64,
        pattern: &SparsePattern,
        anomaly_score: f64,
        category: u32,
    ) -> Result<(Option<u64>, Option<f64>)> {
        if anomaly_score > self.params.anomalous_threshold {
            return Ok((None, None));
        }

        let point = ClusterPoint::new(pattern.clone(), anomaly_score, category);
        match self.best_match(pattern) {
            Some((id, similarity)) if similarity >= self.params.similarity_threshold => {
                self.clusters
                    .iter_mut()
                    .find(|c| c.id() == id)
                    .expect("matched cluster exists")
                    .add_point(point);
                Ok((Some(id), Some(similarity)))
            }
            _ => {
                let id = self.next_id;
                self.next_id += 1;
                let mut cluster = Cluster::new(id);
                cluster.add_point(point);
                self.clusters.push(cluster);
                Ok((Some(id), Some(1.0)))
            }
        }
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
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Inflow: streaming classification + clustering ===\n");

    let readings = generate_stream(4, 60, 10);
    println!("stream: {} readings, 3 categories + noise gaps", readings.len());

    let config = ExperimentConfig {
        start_clustering_index: 50,
        rolling_window: 20,
        snapshot_period: 100,
        cluster_params: ClusterParams {
            similarity_threshold: 0.5,
            anomalous_threshold: 0.6,
            ..Default::default()
        },
    };

    let engine = PrototypeEngine::new(config.cluster_params.clone())?;
    let mut driver = ExperimentDriver::new(
        config,
        Box::new(ReplaySource::new(readings)),
        Box::new(ToyNetwork::new()),
        Box::new(engine),
    )?
    .with_observer(Box::new(FnObserver(|s: &StepSnapshot| {
        println!(
            "  [{:>5}] classification {:.3} | clustering {:.3} | homogeneity {:>6.2} | {} clusters",
            s.record_number,
            s.classification_accuracy,
            s.clustering_accuracy,
            s.cluster_homogeneity,
            s.num_clusters,
        );
    })));

    let result = driver.run_experiment("synthetic_phases")?;

    println!("\nexperiment: {}", result.experiment_id);
    println!("steps traced: {}", result.trace.len());
    println!(
        "final classification accuracy: {:.3}",
        result.final_classification_accuracy().unwrap_or(0.0)
    );
    println!(
        "final clustering accuracy: {:.3}",
        result.trace.last_clustering_accuracy().unwrap_or(0.0)
    );
    println!(
        "final homogeneity: {:.2}",
        result
            .trace
            .cluster_homogeneities()
            .last()
            .copied()
            .unwrap_or(0.0)
    );

    Ok(())
}
