//! # Inflow: Online Streaming Inference-and-Accuracy Pipeline
//!
//! Inflow drives a sequence classifier/clustering experiment over a sensor
//! data stream, one record at a time. It owns the state that makes such an
//! experiment meaningful — the per-step trace, the rolling accuracy
//! estimates, the majority-vote cluster labels — while treating the
//! pattern-recognition machinery itself (sequence memory, cluster engine,
//! record storage) as collaborators behind trait seams.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use inflow::{ExperimentConfig, ExperimentDriver, ReplaySource};
//!
//! let source = ReplaySource::from_pairs(&[(0.1, 1), (0.9, 2), (0.2, 1)]);
//! let mut driver = ExperimentDriver::new(
//!     ExperimentConfig::default(),
//!     Box::new(source),
//!     Box::new(my_network),   // impl InferenceNetwork
//!     Box::new(my_engine),    // impl ClusterEngine
//! )?;
//!
//! let trace = driver.run()?;
//! println!("final accuracy: {:?}", trace.last_classification_accuracy());
//! ```
//!
//! ## Core Concepts
//!
//! - **Record**: one `(sensorValue, actualCategory)` reading; category 0 is
//!   noise. Records flow strictly in order, numbered from 0.
//! - **Trace**: fourteen index-aligned, append-only columns holding every
//!   observed and derived quantity per step.
//! - **Rolling accuracy**: a single-scalar exponential moving average per
//!   channel — no buffered window.
//! - **Warm-up threshold**: clustering is skipped until the sequence memory
//!   has had enough records to form stable predictions.
//! - **Homogeneity**: the percentage of clustered points whose ground truth
//!   matches their cluster's majority label.

pub mod accuracy;
pub mod cluster;
pub mod driver;
pub mod error;
pub mod labeling;
pub mod network;
pub mod observer;
pub mod pattern;
pub mod record;
pub mod trace;

// Re-exports for convenience
pub use accuracy::RollingAccuracy;
pub use cluster::{Cluster, ClusterEngine, ClusterParams, ClusterPoint};
pub use driver::{
    experiment_id, ExperimentConfig, ExperimentDriver, ExperimentResult, ExperimentState,
};
pub use error::{PipelineError, Result};
pub use labeling::{clustering_inference, compute_homogeneity, label_clusters};
pub use network::{InferenceNetwork, NetworkOutput, NetworkTopology};
pub use observer::{ChannelObserver, FnObserver, NullObserver, RunObserver, StepSnapshot};
pub use pattern::SparsePattern;
pub use record::{Record, RecordSource, ReplaySource, SensorReading, NOISE_CATEGORY};
pub use trace::{Trace, TraceField, TraceStep};
