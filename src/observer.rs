//! Run observers: injected diagnostics, no ambient global state.
//!
//! Every `snapshot_period`-th step the driver hands the observer a snapshot
//! of all derived fields plus the current cluster count. Purely
//! observational — dropping every event changes nothing about the run.

use serde::{Deserialize, Serialize};

/// Snapshot of one step's derived fields, emitted periodically.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub record_number: u64,
    pub sensor_value: f64,
    pub actual_category: u32,
    pub anomaly_score: Option<f64>,
    pub classification_inference: u32,
    pub classification_accuracy: f64,
    pub clustering_inference: Option<u32>,
    pub predicted_cluster_id: Option<u64>,
    pub clustering_accuracy: f64,
    pub cluster_homogeneity: f64,
    pub clustering_confidence: Option<f64>,
    pub num_clusters: usize,
}

/// Observer that receives run diagnostics.
pub trait RunObserver {
    /// Called on the periodic diagnostic steps.
    fn on_snapshot(&mut self, snapshot: &StepSnapshot);

    /// Called once when the record source is exhausted.
    fn on_completed(&mut self, trace_len: usize, num_clusters: usize) {
        let _ = (trace_len, num_clusters);
    }
}

/// Observer that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl RunObserver for NullObserver {
    fn on_snapshot(&mut self, _snapshot: &StepSnapshot) {}
}

/// Function-based observer for simple cases.
pub struct FnObserver<F: FnMut(&StepSnapshot)>(pub F);

impl<F: FnMut(&StepSnapshot)> RunObserver for FnObserver<F> {
    fn on_snapshot(&mut self, snapshot: &StepSnapshot) {
        (self.0)(snapshot);
    }
}

/// Channel-based observer — sends snapshots to a channel.
pub struct ChannelObserver {
    sender: std::sync::mpsc::Sender<StepSnapshot>,
}

impl ChannelObserver {
    pub fn new(sender: std::sync::mpsc::Sender<StepSnapshot>) -> Self {
        Self { sender }
    }
}

impl RunObserver for ChannelObserver {
    fn on_snapshot(&mut self, snapshot: &StepSnapshot) {
        let _ = self.sender.send(snapshot.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(record_number: u64) -> StepSnapshot {
        StepSnapshot {
            record_number,
            sensor_value: 1.0,
            actual_category: 1,
            anomaly_score: Some(0.1),
            classification_inference: 1,
            classification_accuracy: 0.5,
            clustering_inference: None,
            predicted_cluster_id: None,
            clustering_accuracy: 0.0,
            cluster_homogeneity: 0.0,
            clustering_confidence: None,
            num_clusters: 0,
        }
    }

    #[test]
    fn test_fn_observer_sees_snapshots() {
        let mut seen = Vec::new();
        {
            let mut observer = FnObserver(|s: &StepSnapshot| seen.push(s.record_number));
            observer.on_snapshot(&snapshot(0));
            observer.on_snapshot(&snapshot(50));
        }
        assert_eq!(seen, vec![0, 50]);
    }

    #[test]
    fn test_channel_observer_delivers() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut observer = ChannelObserver::new(tx);
        observer.on_snapshot(&snapshot(100));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.record_number, 100);
    }
}
