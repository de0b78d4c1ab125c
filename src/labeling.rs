//! Majority-vote cluster labeling and homogeneity scoring.
//!
//! Labels are assigned from the frequency distribution of ground-truth
//! categories among a cluster's points: the category with the highest count
//! wins. On a tie the **lowest category id** wins — the frequencies are
//! enumerated sorted ascending by category and only a strictly greater count
//! displaces the current best, which makes the rule deterministic.
//!
//! Homogeneity is a global snapshot metric: the percentage of points, across
//! all clusters, whose stored category equals their owning cluster's current
//! label. Calling it before labeling scores against unset labels, and an
//! unset label never equals any real category.

use crate::cluster::ClusterEngine;

/// Assign every cluster the majority category of its points.
///
/// Empty clusters keep whatever label they had (there is no majority to
/// take). Ties break to the lowest category id.
pub fn label_clusters(engine: &mut dyn ClusterEngine) {
    for cluster in engine.clusters_mut() {
        let mut best: Option<(u32, usize)> = None;
        for (category, count) in cluster.category_frequencies() {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((category, count)),
            }
        }
        if let Some((category, _)) = best {
            cluster.set_label(category);
        }
    }
}

/// Percentage in [0, 100] of points matching their cluster's label.
///
/// Returns exactly `0.0` when no cluster holds any point.
pub fn compute_homogeneity(engine: &dyn ClusterEngine) -> f64 {
    let mut correct = 0usize;
    let mut total = 0usize;
    for cluster in engine.clusters() {
        for point in cluster.points() {
            if cluster.label() == Some(point.category) {
                correct += 1;
            }
            total += 1;
        }
    }
    if total > 0 {
        100.0 * correct as f64 / total as f64
    } else {
        0.0
    }
}

/// Per-step clustering inference: `(label, cluster id, homogeneity)`.
///
/// Labels the current clusters, then reads the predicted cluster's label.
/// With no predicted cluster, label and id are `None` but homogeneity is
/// still the current global snapshot. A predicted id the engine no longer
/// knows (pruned or merged away since prediction) yields a `None` label with
/// the id preserved.
pub fn clustering_inference(
    predicted: Option<u64>,
    engine: &mut dyn ClusterEngine,
) -> (Option<u32>, Option<u64>, f64) {
    let label = match predicted {
        Some(id) => {
            label_clusters(engine);
            engine.cluster_by_id(id).and_then(|c| c.label())
        }
        None => None,
    };
    let homogeneity = compute_homogeneity(engine);
    (label, predicted, homogeneity)
}
