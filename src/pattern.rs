//! Sparse activation patterns.
//!
//! Sequence-memory stages expose their cell activity as sparse sets of
//! active-unit indices into a fixed-size binary vector. This module holds the
//! shape helpers that move between the index-set form (compact, what the
//! trace stores) and the dense 0/1 form (what cluster engines consume).

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// A sparse 0/1 activation pattern.
///
/// Stored as a sorted, deduplicated set of active indices into a binary
/// vector of `size` units. Immutable after construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparsePattern {
    indices: Vec<usize>,
    size: usize,
}

impl SparsePattern {
    /// Build a pattern from active indices.
    ///
    /// Indices are sorted and deduplicated; any index `>= size` is a shape
    /// error, since it cannot address the underlying binary vector.
    pub fn from_indices(mut indices: Vec<usize>, size: usize) -> Result<Self> {
        indices.sort_unstable();
        indices.dedup();
        if let Some(&last) = indices.last() {
            if last >= size {
                return Err(PipelineError::Shape {
                    expected: size as u64,
                    got: last as u64,
                });
            }
        }
        Ok(Self { indices, size })
    }

    /// Build a pattern from a dense 0/1 vector (nonzero = active).
    pub fn from_dense(dense: &[u8]) -> Self {
        let indices = dense
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0)
            .map(|(i, _)| i)
            .collect();
        Self {
            indices,
            size: dense.len(),
        }
    }

    /// An empty pattern over `size` units.
    pub fn empty(size: usize) -> Self {
        Self {
            indices: Vec::new(),
            size,
        }
    }

    /// Expand to the dense 0/1 form.
    pub fn to_dense(&self) -> Vec<u8> {
        let mut dense = vec![0u8; self.size];
        for &i in &self.indices {
            dense[i] = 1;
        }
        dense
    }

    /// Active indices, sorted ascending.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Size of the underlying binary vector.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of active units.
    pub fn active_count(&self) -> usize {
        self.indices.len()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Number of indices active in both patterns.
    ///
    /// Linear merge over the two sorted index sets.
    pub fn overlap(&self, other: &SparsePattern) -> usize {
        let (mut a, mut b) = (0, 0);
        let mut shared = 0;
        while a < self.indices.len() && b < other.indices.len() {
            match self.indices[a].cmp(&other.indices[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    shared += 1;
                    a += 1;
                    b += 1;
                }
            }
        }
        shared
    }
}
