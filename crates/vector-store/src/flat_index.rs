use crate::error::{Result, VectorStoreError};
use ndarray::{Array2, ArrayView1, Axis};

/// A nearest-neighbor match: the row offset inside the index and its squared L2 distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub offset: usize,
    pub distance: f32,
}

/// Exact (brute-force) vector index over a dense row-major buffer.
///
/// Rows are addressed by insertion offset. There is no targeted delete: callers that need to
/// remove or replace rows rebuild the whole index, which is the only operation that moves rows.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    rows: Array2<f32>,
}

impl FlatIndex {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            rows: Array2::zeros((0, dimension)),
        }
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of rows in the index
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.nrows()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.nrows() == 0
    }

    /// Append one vector, returning its offset
    pub fn append(&mut self, vector: &[f32]) -> Result<usize> {
        self.check_vector(vector)?;
        self.rows
            .push_row(ArrayView1::from(vector))
            .map_err(|e| VectorStoreError::invalid_input(format!("index append: {e}")))?;
        Ok(self.rows.nrows() - 1)
    }

    /// Replace the whole content so that offset `i` holds `vectors[i]`.
    ///
    /// Every vector is validated first; on error the previous content is kept.
    pub fn rebuild(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        for vector in vectors {
            self.check_vector(vector)?;
        }
        let flat: Vec<f32> = vectors.iter().flatten().copied().collect();
        self.rows = Array2::from_shape_vec((vectors.len(), self.dimension), flat)
            .map_err(|e| VectorStoreError::invalid_input(format!("index rebuild: {e}")))?;
        log::debug!("Rebuilt flat index with {} rows", vectors.len());
        Ok(())
    }

    /// The vector stored at `offset`
    #[must_use]
    pub fn row(&self, offset: usize) -> Option<Vec<f32>> {
        (offset < self.rows.nrows()).then(|| self.rows.row(offset).to_vec())
    }

    /// All rows in offset order
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<f32>> {
        self.rows.outer_iter().map(|row| row.to_vec()).collect()
    }

    /// Up to `k` nearest rows by squared Euclidean distance, closest first.
    /// Equal distances are ordered by offset.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check_vector(query)?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<Neighbor> = self
            .rows
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(offset, row)| Neighbor {
                offset,
                distance: squared_l2(row.iter().copied(), query),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.offset.cmp(&b.offset))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Width must match and every component must be finite.
    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if let Some(at) = vector.iter().position(|v| !v.is_finite()) {
            return Err(VectorStoreError::invalid_input(format!(
                "vector component {at} is not finite"
            )));
        }
        Ok(())
    }
}

fn squared_l2(row: impl Iterator<Item = f32>, query: &[f32]) -> f32 {
    row.zip(query.iter())
        .map(|(a, b)| {
            let d = a - b;
            d * d
        })
        .sum()
}
