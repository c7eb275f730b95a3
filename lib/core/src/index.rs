//! Brute-force Euclidean k-nearest-neighbor index.
//!
//! Vectors live in one contiguous buffer in corpus order, so position `i` in
//! the index is position `i` in the corpus. Queries scan every row; there is no
//! approximation and no mutation after [`SimilarityIndex::fit`].

use crate::distance::squared_euclidean;
use crate::{Error, Result, Vector};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BinaryHeap;

/// One search hit: corpus position and Euclidean distance to the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexParts")]
pub struct SimilarityIndex {
    /// Vector dimension
    dim: usize,
    /// Number of indexed vectors
    len: usize,
    /// Neighbor count used when the caller does not pass one
    n_neighbors: usize,
    /// Row-major storage, `len * dim` floats
    data: Vec<f32>,
}

/// Unchecked wire form; converted through `TryFrom` so a decoded index always
/// satisfies the same invariants as a fitted one.
#[derive(Deserialize)]
struct IndexParts {
    dim: usize,
    len: usize,
    n_neighbors: usize,
    data: Vec<f32>,
}

impl TryFrom<IndexParts> for SimilarityIndex {
    type Error = String;

    fn try_from(parts: IndexParts) -> std::result::Result<Self, Self::Error> {
        if parts.dim == 0 {
            return Err("index has zero dimensions".to_string());
        }
        if parts.len == 0 {
            return Err("index is empty".to_string());
        }
        if parts.n_neighbors == 0 {
            return Err("index has n_neighbors = 0".to_string());
        }
        if parts.len.checked_mul(parts.dim) != Some(parts.data.len()) {
            return Err(format!(
                "index holds {} floats, expected {} vectors of dimension {}",
                parts.data.len(),
                parts.len,
                parts.dim
            ));
        }
        Ok(Self {
            dim: parts.dim,
            len: parts.len,
            n_neighbors: parts.n_neighbors,
            data: parts.data,
        })
    }
}

impl SimilarityIndex {
    /// Fit the index over `vectors`, keeping their order.
    pub fn fit(vectors: &[Vector], n_neighbors: usize) -> Result<Self> {
        if n_neighbors == 0 {
            return Err(Error::InvalidArgument(
                "n_neighbors must be at least 1".to_string(),
            ));
        }
        let first = vectors.first().ok_or_else(|| {
            Error::Corpus("cannot fit a neighbor index on zero vectors".to_string())
        })?;

        let dim = first.dim();
        if dim == 0 {
            return Err(Error::Encoding(
                "cannot index zero-dimensional vectors".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(vectors.len() * dim);
        for vector in vectors {
            if vector.dim() != dim {
                return Err(Error::InvalidDimension {
                    expected: dim,
                    actual: vector.dim(),
                });
            }
            data.extend_from_slice(vector.as_slice());
        }

        Ok(Self {
            dim,
            len: vectors.len(),
            n_neighbors,
            data,
        })
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Stored vector at corpus position `index`
    #[inline]
    pub fn vector(&self, index: usize) -> Option<&[f32]> {
        if index >= self.len {
            return None;
        }
        let start = index * self.dim;
        Some(&self.data[start..start + self.dim])
    }

    /// Stored vectors in corpus order
    pub fn vectors(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.data.chunks_exact(self.dim)
    }

    /// Search with the fitted default neighbor count
    pub fn kneighbors(&self, query: &[f32]) -> Result<Vec<Neighbor>> {
        self.search(query, self.n_neighbors)
    }

    /// Return the `k` stored vectors closest to `query`, nearest first.
    ///
    /// Equal distances are ordered by ascending corpus position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        if k > self.len {
            return Err(Error::InsufficientCorpus {
                requested: k,
                available: self.len,
            });
        }
        if query.len() != self.dim {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: query.len(),
            });
        }

        // Max-heap of the k best (distance, position) pairs seen so far; the
        // root is the current worst keeper.
        let mut heap: BinaryHeap<(OrderedFloat<f32>, usize)> = BinaryHeap::with_capacity(k + 1);
        for (index, row) in self.vectors().enumerate() {
            let candidate = (OrderedFloat(squared_euclidean(query, row)), index);
            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(worst) = heap.peek() {
                if candidate < *worst {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|(squared, index)| Neighbor {
                index,
                distance: squared.0.sqrt(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_index() -> SimilarityIndex {
        let vectors: Vec<Vector> = (0..10)
            .map(|i| Vector::new(vec![i as f32, 0.0]))
            .collect();
        SimilarityIndex::fit(&vectors, 5).unwrap()
    }

    #[test]
    fn test_fit_keeps_order() {
        let index = line_index();
        assert_eq!(index.len(), 10);
        assert_eq!(index.dim(), 2);
        assert_eq!(index.vector(3), Some(&[3.0, 0.0][..]));
        assert_eq!(index.vector(10), None);
        assert_eq!(index.vectors().count(), 10);
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = line_index();
        let results = index.search(&[6.2, 0.0], 3).unwrap();
        let positions: Vec<usize> = results.iter().map(|n| n.index).collect();
        assert_eq!(positions, vec![6, 7, 5]);
        assert!((results[0].distance - 0.2).abs() < 1e-5);
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_ties_break_by_position() {
        let vectors = vec![
            Vector::new(vec![1.0, 0.0]),
            Vector::new(vec![0.0, 1.0]),
            Vector::new(vec![-1.0, 0.0]),
            Vector::new(vec![0.0, -1.0]),
        ];
        let index = SimilarityIndex::fit(&vectors, 2).unwrap();
        let results = index.search(&[0.0, 0.0], 4).unwrap();
        let positions: Vec<usize> = results.iter().map(|n| n.index).collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_kneighbors_uses_fitted_count() {
        let index = line_index();
        assert_eq!(index.kneighbors(&[0.0, 0.0]).unwrap().len(), 5);
    }

    #[test]
    fn test_k_bound() {
        let index = line_index();
        assert_eq!(index.search(&[0.0, 0.0], 10).unwrap().len(), 10);
        assert!(matches!(
            index.search(&[0.0, 0.0], 11),
            Err(Error::InsufficientCorpus { requested: 11, available: 10 })
        ));
        assert!(matches!(
            index.search(&[0.0, 0.0], 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = line_index();
        assert!(matches!(
            index.search(&[0.0, 0.0, 0.0], 1),
            Err(Error::InvalidDimension { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        assert!(matches!(
            SimilarityIndex::fit(&[], 5),
            Err(Error::Corpus(_))
        ));
        assert!(matches!(
            SimilarityIndex::fit(&[Vector::new(vec![1.0])], 0),
            Err(Error::InvalidArgument(_))
        ));
        let ragged = vec![Vector::new(vec![1.0, 2.0]), Vector::new(vec![1.0])];
        assert!(matches!(
            SimilarityIndex::fit(&ragged, 1),
            Err(Error::InvalidDimension { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_try_from_rejects_inconsistent_parts() {
        let parts = IndexParts {
            dim: 2,
            len: 3,
            n_neighbors: 1,
            data: vec![0.0; 5],
        };
        assert!(SimilarityIndex::try_from(parts).is_err());

        let parts = IndexParts {
            dim: 2,
            len: 2,
            n_neighbors: 1,
            data: vec![0.0; 4],
        };
        assert!(SimilarityIndex::try_from(parts).is_ok());
    }
}
