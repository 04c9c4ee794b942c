use crate::error::{Result, VectorStoreError};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Distance between two embeddings; lower is more similar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared Euclidean distance
    #[default]
    L2,
    /// `1 - cosine similarity`
    Cosine,
}

impl DistanceMetric {
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        let a = ArrayView1::from(a);
        let b = ArrayView1::from(b);
        match self {
            DistanceMetric::L2 => {
                let diff = &a - &b;
                diff.dot(&diff)
            }
            DistanceMetric::Cosine => {
                let norm_a = a.dot(&a).sqrt();
                let norm_b = b.dot(&b).sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 1.0;
                }
                1.0 - a.dot(&b) / (norm_a * norm_b)
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DistanceMetric::L2 => "l2",
            DistanceMetric::Cosine => "cosine",
        }
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l2" => Ok(DistanceMetric::L2),
            "cosine" => Ok(DistanceMetric::Cosine),
            other => Err(format!("unknown distance metric '{other}' (expected l2 or cosine)")),
        }
    }
}

/// Exact nearest-neighbour index (brute force over every stored vector)
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    metric: DistanceMetric,
    vectors: HashMap<String, Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            dimension,
            metric,
            vectors: HashMap::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Insert or replace the vector stored under `id`
    pub fn upsert(&mut self, id: &str, vector: &[f32]) -> Result<()> {
        self.check_dimension(vector)?;
        self.vectors.insert(id.to_string(), vector.to_vec());
        Ok(())
    }

    /// Up to `k` ids accepted by `filter`, ascending by distance.
    ///
    /// Ties are broken by id so results are deterministic.
    pub fn search<F>(&self, query: &[f32], k: usize, filter: F) -> Result<Vec<(String, f32)>>
    where
        F: Fn(&str) -> bool,
    {
        self.check_dimension(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(&str, f32)> = self
            .vectors
            .iter()
            .filter(|(id, _)| filter(id.as_str()))
            .map(|(id, vector)| (id.as_str(), self.metric.distance(query, vector)))
            .filter(|(_, distance)| !distance.is_nan())
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(id, distance)| (id.to_string(), distance))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn clear(&mut self) {
        self.vectors.clear();
    }
}
