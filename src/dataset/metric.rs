use std::fmt;

use serde::{Deserialize, Serialize};

/// Distance function used to rank neighbors.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Euclidean,
    #[default]
    Cosine,
}

impl DistanceMetric {
    pub const ALL: [DistanceMetric; 2] = [DistanceMetric::Cosine, DistanceMetric::Euclidean];

    /// Non-negative distance between two equal-length vectors.
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
            DistanceMetric::Cosine => {
                let mut dot = 0.0f32;
                let mut na = 0.0f32;
                let mut nb = 0.0f32;
                for (x, y) in a.iter().zip(b) {
                    dot += x * y;
                    na += x * x;
                    nb += y * y;
                }
                if na == 0.0 || nb == 0.0 {
                    // zero vectors are treated as orthogonal to everything
                    return 1.0;
                }
                (1.0 - dot / (na.sqrt() * nb.sqrt())).clamp(0.0, 2.0)
            }
        }
    }

    /// Upper bound of the distance range, when the metric has one.
    pub fn max_distance(self) -> Option<f32> {
        match self {
            DistanceMetric::Euclidean => None,
            DistanceMetric::Cosine => Some(2.0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Cosine => "cosine",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn euclidean_is_l2_norm() {
        let d = DistanceMetric::Euclidean.distance(&[0.0, 0.0], &[3.0, 4.0]);
        assert_abs_diff_eq!(d, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn cosine_spans_zero_to_two() {
        let same = DistanceMetric::Cosine.distance(&[1.0, 0.0], &[2.0, 0.0]);
        let orth = DistanceMetric::Cosine.distance(&[1.0, 0.0], &[0.0, 5.0]);
        let opp = DistanceMetric::Cosine.distance(&[1.0, 0.0], &[-1.0, 0.0]);
        assert_abs_diff_eq!(same, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(orth, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(opp, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn cosine_with_zero_vector_is_orthogonal() {
        assert_eq!(DistanceMetric::Cosine.distance(&[0.0, 0.0], &[1.0, 1.0]), 1.0);
    }
}
