pub mod loader;
pub mod memory;
pub mod metadata;
pub mod metric;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use metadata::{FieldStats, SpriteAndMetadataInfo, SpriteMeta, SpriteSource, UniqueEntry};
pub use metric::DistanceMetric;

// Basic type alias for clarity
pub type PointIndex = usize;

/// One ranked neighbor of the focal point.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeighborEntry {
    pub index: PointIndex,
    pub dist: f32,
}

impl NeighborEntry {
    pub fn new(index: PointIndex, dist: f32) -> Self {
        Self { index, dist }
    }
}

/// A single metadata cell. Numbers and text are both shown through `Display`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Number(f64),
    Text(String),
}

impl MetadataValue {
    /// Numeric cells become `Number`, anything else stays text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(n) if !trimmed.is_empty() && n.is_finite() => MetadataValue::Number(n),
            _ => MetadataValue::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetadataValue::Number(n) => Some(*n),
            MetadataValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Number(n) => write!(f, "{}", n),
            MetadataValue::Text(s) => f.write_str(s),
        }
    }
}

/// Everything the inspector needs from the point storage.
///
/// `find_neighbors` must return entries sorted ascending by `dist`; the
/// inspector uses the first entry as its normalization baseline and never
/// re-sorts.
pub trait Dataset {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn metadata(&self, index: PointIndex, field: &str) -> Option<&MetadataValue>;

    fn find_neighbors(&self, index: PointIndex, metric: DistanceMetric, k: usize) -> Vec<NeighborEntry>;

    fn query(&self, text: &str, regex_mode: bool, field: &str) -> Vec<PointIndex>;

    fn filter_to_indices(&mut self, indices: &[PointIndex]);

    fn reset_filter(&mut self);

    fn sprite_and_metadata(&self) -> Option<&SpriteAndMetadataInfo>;

    /// Display label of a point for the given metadata field.
    fn label_for(&self, index: PointIndex, field: &str) -> String {
        match self.metadata(index, field) {
            Some(v) => v.to_string(),
            None => format!("Unknown #{}", index),
        }
    }
}
