use std::collections::HashMap;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use super::metadata::{analyze_metadata, SpriteAndMetadataInfo, SpriteSource};
use super::{Dataset, DistanceMetric, MetadataValue, NeighborEntry, PointIndex};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataPoint {
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: HashMap<String, MetadataValue>,
}

impl DataPoint {
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector, metadata: HashMap::new() }
    }

    pub fn with_meta(mut self, key: &str, value: MetadataValue) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Point cloud held entirely in memory with brute-force neighbor search.
///
/// Filtering keeps the original point indices stable; it only narrows the set
/// of points that neighbor search and queries consider.
#[derive(Clone, Debug)]
pub struct InMemoryDataset {
    points: Vec<DataPoint>,
    info: SpriteAndMetadataInfo,
    // None while the full dataset is shown
    active: Option<Vec<bool>>,
}

impl InMemoryDataset {
    pub fn new(points: Vec<DataPoint>, columns: Vec<String>) -> Self {
        let rows: Vec<HashMap<String, MetadataValue>> = points.iter().map(|p| p.metadata.clone()).collect();
        let stats = analyze_metadata(&columns, &rows);
        Self {
            points,
            info: SpriteAndMetadataInfo { stats, sprite: None },
            active: None,
        }
    }

    /// Build from points alone, taking metadata columns in sorted key order.
    pub fn from_points(points: Vec<DataPoint>) -> Self {
        let mut columns: Vec<String> = points
            .iter()
            .flat_map(|p| p.metadata.keys().cloned())
            .collect();
        columns.sort();
        columns.dedup();
        Self::new(points, columns)
    }

    pub fn with_sprite(mut self, sprite: SpriteSource) -> Self {
        self.info.sprite = Some(sprite);
        self
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn is_filtered(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_active(&self, index: PointIndex) -> bool {
        match &self.active {
            Some(mask) => mask.get(index).copied().unwrap_or(false),
            None => index < self.points.len(),
        }
    }

    pub fn active_indices(&self) -> Vec<PointIndex> {
        (0..self.points.len()).filter(|&i| self.is_active(i)).collect()
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn metadata(&self, index: PointIndex, field: &str) -> Option<&MetadataValue> {
        self.points.get(index).and_then(|p| p.metadata.get(field))
    }

    fn find_neighbors(&self, index: PointIndex, metric: DistanceMetric, k: usize) -> Vec<NeighborEntry> {
        let Some(origin) = self.points.get(index) else { return Vec::new() };
        let mut out: Vec<NeighborEntry> = self
            .points
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index && self.is_active(i))
            .map(|(i, p)| NeighborEntry::new(i, metric.distance(&origin.vector, &p.vector)))
            .collect();
        out.sort_by(|a, b| a.dist.total_cmp(&b.dist).then(a.index.cmp(&b.index)));
        out.truncate(k);
        out
    }

    fn query(&self, text: &str, regex_mode: bool, field: &str) -> Vec<PointIndex> {
        let labels = self
            .points
            .iter()
            .enumerate()
            .filter(|&(i, _)| self.is_active(i))
            .filter_map(|(i, p)| p.metadata.get(field).map(|v| (i, v.to_string())));

        if regex_mode {
            let re = match RegexBuilder::new(text).case_insensitive(true).build() {
                Ok(re) => re,
                Err(e) => {
                    log::warn!("invalid search pattern {:?}: {}", text, e);
                    return Vec::new();
                }
            };
            labels.filter(|(_, l)| re.is_match(l)).map(|(i, _)| i).collect()
        } else {
            let needle = text.to_lowercase();
            labels
                .filter(|(_, l)| l.to_lowercase().contains(&needle))
                .map(|(i, _)| i)
                .collect()
        }
    }

    fn filter_to_indices(&mut self, indices: &[PointIndex]) {
        let mut mask = vec![false; self.points.len()];
        for &i in indices {
            if let Some(slot) = mask.get_mut(i) {
                *slot = true;
            }
        }
        self.active = Some(mask);
    }

    fn reset_filter(&mut self) {
        self.active = None;
    }

    fn sprite_and_metadata(&self) -> Option<&SpriteAndMetadataInfo> {
        Some(&self.info)
    }
}
