use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::MetadataValue;

/// Columns with more unique values than this get no per-value breakdown.
pub const NUM_COLORS_COLOR_MAP: usize = 50;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniqueEntry {
    pub label: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub name: String,
    pub is_numeric: bool,
    pub too_many_unique_values: bool,
    pub unique_entries: Vec<UniqueEntry>,
    pub min: f64,
    pub max: f64,
}

impl FieldStats {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_numeric: true,
            too_many_unique_values: false,
            unique_entries: Vec::new(),
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

/// Sprite atlas as described by the dataset, before any derived fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteSource {
    pub image_path: PathBuf,
    pub single_image_dim: (u32, u32),
    // pixel width of the whole atlas image
    pub atlas_width: u32,
}

/// Sprite atlas with its derived layout fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteMeta {
    pub image_path: PathBuf,
    pub single_image_dim: (u32, u32),
    pub aspect_ratio: f32,
    pub n_cols: u32,
}

impl SpriteMeta {
    /// Derive layout from the source. `None` when the source has no usable image.
    pub fn from_source(src: &SpriteSource) -> Option<Self> {
        let (w, h) = src.single_image_dim;
        if src.image_path.as_os_str().is_empty() || w == 0 || h == 0 {
            return None;
        }
        Some(Self {
            image_path: src.image_path.clone(),
            single_image_dim: (w, h),
            aspect_ratio: w as f32 / h as f32,
            n_cols: src.atlas_width / w,
        })
    }

    /// Background size (percent of the cell) for both axes.
    pub fn background_size_percent(&self) -> f32 {
        self.n_cols as f32 * 100.0
    }

    /// Bottom padding (percent of width) that keeps the cell aspect ratio.
    pub fn padding_bottom_percent(&self) -> f32 {
        100.0 / self.aspect_ratio
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpriteAndMetadataInfo {
    pub stats: Vec<FieldStats>,
    #[serde(default)]
    pub sprite: Option<SpriteSource>,
}

impl SpriteAndMetadataInfo {
    pub fn field_names(&self) -> Vec<String> {
        self.stats.iter().map(|s| s.name.clone()).collect()
    }

    pub fn stats_for(&self, field: &str) -> Option<&FieldStats> {
        self.stats.iter().find(|s| s.name == field)
    }
}

/// Compute per-column statistics over the metadata of every point.
pub fn analyze_metadata(columns: &[String], rows: &[HashMap<String, MetadataValue>]) -> Vec<FieldStats> {
    let mut stats: Vec<FieldStats> = columns.iter().map(|c| FieldStats::empty(c)).collect();
    // per column: label -> position in unique_entries
    let mut seen: Vec<HashMap<String, usize>> = columns.iter().map(|_| HashMap::new()).collect();

    for row in rows {
        for (col, name) in columns.iter().enumerate() {
            let Some(value) = row.get(name) else { continue };
            let st = &mut stats[col];
            if !st.too_many_unique_values {
                let label = value.to_string();
                let map = &mut seen[col];
                match map.get(&label) {
                    Some(&pos) => st.unique_entries[pos].count += 1,
                    None => {
                        map.insert(label.clone(), st.unique_entries.len());
                        st.unique_entries.push(UniqueEntry { label, count: 1 });
                    }
                }
                if map.len() > NUM_COLORS_COLOR_MAP {
                    st.too_many_unique_values = true;
                }
            }
            match value.as_number() {
                Some(n) => {
                    st.min = st.min.min(n);
                    st.max = st.max.max(n);
                }
                None => st.is_numeric = false,
            }
        }
    }
    for st in &mut stats {
        if st.too_many_unique_values {
            st.unique_entries.clear();
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, MetadataValue> {
        pairs.iter().map(|(k, v)| (k.to_string(), MetadataValue::parse(v))).collect()
    }

    #[test]
    fn detects_numeric_columns_and_counts_values() {
        let cols = vec!["word".to_string(), "freq".to_string()];
        let rows = vec![
            row(&[("word", "cat"), ("freq", "3")]),
            row(&[("word", "dog"), ("freq", "5")]),
            row(&[("word", "cat"), ("freq", "1")]),
        ];
        let stats = analyze_metadata(&cols, &rows);
        assert!(!stats[0].is_numeric);
        assert!(stats[1].is_numeric);
        assert_eq!(stats[1].min, 1.0);
        assert_eq!(stats[1].max, 5.0);
        assert_eq!(stats[0].unique_entries, vec![
            UniqueEntry { label: "cat".into(), count: 2 },
            UniqueEntry { label: "dog".into(), count: 1 },
        ]);
    }

    #[test]
    fn flags_columns_with_too_many_unique_values() {
        let cols = vec!["id".to_string()];
        let rows: Vec<_> = (0..=NUM_COLORS_COLOR_MAP)
            .map(|i| {
                let id = format!("p{}", i);
                row(&[("id", id.as_str())])
            })
            .collect();
        let stats = analyze_metadata(&cols, &rows);
        assert!(stats[0].too_many_unique_values);
        assert!(stats[0].unique_entries.is_empty());
    }

    #[test]
    fn sprite_meta_derives_layout() {
        let src = SpriteSource {
            image_path: PathBuf::from("sprite.png"),
            single_image_dim: (28, 14),
            atlas_width: 280,
        };
        let meta = SpriteMeta::from_source(&src).expect("usable sprite");
        assert_eq!(meta.n_cols, 10);
        assert_eq!(meta.aspect_ratio, 2.0);
        assert_eq!(meta.padding_bottom_percent(), 50.0);
        assert_eq!(meta.background_size_percent(), 1000.0);

        let missing = SpriteSource { image_path: PathBuf::new(), ..src };
        assert!(SpriteMeta::from_source(&missing).is_none());
    }
}
