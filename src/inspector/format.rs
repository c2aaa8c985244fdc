//! Visual encodings for ranked rows: normalized bar length, matching color,
//! and sprite atlas placement.
//!
//! `normalize` and `color_for` share one scale. A row's bar width and its
//! color are always derived from the same normalized value.

use serde::{Deserialize, Serialize};

use crate::dataset::{DistanceMetric, NeighborEntry, PointIndex, SpriteMeta, UniqueEntry};

use super::LIMIT_RESULTS;

const EPSILON: f32 = 1e-6;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert from hue in degrees, saturation and lightness in [0,1].
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = (h.rem_euclid(360.0)) / 60.0;
        let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
        let (r1, g1, b1) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let ch = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb::new(ch(r1), ch(g1), ch(b1))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

// similarity stops, ascending: far -> orange, mid -> red, closest -> purple
fn color_stops() -> [(f32, Rgb); 3] {
    [
        (0.4, Rgb::from_hsl(40.0, 0.7, 0.6)),
        (0.7, Rgb::from_hsl(0.0, 0.8, 0.65)),
        (1.0, Rgb::from_hsl(285.0, 0.8, 0.4)),
    ]
}

fn similarity_color(similarity: f32) -> Rgb {
    let stops = color_stops();
    let s = similarity.clamp(stops[0].0, stops[2].0);
    for w in stops.windows(2) {
        let (lo, c_lo) = w[0];
        let (hi, c_hi) = w[1];
        if s <= hi {
            return c_lo.lerp(c_hi, (s - lo) / (hi - lo));
        }
    }
    stops[2].1
}

/// Map `value` to [0,1] relative to `baseline` (the closest distance).
///
/// Euclidean distances have no upper bound, so the excess over the baseline
/// is compressed with `x / (1 + x)`. Cosine distances live in [0,2] and are
/// scaled linearly over what remains of that range above the baseline.
pub fn normalize(metric: DistanceMetric, value: f32, baseline: f32) -> f32 {
    if !(value > baseline) {
        return 0.0;
    }
    let n = match metric {
        DistanceMetric::Euclidean => {
            let x = (value - baseline) / baseline.max(EPSILON);
            1.0 - 1.0 / (1.0 + x)
        }
        DistanceMetric::Cosine => {
            let span = metric.max_distance().unwrap_or(2.0) - baseline;
            if span <= 0.0 {
                return 0.0;
            }
            (value - baseline) / span
        }
    };
    n.clamp(0.0, 1.0)
}

pub fn color_for(metric: DistanceMetric, value: f32, baseline: f32) -> Rgb {
    similarity_color(1.0 - normalize(metric, value, baseline))
}

/// Where a point's thumbnail sits inside a square sprite atlas.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpritePlacement {
    pub row: u32,
    pub col: u32,
    pub top_percent: f32,
    pub left_percent: f32,
}

impl SpritePlacement {
    pub fn for_index(index: PointIndex, n_cols: u32) -> Option<Self> {
        if n_cols == 0 {
            return None;
        }
        let row = (index / n_cols as usize) as u32;
        let col = (index % n_cols as usize) as u32;
        let (top_percent, left_percent) = if n_cols > 1 {
            let denom = (n_cols - 1) as f32;
            (row as f32 / denom * 100.0, col as f32 / denom * 100.0)
        } else {
            (0.0, 0.0)
        };
        Some(Self { row, col, top_percent, left_percent })
    }

    /// Texture coordinates `(min, max)` of the cell.
    pub fn uv_rect(&self, n_cols: u32) -> ([f32; 2], [f32; 2]) {
        let cell = 1.0 / n_cols.max(1) as f32;
        let min = [self.col as f32 * cell, self.row as f32 * cell];
        ([min[0], min[1]], [min[0] + cell, min[1] + cell])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderRow {
    pub index: PointIndex,
    pub label: String,
    pub dist: f32,
    pub dist_text: String,
    pub normalized: f32,
    pub color: Rgb,
    pub image: Option<SpritePlacement>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    pub index: PointIndex,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub label: String,
    pub count: usize,
    pub fill: f32,
    pub color: Rgb,
}

/// Format a ranked neighbor list. Input must already be ascending by distance.
pub fn format_neighbors<F>(
    neighbors: &[NeighborEntry],
    metric: DistanceMetric,
    sprite: Option<&SpriteMeta>,
    show_images: bool,
    label: F,
) -> Vec<RenderRow>
where
    F: Fn(PointIndex) -> String,
{
    let Some(first) = neighbors.first() else { return Vec::new() };
    let min_dist = first.dist;
    let n_cols = if show_images { sprite.map(|s| s.n_cols) } else { None };

    neighbors
        .iter()
        .take(LIMIT_RESULTS)
        .map(|n| RenderRow {
            index: n.index,
            label: label(n.index),
            dist: n.dist,
            dist_text: format!("{:.3}", n.dist),
            normalized: normalize(metric, n.dist, min_dist),
            color: color_for(metric, n.dist, min_dist),
            image: n_cols.and_then(|c| SpritePlacement::for_index(n.index, c)),
        })
        .collect()
}

pub fn format_matches<F>(indices: &[PointIndex], label: F) -> Vec<MatchRow>
where
    F: Fn(PointIndex) -> String,
{
    indices
        .iter()
        .take(LIMIT_RESULTS)
        .map(|&index| MatchRow { index, label: label(index) })
        .collect()
}

/// Rows for a metadata column's value counts, least frequent first.
///
/// Counts are unbounded, so they always use the ratio scale: the most
/// frequent value gets a full bar.
pub fn format_metadata_entries(entries: &[UniqueEntry]) -> Vec<MetadataRow> {
    let mut sorted: Vec<&UniqueEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.count);
    let Some(max_count) = sorted.last().map(|e| e.count) else { return Vec::new() };
    let max = max_count.max(1) as f32;

    sorted
        .into_iter()
        .map(|e| {
            let count = e.count as f32;
            MetadataRow {
                label: e.label.clone(),
                count: e.count,
                fill: 1.0 - normalize(DistanceMetric::Euclidean, max, count),
                color: color_for(DistanceMetric::Euclidean, max, count),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hsl_conversion_hits_known_colors() {
        assert_eq!(Rgb::from_hsl(0.0, 1.0, 0.5), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hsl(120.0, 1.0, 0.5), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::from_hsl(240.0, 1.0, 0.5), Rgb::new(0, 0, 255));
        assert_eq!(Rgb::new(255, 0, 16).to_hex(), "#ff0010");
    }

    #[test]
    fn color_scale_endpoints_and_clamping() {
        let closest = Rgb::from_hsl(285.0, 0.8, 0.4);
        let farthest = Rgb::from_hsl(40.0, 0.7, 0.6);
        assert_eq!(similarity_color(1.0), closest);
        assert_eq!(similarity_color(0.4), farthest);
        assert_eq!(similarity_color(0.0), farthest);
        assert_eq!(similarity_color(0.7), Rgb::from_hsl(0.0, 0.8, 0.65));
    }

    #[test]
    fn euclidean_normalization_is_unbounded_ratio() {
        assert_eq!(normalize(DistanceMetric::Euclidean, 1.0, 1.0), 0.0);
        assert_abs_diff_eq!(normalize(DistanceMetric::Euclidean, 2.0, 1.0), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(normalize(DistanceMetric::Euclidean, 4.0, 1.0), 0.75, epsilon = 1e-6);
        let far = normalize(DistanceMetric::Euclidean, 1.0e30, 1.0);
        assert!(far <= 1.0 && far > 0.99);
    }

    #[test]
    fn cosine_normalization_uses_fixed_range() {
        assert_eq!(normalize(DistanceMetric::Cosine, 0.2, 0.2), 0.0);
        assert_abs_diff_eq!(normalize(DistanceMetric::Cosine, 1.0, 0.0), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(normalize(DistanceMetric::Cosine, 2.0, 0.0), 1.0, epsilon = 1e-6);
        assert_eq!(normalize(DistanceMetric::Cosine, 2.0, 2.0), 0.0);
    }

    #[test]
    fn cosine_range_ends_at_metric_maximum() {
        let max = DistanceMetric::Cosine.max_distance().expect("cosine is bounded");
        for baseline in [0.0, 0.3, 1.2] {
            assert_abs_diff_eq!(normalize(DistanceMetric::Cosine, max, baseline), 1.0, epsilon = 1e-6);
        }
        assert_eq!(DistanceMetric::Euclidean.max_distance(), None);
    }

    #[test]
    fn normalize_is_monotone_for_fixed_baseline() {
        for metric in DistanceMetric::ALL {
            for baseline in [0.0f32, 0.05, 0.3, 1.0] {
                let mut prev = 0.0f32;
                for step in 0..200 {
                    let v = baseline + step as f32 * 0.01;
                    let n = normalize(metric, v, baseline);
                    assert!((0.0..=1.0).contains(&n));
                    assert!(n >= prev, "{metric} baseline={baseline} v={v}");
                    prev = n;
                }
            }
        }
    }

    #[test]
    fn sprite_placement_grid_math() {
        let p = SpritePlacement::for_index(7, 3).unwrap();
        assert_eq!((p.row, p.col), (2, 1));
        assert_abs_diff_eq!(p.top_percent, 100.0);
        assert_abs_diff_eq!(p.left_percent, 50.0);
        let (min, max) = p.uv_rect(4);
        assert_abs_diff_eq!(min[0], 0.25);
        assert_abs_diff_eq!(max[1], 0.75);

        let single = SpritePlacement::for_index(5, 1).unwrap();
        assert_eq!((single.top_percent, single.left_percent), (0.0, 0.0));
        assert!(SpritePlacement::for_index(5, 0).is_none());
    }

    #[test]
    fn metadata_rows_sort_ascending_and_fill_by_share() {
        let entries = vec![
            UniqueEntry { label: "a".into(), count: 4 },
            UniqueEntry { label: "b".into(), count: 1 },
            UniqueEntry { label: "c".into(), count: 2 },
        ];
        let rows = format_metadata_entries(&entries);
        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "c", "a"]);
        assert_abs_diff_eq!(rows[0].fill, 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(rows[2].fill, 1.0, epsilon = 1e-6);
        assert_eq!(rows[2].color, similarity_color(1.0));
        assert!(format_metadata_entries(&[]).is_empty());
    }
}
