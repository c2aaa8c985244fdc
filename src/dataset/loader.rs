use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use super::memory::{DataPoint, InMemoryDataset};
use super::MetadataValue;

fn tsv_reader<R: Read>(r: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(r)
}

/// Parse one vector per line, tab-separated floats. Blank lines are skipped.
pub fn parse_tensors<R: Read>(r: R) -> Result<Vec<Vec<f32>>> {
    let mut out: Vec<Vec<f32>> = Vec::new();
    let mut dim: Option<usize> = None;
    for (line, rec) in tsv_reader(r).records().enumerate() {
        let rec = rec?;
        if rec.iter().all(|c| c.trim().is_empty()) { continue; }
        let v = rec
            .iter()
            .map(|c| c.trim().parse::<f32>())
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| anyhow!("line {}: invalid number: {}", line + 1, e))?;
        match dim {
            Some(d) if d != v.len() => {
                return Err(anyhow!("line {}: expected {} dimensions, found {}", line + 1, d, v.len()));
            }
            _ => dim = Some(v.len()),
        }
        out.push(v);
    }
    Ok(out)
}

/// Parse metadata rows. A single column has no header and is named `label`;
/// multiple columns take their names from the first line.
pub fn parse_metadata<R: Read>(r: R) -> Result<(Vec<String>, Vec<HashMap<String, MetadataValue>>)> {
    let records: Vec<csv::StringRecord> = tsv_reader(r).records().collect::<std::result::Result<_, _>>()?;
    let Some(first) = records.first() else { return Ok((Vec::new(), Vec::new())) };

    let (columns, body): (Vec<String>, &[csv::StringRecord]) = if first.len() > 1 {
        (first.iter().map(|s| s.to_string()).collect(), &records[1..])
    } else {
        (vec!["label".to_string()], &records[..])
    };

    let rows = body
        .iter()
        .map(|rec| {
            columns
                .iter()
                .zip(rec.iter())
                .filter(|(_, cell)| !cell.is_empty())
                .map(|(name, cell)| (name.clone(), MetadataValue::parse(cell)))
                .collect()
        })
        .collect();
    Ok((columns, rows))
}

pub fn load_tsv(vectors: &Path, metadata: Option<&Path>) -> Result<InMemoryDataset> {
    let f = File::open(vectors).with_context(|| format!("opening {}", vectors.display()))?;
    let tensors = parse_tensors(f)?;
    let (columns, rows) = match metadata {
        Some(p) => {
            let f = File::open(p).with_context(|| format!("opening {}", p.display()))?;
            parse_metadata(f)?
        }
        None => (Vec::new(), Vec::new()),
    };
    if !rows.is_empty() && rows.len() != tensors.len() {
        return Err(anyhow!(
            "metadata has {} rows but there are {} vectors",
            rows.len(),
            tensors.len()
        ));
    }
    let mut rows = rows.into_iter();
    let points = tensors
        .into_iter()
        .map(|vector| DataPoint { vector, metadata: rows.next().unwrap_or_default() })
        .collect();
    log::info!("loaded point cloud from {}", vectors.display());
    Ok(InMemoryDataset::new(points, columns))
}

#[derive(Deserialize)]
struct JsonDataset {
    points: Vec<DataPoint>,
    #[serde(default)]
    columns: Option<Vec<String>>,
}

pub fn load_json(path: &Path) -> Result<InMemoryDataset> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut s = String::new();
    f.read_to_string(&mut s)?;
    let doc: JsonDataset = serde_json::from_str(&s)?;
    log::info!("loaded {} points from {}", doc.points.len(), path.display());
    Ok(match doc.columns {
        Some(cols) => InMemoryDataset::new(doc.points, cols),
        None => InMemoryDataset::from_points(doc.points),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    #[test]
    fn parses_tensors_and_rejects_ragged_rows() {
        let ok = parse_tensors("1\t2\n3\t4\n\n".as_bytes()).unwrap();
        assert_eq!(ok, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert!(parse_tensors("1\t2\n3\n".as_bytes()).is_err());
        assert!(parse_tensors("1\tx\n".as_bytes()).is_err());
    }

    #[test]
    fn single_column_metadata_has_no_header() {
        let (cols, rows) = parse_metadata("cat\ndog\n".as_bytes()).unwrap();
        assert_eq!(cols, vec!["label".to_string()]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["label"].to_string(), "dog");
    }

    #[test]
    fn multi_column_metadata_uses_header() {
        let (cols, rows) = parse_metadata("word\tfreq\ncat\t3\ndog\t\n".as_bytes()).unwrap();
        assert_eq!(cols, vec!["word".to_string(), "freq".to_string()]);
        assert_eq!(rows[0]["freq"], MetadataValue::Number(3.0));
        assert!(!rows[1].contains_key("freq"));
    }

    #[test]
    fn json_document_round_trips_into_dataset() {
        let doc = r#"{"points":[{"vector":[1,0],"metadata":{"word":"a"}},{"vector":[0,1]}]}"#;
        let parsed: JsonDataset = serde_json::from_str(doc).unwrap();
        let ds = InMemoryDataset::from_points(parsed.points);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.label_for(0, "word"), "a");
        assert_eq!(ds.label_for(1, "word"), "Unknown #1");
    }
}
