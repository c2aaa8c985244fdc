use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

/// Downloadable record of a search term and the neighbors marked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub name: Vec<String>,
    pub label: Vec<String>,
    #[serde(rename = "relType")]
    pub rel_type: Vec<String>,
    pub elements: Vec<String>,
}

impl SelectionSnapshot {
    pub fn search_value(&self) -> &str {
        self.name.first().map(String::as_str).unwrap_or("")
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// File name for a snapshot: the search value, or a timestamp when there is none.
pub fn snapshot_file_name(snapshot: &SelectionSnapshot) -> String {
    let stem: String = snapshot
        .search_value()
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    if stem.is_empty() {
        let now = OffsetDateTime::now_utc();
        let fmt = format_description!("[year][month][day]_[hour][minute][second]");
        let stamp = now.format(fmt).unwrap_or_else(|_| "unknown".to_string());
        return format!("selection_{}.json", stamp);
    }
    format!("{}.json", stem)
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut f = File::create(&tmp_path)?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

pub fn export_snapshot(snapshot: &SelectionSnapshot, dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(snapshot_file_name(snapshot));
    let mut s = snapshot.to_json()?;
    // ensure newline at end
    s.push('\n');
    atomic_write(&path, s.as_bytes())?;
    log::info!("exported selection to {}", path.display());
    Ok(path)
}
