use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::DistanceMetric;
use crate::inspector::DEFAULT_NEIGHBORS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectorSettings {
    #[serde(default = "InspectorSettings::default_num_neighbors")]
    pub num_neighbors: usize,
    #[serde(default = "InspectorSettings::default_show_images")]
    pub show_neighbor_images: bool,
    #[serde(default)]
    pub distance_metric: DistanceMetric,
    // If None, use OS temporary directory for exports
    #[serde(default)]
    pub export_override: Option<PathBuf>,
    #[serde(default = "InspectorSettings::default_relation_type")]
    pub relation_type: String,
}

impl Default for InspectorSettings {
    fn default() -> Self {
        Self {
            num_neighbors: Self::default_num_neighbors(),
            show_neighbor_images: Self::default_show_images(),
            distance_metric: DistanceMetric::default(),
            export_override: None,
            relation_type: Self::default_relation_type(),
        }
    }
}

impl InspectorSettings {
    fn config_dir() -> PathBuf {
        // Cross-platform user config dir
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/Projector-Inspector
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join("Projector-Inspector");
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA%\Projector-Inspector
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join("Projector-Inspector");
            }
            return PathBuf::from("Projector-Inspector");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/Projector-Inspector or ~/.config/Projector-Inspector
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join("Projector-Inspector");
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join("Projector-Inspector");
        }
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_dir())
    }

    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let json_path = dir.join("settings.json");
        if json_path.exists() {
            let mut f = fs::File::open(json_path)?;
            let mut s = String::new();
            f.read_to_string(&mut s)?;
            let v: Self = serde_json::from_str(&s)?;
            return Ok(v);
        }
        // Migrate from legacy RON if present
        let ron_path = dir.join("settings.ron");
        if ron_path.exists() {
            let mut f = fs::File::open(&ron_path)?;
            let mut s = String::new();
            f.read_to_string(&mut s)?;
            let v: Self = ron::from_str(&s)?;
            // Save immediately to JSON for future reads
            if let Err(e) = v.save_to(dir) {
                log::warn!("could not migrate {} to JSON: {}", ron_path.display(), e);
            }
            return Ok(v);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_dir())
    }

    pub fn save_to(&self, dir: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(dir)?;
        let path = dir.join("settings.json");
        let s = serde_json::to_string_pretty(self)?;
        let mut f = fs::File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Return the directory where the settings file (settings.json) is stored.
    pub fn settings_dir() -> PathBuf {
        Self::config_dir()
    }

    /// Default export directory when no override is set: OS temporary directory.
    /// Example: {temp_dir}/Projector-Inspector/exports
    pub fn export_default_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push("Projector-Inspector");
        p.push("exports");
        p
    }

    pub fn export_dir(&self) -> PathBuf {
        if let Some(p) = &self.export_override { return p.clone(); }
        Self::export_default_dir()
    }

    pub(crate) fn default_num_neighbors() -> usize { DEFAULT_NEIGHBORS }
    pub(crate) fn default_show_images() -> bool { true }
    pub(crate) fn default_relation_type() -> String { "similar".to_string() }
}
