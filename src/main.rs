mod gui;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Arg, Command};
use eframe::egui;

use gui::frontend::InspectorApp;
use projector_inspector::dataset::loader;
use projector_inspector::dataset::memory::InMemoryDataset;
use projector_inspector::dataset::SpriteSource;
use projector_inspector::persistence::settings::InspectorSettings;

fn parse_dim(s: &str) -> anyhow::Result<(u32, u32)> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got {}", s))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

fn load_sprite(path: &Path, dim: (u32, u32)) -> anyhow::Result<(SpriteSource, egui::IconData)> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let image = eframe::icon_data::from_png_bytes(&bytes).map_err(|e| anyhow!("decoding {}: {}", path.display(), e))?;
    let src = SpriteSource {
        image_path: path.to_path_buf(),
        single_image_dim: dim,
        atlas_width: image.width,
    };
    Ok((src, image))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = Command::new("Projector-Inspector")
        .about("Inspect nearest neighbors of an embedding point cloud")
        .arg(Arg::new("vectors").long("vectors").value_name("TSV").help("Tab-separated vectors, one per line"))
        .arg(Arg::new("metadata").long("metadata").value_name("TSV").help("Tab-separated metadata, header row for multiple columns"))
        .arg(Arg::new("json").long("json").value_name("FILE").conflicts_with("vectors").help("JSON document with points and metadata"))
        .arg(Arg::new("sprite").long("sprite").value_name("PNG").requires("sprite_dim").help("Sprite atlas image"))
        .arg(Arg::new("sprite_dim").long("sprite-dim").value_name("WxH").help("Size of a single sprite image"))
        .get_matches();

    let mut dataset: InMemoryDataset = if let Some(p) = matches.get_one::<String>("json") {
        loader::load_json(Path::new(p))?
    } else if let Some(p) = matches.get_one::<String>("vectors") {
        let meta = matches.get_one::<String>("metadata").map(PathBuf::from);
        loader::load_tsv(Path::new(p), meta.as_deref())?
    } else {
        return Err(anyhow!("one of --vectors or --json is required"));
    };

    let mut sprite_image = None;
    if let (Some(p), Some(d)) = (matches.get_one::<String>("sprite"), matches.get_one::<String>("sprite_dim")) {
        match load_sprite(Path::new(p), parse_dim(d)?) {
            Ok((src, image)) => {
                dataset = dataset.with_sprite(src);
                sprite_image = Some(image);
            }
            // run without thumbnails rather than refusing to start
            Err(e) => log::warn!("sprite atlas unavailable: {}", e),
        }
    }

    let settings = InspectorSettings::load().unwrap_or_else(|e| {
        log::warn!("using default settings: {}", e);
        InspectorSettings::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 710.0])
            .with_min_inner_size([640.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native(
        "Projector-Inspector",
        options,
        Box::new(move |_cc| Ok(Box::new(InspectorApp::new(dataset, settings, sprite_image)) as Box<dyn eframe::App>)),
    )
    .map_err(|e| anyhow!("{}", e))
}
