use eframe::egui::{self, Color32, Sense, Vec2};

use projector_inspector::dataset::memory::InMemoryDataset;
use projector_inspector::dataset::{Dataset, DistanceMetric, PointIndex};
use projector_inspector::inspector::context::ContextId;
use projector_inspector::inspector::format::{Rgb, SpritePlacement};
use projector_inspector::inspector::view::InspectorView;
use projector_inspector::persistence::export;
use projector_inspector::persistence::settings::InspectorSettings;
use projector_inspector::Projector;

const ROW_HEIGHT: f32 = 18.0;
const THUMB_SIZE: f32 = 40.0;

/// Things the inspector side panel asks the app to do, collected during a frame
#[derive(Debug, Clone, PartialEq)]
enum InspectorAction {
    QueryChanged { text: String, regex: bool },
    SetMetric(DistanceMetric),
    SetNumNeighbors(usize),
    ShowImages(bool),
    SelectField(String),
    MetadataInfo { column: String, enabled: bool },
    Isolate,
    ResetFilter,
    ClearSelection,
    SelectPoint(PointIndex),
    SelectMatch(PointIndex),
    Hover(Option<PointIndex>),
    ToggleMark(PointIndex),
    Export,
}

// Drop hover reports that match the current hover so idle frames dispatch nothing
fn hover_changes_only(mut actions: Vec<InspectorAction>, current: Option<PointIndex>) -> Vec<InspectorAction> {
    actions.retain(|a| !matches!(a, InspectorAction::Hover(h) if *h == current));
    actions
}

fn color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.r, c.g, c.b)
}

pub struct InspectorApp {
    projector: Projector<InMemoryDataset>,
    settings: InspectorSettings,
    search_text: String,
    regex_mode: bool,
    num_neighbors_edit: usize,
    metadata_info_enabled: bool,
    metadata_info_column: String,
    sprite_image: Option<egui::IconData>,
    sprite_texture: Option<egui::TextureHandle>,
    last_info: Option<String>,
    save_error: Option<String>,
}

impl InspectorApp {
    pub fn new(dataset: InMemoryDataset, settings: InspectorSettings, sprite_image: Option<egui::IconData>) -> Self {
        let projector = Projector::new(dataset, &settings);
        let num_neighbors_edit = projector.panel().num_neighbors();
        Self {
            projector,
            settings,
            search_text: String::new(),
            regex_mode: false,
            num_neighbors_edit,
            metadata_info_enabled: false,
            metadata_info_column: String::new(),
            sprite_image,
            sprite_texture: None,
            last_info: None,
            save_error: None,
        }
    }

    fn sprite_texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureHandle> {
        if self.sprite_texture.is_none() {
            if let Some(icon) = self.sprite_image.take() {
                let size = [icon.width as usize, icon.height as usize];
                let img = egui::ColorImage::from_rgba_unmultiplied(size, &icon.rgba);
                self.sprite_texture = Some(ctx.load_texture("sprite_atlas", img, egui::TextureOptions::LINEAR));
            }
        }
        self.sprite_texture.clone()
    }

    fn dispatch(&mut self, action: InspectorAction) {
        let panel = self.projector.panel_mut();
        match action {
            InspectorAction::QueryChanged { text, regex } => panel.on_query_changed(&text, regex),
            InspectorAction::SetMetric(m) => panel.set_distance_metric(m),
            InspectorAction::SetNumNeighbors(k) => panel.set_num_neighbors(k),
            InspectorAction::ShowImages(show) => panel.set_show_neighbor_images(show),
            InspectorAction::SelectField(f) => {
                panel.set_selected_field(&f);
            }
            InspectorAction::MetadataInfo { column, enabled } => panel.metadata_editor_context(enabled, &column),
            InspectorAction::Isolate => {
                let kept = panel.on_filter_requested();
                self.last_info = Some(format!("Showing {} points", kept.len()));
            }
            InspectorAction::ResetFilter => panel.on_filter_reset(),
            InspectorAction::ClearSelection => panel.clear_selection(),
            InspectorAction::SelectPoint(i) => self.projector.select(vec![i]),
            InspectorAction::SelectMatch(i) => panel.select_search_result(i),
            InspectorAction::Hover(i) => panel.hover_point(i),
            InspectorAction::ToggleMark(i) => panel.toggle_neighbor_mark(i),
            InspectorAction::Export => {
                let snapshot = panel.selection_snapshot(&self.settings.relation_type);
                match export::export_snapshot(&snapshot, &self.settings.export_dir()) {
                    Ok(path) => {
                        self.save_error = None;
                        self.last_info = Some(format!("Exported {}", path.display()));
                    }
                    Err(e) => self.save_error = Some(format!("Export failed: {}", e)),
                }
            }
        }
    }

    fn show_points(&self, ui: &mut egui::Ui, actions: &mut Vec<InspectorAction>) {
        let panel = self.projector.panel();
        let ds = panel.dataset();
        let view = panel.view();
        let field = view.selected_field.clone().unwrap_or_default();
        let active = ds.active_indices();
        ui.heading(format!("Points ({} shown of {})", active.len(), ds.len()));
        ui.separator();
        egui::ScrollArea::vertical().auto_shrink([false, false]).show_rows(ui, ROW_HEIGHT, active.len(), |ui, range| {
            for &i in &active[range] {
                let selected = panel.selection().selected_indices.contains(&i);
                let hovered = self.projector.hover() == Some(i);
                let mut text = egui::RichText::new(format!("{:>6}  {}", i, ds.label_for(i, &field)));
                if hovered { text = text.strong(); }
                if ui.selectable_label(selected, text).clicked() {
                    actions.push(InspectorAction::SelectPoint(i));
                }
            }
        });
    }

    fn show_inspector(&mut self, ui: &mut egui::Ui, actions: &mut Vec<InspectorAction>) {
        let view = self.projector.panel().view().clone();

        ui.heading("Inspector");
        ui.add_space(4.0);

        // Label-by field
        if !view.metadata_fields.is_empty() {
            let current = view.selected_field.clone().unwrap_or_default();
            let mut chosen = current.clone();
            egui::ComboBox::from_label("Label by")
                .selected_text(current.as_str())
                .show_ui(ui, |ui| {
                    for f in &view.metadata_fields {
                        ui.selectable_value(&mut chosen, f.clone(), f.as_str());
                    }
                });
            if chosen != current { actions.push(InspectorAction::SelectField(chosen)); }
        }

        // Search box
        ui.horizontal(|ui| {
            let resp = ui.add(egui::TextEdit::singleline(&mut self.search_text).hint_text("Search"));
            let regex_changed = ui.checkbox(&mut self.regex_mode, ".*").on_hover_text("Regex mode").changed();
            if resp.changed() || regex_changed {
                actions.push(InspectorAction::QueryChanged { text: self.search_text.clone(), regex: self.regex_mode });
            }
        });
        if !view.search_message.is_empty() { ui.small(view.search_message.as_str()); }

        // Filter actions
        ui.horizontal(|ui| {
            if ui.add_enabled(view.filter.set_filter_enabled, egui::Button::new(view.filter.set_filter_label.as_str())).clicked() {
                actions.push(InspectorAction::Isolate);
            }
            if ui.add_enabled(view.filter.clear_selection_enabled, egui::Button::new("Clear selection")).clicked() {
                actions.push(InspectorAction::ClearSelection);
            }
            if ui.add_enabled(view.filter.reset_filter_enabled, egui::Button::new("Show all data")).clicked() {
                actions.push(InspectorAction::ResetFilter);
            }
        });
        ui.separator();

        // Neighbor options
        ui.horizontal(|ui| {
            ui.label("Neighbors");
            if ui.add(egui::DragValue::new(&mut self.num_neighbors_edit).range(1..=1000)).changed() {
                actions.push(InspectorAction::SetNumNeighbors(self.num_neighbors_edit));
            }
        });
        ui.horizontal(|ui| {
            ui.label("Distance");
            for m in DistanceMetric::ALL {
                if ui.selectable_label(view.metric == m, m.name().to_uppercase()).clicked() && view.metric != m {
                    actions.push(InspectorAction::SetMetric(m));
                }
            }
        });
        if view.sprite_images_available {
            let mut show = view.show_neighbor_images;
            if ui.checkbox(&mut show, "Show images").changed() {
                actions.push(InspectorAction::ShowImages(show));
            }
        }

        // Metadata value breakdown
        ui.horizontal(|ui| {
            let mut enabled = self.metadata_info_enabled;
            let toggled = ui.checkbox(&mut enabled, "Value counts for").changed();
            let mut column = self.metadata_info_column.clone();
            egui::ComboBox::from_id_salt("metadata_info_column")
                .selected_text(column.as_str())
                .show_ui(ui, |ui| {
                    for f in &view.metadata_fields {
                        ui.selectable_value(&mut column, f.clone(), f.as_str());
                    }
                });
            if toggled || column != self.metadata_info_column {
                self.metadata_info_enabled = enabled;
                self.metadata_info_column = column.clone();
                actions.push(InspectorAction::MetadataInfo { column, enabled });
            }
        });
        ui.separator();

        let sprite = if view.show_neighbor_images { self.sprite_texture(ui.ctx()) } else { None };
        let n_cols = self.projector.panel().state().sprite_meta.as_ref().map(|s| s.n_cols).unwrap_or(1);

        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            match view.visible_context {
                Some(ContextId::Neighbors) => Self::show_neighbors(ui, &view, sprite.as_ref(), n_cols, actions),
                Some(ContextId::Matches) => Self::show_matches(ui, &view, actions),
                Some(ContextId::MetadataInfo) => Self::show_metadata(ui, &view),
                None => { ui.weak("Select a point or search to inspect it."); }
            }
        });

        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Relation");
            ui.text_edit_singleline(&mut self.settings.relation_type);
            if ui.add_enabled(!view.marked_elements.is_empty(), egui::Button::new("Export")).clicked() {
                actions.push(InspectorAction::Export);
            }
        });
        if let Some(msg) = &self.last_info { ui.small(msg.as_str()); }
        if let Some(err) = &self.save_error { ui.colored_label(Color32::RED, err.as_str()); }
    }

    fn bar(ui: &mut egui::Ui, fill: f32, color: Color32) {
        let (rect, _) = ui.allocate_exact_size(Vec2::new(ui.available_width(), 4.0), Sense::hover());
        let painter = ui.painter();
        painter.rect_filled(rect, 0.0, Color32::from_gray(60));
        let mut filled = rect;
        filled.set_width(rect.width() * fill.clamp(0.0, 1.0));
        painter.rect_filled(filled, 0.0, color);
        // quarter ticks
        for j in 1..4 {
            let x = rect.left() + rect.width() * j as f32 / 4.0;
            painter.vline(x, rect.y_range(), egui::Stroke::new(1.0, Color32::from_gray(30)));
        }
    }

    fn show_neighbors(
        ui: &mut egui::Ui,
        view: &InspectorView,
        sprite: Option<&egui::TextureHandle>,
        n_cols: u32,
        actions: &mut Vec<InspectorAction>,
    ) {
        ui.strong("Nearest points");
        let mut hovered = None;
        for row in &view.neighbors {
            ui.horizontal(|ui| {
                if let (Some(tex), Some(place)) = (sprite, row.image) {
                    Self::thumbnail(ui, tex, place, n_cols);
                }
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        let mut marked = view.marked_elements.contains(&row.label);
                        if ui.checkbox(&mut marked, "").changed() {
                            actions.push(InspectorAction::ToggleMark(row.index));
                        }
                        let resp = ui.add(egui::Label::new(egui::RichText::new(&row.label).color(color32(row.color))).sense(Sense::click()));
                        if resp.hovered() { hovered = Some(row.index); }
                        if resp.clicked() { actions.push(InspectorAction::SelectPoint(row.index)); }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.monospace(row.dist_text.as_str());
                        });
                    });
                    Self::bar(ui, row.normalized, color32(row.color));
                });
            });
        }
        actions.push(InspectorAction::Hover(hovered));
    }

    fn thumbnail(ui: &mut egui::Ui, tex: &egui::TextureHandle, place: SpritePlacement, n_cols: u32) {
        let (min, max) = place.uv_rect(n_cols);
        let uv = egui::Rect::from_min_max(egui::pos2(min[0], min[1]), egui::pos2(max[0], max[1]));
        let (rect, _) = ui.allocate_exact_size(Vec2::splat(THUMB_SIZE), Sense::hover());
        ui.painter().image(tex.id(), rect, uv, Color32::WHITE);
    }

    fn show_matches(ui: &mut egui::Ui, view: &InspectorView, actions: &mut Vec<InspectorAction>) {
        ui.strong("Matches");
        if view.limit_message_visible {
            ui.small(format!("Showing only the first {} results...", view.matches.len()));
        }
        let mut hovered = None;
        for row in &view.matches {
            let resp = ui.selectable_label(false, row.label.as_str());
            if resp.hovered() { hovered = Some(row.index); }
            if resp.clicked() { actions.push(InspectorAction::SelectMatch(row.index)); }
        }
        // leaving the list clears the hover
        actions.push(InspectorAction::Hover(hovered));
    }

    fn show_metadata(ui: &mut egui::Ui, view: &InspectorView) {
        ui.strong(view.metadata_column.as_deref().unwrap_or("Metadata"));
        for row in &view.metadata {
            ui.horizontal(|ui| {
                ui.colored_label(color32(row.color), row.label.as_str());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.monospace(row.count.to_string());
                });
            });
            Self::bar(ui, row.fill, color32(row.color));
        }
    }
}

impl eframe::App for InspectorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut actions: Vec<InspectorAction> = Vec::new();

        egui::SidePanel::right("inspector_panel")
            .resizable(true)
            .default_width(340.0)
            .min_width(260.0)
            .show(ctx, |ui| self.show_inspector(ui, &mut actions));

        egui::CentralPanel::default().show(ctx, |ui| self.show_points(ui, &mut actions));

        let actions = hover_changes_only(actions, self.projector.hover());
        if !actions.is_empty() {
            for a in actions { self.dispatch(a); }
            self.projector.pump();
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.num_neighbors = self.projector.panel().num_neighbors();
        self.settings.distance_metric = self.projector.panel().metric();
        self.settings.show_neighbor_images = self.projector.panel().view().show_neighbor_images;
        if let Err(e) = self.settings.save() {
            log::warn!("could not save settings: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaving_a_list_clears_a_stale_hover() {
        let frame = vec![InspectorAction::Hover(None)];
        assert_eq!(hover_changes_only(frame, Some(4)), vec![InspectorAction::Hover(None)]);
    }

    #[test]
    fn unchanged_hover_is_not_dispatched() {
        let frame = vec![InspectorAction::Hover(Some(4)), InspectorAction::SelectMatch(4)];
        assert_eq!(hover_changes_only(frame, Some(4)), vec![InspectorAction::SelectMatch(4)]);
        assert!(hover_changes_only(vec![InspectorAction::Hover(None)], None).is_empty());
    }
}
