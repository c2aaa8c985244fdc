pub mod context;
pub mod format;
pub mod view;

use std::collections::HashSet;

use crate::dataset::{
    Dataset, DistanceMetric, NeighborEntry, PointIndex, SpriteAndMetadataInfo, SpriteMeta,
};
use crate::events::ProjectorEventContext;
use crate::persistence::export::SelectionSnapshot;
use crate::persistence::settings::InspectorSettings;

use context::{ContextId, DisplayContexts};
use format::{format_matches, format_metadata_entries, format_neighbors, MatchRow, MetadataRow, RenderRow};
use view::{render, InspectorSink, InspectorView};

/// Limit the number of rows we draw for any list.
pub const LIMIT_RESULTS: usize = 100;
pub const DEFAULT_NEIGHBORS: usize = 100;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionState {
    pub selected_indices: Vec<PointIndex>,
    pub neighbors: Vec<NeighborEntry>,
}

impl SelectionState {
    pub fn primary(&self) -> Option<PointIndex> {
        self.selected_indices.first().copied()
    }
}

/// A neighbor query issued on behalf of the current selection.
///
/// Results are only applied while `generation` is still the latest issued;
/// any later selection change or metric switch makes the ticket stale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeighborRequest {
    pub generation: u64,
    pub point: PointIndex,
    pub metric: DistanceMetric,
    pub k: usize,
}

#[derive(Clone, Debug)]
pub struct InspectorState {
    pub selection: SelectionState,
    // input of the last neighbor formatting pass, reused on display toggles
    pub last_neighbors: Option<Vec<NeighborEntry>>,
    pub neighbor_rows: Vec<RenderRow>,
    pub match_rows: Vec<MatchRow>,
    pub match_total: usize,
    pub metadata_rows: Vec<MetadataRow>,
    pub metadata_column: Option<String>,
    pub contexts: DisplayContexts,
    pub metric: DistanceMetric,
    pub num_neighbors: usize,
    pub show_neighbor_images: bool,
    pub sprite_meta: Option<SpriteMeta>,
    pub metadata_fields: Vec<String>,
    pub selected_field: Option<String>,
    pub search_message: String,
    pub search_value: String,
    pub can_filter: bool,
    pub filter_point_count: usize,
    pub reset_filter_enabled: bool,
    pub selected_elements: Vec<String>,
    pub query_generation: u64,
}

impl Default for InspectorState {
    fn default() -> Self {
        Self {
            selection: SelectionState::default(),
            last_neighbors: None,
            neighbor_rows: Vec::new(),
            match_rows: Vec::new(),
            match_total: 0,
            metadata_rows: Vec::new(),
            metadata_column: None,
            contexts: DisplayContexts::new(),
            metric: DistanceMetric::default(),
            num_neighbors: DEFAULT_NEIGHBORS,
            show_neighbor_images: true,
            sprite_meta: None,
            metadata_fields: Vec::new(),
            selected_field: None,
            search_message: String::new(),
            search_value: String::new(),
            can_filter: false,
            filter_point_count: 0,
            reset_filter_enabled: false,
            selected_elements: Vec::new(),
            query_generation: 0,
        }
    }
}

/// Selection, search and neighbor inspection over a dataset.
///
/// Every public operation runs to completion, re-renders the view and hands
/// it to the sink (if any). The panel never calls back into itself: selection
/// requests go out through the event context and come back through
/// [`InspectorPanel::on_selection_changed`] when the host delivers them.
pub struct InspectorPanel<D: Dataset, E: ProjectorEventContext> {
    dataset: D,
    events: E,
    state: InspectorState,
    view: InspectorView,
    sink: Option<Box<dyn InspectorSink>>,
}

impl<D: Dataset, E: ProjectorEventContext> InspectorPanel<D, E> {
    pub fn new(dataset: D, events: E) -> Self {
        let mut panel = Self {
            dataset,
            events,
            state: InspectorState::default(),
            view: InspectorView::default(),
            sink: None,
        };
        panel.load_dataset_metadata();
        panel
    }

    pub fn with_settings(dataset: D, events: E, settings: &InspectorSettings) -> Self {
        let mut panel = Self::new(dataset, events);
        panel.state.metric = settings.distance_metric;
        panel.state.num_neighbors = settings.num_neighbors.max(1);
        panel.state.show_neighbor_images = settings.show_neighbor_images;
        panel.refresh();
        panel
    }

    pub fn with_sink(mut self, sink: Box<dyn InspectorSink>) -> Self {
        self.sink = Some(sink);
        self.refresh();
        self
    }

    pub fn dataset(&self) -> &D { &self.dataset }
    pub fn events(&self) -> &E { &self.events }
    pub fn events_mut(&mut self) -> &mut E { &mut self.events }
    pub fn state(&self) -> &InspectorState { &self.state }
    pub fn view(&self) -> &InspectorView { &self.view }
    pub fn selection(&self) -> &SelectionState { &self.state.selection }
    pub fn metric(&self) -> DistanceMetric { self.state.metric }
    pub fn num_neighbors(&self) -> usize { self.state.num_neighbors }

    fn refresh(&mut self) {
        self.view = render(&self.state);
        if let Some(sink) = self.sink.as_mut() {
            sink.publish(&self.view);
        }
    }

    fn field(&self) -> &str {
        self.state.selected_field.as_deref().unwrap_or("")
    }

    fn label(&self, index: PointIndex) -> String {
        self.dataset.label_for(index, self.field())
    }

    fn load_dataset_metadata(&mut self) {
        match self.dataset.sprite_and_metadata().cloned() {
            Some(info) => self.metadata_changed(&info),
            None => self.refresh(),
        }
    }

    // --- selection -------------------------------------------------------

    /// Host callback: the selection (and, for a single point, its neighbors)
    /// changed. Neighbors take precedence over showing the indices as matches.
    pub fn on_selection_changed(&mut self, indices: Vec<PointIndex>, neighbors: Vec<NeighborEntry>) {
        self.state.query_generation += 1;
        self.apply_selection(indices, neighbors);
        self.refresh();
    }

    fn apply_selection(&mut self, indices: Vec<PointIndex>, neighbors: Vec<NeighborEntry>) {
        log::debug!("selection changed: {} points, {} neighbors", indices.len(), neighbors.len());
        self.update_filter_buttons(indices.len() + neighbors.len());
        let show_matches = neighbors.is_empty();
        self.update_neighbors_list(Some(neighbors.clone()));
        if show_matches {
            self.update_search_results(&indices);
        } else {
            self.update_search_results(&[]);
        }
        self.state.selection = SelectionState { selected_indices: indices, neighbors };
    }

    fn update_filter_buttons(&mut self, num_points: usize) {
        if num_points > 1 {
            self.state.can_filter = true;
            self.state.filter_point_count = num_points;
        } else {
            self.state.can_filter = false;
        }
    }

    fn update_neighbors_list(&mut self, neighbors: Option<Vec<NeighborEntry>>) {
        if let Some(n) = neighbors {
            self.state.last_neighbors = Some(n);
        }
        let Some(neighbors) = self.state.last_neighbors.as_deref() else { return };

        let field = self.field();
        let dataset = &self.dataset;
        let rows = format_neighbors(
            neighbors,
            self.state.metric,
            self.state.sprite_meta.as_ref(),
            self.state.show_neighbor_images,
            |i| dataset.label_for(i, field),
        );

        if rows.is_empty() {
            self.state.neighbor_rows = rows;
            self.state.contexts.deactivate(ContextId::Neighbors);
            return;
        }
        self.state.neighbor_rows = rows;
        self.state.contexts.activate(ContextId::Neighbors);
        self.state.search_message.clear();
    }

    fn update_search_results(&mut self, indices: &[PointIndex]) {
        self.state.match_total = indices.len();
        let field = self.field();
        let dataset = &self.dataset;
        let rows = format_matches(indices, |i| dataset.label_for(i, field));
        self.state.match_rows = rows;
        if indices.is_empty() {
            self.state.contexts.deactivate(ContextId::Matches);
        } else {
            self.state.contexts.activate(ContextId::Matches);
        }
    }

    pub fn clear_selection(&mut self) {
        self.events.notify_selection_changed(Vec::new());
    }

    pub fn hover_point(&mut self, index: Option<PointIndex>) {
        self.events.notify_hover_over_point(index);
    }

    pub fn select_neighbor(&mut self, index: PointIndex) {
        self.events.notify_selection_changed(vec![index]);
    }

    /// Clicking a match remembers its label as the search value used for export.
    pub fn select_search_result(&mut self, index: PointIndex) {
        self.state.search_value = self.label(index);
        self.refresh();
        self.events.notify_selection_changed(vec![index]);
    }

    pub fn toggle_neighbor_mark(&mut self, index: PointIndex) {
        let label = self.label(index);
        match self.state.selected_elements.iter().position(|l| *l == label) {
            Some(pos) => {
                self.state.selected_elements.remove(pos);
            }
            None => self.state.selected_elements.push(label),
        }
        self.refresh();
    }

    // --- neighbors -------------------------------------------------------

    pub fn set_num_neighbors(&mut self, k: usize) {
        self.state.num_neighbors = k.max(1);
        self.refresh();
        if let Some(primary) = self.state.selection.primary() {
            self.events.notify_selection_changed(vec![primary]);
        }
    }

    pub fn set_show_neighbor_images(&mut self, show: bool) {
        self.state.show_neighbor_images = show;
        self.update_neighbors_list(None);
        self.refresh();
    }

    /// Switch metric and query the dataset for the new ranking right away.
    pub fn set_distance_metric(&mut self, metric: DistanceMetric) {
        if let Some(req) = self.switch_metric(metric) {
            let neighbors = self.dataset.find_neighbors(req.point, req.metric, req.k);
            self.apply_neighbors(&req, neighbors);
        }
    }

    /// Switch metric without querying. The returned request (if a point is
    /// selected) must be answered through [`InspectorPanel::apply_neighbors`].
    pub fn switch_metric(&mut self, metric: DistanceMetric) -> Option<NeighborRequest> {
        log::info!("distance metric set to {}", metric);
        self.state.metric = metric;
        self.state.query_generation += 1;
        self.events.notify_distance_metric_changed(metric);
        let req = self.request_neighbors();
        self.refresh();
        req
    }

    pub fn request_neighbors(&mut self) -> Option<NeighborRequest> {
        let point = self.state.selection.primary()?;
        self.state.query_generation += 1;
        Some(NeighborRequest {
            generation: self.state.query_generation,
            point,
            metric: self.state.metric,
            k: self.state.num_neighbors,
        })
    }

    /// Apply a neighbor result. Returns false, leaving state untouched, when
    /// the request has been superseded.
    pub fn apply_neighbors(&mut self, req: &NeighborRequest, neighbors: Vec<NeighborEntry>) -> bool {
        if req.generation != self.state.query_generation || req.metric != self.state.metric {
            log::debug!("discarding stale neighbor result for point {}", req.point);
            return false;
        }
        let indices = self.state.selection.selected_indices.clone();
        self.apply_selection(indices, neighbors);
        self.refresh();
        true
    }

    // --- search & filter -------------------------------------------------

    pub fn on_query_changed(&mut self, text: &str, regex_mode: bool) {
        if text.trim().is_empty() {
            self.state.search_message.clear();
            self.refresh();
            self.events.notify_selection_changed(Vec::new());
            return;
        }
        let indices = self.dataset.query(text, regex_mode, self.field());
        log::debug!("query {:?} matched {} points", text, indices.len());
        self.state.search_message = if indices.is_empty() {
            "0 matches.".to_string()
        } else {
            format!("{} matches.", indices.len())
        };
        self.refresh();
        self.events.notify_selection_changed(indices);
    }

    /// Restrict the dataset to the selection plus its neighbors.
    pub fn on_filter_requested(&mut self) -> Vec<PointIndex> {
        let sel = &self.state.selection;
        let mut seen = HashSet::new();
        let indices: Vec<PointIndex> = sel
            .selected_indices
            .iter()
            .copied()
            .chain(sel.neighbors.iter().map(|n| n.index))
            .filter(|i| seen.insert(*i))
            .collect();
        log::info!("filtering dataset to {} points", indices.len());
        self.dataset.filter_to_indices(&indices);
        self.state.reset_filter_enabled = true;
        self.update_filter_buttons(0);
        self.refresh();
        indices
    }

    pub fn on_filter_reset(&mut self) {
        log::info!("restoring full dataset");
        self.dataset.reset_filter();
        self.state.reset_filter_enabled = false;
        self.refresh();
    }

    // --- dataset & metadata lifecycle -----------------------------------

    pub fn dataset_changed(&mut self) {
        self.state.reset_filter_enabled = false;
        self.refresh();
    }

    /// Swap in a new dataset, dropping the selection. Returns the old one.
    pub fn replace_dataset(&mut self, dataset: D) -> D {
        let old = std::mem::replace(&mut self.dataset, dataset);
        self.state.query_generation += 1;
        self.state.selected_elements.clear();
        self.state.contexts.deactivate(ContextId::MetadataInfo);
        self.apply_selection(Vec::new(), Vec::new());
        self.dataset_changed();
        self.load_dataset_metadata();
        old
    }

    pub fn restore_from_bookmark(&mut self, has_filtered_points: bool) {
        self.state.reset_filter_enabled = has_filtered_points;
        self.refresh();
    }

    pub fn metadata_changed(&mut self, info: &SpriteAndMetadataInfo) {
        let label_index = info.stats.iter().position(|s| !s.is_numeric);
        self.state.metadata_fields = info.field_names();
        self.state.sprite_meta = info.sprite.as_ref().and_then(SpriteMeta::from_source);

        let keep = self
            .state
            .selected_field
            .as_ref()
            .is_some_and(|f| self.state.metadata_fields.contains(f));
        if !keep {
            // default label is the first non-numeric column
            self.state.selected_field = self.state.metadata_fields.get(label_index.unwrap_or(0)).cloned();
        }
        let sel = self.state.selection.clone();
        self.apply_selection(sel.selected_indices, sel.neighbors);
        self.refresh();
    }

    /// Choose the metadata field used for labels and text search.
    pub fn set_selected_field(&mut self, field: &str) -> bool {
        if !self.state.metadata_fields.iter().any(|f| f == field) {
            return false;
        }
        self.state.selected_field = Some(field.to_string());
        let sel = self.state.selection.clone();
        self.apply_selection(sel.selected_indices, sel.neighbors);
        self.refresh();
        true
    }

    pub fn metadata_editor_context(&mut self, enabled: bool, column: &str) {
        let stat = self
            .dataset
            .sprite_and_metadata()
            .and_then(|info| info.stats_for(column))
            .filter(|s| enabled && !s.too_many_unique_values && !s.unique_entries.is_empty());
        match stat {
            Some(s) => {
                self.state.metadata_rows = format_metadata_entries(&s.unique_entries);
                self.state.metadata_column = Some(column.to_string());
                self.state.contexts.activate(ContextId::MetadataInfo);
            }
            None => self.state.contexts.deactivate(ContextId::MetadataInfo),
        }
        self.refresh();
    }

    // --- export ----------------------------------------------------------

    pub fn selection_snapshot(&self, relation_type: &str) -> SelectionSnapshot {
        SelectionSnapshot {
            name: vec![self.state.search_value.clone()],
            label: vec![self.state.search_value.clone()],
            rel_type: vec![relation_type.to_string()],
            elements: self.state.selected_elements.clone(),
        }
    }
}
