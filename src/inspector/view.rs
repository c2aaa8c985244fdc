use serde::{Deserialize, Serialize};

use crate::dataset::{DistanceMetric, PointIndex};

use super::context::ContextId;
use super::format::{MatchRow, MetadataRow, RenderRow};
use super::InspectorState;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterActions {
    pub set_filter_label: String,
    pub set_filter_enabled: bool,
    pub clear_selection_enabled: bool,
    pub reset_filter_enabled: bool,
}

/// Everything a presentation layer needs to draw the inspector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectorView {
    pub visible_context: Option<ContextId>,
    pub neighbors: Vec<RenderRow>,
    pub matches: Vec<MatchRow>,
    pub limit_message_visible: bool,
    pub metadata: Vec<MetadataRow>,
    pub metadata_column: Option<String>,
    pub search_message: String,
    pub filter: FilterActions,
    pub metric: DistanceMetric,
    pub num_neighbors: usize,
    pub show_neighbor_images: bool,
    pub sprite_images_available: bool,
    pub selected_field: Option<String>,
    pub metadata_fields: Vec<String>,
    pub primary_point: Option<PointIndex>,
    pub marked_elements: Vec<String>,
}

impl InspectorView {
    pub fn is_visible(&self, ctx: ContextId) -> bool {
        self.visible_context == Some(ctx)
    }
}

/// Receives a fresh view after every state change.
pub trait InspectorSink {
    fn publish(&mut self, view: &InspectorView);
}

impl<F: FnMut(&InspectorView)> InspectorSink for F {
    fn publish(&mut self, view: &InspectorView) {
        self(view)
    }
}

pub fn render(state: &InspectorState) -> InspectorView {
    let set_filter_label = if state.filter_point_count > 1 {
        format!("Isolate {} points", state.filter_point_count)
    } else {
        "Isolate selection".to_string()
    };
    InspectorView {
        visible_context: state.contexts.visible(),
        neighbors: state.neighbor_rows.clone(),
        matches: state.match_rows.clone(),
        limit_message_visible: state.match_total > super::LIMIT_RESULTS,
        metadata: state.metadata_rows.clone(),
        metadata_column: state.metadata_column.clone(),
        search_message: state.search_message.clone(),
        filter: FilterActions {
            set_filter_label,
            set_filter_enabled: state.can_filter,
            clear_selection_enabled: state.can_filter,
            reset_filter_enabled: state.reset_filter_enabled,
        },
        metric: state.metric,
        num_neighbors: state.num_neighbors,
        show_neighbor_images: state.show_neighbor_images,
        sprite_images_available: state.sprite_meta.is_some(),
        selected_field: state.selected_field.clone(),
        metadata_fields: state.metadata_fields.clone(),
        primary_point: state.selection.primary(),
        marked_elements: state.selected_elements.clone(),
    }
}
