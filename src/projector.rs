use std::sync::mpsc::Receiver;

use crate::dataset::{Dataset, DistanceMetric, NeighborEntry, PointIndex};
use crate::events::{self, ChannelEvents, ProjectorEvent};
use crate::inspector::InspectorPanel;
use crate::persistence::settings::InspectorSettings;

/// Owns the inspector and answers the selection requests it emits.
///
/// A selection of exactly one point gets its nearest neighbors computed with
/// the inspector's current metric and neighbor count; any other selection is
/// delivered without neighbors.
pub struct Projector<D: Dataset> {
    panel: InspectorPanel<D, ChannelEvents>,
    rx: Receiver<ProjectorEvent>,
    hover: Option<PointIndex>,
    announced_metric: Option<DistanceMetric>,
}

impl<D: Dataset> Projector<D> {
    pub fn new(dataset: D, settings: &InspectorSettings) -> Self {
        let (tx, rx) = events::channel();
        Self {
            panel: InspectorPanel::with_settings(dataset, tx, settings),
            rx,
            hover: None,
            announced_metric: None,
        }
    }

    pub fn panel(&self) -> &InspectorPanel<D, ChannelEvents> { &self.panel }
    pub fn panel_mut(&mut self) -> &mut InspectorPanel<D, ChannelEvents> { &mut self.panel }
    pub fn hover(&self) -> Option<PointIndex> { self.hover }
    pub fn announced_metric(&self) -> Option<DistanceMetric> { self.announced_metric }

    /// Select points as if the scene had been clicked.
    pub fn select(&mut self, indices: Vec<PointIndex>) {
        let neighbors = self.neighbors_for(&indices);
        self.panel.on_selection_changed(indices, neighbors);
    }

    fn neighbors_for(&self, indices: &[PointIndex]) -> Vec<NeighborEntry> {
        match indices {
            [single] => self
                .panel
                .dataset()
                .find_neighbors(*single, self.panel.metric(), self.panel.num_neighbors()),
            _ => Vec::new(),
        }
    }

    /// Drain queued inspector events. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        // Events raised while handling are picked up in the same drain
        while let Ok(ev) = self.rx.try_recv() {
            handled += 1;
            match ev {
                ProjectorEvent::SelectionChanged(indices) => self.select(indices),
                ProjectorEvent::HoverOverPoint(index) => self.hover = index,
                ProjectorEvent::DistanceMetricChanged(metric) => self.announced_metric = Some(metric),
            }
        }
        handled
    }
}
