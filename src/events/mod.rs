use std::sync::mpsc::{self, Receiver, Sender};

use crate::dataset::{DistanceMetric, PointIndex};

/// Notifications the inspector sends back to its host.
#[derive(Clone, Debug, PartialEq)]
pub enum ProjectorEvent {
    SelectionChanged(Vec<PointIndex>),
    HoverOverPoint(Option<PointIndex>),
    DistanceMetricChanged(DistanceMetric),
}

pub trait ProjectorEventContext {
    fn notify_selection_changed(&mut self, indices: Vec<PointIndex>);
    fn notify_hover_over_point(&mut self, index: Option<PointIndex>);
    fn notify_distance_metric_changed(&mut self, metric: DistanceMetric);
}

// Queue events in memory; handy when the host drains them itself
impl ProjectorEventContext for Vec<ProjectorEvent> {
    fn notify_selection_changed(&mut self, indices: Vec<PointIndex>) {
        self.push(ProjectorEvent::SelectionChanged(indices));
    }

    fn notify_hover_over_point(&mut self, index: Option<PointIndex>) {
        self.push(ProjectorEvent::HoverOverPoint(index));
    }

    fn notify_distance_metric_changed(&mut self, metric: DistanceMetric) {
        self.push(ProjectorEvent::DistanceMetricChanged(metric));
    }
}

/// Event context backed by a channel; the host keeps the receiving end.
#[derive(Clone, Debug)]
pub struct ChannelEvents {
    tx: Sender<ProjectorEvent>,
}

impl ChannelEvents {
    fn send(&self, ev: ProjectorEvent) {
        // receiver gone means the host is shutting down
        if self.tx.send(ev).is_err() {
            log::debug!("projector event dropped: receiver closed");
        }
    }
}

impl ProjectorEventContext for ChannelEvents {
    fn notify_selection_changed(&mut self, indices: Vec<PointIndex>) {
        self.send(ProjectorEvent::SelectionChanged(indices));
    }

    fn notify_hover_over_point(&mut self, index: Option<PointIndex>) {
        self.send(ProjectorEvent::HoverOverPoint(index));
    }

    fn notify_distance_metric_changed(&mut self, metric: DistanceMetric) {
        self.send(ProjectorEvent::DistanceMetricChanged(metric));
    }
}

// Create the broker pair used by a projector host
pub fn channel() -> (ChannelEvents, Receiver<ProjectorEvent>) {
    let (tx, rx) = mpsc::channel();
    (ChannelEvents { tx }, rx)
}
