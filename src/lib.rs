pub mod dataset;
pub mod events;
pub mod inspector;
pub mod persistence;
pub mod projector;

pub use dataset::{Dataset, DistanceMetric, NeighborEntry, PointIndex};
pub use inspector::InspectorPanel;
pub use projector::Projector;
