use serde::{Deserialize, Serialize};

/// Mutually exclusive sub-views of the inspector.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextId {
    MetadataInfo,
    Matches,
    Neighbors,
}

/// Tracks which contexts are live, ordered by when they were first activated.
///
/// At most one context is visible. `activate` shows the given context;
/// `deactivate` of the visible context falls back to the most recently added
/// context still tracked. Removing a hidden context leaves the view alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayContexts {
    tracked: Vec<ContextId>,
    visible: Option<ContextId>,
}

impl DisplayContexts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&mut self, ctx: ContextId) {
        if !self.tracked.contains(&ctx) {
            self.tracked.push(ctx);
        }
        self.visible = Some(ctx);
    }

    pub fn deactivate(&mut self, ctx: ContextId) {
        let was_visible = self.visible == Some(ctx);
        self.tracked.retain(|c| *c != ctx);
        if was_visible || self.visible.is_none() {
            self.visible = self.tracked.last().copied();
        }
    }

    pub fn visible(&self) -> Option<ContextId> {
        self.visible
    }

    pub fn is_visible(&self, ctx: ContextId) -> bool {
        self.visible == Some(ctx)
    }

    pub fn is_tracked(&self, ctx: ContextId) -> bool {
        self.tracked.contains(&ctx)
    }

    /// Tracked contexts, oldest first.
    pub fn tracked(&self) -> &[ContextId] {
        &self.tracked
    }
}
