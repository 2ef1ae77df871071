// src/banner/visibility.rs

use crate::host::{SceneContext, Surface};
use std::sync::Arc;
use tracing::trace;

/// How far the viewer can see a banner from.
pub const MAX_DISTANCE: f32 = 100.0;
/// Every collision group.
pub const GROUP_MASK: u8 = 0xff;

/// Answers whether a banner is in front of the active viewer.
#[derive(Clone)]
pub struct VisibilityGate {
    scene: Arc<dyn SceneContext>,
}

impl VisibilityGate {
    pub fn new(scene: Arc<dyn SceneContext>) -> Self {
        Self { scene }
    }

    /// Casts a ray along the viewer's forward vector; no active view means
    /// not visible.
    pub fn is_visible(&self, surface: &dyn Surface) -> bool {
        let Some(view) = self.scene.active_view() else {
            trace!("no active view, banner treated as not visible");
            return false;
        };
        let target = surface.object_id();
        self.scene
            .ray_cast(view.position, view.forward, GROUP_MASK, MAX_DISTANCE)
            .contains(&target)
    }
}
