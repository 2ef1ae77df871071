// src/host/mod.rs

//! Boundary to the host engine.
//!
//! The banner never reaches into a global engine or scene; everything it
//! touches is handed in through a [`HostContext`].

pub mod headless;

use crate::model::TextureHandle;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type ObjectId = u64;

/// Collision group automatically created colliders are put in.
pub const BANNER_COLLISION_GROUP: u8 = 0x2;

/// Snapshot of a surface material: pipeline name plus its texture slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub pipeline: String,
    slots: BTreeMap<String, Option<TextureHandle>>,
    pub alpha_mask_threshold: Option<f32>,
    pub alpha_mask_texture: Option<TextureHandle>,
}

impl Material {
    pub fn new(pipeline: &str, slots: &[&str]) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            slots: slots.iter().map(|s| (s.to_string(), None)).collect(),
            alpha_mask_threshold: None,
            alpha_mask_texture: None,
        }
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn texture(&self, name: &str) -> Option<&TextureHandle> {
        self.slots.get(name).and_then(Option::as_ref)
    }

    /// Creates the slot when the pipeline does not declare it.
    pub fn set_texture(&mut self, name: &str, texture: TextureHandle) {
        self.slots.insert(name.to_string(), Some(texture));
    }
}

/// The object the banner is drawn on.
pub trait Surface: Send + Sync {
    fn object_id(&self) -> ObjectId;
    fn has_mesh(&self) -> bool;
    /// Current material of the mesh, `None` without a mesh.
    fn material(&self) -> Option<Material>;
    fn set_material(&self, material: Material);
    fn scaling_local(&self) -> [f32; 3];
    /// Replaces the local scaling (reset + scale).
    fn set_scaling(&self, scaling: [f32; 3]);
    fn has_collider(&self) -> bool;
    fn add_box_collider(&self, group: u8);
    fn set_collider_extents(&self, extents: [f32; 3]);
}

/// World pose of a viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPose {
    pub position: [f32; 3],
    pub forward: [f32; 3],
}

pub trait SceneContext: Send + Sync {
    /// First active view, `None` when nothing renders yet.
    fn active_view(&self) -> Option<ViewPose>;
    /// Ids of every object in `group_mask` hit within `max_distance`.
    fn ray_cast(
        &self,
        origin: [f32; 3],
        direction: [f32; 3],
        group_mask: u8,
        max_distance: f32,
    ) -> Vec<ObjectId>;
}

pub trait XrSession: Send + Sync {
    fn is_active(&self) -> bool;
    /// Resolves once the session has fully ended.
    fn end(&self) -> BoxFuture<'static, ()>;
}

pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str);
}

/// Everything a banner needs from its host, passed in explicitly.
#[derive(Clone)]
pub struct HostContext {
    pub surface: Arc<dyn Surface>,
    pub scene: Arc<dyn SceneContext>,
    pub xr: Option<Arc<dyn XrSession>>,
    pub opener: Arc<dyn UrlOpener>,
}
