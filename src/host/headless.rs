// src/host/headless.rs

//! In-memory host used by the CLI runner and by tests.

use crate::host::{Material, ObjectId, SceneContext, Surface, UrlOpener, ViewPose, XrSession};
use crate::lock;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
struct SurfaceState {
    material: Option<Material>, // None = no mesh
    scaling: [f32; 3],
    collider: Option<(u8, [f32; 3])>,
}

#[derive(Debug)]
pub struct HeadlessSurface {
    id: ObjectId,
    state: Mutex<SurfaceState>,
}

impl HeadlessSurface {
    pub fn new(id: ObjectId, material: Material) -> Self {
        Self {
            id,
            state: Mutex::new(SurfaceState {
                material: Some(material),
                scaling: [1.0, 1.0, 1.0],
                collider: None,
            }),
        }
    }

    /// A surface with no mesh component at all.
    pub fn without_mesh(id: ObjectId) -> Self {
        let surface = Self::new(id, Material::default());
        lock(&surface.state).material = None;
        surface
    }

    pub fn collider(&self) -> Option<(u8, [f32; 3])> {
        lock(&self.state).collider
    }
}

impl Surface for HeadlessSurface {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn has_mesh(&self) -> bool {
        lock(&self.state).material.is_some()
    }

    fn material(&self) -> Option<Material> {
        lock(&self.state).material.clone()
    }

    fn set_material(&self, material: Material) {
        lock(&self.state).material = Some(material);
    }

    fn scaling_local(&self) -> [f32; 3] {
        lock(&self.state).scaling
    }

    fn set_scaling(&self, scaling: [f32; 3]) {
        lock(&self.state).scaling = scaling;
    }

    fn has_collider(&self) -> bool {
        lock(&self.state).collider.is_some()
    }

    fn add_box_collider(&self, group: u8) {
        lock(&self.state).collider = Some((group, [1.0, 1.0, 0.1]));
    }

    fn set_collider_extents(&self, extents: [f32; 3]) {
        if let Some((_, current)) = lock(&self.state).collider.as_mut() {
            *current = extents;
        }
    }
}

/// A sphere stand-in for an object's bounds.
#[derive(Debug, Clone, Copy)]
pub struct SceneObject {
    pub id: ObjectId,
    pub center: [f32; 3],
    pub radius: f32,
    pub group: u8,
}

/// Scene made of bounding spheres and at most one active view.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    view: Mutex<Option<ViewPose>>,
    objects: Mutex<Vec<SceneObject>>,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_view(&self, view: Option<ViewPose>) {
        *lock(&self.view) = view;
    }

    pub fn add_object(&self, object: SceneObject) {
        lock(&self.objects).push(object);
    }

    pub fn move_object(&self, id: ObjectId, center: [f32; 3]) {
        for object in lock(&self.objects).iter_mut().filter(|o| o.id == id) {
            object.center = center;
        }
    }
}

impl SceneContext for HeadlessScene {
    fn active_view(&self) -> Option<ViewPose> {
        *lock(&self.view)
    }

    fn ray_cast(
        &self,
        origin: [f32; 3],
        direction: [f32; 3],
        group_mask: u8,
        max_distance: f32,
    ) -> Vec<ObjectId> {
        let len = dot(direction, direction).sqrt();
        if len == 0.0 || !len.is_finite() {
            return Vec::new();
        }
        let dir = direction.map(|c| c / len);
        lock(&self.objects)
            .iter()
            .filter(|o| o.group & group_mask != 0)
            .filter(|o| match ray_sphere(origin, dir, o.center, o.radius) {
                Some(t) => t <= max_distance,
                None => false,
            })
            .map(|o| o.id)
            .collect()
    }
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Distance along a normalized ray to the first hit, if any.
fn ray_sphere(origin: [f32; 3], dir: [f32; 3], center: [f32; 3], radius: f32) -> Option<f32> {
    let oc = [origin[0] - center[0], origin[1] - center[1], origin[2] - center[2]];
    let b = dot(oc, dir);
    let c = dot(oc, oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt = disc.sqrt();
    let near = -b - sqrt;
    let far = -b + sqrt;
    if far < 0.0 {
        None
    } else if near < 0.0 {
        Some(0.0) // origin inside
    } else {
        Some(near)
    }
}

/// XR session that ends after a fixed delay.
#[derive(Debug)]
pub struct HeadlessXr {
    active: std::sync::Arc<AtomicBool>,
    end_delay: Duration,
    end_calls: AtomicUsize,
}

impl HeadlessXr {
    pub fn new(active: bool, end_delay: Duration) -> Self {
        Self {
            active: std::sync::Arc::new(AtomicBool::new(active)),
            end_delay,
            end_calls: AtomicUsize::new(0),
        }
    }

    pub fn end_calls(&self) -> usize {
        self.end_calls.load(Ordering::SeqCst)
    }
}

impl XrSession for HeadlessXr {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn end(&self) -> BoxFuture<'static, ()> {
        self.end_calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.clone();
        let delay = self.end_delay;
        async move {
            tokio::time::sleep(delay).await;
            active.store(false, Ordering::SeqCst);
            info!("xr session ended");
        }
        .boxed()
    }
}

/// Records every URL instead of launching a browser.
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        lock(&self.opened).clone()
    }
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) {
        info!(url, "open url");
        lock(&self.opened).push(url.to_string());
    }
}
