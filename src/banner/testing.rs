// src/banner/testing.rs

//! Scripted collaborators for controller and click tests.

use crate::content::{BannerServices, BeaconSink, ContentSource, TextureLoader};
use crate::error::{BannerError, Result};
use crate::format::BuiltinFormats;
use crate::host::headless::{HeadlessScene, HeadlessSurface, RecordingOpener, SceneObject};
use crate::host::{HostContext, Material, ViewPose, BANNER_COLLISION_GROUP};
use crate::model::{
    BannerPhase, BannerState, BetaUnitInfo, CampaignAd, CampaignAsset, CampaignRecord,
    ContentRecord, ContentRequest, TextureHandle,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub const SURFACE_ID: u64 = 42;

pub fn campaign(asset_url: &str, cta_url: &str, campaign_id: &str) -> ContentRecord {
    ContentRecord::Campaign(CampaignRecord {
        ads: vec![CampaignAsset {
            asset_url: asset_url.to_string(),
            cta_url: cta_url.to_string(),
        }],
        campaign_id: Some(campaign_id.to_string()),
    })
}

pub fn loaded_state(url: &str, campaign_id: Option<&str>) -> BannerState {
    BannerState {
        phase: BannerPhase::Loaded,
        ad: Some(CampaignAd {
            campaign_id: campaign_id.map(str::to_string),
            texture: TextureHandle::new(1, "a.png", 1, 1, vec![0; 4]),
            image_src: "a.png".to_string(),
            url: url.to_string(),
            generation: 1,
        }),
    }
}

enum Scripted {
    Ready(Result<ContentRecord>),
    Gated(oneshot::Receiver<Result<ContentRecord>>),
}

/// Content source answering from a queue, then with a fallback record.
#[derive(Default)]
pub struct ScriptedContent {
    unit_infos: Mutex<VecDeque<BetaUnitInfo>>,
    responses: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Option<ContentRecord>>,
    requests: Mutex<Vec<ContentRequest>>,
    calls: AtomicUsize,
}

impl ScriptedContent {
    pub fn always(record: ContentRecord) -> Arc<Self> {
        let source = Self::default();
        *source.fallback.lock().unwrap() = Some(record);
        Arc::new(source)
    }

    pub fn push(&self, response: Result<ContentRecord>) {
        self.responses.lock().unwrap().push_back(Scripted::Ready(response));
    }

    /// Next fetch waits until the returned sender fires.
    pub fn push_gated(&self) -> oneshot::Sender<Result<ContentRecord>> {
        let (tx, rx) = oneshot::channel();
        self.responses.lock().unwrap().push_back(Scripted::Gated(rx));
        tx
    }

    pub fn push_unit_info(&self, info: BetaUnitInfo) {
        self.unit_infos.lock().unwrap().push_back(info);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ContentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ContentSource for ScriptedContent {
    fn unit_info<'a>(&'a self, _ad_unit: &'a str) -> BoxFuture<'a, Result<BetaUnitInfo>> {
        let info = self.unit_infos.lock().unwrap().pop_front().unwrap_or_default();
        async move { Ok(info) }.boxed()
    }

    fn fetch<'a>(&'a self, request: &'a ContentRequest) -> BoxFuture<'a, Result<ContentRecord>> {
        self.requests.lock().unwrap().push(request.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().unwrap().pop_front();
        let fallback = self.fallback.lock().unwrap().clone();
        async move {
            match next {
                Some(Scripted::Ready(result)) => result,
                Some(Scripted::Gated(rx)) => rx
                    .await
                    .unwrap_or_else(|_| Err(BannerError::Network("gate dropped".into()))),
                None => fallback.ok_or_else(|| BannerError::Content("no scripted response".into())),
            }
        }
        .boxed()
    }
}

/// Hands out a fresh handle per load; URLs containing "broken" fail.
#[derive(Default)]
pub struct StubTextures {
    next_id: AtomicU64,
}

impl TextureLoader for StubTextures {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<TextureHandle>> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            if url.contains("broken") {
                return Err(BannerError::Texture {
                    url: url.to_string(),
                    reason: "decode failed".into(),
                });
            }
            Ok(TextureHandle::new(id, url, 2, 2, vec![255; 16]))
        }
        .boxed()
    }
}

type BeaconEvent = (String, Option<String>);

#[derive(Default)]
pub struct RecordingBeacons {
    loads: Mutex<Vec<BeaconEvent>>,
    clicks: Mutex<Vec<BeaconEvent>>,
}

impl RecordingBeacons {
    pub fn loads(&self) -> Vec<BeaconEvent> {
        self.loads.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<BeaconEvent> {
        self.clicks.lock().unwrap().clone()
    }
}

impl BeaconSink for RecordingBeacons {
    fn send_on_load(&self, ad_unit: &str, campaign_id: Option<&str>) {
        self.loads.lock().unwrap().push((ad_unit.to_string(), campaign_id.map(str::to_string)));
    }

    fn send_on_click(&self, ad_unit: &str, campaign_id: Option<&str>) {
        self.clicks.lock().unwrap().push((ad_unit.to_string(), campaign_id.map(str::to_string)));
    }
}

/// A headless host whose banner sits 5 units in front of the origin.
pub struct TestHost {
    pub surface: Arc<HeadlessSurface>,
    pub scene: Arc<HeadlessScene>,
    pub opener: Arc<RecordingOpener>,
}

impl TestHost {
    pub fn new(material: Material) -> Self {
        let scene = Arc::new(HeadlessScene::new());
        scene.add_object(SceneObject {
            id: SURFACE_ID,
            center: [0.0, 0.0, -5.0],
            radius: 1.0,
            group: BANNER_COLLISION_GROUP,
        });
        Self {
            surface: Arc::new(HeadlessSurface::new(SURFACE_ID, material)),
            scene,
            opener: Arc::new(RecordingOpener::new()),
        }
    }

    pub fn phong() -> Self {
        Self::new(Material::new("Phong Opaque Textured", &["diffuseTexture"]))
    }

    pub fn look_at_banner(&self) {
        self.scene.set_view(Some(ViewPose { position: [0.0; 3], forward: [0.0, 0.0, -1.0] }));
    }

    pub fn look_away(&self) {
        self.scene.set_view(Some(ViewPose { position: [0.0; 3], forward: [0.0, 0.0, 1.0] }));
    }

    pub fn context(&self) -> HostContext {
        HostContext {
            surface: self.surface.clone(),
            scene: self.scene.clone(),
            xr: None,
            opener: self.opener.clone(),
        }
    }
}

pub fn services(content: Arc<ScriptedContent>, beacons: Arc<RecordingBeacons>) -> BannerServices {
    BannerServices {
        content,
        textures: Arc::new(StubTextures::default()),
        beacons,
        formats: Arc::new(BuiltinFormats),
    }
}
