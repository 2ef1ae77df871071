// tests/mock_backend.rs

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration, Instant};
use xr_banner::config::BannerConfig;
use xr_banner::host::headless::{HeadlessScene, HeadlessSurface, RecordingOpener, SceneObject};
use xr_banner::format::{load_format_table, BuiltinFormats, FormatTable};
use xr_banner::host::{HostContext, Material, Surface, ViewPose, BANNER_COLLISION_GROUP};
use xr_banner::mock_server::{self, MockBackend, MOCK_WIDE_RATIO};
use xr_banner::model::{AdFormat, BannerPhase, Network};
use xr_banner::{AdLifecycleController, BannerServices, ClickOutcome, LoadOutcome};

async fn backend() -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    mock_server::spawn(listener, (0, 0)).await.unwrap()
}

fn config(backend: &MockBackend, ad_unit: &str, format: AdFormat) -> BannerConfig {
    let mut config = BannerConfig::new(ad_unit);
    config.format = format;
    config.dynamic_formats = false;
    config.fetch_timeout_ms = Some(5_000);
    config.endpoints.api_base_url = backend.api_base_url();
    config.endpoints.beacon_url = backend.beacon_url();
    config
}

struct Host {
    surface: Arc<HeadlessSurface>,
    opener: Arc<RecordingOpener>,
    context: HostContext,
}

fn host() -> Host {
    let scene = Arc::new(HeadlessScene::new());
    scene.add_object(SceneObject { id: 1, center: [0.0, 0.0, -3.0], radius: 1.0, group: BANNER_COLLISION_GROUP });
    scene.set_view(Some(ViewPose { position: [0.0; 3], forward: [0.0, 0.0, -1.0] }));
    let surface = Arc::new(HeadlessSurface::new(1, Material::new("Flat Opaque Textured", &["flatTexture"])));
    let opener = Arc::new(RecordingOpener::new());
    let context = HostContext {
        surface: surface.clone(),
        scene,
        xr: None,
        opener: opener.clone(),
    };
    Host { surface, opener, context }
}

async fn wait_for_beacons(backend: &MockBackend, count: usize) -> Vec<serde_json::Value> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let beacons = backend.state.beacons();
        if beacons.len() >= count || Instant::now() > deadline {
            return beacons;
        }
        sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn campaign_banner_loads_over_http() {
    let backend = backend().await;
    let host = host();
    let config = config(&backend, "U1", AdFormat::Wide);
    let services = BannerServices::from_config(&config).await;
    let banner = AdLifecycleController::new(config, host.context.clone(), services, None).unwrap();

    let LoadOutcome::Loaded(ad) = banner.start().await.unwrap() else {
        panic!("banner should load from the mock backend");
    };

    assert_eq!(ad.url, "https://example.com/campaign/U1");
    assert_eq!((ad.texture.width, ad.texture.height), (256, 64));
    assert_eq!(banner.state().phase, BannerPhase::Loaded);
    assert_eq!(host.surface.scaling_local(), [4.0, 1.0, 1.0]);
    let material = host.surface.material().unwrap();
    assert_eq!(material.texture("flatTexture"), Some(&ad.texture));
    assert_eq!(material.alpha_mask_threshold, Some(0.8));

    let beacons = wait_for_beacons(&backend, 1).await;
    assert_eq!(beacons[0]["event"], "load");
    assert_eq!(beacons[0]["ad_unit"], "U1");
    assert_eq!(beacons[0]["campaign_id"].as_str(), ad.campaign_id.as_deref());

    assert_eq!(banner.click().await, ClickOutcome::Navigated);
    assert_eq!(host.opener.opened(), vec!["https://example.com/campaign/U1".to_string()]);
    let beacons = wait_for_beacons(&backend, 2).await;
    assert_eq!(beacons[1]["event"], "click");
}

#[tokio::test]
async fn backend_beta_format_overrides_config() {
    let backend = backend().await;
    let host = host();
    let config = config(&backend, "billboard-7", AdFormat::Tall);
    let services = BannerServices::from_config(&config).await;
    let banner = AdLifecycleController::new(config, host.context.clone(), services, None).unwrap();

    assert!(matches!(banner.start().await.unwrap(), LoadOutcome::Loaded(_)));

    assert_eq!(banner.effective_format(), AdFormat::Billboard);
    assert_eq!(host.surface.scaling_local(), [3.88, 1.0, 1.0]);
}

#[tokio::test]
async fn nft_banner_loads_over_http() {
    let backend = backend().await;
    let host = host();
    let mut config = config(&backend, "U2", AdFormat::Square);
    config.network = Some(Network::Polygon);
    let services = BannerServices::from_config(&config).await;
    let banner = AdLifecycleController::new(config, host.context.clone(), services, None).unwrap();

    let LoadOutcome::Loaded(ad) = banner.start().await.unwrap() else {
        panic!("nft banner should load from the mock backend");
    };

    assert_eq!(ad.url, "https://example.com/nft/U2");
    assert!(ad.image_src.starts_with(&backend.base_url));
    assert!(ad.campaign_id.is_none());
}

#[tokio::test]
async fn unreachable_backend_is_a_transient_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let host = host();
    let mut config = BannerConfig::new("U3");
    config.dynamic_formats = false;
    config.beacon = false;
    config.endpoints.api_base_url = format!("http://{}", addr);
    let services = BannerServices::from_config(&config).await;
    let banner = AdLifecycleController::new(config, host.context.clone(), services, None).unwrap();

    assert!(matches!(banner.start().await.unwrap(), LoadOutcome::Failed(_)));
    assert_eq!(banner.state().phase, BannerPhase::Error);
    assert_eq!(banner.click().await, ClickOutcome::NoBanner);
}

#[tokio::test]
async fn live_backend_falls_back_to_bundled() {
    let backend = backend().await;
    let host = host();
    let mut config = config(&backend, "U4", AdFormat::Square);
    config.endpoints.live_api_base_url = Some("http://127.0.0.1:1".to_string());
    let services = BannerServices::from_config(&config).await;
    let banner = AdLifecycleController::new(config, host.context.clone(), services, None).unwrap();

    assert!(matches!(banner.start().await.unwrap(), LoadOutcome::Loaded(_)));
}

#[tokio::test]
async fn dynamic_format_table_is_fetched_from_backend() {
    let backend = backend().await;
    let client = reqwest::Client::new();

    let table = load_format_table(&client, true, &backend.formats_url(), Duration::from_secs(5)).await;

    let wide = table.entry(AdFormat::Wide).unwrap();
    assert_eq!(wide.ratio(), Some(MOCK_WIDE_RATIO));
    assert_eq!(table.entry(AdFormat::Square), BuiltinFormats.entry(AdFormat::Square));
}

#[tokio::test]
async fn missing_format_table_falls_back_to_builtin() {
    let backend = backend().await;
    let client = reqwest::Client::new();
    let url = format!("{}/no-such-table.json", backend.base_url);

    let table = load_format_table(&client, true, &url, Duration::from_secs(5)).await;

    assert_eq!(table.entry(AdFormat::Wide).unwrap().ratio(), Some(4.0));
}

#[tokio::test]
async fn banner_sizes_itself_from_remote_formats() {
    let backend = backend().await;
    let host = host();
    let mut config = config(&backend, "U5", AdFormat::Wide);
    config.dynamic_formats = true;
    config.endpoints.formats_url = backend.formats_url();
    let services = BannerServices::from_config(&config).await;
    let banner = AdLifecycleController::new(config, host.context.clone(), services, None).unwrap();

    assert!(matches!(banner.start().await.unwrap(), LoadOutcome::Loaded(_)));

    assert_eq!(host.surface.scaling_local(), [MOCK_WIDE_RATIO, 1.0, 1.0]);
}
