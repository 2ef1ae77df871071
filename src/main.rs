// src/main.rs

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use xr_banner::config::{BannerConfig, ConfigAdapter, FileConfigAdapter};
use xr_banner::host::headless::{HeadlessScene, HeadlessSurface, HeadlessXr, RecordingOpener, SceneObject};
use xr_banner::host::{HostContext, Material, ViewPose, BANNER_COLLISION_GROUP};
use xr_banner::logging::{init_tracing, EventLog};
use xr_banner::model::AdFormat;
use xr_banner::{mock_server, AdLifecycleController, BannerServices};

#[derive(Parser, Debug)]
#[command(author = "whiteCcinn", version = "1.0", about = "Headless runner for XR ad banners")]
struct CliArgs {
    /// Banner config file (`{"banners": [...]}` or a bare list); demo banners when omitted
    #[arg(short, long)]
    config: Option<String>,
    #[arg(long, default_value = "logs")]
    log_dir: String,
    /// Start the mock ad backend on this port and point every banner at it
    #[arg(long)]
    mock_port: Option<u16>,
    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    run_secs: Option<u64>,
}

fn demo_banners() -> Vec<BannerConfig> {
    [
        ("demo-square", AdFormat::Square),
        ("demo-wide", AdFormat::Wide),
        ("billboard-demo", AdFormat::Tall),
        ("empty-demo", AdFormat::Square),
    ]
    .into_iter()
    .map(|(unit, format)| {
        let mut config = BannerConfig::new(unit);
        config.format = format;
        config
    })
    .collect()
}

/// A scene holding one banner straight in front of the viewer.
fn headless_host(index: usize) -> HostContext {
    let id = index as u64 + 1;
    let scene = Arc::new(HeadlessScene::new());
    scene.add_object(SceneObject {
        id,
        center: [0.0, 1.5, -4.0],
        radius: 1.0,
        group: BANNER_COLLISION_GROUP,
    });
    scene.set_view(Some(ViewPose {
        position: [0.0, 1.5, 0.0],
        forward: [0.0, 0.0, -1.0],
    }));
    HostContext {
        surface: Arc::new(HeadlessSurface::new(id, Material::new("Phong Opaque Textured", &["diffuseTexture"]))),
        scene,
        xr: Some(Arc::new(HeadlessXr::new(false, Duration::from_millis(50)))),
        opener: Arc::new(RecordingOpener::new()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();

    // Global tracing subscriber
    let _guard = init_tracing(&args.log_dir, "banner_log.json")?;
    info!("xr-banner runner starting");

    // Banner event log (loads and clicks)
    let events = EventLog::new(&args.log_dir, "banner", 1000, 100, 1000);

    let mut banners = match &args.config {
        Some(path) => FileConfigAdapter::new(path).get_banners()?,
        None => demo_banners(),
    };

    // Start the mock backend and point every banner at it
    let _mock = match args.mock_port {
        Some(port) => {
            let listener = TcpListener::bind(("127.0.0.1", port)).await?;
            let backend = mock_server::spawn(listener, (20, 120)).await?;
            for banner in &mut banners {
                banner.endpoints.api_base_url = backend.api_base_url();
                banner.endpoints.beacon_url = backend.beacon_url();
                banner.endpoints.formats_url = backend.formats_url();
            }
            Some(backend)
        }
        None => None,
    };

    let mut controllers = Vec::new();
    for (index, config) in banners.into_iter().enumerate() {
        let ad_unit = config.ad_unit.clone();
        let services = BannerServices::from_config(&config).await;
        let controller = match AdLifecycleController::new(config, headless_host(index), services, Some(events.clone())) {
            Ok(controller) => controller,
            Err(e) => {
                error!(ad_unit = %ad_unit, error = %e, "banner not started");
                continue;
            }
        };
        if let Err(e) = controller.run().await {
            error!(ad_unit = %ad_unit, error = %e, "banner stopped");
            continue;
        }
        // One simulated user click
        let outcome = controller.click().await;
        info!(ad_unit = %ad_unit, outcome = outcome.as_str(), "simulated click");
        controllers.push(controller);
    }
    if controllers.is_empty() {
        warn!("no banner is running");
    }

    let run_for = async {
        match args.run_secs {
            Some(secs) => sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::select! {
        _ = signal::ctrl_c() => info!("shutting down gracefully"),
        _ = run_for => info!("run time elapsed"),
    }

    for controller in &controllers {
        controller.dispose();
    }
    events.flush().await;
    info!("xr-banner runner stopped");
    Ok(())
}
