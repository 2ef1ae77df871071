// src/mock_server.rs

//! Local stand-in for the ad-serving backend.
//!
//! Serves the campaign, unit-info and NFT routes the HTTP content source
//! calls, a remote format table, generated PNG creatives, and a beacon sink
//! that keeps what it receives. Used by the CLI runner (`--mock-port`) and integration tests.

use crate::format::{BuiltinFormats, FormatEntry, FormatTable, RemoteFormats};
use crate::lock;
use crate::model::{
    AdFormat, BetaUnitInfo, CampaignAsset, CampaignRecord, NftBanner, NftBannerData, NftRecord,
};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{serve, Json, Router};
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgba};
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// Pixel height of generated creatives.
const ASSET_HEIGHT: u32 = 64;
/// Width-to-height ratio of `wide` in the served format table.
pub const MOCK_WIDE_RATIO: f32 = 5.0;

pub struct MockState {
    base_url: String,
    latency_ms: (u64, u64),
    beacons: Mutex<Vec<Value>>,
}

impl MockState {
    pub fn new(base_url: &str, latency_ms: (u64, u64)) -> Arc<Self> {
        Arc::new(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            latency_ms,
            beacons: Mutex::new(Vec::new()),
        })
    }

    /// Every beacon body received so far.
    pub fn beacons(&self) -> Vec<Value> {
        lock(&self.beacons).clone()
    }

    // Simulated backend processing time.
    async fn simulate_latency(&self) {
        let (min, max) = self.latency_ms;
        if max > min {
            let delay = rand::thread_rng().gen_range(min..max);
            sleep(Duration::from_millis(delay)).await;
        }
    }
}

/// A running mock backend.
pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
    pub task: JoinHandle<()>,
}

impl MockBackend {
    /// API base url to put in `Endpoints::api_base_url`.
    pub fn api_base_url(&self) -> String {
        self.base_url.clone()
    }

    pub fn beacon_url(&self) -> String {
        format!("{}/v1/metrics", self.base_url)
    }

    pub fn formats_url(&self) -> String {
        format!("{}/formats.json", self.base_url)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Deserialize, Debug)]
struct UnitInfoQuery {
    ad_unit_id: String,
}

#[derive(Deserialize, Debug)]
struct CampaignQuery {
    ad_unit_id: String,
    format: String,
    #[allow(dead_code)]
    style: Option<String>,
}

#[derive(Deserialize, Debug)]
struct NftQuery {
    space: String,
    network: String,
}

#[derive(Deserialize, Debug)]
struct BannerQuery {
    uri: String,
    format: String,
    space: String,
}

// Units named "billboard*" get a beta format from the backend.
async fn handle_unit_info(
    State(state): State<Arc<MockState>>,
    Query(query): Query<UnitInfoQuery>,
) -> Result<Json<BetaUnitInfo>, StatusCode> {
    state.simulate_latency().await;
    if query.ad_unit_id.starts_with("billboard") {
        Ok(Json(BetaUnitInfo {
            format: Some(AdFormat::Billboard.name().to_string()),
            absolute_width: Some(3.88),
            absolute_height: Some(1.0),
        }))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

// Units named "empty*" have no running campaign.
async fn handle_campaign(
    State(state): State<Arc<MockState>>,
    Query(query): Query<CampaignQuery>,
) -> Json<CampaignRecord> {
    state.simulate_latency().await;
    info!(ad_unit = %query.ad_unit_id, format = %query.format, "mock backend campaign request");
    if query.ad_unit_id.starts_with("empty") {
        return Json(CampaignRecord::default());
    }
    let format = AdFormat::from_name_or_default(&query.format);
    Json(CampaignRecord {
        ads: vec![CampaignAsset {
            asset_url: format!("{}/assets/{}.png", state.base_url, format),
            cta_url: format!("example.com/campaign/{}", query.ad_unit_id),
        }],
        campaign_id: Some(uuid::Uuid::new_v4().to_string()),
    })
}

async fn handle_nft(
    State(state): State<Arc<MockState>>,
    Query(query): Query<NftQuery>,
) -> Json<NftRecord> {
    state.simulate_latency().await;
    Json(NftRecord {
        uri: format!("ipfs://{}-{}", query.network, query.space),
    })
}

async fn handle_nft_banner(
    State(state): State<Arc<MockState>>,
    Query(query): Query<BannerQuery>,
) -> Json<NftBanner> {
    state.simulate_latency().await;
    let format = AdFormat::from_name_or_default(&query.format);
    Json(NftBanner {
        uri: query.uri,
        data: NftBannerData {
            image: format!("{}/assets/{}.png", state.base_url, format),
            url: format!("example.com/nft/{}", query.space),
        },
    })
}

async fn handle_beacon(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> StatusCode {
    lock(&state.beacons).push(body);
    StatusCode::OK
}

/// Remote format table. Wide is stretched to 5:1 so callers can tell it
/// apart from the builtin table.
async fn handle_formats(State(state): State<Arc<MockState>>) -> Json<RemoteFormats> {
    state.simulate_latency().await;
    let entries: HashMap<String, FormatEntry> = AdFormat::ALL
        .iter()
        .filter_map(|format| {
            let mut entry = BuiltinFormats.entry(*format)?;
            if *format == AdFormat::Wide {
                entry.width = MOCK_WIDE_RATIO;
            }
            Some((format.name().to_string(), entry))
        })
        .collect();
    Json(RemoteFormats::new(entries))
}

async fn handle_asset(Path(name): Path<String>) -> impl IntoResponse {
    let format = AdFormat::from_name_or_default(name.trim_end_matches(".png"));
    match render_creative(format) {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(e) => {
            error!(error = %e, "unable to render mock creative");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// A gradient PNG with the aspect ratio of `format`.
pub fn render_creative(format: AdFormat) -> Result<Vec<u8>, image::ImageError> {
    let ratio = BuiltinFormats
        .entry(format)
        .and_then(|e| e.ratio())
        .unwrap_or(1.0);
    let width = ((ratio * ASSET_HEIGHT as f32).round() as u32).max(1);
    let seed = format.index() as u8;
    let buffer = ImageBuffer::from_fn(width, ASSET_HEIGHT, |x, y| {
        Rgba([(x * 255 / width) as u8, (y * 255 / ASSET_HEIGHT) as u8, seed.wrapping_mul(40), 255])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(buffer).write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
    Ok(bytes)
}

pub fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/v3/unit-info", get(handle_unit_info))
        .route("/v3/campaign", get(handle_campaign))
        .route("/v1/nft", get(handle_nft))
        .route("/v1/banner", get(handle_nft_banner))
        .route("/v1/metrics", post(handle_beacon))
        .route("/formats.json", get(handle_formats))
        .route("/assets/{name}", get(handle_asset))
        .with_state(state)
}

/// Serves the mock backend on `listener` until the returned handle is dropped.
pub async fn spawn(listener: TcpListener, latency_ms: (u64, u64)) -> std::io::Result<MockBackend> {
    let addr = listener.local_addr()?;
    let base_url = format!("http://{}", addr);
    let state = MockState::new(&base_url, latency_ms);
    let app = router(state.clone());
    info!(addr = %addr, "mock ad backend running");
    let task = tokio::spawn(async move {
        if let Err(e) = serve(listener, app).await {
            error!(error = %e, "mock ad backend stopped");
        }
    });
    Ok(MockBackend {
        base_url,
        state,
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creative_matches_format_ratio() {
        let png = render_creative(AdFormat::Wide).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.height(), ASSET_HEIGHT);
        assert_eq!(decoded.width(), 4 * ASSET_HEIGHT);
    }

    #[tokio::test]
    async fn beta_units_get_billboard_info() {
        let state = MockState::new("http://127.0.0.1:1", (0, 0));
        let query = UnitInfoQuery { ad_unit_id: "billboard-1".into() };
        let Json(info) = handle_unit_info(State(state.clone()), Query(query)).await.unwrap();
        assert_eq!(info.beta_format(), Some(AdFormat::Billboard));

        let plain = UnitInfoQuery { ad_unit_id: "U1".into() };
        let err = handle_unit_info(State(state), Query(plain)).await.unwrap_err();
        assert_eq!(err, StatusCode::NOT_FOUND);
    }
}
