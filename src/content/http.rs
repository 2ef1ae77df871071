// src/content/http.rs

use crate::content::{BeaconSink, ContentSource, TextureLoader};
use crate::error::{BannerError, Result};
use crate::model::{
    BetaUnitInfo, CampaignRecord, ContentRecord, ContentRequest, NftBanner, NftRecord,
    TextureHandle,
};
use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Ad-serving backend over HTTP/JSON.
pub struct HttpContentSource {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpContentSource {
    pub fn new(client: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let start = Instant::now();
        let response = timeout(self.timeout, self.client.get(&url).query(query).send())
            .await
            .map_err(|_| BannerError::Timeout(self.timeout))??;
        let status = response.status();
        debug!(url = %url, %status, elapsed_ms = start.elapsed().as_millis() as u64, "content request");
        if !status.is_success() {
            return Err(BannerError::Network(format!("{} returned {}", url, status)));
        }
        Ok(response.json::<T>().await?)
    }

    async fn fetch_nft(&self, request: &ContentRequest, network: &str) -> Result<NftBanner> {
        let nft: NftRecord = self
            .get_json("/v1/nft", &[("space", request.ad_unit.as_str()), ("network", network)])
            .await?;
        self.get_json(
            "/v1/banner",
            &[
                ("uri", nft.uri.as_str()),
                ("format", request.format.name()),
                ("style", request.style.name()),
                ("space", request.ad_unit.as_str()),
            ],
        )
        .await
    }
}

impl ContentSource for HttpContentSource {
    fn unit_info<'a>(&'a self, ad_unit: &'a str) -> BoxFuture<'a, Result<BetaUnitInfo>> {
        async move {
            let url = format!("{}/v3/unit-info", self.base_url);
            let response = timeout(
                self.timeout,
                self.client.get(&url).query(&[("ad_unit_id", ad_unit)]).send(),
            )
            .await
            .map_err(|_| BannerError::Timeout(self.timeout))??;
            // Units without metadata are the common case.
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(BetaUnitInfo::default());
            }
            let response = response.error_for_status()?;
            Ok(response.json::<BetaUnitInfo>().await?)
        }
        .boxed()
    }

    fn fetch<'a>(&'a self, request: &'a ContentRequest) -> BoxFuture<'a, Result<ContentRecord>> {
        async move {
            match request.network {
                Some(network) => {
                    let banner = self.fetch_nft(request, network.name()).await?;
                    Ok(ContentRecord::Nft(banner))
                }
                None => {
                    let record: CampaignRecord = self
                        .get_json(
                            "/v3/campaign",
                            &[
                                ("ad_unit_id", request.ad_unit.as_str()),
                                ("format", request.format.name()),
                                ("style", request.style.name()),
                            ],
                        )
                        .await?;
                    Ok(ContentRecord::Campaign(record))
                }
            }
        }
        .boxed()
    }
}

/// Tries the live backend first and falls back to the bundled one.
pub struct FallbackContentSource {
    live: Arc<dyn ContentSource>,
    bundled: Arc<dyn ContentSource>,
}

impl FallbackContentSource {
    pub fn new(live: Arc<dyn ContentSource>, bundled: Arc<dyn ContentSource>) -> Self {
        Self { live, bundled }
    }
}

impl ContentSource for FallbackContentSource {
    fn unit_info<'a>(&'a self, ad_unit: &'a str) -> BoxFuture<'a, Result<BetaUnitInfo>> {
        async move {
            match self.live.unit_info(ad_unit).await {
                Ok(info) => Ok(info),
                Err(e) => {
                    warn!(ad_unit, error = %e, "live unit info failed, falling back to bundled backend");
                    self.bundled.unit_info(ad_unit).await
                }
            }
        }
        .boxed()
    }

    fn fetch<'a>(&'a self, request: &'a ContentRequest) -> BoxFuture<'a, Result<ContentRecord>> {
        async move {
            match self.live.fetch(request).await {
                Ok(record) => Ok(record),
                Err(e) => {
                    warn!(ad_unit = %request.ad_unit, error = %e, "live content fetch failed, falling back to bundled backend");
                    self.bundled.fetch(request).await
                }
            }
        }
        .boxed()
    }
}

/// Downloads an image and decodes it to RGBA.
pub struct HttpTextureLoader {
    client: Client,
    timeout: Duration,
    next_id: AtomicU64,
}

impl HttpTextureLoader {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            next_id: AtomicU64::new(1),
        }
    }
}

impl TextureLoader for HttpTextureLoader {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<TextureHandle>> {
        async move {
            let texture_err = |reason: String| BannerError::Texture {
                url: url.to_string(),
                reason,
            };
            let response = timeout(self.timeout, self.client.get(url).send())
                .await
                .map_err(|_| BannerError::Timeout(self.timeout))?
                .map_err(|e| texture_err(e.to_string()))?
                .error_for_status()
                .map_err(|e| texture_err(e.to_string()))?;
            let bytes = response.bytes().await.map_err(|e| texture_err(e.to_string()))?;

            let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
                .await
                .map_err(|e| texture_err(e.to_string()))?
                .map_err(|e| texture_err(e.to_string()))?
                .to_rgba8();

            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let (width, height) = decoded.dimensions();
            Ok(TextureHandle::new(id, url, width, height, decoded.into_raw()))
        }
        .boxed()
    }
}

#[derive(Serialize, Debug)]
struct BeaconEvent<'a> {
    event: &'a str,
    ad_unit: &'a str,
    campaign_id: Option<&'a str>,
    timestamp: String,
}

/// Posts load/click metrics without waiting for the answer.
pub struct HttpBeacon {
    client: Client,
    url: String,
}

impl HttpBeacon {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }

    fn send(&self, event: &str, ad_unit: &str, campaign_id: Option<&str>) {
        let body = BeaconEvent {
            event,
            ad_unit,
            campaign_id,
            timestamp: Utc::now().to_rfc3339(),
        };
        let request = self.client.post(&self.url).json(&body);
        let event = event.to_string();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = request.send().await {
                        debug!(event = %event, error = %e, "beacon not delivered");
                    }
                });
            }
            Err(_) => warn!(event = %event, "no async runtime, beacon dropped"),
        }
    }
}

impl BeaconSink for HttpBeacon {
    fn send_on_load(&self, ad_unit: &str, campaign_id: Option<&str>) {
        self.send("load", ad_unit, campaign_id);
    }

    fn send_on_click(&self, ad_unit: &str, campaign_id: Option<&str>) {
        self.send("click", ad_unit, campaign_id);
    }
}
