// src/content/mod.rs

//! Ad-serving backend boundary: content lookup, texture decode, beacons.

pub mod http;
pub mod url;

use crate::config::BannerConfig;
use crate::error::Result;
use crate::format::{load_format_table, FormatTable};
use crate::model::{BetaUnitInfo, ContentRecord, ContentRequest, TextureHandle};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;

pub use http::{FallbackContentSource, HttpBeacon, HttpContentSource, HttpTextureLoader};

/// Used for startup requests when the banner sets no fetch timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub trait ContentSource: Send + Sync {
    /// Unit metadata; may declare a beta format and absolute dimensions.
    fn unit_info<'a>(&'a self, ad_unit: &'a str) -> BoxFuture<'a, Result<BetaUnitInfo>>;
    /// The ad to show for `request`.
    fn fetch<'a>(&'a self, request: &'a ContentRequest) -> BoxFuture<'a, Result<ContentRecord>>;
}

pub trait TextureLoader: Send + Sync {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<TextureHandle>>;
}

/// Fire-and-forget metrics. Nothing is returned and nothing is awaited.
pub trait BeaconSink: Send + Sync {
    fn send_on_load(&self, ad_unit: &str, campaign_id: Option<&str>);
    fn send_on_click(&self, ad_unit: &str, campaign_id: Option<&str>);
}

/// The collaborators a banner controller is built with.
#[derive(Clone)]
pub struct BannerServices {
    pub content: Arc<dyn ContentSource>,
    pub textures: Arc<dyn TextureLoader>,
    pub beacons: Arc<dyn BeaconSink>,
    pub formats: Arc<dyn FormatTable>,
}

impl BannerServices {
    /// HTTP-backed services for `config`.
    ///
    /// `live_api_base_url` wraps the bundled backend in a fallback source and
    /// `dynamic_formats` downloads the format table, keeping the builtin one
    /// if that fails.
    pub async fn from_config(config: &BannerConfig) -> Self {
        let client = reqwest::Client::new();
        let limit = config.fetch_timeout().unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let endpoints = &config.endpoints;

        let bundled: Arc<dyn ContentSource> =
            Arc::new(HttpContentSource::new(client.clone(), &endpoints.api_base_url, limit));
        let content: Arc<dyn ContentSource> = match &endpoints.live_api_base_url {
            Some(live) => Arc::new(FallbackContentSource::new(
                Arc::new(HttpContentSource::new(client.clone(), live, limit)),
                bundled,
            )),
            None => bundled,
        };
        let formats =
            load_format_table(&client, config.dynamic_formats, &endpoints.formats_url, limit).await;

        Self {
            content,
            textures: Arc::new(HttpTextureLoader::new(client.clone(), limit)),
            beacons: Arc::new(HttpBeacon::new(client, &endpoints.beacon_url)),
            formats,
        }
    }
}
