// src/model/campaign.rs

use crate::model::format::{AdFormat, AdStyle, Network};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What the controller asks the content backend for.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContentRequest {
    pub ad_unit: String,
    pub network: Option<Network>,
    pub format: AdFormat,
    pub style: AdStyle,
}

/// Campaign-backed answer: `{ "Ads": [{asset_url, cta_url}], "CampaignId": ... }`
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CampaignRecord {
    #[serde(rename = "Ads", default)]
    pub ads: Vec<CampaignAsset>,
    #[serde(rename = "CampaignId", default)]
    pub campaign_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CampaignAsset {
    pub asset_url: String, // creative image
    pub cta_url: String,   // click-through destination
}

/// First step of the NFT-backed path: which token currently owns the space.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NftRecord {
    pub uri: String,
}

/// Second step of the NFT-backed path: the banner the token points at.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NftBanner {
    pub uri: String,
    pub data: NftBannerData,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NftBannerData {
    pub image: String,
    pub url: String,
}

/// Either shape the backend can answer with.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentRecord {
    Campaign(CampaignRecord),
    Nft(NftBanner),
}

/// Unit metadata that can override the locally configured format.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BetaUnitInfo {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(rename = "absoluteWidth", default)]
    pub absolute_width: Option<f32>,
    #[serde(rename = "absoluteHeight", default)]
    pub absolute_height: Option<f32>,
}

impl BetaUnitInfo {
    /// The declared format, only when it belongs to the beta set.
    pub fn beta_format(&self) -> Option<AdFormat> {
        self.format
            .as_deref()
            .and_then(|name| name.parse::<AdFormat>().ok())
            .filter(AdFormat::is_beta)
    }
}

/// Opaque handle to a decoded texture.
///
/// Equality is by id: two handles are the same texture only if the same
/// decode produced them.
#[derive(Clone)]
pub struct TextureHandle {
    pub id: u64,
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<Vec<u8>>,
}

impl TextureHandle {
    pub fn new(id: u64, source: impl Into<String>, width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            id,
            source: source.into(),
            width,
            height,
            rgba: Arc::new(rgba),
        }
    }
}

impl PartialEq for TextureHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureHandle")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// One successfully loaded banner. Superseded, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignAd {
    pub campaign_id: Option<String>, // none for NFT-backed and default banners
    pub texture: TextureHandle,
    pub image_src: String,
    pub url: String,     // normalized destination
    pub generation: u64, // load attempt that produced it
}
