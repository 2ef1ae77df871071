// src/model/mod.rs

pub mod campaign;
pub mod format;
pub mod state;

pub use campaign::{
    BetaUnitInfo, CampaignAd, CampaignAsset, CampaignRecord, ContentRecord, ContentRequest,
    NftBanner, NftBannerData, NftRecord, TextureHandle,
};
pub use format::{AdFormat, AdStyle, FormatSpec, Network};
pub use state::{BannerPhase, BannerState};
