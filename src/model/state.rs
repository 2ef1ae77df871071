// src/model/state.rs

use crate::model::campaign::CampaignAd;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BannerPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Controller's current view of the banner.
///
/// `ad` keeps the last successful load across later `Loading`/`Error`
/// phases, so the surface keeps showing (and linking to) what it holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BannerState {
    pub phase: BannerPhase,
    pub ad: Option<CampaignAd>,
}

impl BannerState {
    /// Destination a click would navigate to, if any ad has ever loaded.
    pub fn destination(&self) -> Option<&str> {
        self.ad.as_ref().map(|ad| ad.url.as_str())
    }

    pub fn is_clickable(&self) -> bool {
        self.destination().is_some()
    }
}
