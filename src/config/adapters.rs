// src/config/adapters.rs

use crate::config::banner_config::BannerConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;

/// Shape of a banner config file.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConfigData {
    pub banners: Vec<BannerConfig>,
}

pub trait ConfigAdapter: Send + Sync {
    /// Every configured banner, already validated.
    fn get_banners(&self) -> Result<Vec<BannerConfig>>;
}

pub struct FileConfigAdapter {
    pub file: String,
}

impl FileConfigAdapter {
    pub fn new(file: &str) -> Self {
        Self {
            file: file.to_string(),
        }
    }
}

impl ConfigAdapter for FileConfigAdapter {
    fn get_banners(&self) -> Result<Vec<BannerConfig>> {
        let content = fs::read_to_string(&self.file)?;
        parse_banners(&content)
    }
}

/// Accepts `{"banners": [...]}` or a bare array.
pub fn parse_banners(content: &str) -> Result<Vec<BannerConfig>> {
    let banners = match serde_json::from_str::<ConfigData>(content) {
        Ok(data) => data.banners,
        Err(_) => serde_json::from_str::<Vec<BannerConfig>>(content)?,
    };
    for banner in &banners {
        banner.validate()?;
    }
    Ok(banners)
}
