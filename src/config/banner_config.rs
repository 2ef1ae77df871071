// src/config/banner_config.rs

use crate::error::{BannerError, Result};
use crate::model::{AdFormat, AdStyle, Network};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 30_000;

/// Material slot the banner texture goes into.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum TextureProperty {
    /// Probe the material for a known textured pipeline.
    #[default]
    Auto,
    Named(String),
}

impl From<String> for TextureProperty {
    fn from(value: String) -> Self {
        if value.trim().is_empty() || value.eq_ignore_ascii_case("auto") {
            TextureProperty::Auto
        } else {
            TextureProperty::Named(value)
        }
    }
}

impl From<TextureProperty> for String {
    fn from(value: TextureProperty) -> Self {
        match value {
            TextureProperty::Auto => "auto".to_string(),
            TextureProperty::Named(name) => name,
        }
    }
}

/// Where the banner talks to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Endpoints {
    pub api_base_url: String,
    /// Optional live backend tried before `api_base_url`.
    pub live_api_base_url: Option<String>,
    pub beacon_url: String,
    pub formats_url: String,
    /// Destination that gets rewritten to the unit's storefront.
    pub marketplace_root: String,
    /// `{ad_unit}` is replaced with the unit id.
    pub storefront_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.zesty.market/api".to_string(),
            live_api_base_url: None,
            beacon_url: "https://beacon.zesty.market/api/v1/metrics".to_string(),
            formats_url: "https://cdn.zesty.xyz/sdk/zesty-formats.json".to_string(),
            marketplace_root: "https://www.zesty.market".to_string(),
            storefront_url: "https://app.zesty.market/space/{ad_unit}".to_string(),
        }
    }
}

/// Static configuration of one banner slot, fixed at setup.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BannerConfig {
    pub ad_unit: String,
    #[serde(default)]
    pub network: Option<Network>,
    #[serde(default = "default_format")]
    pub format: AdFormat,
    #[serde(default)]
    pub style: AdStyle,
    /// Keep surface height, make width follow the format ratio.
    #[serde(default = "enabled")]
    pub scale_to_ratio: bool,
    #[serde(default)]
    pub texture_property: TextureProperty,
    #[serde(default = "enabled")]
    pub assign_alpha_mask: bool,
    #[serde(default = "enabled")]
    pub beacon: bool,
    #[serde(default = "enabled")]
    pub create_automatic_collision: bool,
    /// Download the format table at startup instead of using the builtin one.
    #[serde(default = "enabled")]
    pub dynamic_formats: bool,
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,
    #[serde(default)]
    pub endpoints: Endpoints,
}

fn enabled() -> bool {
    true
}

fn default_format() -> AdFormat {
    AdFormat::DEFAULT
}

fn default_refresh_interval_ms() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MS
}

impl BannerConfig {
    /// Defaults for everything but the ad unit.
    pub fn new(ad_unit: &str) -> Self {
        Self {
            ad_unit: ad_unit.to_string(),
            network: None,
            format: default_format(),
            style: AdStyle::default(),
            scale_to_ratio: true,
            texture_property: TextureProperty::Auto,
            assign_alpha_mask: true,
            beacon: true,
            create_automatic_collision: true,
            dynamic_formats: true,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            fetch_timeout_ms: None,
            endpoints: Endpoints::default(),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// Rejects values no scene could work with.
    pub fn validate(&self) -> Result<()> {
        if self.ad_unit.trim().is_empty() {
            return Err(BannerError::InvalidConfig("ad_unit must not be empty".into()));
        }
        if self.refresh_interval_ms == 0 {
            return Err(BannerError::InvalidConfig("refresh_interval_ms must be positive".into()));
        }
        if self.fetch_timeout_ms == Some(0) {
            return Err(BannerError::InvalidConfig("fetch_timeout_ms must be positive".into()));
        }
        let urls = [
            ("api_base_url", Some(&self.endpoints.api_base_url)),
            ("live_api_base_url", self.endpoints.live_api_base_url.as_ref()),
            ("beacon_url", Some(&self.endpoints.beacon_url)),
            ("formats_url", Some(&self.endpoints.formats_url)),
        ];
        for (name, url) in urls {
            if let Some(url) = url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(BannerError::InvalidConfig(format!(
                        "{} must be an absolute http(s) URL, got {:?}",
                        name, url
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_gets_component_defaults() {
        let config: BannerConfig = serde_json::from_str(r#"{"ad_unit":"U1"}"#).unwrap();
        assert_eq!(config.format, AdFormat::Square);
        assert_eq!(config.style, AdStyle::Transparent);
        assert_eq!(config.texture_property, TextureProperty::Auto);
        assert!(config.scale_to_ratio && config.beacon && config.assign_alpha_mask);
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config, BannerConfig::new("U1"));
    }

    #[test]
    fn texture_property_reads_auto_or_name() {
        let config: BannerConfig =
            serde_json::from_str(r#"{"ad_unit":"U1","texture_property":"emissiveTexture"}"#).unwrap();
        assert_eq!(config.texture_property, TextureProperty::Named("emissiveTexture".into()));
        assert_eq!(TextureProperty::from("AUTO".to_string()), TextureProperty::Auto);
    }

    #[test]
    fn validation_rejects_empty_unit_and_zero_interval() {
        assert!(BannerConfig::new(" ").validate().is_err());
        let mut config = BannerConfig::new("U1");
        config.refresh_interval_ms = 0;
        assert!(matches!(config.validate(), Err(BannerError::InvalidConfig(_))));
    }

    #[test]
    fn validation_rejects_relative_endpoints() {
        let mut config = BannerConfig::new("U1");
        config.endpoints.live_api_base_url = Some("api.example.com".into());
        assert!(config.validate().is_err());
        config.endpoints.live_api_base_url = Some("https://api.example.com".into());
        assert!(config.validate().is_ok());
    }
}
