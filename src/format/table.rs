// src/format/table.rs

use crate::error::Result;
use crate::model::{AdFormat, AdStyle};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_IMAGE_ROOT: &str = "https://cdn.zesty.xyz/images/zesty";

/// One row of the format table. `width`/`height` are relative, only their
/// ratio matters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FormatEntry {
    pub width: f32,
    #[serde(default = "unit_height")]
    pub height: f32,
    /// Default artwork per style, shown when the unit has no campaign.
    #[serde(default)]
    pub style: HashMap<AdStyle, String>,
}

fn unit_height() -> f32 {
    1.0
}

impl FormatEntry {
    /// Width-to-height ratio, `None` when the row cannot produce a visible banner.
    pub fn ratio(&self) -> Option<f32> {
        let ratio = self.width / self.height;
        (ratio.is_finite() && ratio > 0.0).then_some(ratio)
    }
}

/// Source of format rows. The builtin table always answers; a remote table
/// may not know every format.
pub trait FormatTable: Send + Sync {
    fn entry(&self, format: AdFormat) -> Option<FormatEntry>;
}

/// Compiled-in formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFormats;

static BUILTIN: Lazy<HashMap<AdFormat, FormatEntry>> = Lazy::new(|| {
    [
        (AdFormat::Tall, 0.75),
        (AdFormat::Wide, 4.0),
        (AdFormat::Square, 1.0),
        (AdFormat::MobilePhoneInterstitial, 0.56),
        (AdFormat::Billboard, 3.88),
        (AdFormat::MediumRectangle, 1.2),
    ]
    .into_iter()
    .map(|(format, width)| {
        let style = AdStyle::ALL
            .iter()
            .map(|s| (*s, default_image_url(format, *s)))
            .collect();
        (format, FormatEntry { width, height: 1.0, style })
    })
    .collect()
});

fn default_image_url(format: AdFormat, style: AdStyle) -> String {
    match style {
        AdStyle::Standard => format!("{}/zesty-banner-{}.png", DEFAULT_IMAGE_ROOT, format),
        other => format!("{}/zesty-banner-{}-{}.png", DEFAULT_IMAGE_ROOT, format, other),
    }
}

impl FormatTable for BuiltinFormats {
    fn entry(&self, format: AdFormat) -> Option<FormatEntry> {
        BUILTIN.get(&format).cloned()
    }
}

/// Format table downloaded at startup, keyed by format name.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(transparent)]
pub struct RemoteFormats {
    entries: HashMap<String, FormatEntry>,
}

impl RemoteFormats {
    pub fn new(entries: HashMap<String, FormatEntry>) -> Self {
        Self { entries }
    }

    pub async fn fetch(client: &reqwest::Client, url: &str, limit: Duration) -> Result<Self> {
        let response = tokio::time::timeout(limit, client.get(url).send())
            .await
            .map_err(|_| crate::error::BannerError::Timeout(limit))??
            .error_for_status()?;
        Ok(response.json::<RemoteFormats>().await?)
    }
}

impl FormatTable for RemoteFormats {
    fn entry(&self, format: AdFormat) -> Option<FormatEntry> {
        self.entries.get(format.name()).cloned()
    }
}

/// Picks the remote table when asked to and it can be fetched, the builtin
/// one otherwise.
pub async fn load_format_table(
    client: &reqwest::Client,
    dynamic: bool,
    url: &str,
    limit: Duration,
) -> std::sync::Arc<dyn FormatTable> {
    if !dynamic {
        return std::sync::Arc::new(BuiltinFormats);
    }
    match RemoteFormats::fetch(client, url, limit).await {
        Ok(table) => {
            info!(url, formats = table.entries.len(), "loaded remote format table");
            std::sync::Arc::new(table)
        }
        Err(e) => {
            warn!(url, error = %e, "failed to load remote format table, using builtin formats");
            std::sync::Arc::new(BuiltinFormats)
        }
    }
}
