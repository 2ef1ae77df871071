// src/logging/banner_log.rs

use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BannerEventKind {
    Load,
    Click,
}

impl BannerEventKind {
    pub const ALL: [BannerEventKind; 2] = [BannerEventKind::Load, BannerEventKind::Click];

    pub fn name(&self) -> &'static str {
        match self {
            BannerEventKind::Load => "load",
            BannerEventKind::Click => "click",
        }
    }
}

/// **One banner event record**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BannerLog {
    pub timestamp: String,            // RFC 3339
    pub event: BannerEventKind,
    pub banner_id: String,            // controller instance
    pub ad_unit: String,
    pub generation: u64,              // load attempt, 0 for clicks
    pub format: Option<String>,       // effective format of the load
    pub campaign_id: Option<String>,
    pub status: String,               // "success", "failure", "stale", "deferred", ...
    pub elapsed_ms: u128,
    pub error: Option<String>,
}

impl BannerLog {
    /// **Load attempt record**, defaults to failure until marked otherwise.
    pub fn load(banner_id: &str, ad_unit: &str, generation: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: BannerEventKind::Load,
            banner_id: banner_id.to_string(),
            ad_unit: ad_unit.to_string(),
            generation,
            format: None,
            campaign_id: None,
            status: "failure".to_string(),
            elapsed_ms: 0,
            error: None,
        }
    }

    /// **Click record**
    pub fn click(banner_id: &str, ad_unit: &str, campaign_id: Option<&str>, status: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: BannerEventKind::Click,
            banner_id: banner_id.to_string(),
            ad_unit: ad_unit.to_string(),
            generation: 0,
            format: None,
            campaign_id: campaign_id.map(str::to_string),
            status: status.to_string(),
            elapsed_ms: 0,
            error: None,
        }
    }

    pub fn set_success(&mut self, format: &str, campaign_id: Option<&str>, elapsed_ms: u128) {
        self.status = "success".to_string();
        self.format = Some(format.to_string());
        self.campaign_id = campaign_id.map(str::to_string);
        self.elapsed_ms = elapsed_ms;
    }

    pub fn set_failure(&mut self, status: &str, error: impl ToString, elapsed_ms: u128) {
        self.status = status.to_string();
        self.error = Some(error.to_string());
        self.elapsed_ms = elapsed_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_record_starts_as_failure() {
        let log = BannerLog::load("b1", "U1", 3);
        assert_eq!(log.status, "failure");
        assert_eq!(log.generation, 3);
        assert_eq!(log.event, BannerEventKind::Load);
    }

    #[test]
    fn success_serializes_with_snake_case_event() {
        let mut log = BannerLog::load("b1", "U1", 1);
        log.set_success("square", Some("C1"), 42);
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["event"], "load");
        assert_eq!(json["campaign_id"], "C1");
        assert_eq!(json["status"], "success");
    }
}
