// src/error.rs

use std::time::Duration;
use thiserror::Error;

/// Errors raised while setting up, loading or applying a banner.
///
/// Two families share this enum. Fatal ones describe a misconfigured scene
/// and propagate to whoever drives the controller; transient ones are
/// logged inside the controller and retried on the next refresh tick.
#[derive(Debug, Error)]
pub enum BannerError {
    /// The surface object has no mesh to put the texture on.
    #[error("banner surface is missing a mesh component")]
    MissingMesh,

    /// Neither known texture slot exists on the surface material.
    #[error("unable to apply banner texture: unsupported pipeline {0}")]
    UnsupportedPipeline(String),

    /// A configuration value failed validation.
    #[error("invalid banner configuration: {0}")]
    InvalidConfig(String),

    /// Request to the ad-serving backend failed.
    #[error("network error: {0}")]
    Network(String),

    /// Backend answered, but with something we cannot show.
    #[error("content error: {0}")]
    Content(String),

    /// Image could not be downloaded or decoded.
    #[error("texture load failed for {url}: {reason}")]
    Texture { url: String, reason: String },

    /// The whole load attempt exceeded the configured timeout.
    #[error("load timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BannerError {
    /// Fatal errors describe a misconfigured scene or banner and halt it.
    /// Everything else, including I/O and JSON errors raised by a content
    /// source, is retried on the next refresh.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BannerError::MissingMesh
                | BannerError::UnsupportedPipeline(_)
                | BannerError::InvalidConfig(_)
        )
    }
}

impl From<reqwest::Error> for BannerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BannerError::Content(err.to_string())
        } else {
            BannerError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, BannerError>;
