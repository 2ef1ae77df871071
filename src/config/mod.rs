// src/config/mod.rs

pub mod adapters;
pub mod banner_config;

pub use adapters::{ConfigAdapter, FileConfigAdapter};
pub use banner_config::{BannerConfig, Endpoints, TextureProperty, DEFAULT_REFRESH_INTERVAL_MS};
