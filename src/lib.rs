// src/lib.rs

//! Ad banners for 3D/XR scenes.
//!
//! A banner is a textured surface in the host scene. An
//! [`AdLifecycleController`] fetches the campaign for its ad unit, puts the
//! creative on the surface, refreshes it while the viewer is looking, and
//! turns activations into navigation.

pub mod banner;
pub mod config;
pub mod content;
pub mod error;
pub mod format;
pub mod host;
pub mod logging;
#[cfg(feature = "mock-server")]
pub mod mock_server;
pub mod model;

pub use banner::{AdLifecycleController, ClickOutcome, LoadOutcome, TickOutcome};
pub use config::BannerConfig;
pub use content::BannerServices;
pub use error::{BannerError, Result};
pub use host::HostContext;

use std::sync::{Mutex, MutexGuard};

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
