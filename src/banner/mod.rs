// src/banner/mod.rs

//! Banner lifecycle: loading, texturing, refresh and click-through.

pub mod click;
pub mod controller;
pub mod texture;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testing;

pub use click::{ClickDispatcher, ClickOutcome};
pub use controller::{AdLifecycleController, LoadOutcome, TickOutcome};
pub use texture::{apply_texture, detect_slot, fit_to_format};
pub use visibility::VisibilityGate;
