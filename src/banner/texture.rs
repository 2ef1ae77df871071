// src/banner/texture.rs

use crate::config::TextureProperty;
use crate::error::{BannerError, Result};
use crate::host::{Material, Surface};
use crate::model::{FormatSpec, TextureHandle};

/// Textured pipelines the banner knows how to fill, in probing order, with
/// the alpha-mask threshold each one needs.
const KNOWN_SLOTS: [(&str, f32); 2] = [("diffuseTexture", 0.3), ("flatTexture", 0.8)];

/// Texture slot and alpha-mask threshold for `material`, if its pipeline is
/// one we recognize.
pub fn detect_slot(material: &Material) -> Option<(&'static str, f32)> {
    KNOWN_SLOTS
        .iter()
        .copied()
        .find(|(slot, _)| material.has_parameter(slot))
}

/// Puts `texture` on the surface material.
///
/// `Auto` probes the material pipeline and fails with
/// [`BannerError::UnsupportedPipeline`] when nothing matches. A named
/// property is assigned as is.
pub fn apply_texture(
    surface: &dyn Surface,
    property: &TextureProperty,
    assign_alpha_mask: bool,
    texture: &TextureHandle,
) -> Result<()> {
    let mut material = surface.material().ok_or(BannerError::MissingMesh)?;
    match property {
        TextureProperty::Auto => {
            let (slot, threshold) = detect_slot(&material)
                .ok_or_else(|| BannerError::UnsupportedPipeline(material.pipeline.clone()))?;
            material.set_texture(slot, texture.clone());
            material.alpha_mask_threshold = Some(threshold);
        }
        TextureProperty::Named(name) => material.set_texture(name, texture.clone()),
    }
    if assign_alpha_mask {
        material.alpha_mask_texture = Some(texture.clone());
    }
    surface.set_material(material);
    Ok(())
}

/// Scales the surface to `spec` and keeps the collider in step.
pub fn fit_to_format(surface: &dyn Surface, spec: &FormatSpec, resize_collider: bool) {
    surface.set_scaling([spec.width, spec.height, 1.0]);
    if resize_collider {
        surface.set_collider_extents([spec.width, spec.height, 0.1]);
    }
}
