// src/format/resolver.rs

use crate::format::table::{BuiltinFormats, FormatTable};
use crate::model::{AdFormat, AdStyle, BetaUnitInfo, FormatSpec};

/// Turns a requested format (and optional beta unit info) into dimensions.
///
/// Never fails: a banner that cannot be sized cannot be rendered, so every
/// gap falls back to something drawable instead.
///
/// - a beta format declared in `beta` wins over `format`, and its absolute
///   width/height win over ratio-derived ones;
/// - rows missing from `table`, or with a non-positive ratio, come from the
///   builtin table;
/// - a non-positive or non-finite `target_height` is treated as 1.
pub fn resolve(
    table: &dyn FormatTable,
    format: AdFormat,
    beta: Option<&BetaUnitInfo>,
    target_height: f32,
) -> FormatSpec {
    let height = positive_or(target_height, 1.0);
    let beta_format = beta.and_then(BetaUnitInfo::beta_format);
    let format = beta_format.unwrap_or(format);
    let ratio = ratio_for(table, format);

    let mut spec = FormatSpec {
        format,
        ratio,
        width: ratio * height,
        height,
    };

    if let (Some(_), Some(info)) = (beta_format, beta) {
        if let Some(w) = info.absolute_width.filter(|w| w.is_finite() && *w > 0.0) {
            spec.width = w;
        }
        if let Some(h) = info.absolute_height.filter(|h| h.is_finite() && *h > 0.0) {
            spec.height = h;
        }
        spec.ratio = spec.width / spec.height;
    }
    spec
}

/// Default artwork for a format/style pair, used when a unit has no campaign.
pub fn default_image(table: &dyn FormatTable, format: AdFormat, style: AdStyle) -> Option<String> {
    table
        .entry(format)
        .and_then(|e| e.style.get(&style).cloned())
        .or_else(|| {
            BuiltinFormats
                .entry(format)
                .and_then(|e| e.style.get(&style).cloned())
        })
}

fn ratio_for(table: &dyn FormatTable, format: AdFormat) -> f32 {
    table
        .entry(format)
        .and_then(|e| e.ratio())
        .or_else(|| BuiltinFormats.entry(format).and_then(|e| e.ratio()))
        .unwrap_or(1.0)
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}
