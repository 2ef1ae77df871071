// src/content/url.rs

use crate::config::Endpoints;

const IPFS_GATEWAY: &str = "https://ipfs.zesty.market/ipfs/";
const ARWEAVE_GATEWAY: &str = "https://arweave.net/";

/// Makes a backend destination safe to hand to the URL opener.
///
/// Adds `https://` when no scheme is present and sends the bare marketplace
/// root to the unit's own storefront page.
pub fn normalize_destination(url: &str, ad_unit: &str, endpoints: &Endpoints) -> String {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    let url = if lower.starts_with("http://") || lower.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };
    if url.trim_end_matches('/') == endpoints.marketplace_root.trim_end_matches('/') {
        endpoints.storefront_url.replace("{ad_unit}", ad_unit)
    } else {
        url
    }
}

/// Turns `ipfs://` and `ar://` image URIs into gateway URLs. Anything that
/// already names a png/jpg/jpeg file passes through untouched, whatever its
/// scheme.
pub fn resolve_image_url(image: &str) -> String {
    let image = image.trim();
    if image.starts_with("http") || has_image_extension(image) {
        return image.to_string();
    }
    if let Some(cid) = image.strip_prefix("ipfs://") {
        format!("{}{}", IPFS_GATEWAY, cid.trim_start_matches("ipfs/"))
    } else if let Some(id) = image.strip_prefix("ar://") {
        format!("{}{}", ARWEAVE_GATEWAY, id)
    } else {
        image.to_string()
    }
}

/// `.png`, `.jpg` or `.jpeg` after at least one other character.
fn has_image_extension(path: &str) -> bool {
    let path = path.to_ascii_lowercase();
    [".png", ".jpg", ".jpeg"]
        .iter()
        .any(|ext| path.match_indices(ext).any(|(at, _)| at > 0))
}
