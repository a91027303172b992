//! Product image URL normalization.
//!
//! The catalog stores images in three shapes: absolute URLs, paths relative
//! to the asset host (`static/images/x.jpg`, `/uploads/x.jpg`), and bare file
//! names that live under `static/images/`.

/// Resolve a raw catalog image reference against `asset_base`.
///
/// Returns `None` for a missing or blank reference.
#[must_use]
pub fn normalize_image_url(raw: Option<&str>, asset_base: &str) -> Option<String> {
    let image = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let base = asset_base.trim_end_matches('/');

    if is_absolute(image) {
        return Some(image.to_string());
    }
    if image.contains('/') {
        return Some(format!("{base}/{}", image.trim_start_matches('/')));
    }
    Some(format!("{base}/static/images/{image}"))
}

fn is_absolute(image: &str) -> bool {
    let lower = image.get(..8).unwrap_or(image).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
