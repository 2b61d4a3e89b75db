//! Pure calculation functions for variant widths and dimensions.
//!
//! Everything here is testable without I/O or image data.

/// Base display widths for content images, in CSS pixels.
pub const BASE_WIDTHS: &[u32] = &[250, 400];

/// A single variant to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub width: u32,
    pub height: u32,
}

/// Expand base display widths with their double-density equivalents.
///
/// The result is deduplicated and sorted ascending, so overlapping entries
/// (a base width that is already another width's double) appear once.
pub fn variant_widths(base: &[u32]) -> Vec<u32> {
    let mut widths: Vec<u32> = base.to_vec();
    widths.extend(base.iter().map(|w| w * 2));
    widths.sort_unstable();
    widths.dedup();
    widths
}

/// Calculate which variants to generate for an original image.
///
/// Widths larger than the original are skipped so upscaled variants are never
/// produced; heights preserve the source aspect ratio. If every requested
/// width exceeds the original, the original dimensions come back as the only
/// entry.
pub fn plan_variants(original: (u32, u32), widths: &[u32]) -> Vec<Variant> {
    let (orig_w, orig_h) = original;

    let mut result: Vec<Variant> = widths
        .iter()
        .filter(|&&w| w <= orig_w)
        .map(|&w| {
            let ratio = w as f64 / orig_w as f64;
            Variant {
                width: w,
                height: (orig_h as f64 * ratio).round() as u32,
            }
        })
        .collect();

    if result.is_empty() {
        result.push(Variant {
            width: orig_w,
            height: orig_h,
        });
    }

    result
}
