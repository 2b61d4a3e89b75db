//! Responsive image pipeline for gesso sites.
//!
//! Content images referenced under `/assets` are resized into a fixed set of
//! display widths plus their double-density equivalents, encoded as AVIF,
//! WebP, and JPEG, and emitted as `<picture>` markup. The processing backend
//! sits behind a trait so pipeline logic is testable without image I/O.

pub mod backend;
pub mod encoder;
pub mod pipeline;
pub mod widths;

pub use backend::{Dimensions, ImageBackend, ImageError, ResizeJob};
pub use encoder::RasterBackend;
pub use pipeline::{is_asset_url, rewrite_asset_path, ImagePipeline};
pub use widths::{plan_variants, variant_widths, Variant, BASE_WIDTHS};
