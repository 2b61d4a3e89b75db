//! Responsive image pipeline.
//!
//! Content images whose URL starts with `/assets` are resolved to files under
//! the site source directory, resized into a fixed set of widths in AVIF,
//! WebP, and JPEG, and rendered as a `<picture>` element. Everything else
//! passes through as a plain `<img>`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::backend::{ImageBackend, ImageError, ResizeJob};
use crate::widths::{plan_variants, variant_widths, Variant, BASE_WIDTHS};

/// Output formats in `<picture>` source order: best compression first, the
/// JPEG fallback last.
const FORMATS: &[(&str, &str)] = &[
    ("avif", "image/avif"),
    ("webp", "image/webp"),
    ("jpeg", "image/jpeg"),
];

/// Sizes attribute for content images. The layout caps images at 250px on
/// narrow viewports and 400px elsewhere.
const SIZES: &str = "(max-width: 400px) 250px";

/// Responsive image pipeline.
///
/// Holds the site source root (where `/assets` URLs resolve), the build
/// output root (where variants are written), and the variant width set.
pub struct ImagePipeline {
    backend: Box<dyn ImageBackend>,
    source_root: PathBuf,
    output_root: PathBuf,
    widths: Vec<u32>,
    quality: u8,
}

impl ImagePipeline {
    /// Create a pipeline with the default width set and quality.
    ///
    /// `source_root` is the site source directory (containing `assets/`);
    /// `output_root` is the build output directory.
    pub fn new(
        backend: Box<dyn ImageBackend>,
        source_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            backend,
            source_root: source_root.into(),
            output_root: output_root.into(),
            widths: variant_widths(BASE_WIDTHS),
            quality: 80,
        }
    }

    /// Override the base display widths (doubles are derived automatically).
    pub fn with_base_widths(mut self, base: &[u32]) -> Self {
        self.widths = variant_widths(base);
        self
    }

    /// Generate variants for an `/assets` URL and return `<picture>` markup.
    pub fn render_picture(
        &self,
        url: &str,
        alt: &str,
        title: Option<&str>,
    ) -> Result<String, ImageError> {
        // "/assets/images/cat.jpg" -> base "/assets/images/cat"
        let (url_base, _ext) = url.rsplit_once('.').unwrap_or((url, ""));
        let rel_base = url_base.trim_start_matches('/');

        let source = self.source_root.join(url.trim_start_matches('/'));
        let dims = self.backend.identify(&source)?;
        let variants = plan_variants((dims.width, dims.height), &self.widths);

        for (ext, _) in FORMATS {
            for variant in &variants {
                let output = self.variant_path(rel_base, variant.width, ext);
                if output.exists() {
                    continue;
                }
                if let Some(parent) = output.parent() {
                    fs::create_dir_all(parent)?;
                }
                self.backend.resize(&ResizeJob {
                    source: source.clone(),
                    output,
                    width: variant.width,
                    height: variant.height,
                    quality: self.quality,
                })?;
            }
        }
        debug!(url, count = variants.len() * FORMATS.len(), "generated image variants");

        Ok(picture_markup(url_base, &variants, alt, title))
    }

    fn variant_path(&self, rel_base: &str, width: u32, ext: &str) -> PathBuf {
        self.output_root.join(format!("{rel_base}-{width}.{ext}"))
    }
}

/// Check whether a URL points into the managed asset tree.
pub fn is_asset_url(url: &str) -> bool {
    url.starts_with("/assets")
}

/// Resolve an `/assets` URL against a site source directory.
pub fn rewrite_asset_path(source_root: &Path, url: &str) -> PathBuf {
    source_root.join(url.trim_start_matches('/'))
}

fn srcset(url_base: &str, variants: &[Variant], ext: &str) -> String {
    variants
        .iter()
        .map(|v| format!("{url_base}-{}.{ext} {}w", v.width, v.width))
        .collect::<Vec<_>>()
        .join(", ")
}

fn picture_markup(url_base: &str, variants: &[Variant], alt: &str, title: Option<&str>) -> String {
    let mut out = String::from("<picture>");

    for (ext, mime) in &FORMATS[..FORMATS.len() - 1] {
        out.push_str(&format!(
            r#"<source type="{mime}" srcset="{}" sizes="{SIZES}">"#,
            srcset(url_base, variants, ext)
        ));
    }

    // Fallback img: lowest-resolution JPEG as src, largest variant's
    // dimensions as the layout hint
    let (fallback_ext, _) = FORMATS[FORMATS.len() - 1];
    let smallest = &variants[0];
    let largest = &variants[variants.len() - 1];
    let title_attr = title
        .map(|t| format!(r#" title="{}""#, escape_attr(t)))
        .unwrap_or_default();

    out.push_str(&format!(
        r#"<img src="{url_base}-{}.{fallback_ext}" srcset="{}" sizes="{SIZES}" width="{}" height="{}" alt="{}"{title_attr} loading="lazy" decoding="async">"#,
        smallest.width,
        srcset(url_base, variants, fallback_ext),
        largest.width,
        largest.height,
        escape_attr(alt),
    ));

    out.push_str("</picture>");
    out
}

/// Plain `<img>` for images outside the managed asset tree.
pub fn plain_img(src: &str, alt: &str, title: Option<&str>) -> String {
    let title_attr = title
        .map(|t| format!(r#" title="{}""#, escape_attr(t)))
        .unwrap_or_default();
    format!(
        r#"<img src="{}" alt="{}"{title_attr} loading="lazy" decoding="async">"#,
        escape_attr(src),
        escape_attr(alt),
    )
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl gesso_md::ImageRenderer for ImagePipeline {
    fn render(
        &self,
        src: &str,
        alt: &str,
        title: Option<&str>,
    ) -> Result<String, gesso_md::RenderError> {
        if !is_asset_url(src) {
            return Ok(plain_img(src, alt, title));
        }
        self.render_picture(src, alt, title)
            .map_err(|e| gesso_md::RenderError::Image {
                src: src.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tests::{MockBackend, RecordedOp};
    use crate::backend::Dimensions;
    use gesso_md::ImageRenderer;
    use std::sync::Arc;

    fn pipeline(dims: Dimensions, out: &Path) -> (ImagePipeline, Arc<MockBackend>) {
        let mock = Arc::new(MockBackend::with_dimensions(dims));
        let pipeline = ImagePipeline::new(Box::new(mock.clone()), "site/src", out);
        (pipeline, mock)
    }

    #[test]
    fn asset_urls_resolve_under_source_root() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (pipeline, mock) = pipeline(
            Dimensions {
                width: 1000,
                height: 750,
            },
            tmp.path(),
        );

        pipeline
            .render_picture("/assets/images/cat.jpg", "a cat", None)
            .unwrap();

        let ops = mock.get_operations();
        let expected = Path::new("site/src")
            .join("assets/images/cat.jpg")
            .to_string_lossy()
            .to_string();
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if *p == expected));
    }

    #[test]
    fn generates_all_widths_in_all_formats() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (pipeline, mock) = pipeline(
            Dimensions {
                width: 1000,
                height: 750,
            },
            tmp.path(),
        );

        pipeline
            .render_picture("/assets/photo.jpg", "", None)
            .unwrap();

        let resizes: Vec<_> = mock.get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Resize { .. }))
            .collect();
        // 4 widths (250, 400, 500, 800) x 3 formats
        assert_eq!(resizes.len(), 12);
    }

    #[test]
    fn small_originals_are_not_upscaled() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (pipeline, mock) = pipeline(
            Dimensions {
                width: 300,
                height: 200,
            },
            tmp.path(),
        );

        let html = pipeline
            .render_picture("/assets/tiny.jpg", "", None)
            .unwrap();

        let resizes: Vec<_> = mock.get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Resize { width: 250, .. }))
            .collect();
        assert_eq!(resizes.len(), 3);
        assert!(!html.contains("400w"));
    }

    #[test]
    fn existing_variants_are_not_regenerated() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cached = tmp.path().join("assets/photo-250.avif");
        fs::create_dir_all(cached.parent().unwrap()).unwrap();
        fs::write(&cached, b"cached").unwrap();

        let (pipeline, mock) = pipeline(
            Dimensions {
                width: 1000,
                height: 750,
            },
            tmp.path(),
        );

        pipeline
            .render_picture("/assets/photo.jpg", "", None)
            .unwrap();

        let resizes: Vec<_> = mock.get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Resize { .. }))
            .collect();
        assert_eq!(resizes.len(), 11);
    }

    #[test]
    fn picture_markup_has_required_attributes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (pipeline, _) = pipeline(
            Dimensions {
                width: 1000,
                height: 750,
            },
            tmp.path(),
        );

        let html = pipeline
            .render_picture("/assets/images/cat.jpg", "a cat", None)
            .unwrap();

        assert!(html.starts_with("<picture>"));
        assert!(html.contains(r#"type="image/avif""#));
        assert!(html.contains(r#"type="image/webp""#));
        assert!(html.contains(r#"sizes="(max-width: 400px) 250px""#));
        assert!(html.contains(r#"loading="lazy""#));
        assert!(html.contains(r#"decoding="async""#));
        assert!(html.contains(r#"alt="a cat""#));
        // src is the smallest JPEG, srcset carries doubles too
        assert!(html.contains(r#"src="/assets/images/cat-250.jpeg""#));
        assert!(html.contains("/assets/images/cat-800.jpeg 800w"));
    }

    #[test]
    fn alt_text_is_escaped() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (pipeline, _) = pipeline(
            Dimensions {
                width: 500,
                height: 500,
            },
            tmp.path(),
        );

        let html = pipeline
            .render_picture("/assets/x.jpg", r#"says "hi" & <bye>"#, None)
            .unwrap();

        assert!(html.contains(r#"alt="says &quot;hi&quot; &amp; &lt;bye&gt;""#));
    }

    #[test]
    fn non_asset_urls_render_plain_img() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (pipeline, mock) = pipeline(
            Dimensions {
                width: 500,
                height: 500,
            },
            tmp.path(),
        );

        let html = ImageRenderer::render(&pipeline, "https://example.com/pic.png", "remote", None)
            .unwrap();

        assert!(html.contains(r#"<img src="https://example.com/pic.png""#));
        assert!(!html.contains("<picture>"));
        assert!(mock.get_operations().is_empty());
    }

    #[test]
    fn rewrite_maps_assets_into_source_tree() {
        let path = rewrite_asset_path(Path::new("src"), "/assets/images/cat.jpg");

        assert_eq!(path, Path::new("src").join("assets/images/cat.jpg"));
    }
}
