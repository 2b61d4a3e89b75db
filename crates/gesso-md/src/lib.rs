//! Markdown pipeline for gesso sites.
//!
//! This crate parses content files: YAML front matter and excerpt extraction,
//! markdown-to-HTML rendering with configurable option flags, syntax
//! highlighting for fenced code blocks, and a hook for custom image rendering.

pub mod frontmatter;
pub mod highlight;
pub mod render;

pub use frontmatter::{extract_excerpt, extract_frontmatter, Frontmatter, FrontmatterError, EXCERPT_MARKER};
pub use highlight::{Highlighter, HighlightError};
pub use render::{ImageRenderer, MarkdownOptions, RenderError, Renderer};
