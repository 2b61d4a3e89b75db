//! Static site builder for gesso sites.
//!
//! Turns a directory of markdown content plus passthrough assets into a
//! finished site: front matter and excerpts, highlighted code, responsive
//! images, templated pages, and env-driven template data.

pub mod assets;
pub mod builder;
pub mod config;
pub mod env;
pub mod templates;

pub use builder::{BuildError, BuildResult, StaticBuilder};
pub use config::{ConfigError, MarkdownConfig, SiteConfig};
pub use env::{load_env, EnvError};
