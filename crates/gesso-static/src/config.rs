//! Site configuration.
//!
//! Configuration lives in an optional `site.toml` at the project root. Every
//! field has a default so a project with no config file still builds.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use gesso_md::MarkdownOptions;

/// Site-wide configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title, used in page <title> and the nav header
    pub title: String,

    /// Base URL the site is served under
    pub base_url: String,

    /// Source directory
    pub input_dir: PathBuf,

    /// Build output directory
    pub output_dir: PathBuf,

    /// Env file whose variables are exposed to templates as `env`
    pub env_file: PathBuf,

    /// Minify generated CSS
    pub minify: bool,

    /// Markdown rendering flags
    pub markdown: MarkdownConfig,
}

/// Markdown rendering flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    pub html: bool,
    pub breaks: bool,
    pub linkify: bool,
    pub heading_attributes: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Site".to_string(),
            base_url: "/".to_string(),
            input_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("dist"),
            env_file: PathBuf::from(".env"),
            minify: true,
            markdown: MarkdownConfig::default(),
        }
    }
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            html: true,
            breaks: true,
            linkify: true,
            heading_attributes: true,
        }
    }
}

/// Errors that can occur loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl SiteConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error: defaults apply.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Directories the dev server watches for changes: the source tree plus
    /// the script directory.
    pub fn watch_targets(&self) -> Vec<PathBuf> {
        vec![self.input_dir.clone(), self.input_dir.join("js")]
    }

    pub fn markdown_options(&self) -> MarkdownOptions {
        MarkdownOptions {
            html: self.markdown.html,
            breaks: self.markdown.breaks,
            linkify: self.markdown.linkify,
            heading_attributes: self.markdown.heading_attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let config = SiteConfig::load(Path::new("/nonexistent/site.toml")).unwrap();

        assert_eq!(config.input_dir, PathBuf::from("src"));
        assert_eq!(config.output_dir, PathBuf::from("dist"));
        assert!(config.markdown.breaks);
    }

    #[test]
    fn loads_partial_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("site.toml");
        std::fs::write(&path, "title = \"My Site\"\n\n[markdown]\nbreaks = false\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();

        assert_eq!(config.title, "My Site");
        assert!(!config.markdown.breaks);
        // untouched fields keep defaults
        assert!(config.markdown.linkify);
        assert_eq!(config.base_url, "/");
    }

    #[test]
    fn rejects_unknown_fields() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("site.toml");
        std::fs::write(&path, "titel = \"typo\"\n").unwrap();

        assert!(matches!(
            SiteConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn watch_targets_include_script_dir() {
        let config = SiteConfig::default();

        let targets = config.watch_targets();

        assert!(targets.contains(&PathBuf::from("src")));
        assert!(targets.contains(&PathBuf::from("src/js")));
    }
}
