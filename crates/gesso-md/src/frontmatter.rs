//! Front matter and excerpt extraction.

use serde::Deserialize;

/// Literal marker separating the excerpt from the rest of a content body.
pub const EXCERPT_MARKER: &str = "--excerpt--";

/// Parsed front matter from a content file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Frontmatter {
    /// Page title (required)
    pub title: String,

    /// Page description for SEO
    #[serde(default)]
    pub description: Option<String>,

    /// Publication date, rendered as-is
    #[serde(default)]
    pub date: Option<String>,

    /// Order in navigation (lower = first)
    #[serde(default)]
    pub order: Option<i32>,

    /// Whether to show in navigation
    #[serde(default = "default_true")]
    pub nav: bool,

    /// Custom slug override
    #[serde(default)]
    pub slug: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for Frontmatter {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            date: None,
            order: None,
            nav: true,
            slug: None,
        }
    }
}

/// Extract front matter from a content file.
///
/// Returns the parsed front matter and the remaining content after the
/// front matter block.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let trimmed = source.trim_start();

    if !trimmed.starts_with("---") {
        return Ok((None, source));
    }

    // Find the closing ---
    let after_open = &trimmed[3..];
    let Some(close_pos) = after_open.find("\n---") else {
        return Err(FrontmatterError::Unclosed);
    };

    let yaml_content = &after_open[..close_pos].trim();
    let remaining = &after_open[close_pos + 4..];

    let frontmatter: Frontmatter = serde_yaml::from_str(yaml_content)
        .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;

    Ok((Some(frontmatter), remaining.trim_start()))
}

/// Split an excerpt off a content body.
///
/// The excerpt is the text preceding the first occurrence of
/// [`EXCERPT_MARKER`]; the marker itself is removed from the returned body.
/// Bodies without the marker come back unchanged with no excerpt.
pub fn extract_excerpt(body: &str) -> (Option<String>, String) {
    match body.find(EXCERPT_MARKER) {
        Some(pos) => {
            let excerpt = body[..pos].to_string();
            let rest = &body[pos + EXCERPT_MARKER.len()..];
            (Some(excerpt), format!("{}{}", &body[..pos], rest))
        }
        None => (None, body.to_string()),
    }
}

/// Errors that can occur when parsing front matter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed front matter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in front matter: {0}")]
    InvalidYaml(String),
}
