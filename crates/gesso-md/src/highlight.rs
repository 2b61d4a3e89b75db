//! Syntax highlighting for fenced code blocks.
//!
//! Registration-only: building a [`Highlighter`] loads the bundled syntax and
//! theme definitions once; there are no further knobs. Highlighted blocks are
//! emitted as inline-styled `<pre>` HTML so no highlight stylesheet is needed.

use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

const THEME: &str = "InspiredGitHub";

/// Errors that can occur while highlighting.
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("Highlighting failed: {0}")]
    Syntect(#[from] syntect::Error),
}

/// Code block highlighter backed by syntect's bundled definitions.
pub struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    /// Load the default syntax and theme sets.
    pub fn new() -> Self {
        let syntaxes = SyntaxSet::load_defaults_newlines();
        let theme = ThemeSet::load_defaults().themes[THEME].clone();
        Self { syntaxes, theme }
    }

    /// Highlight a code block to an HTML `<pre>` fragment.
    ///
    /// `info` is the fence info string (e.g. `rust` or `js title=app.js`);
    /// unknown languages fall back to plain text.
    pub fn highlight(&self, code: &str, info: &str) -> Result<String, HighlightError> {
        let token = language_token(info);
        let syntax = self
            .syntaxes
            .find_syntax_by_token(token)
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());

        Ok(highlighted_html_for_string(
            code,
            &self.syntaxes,
            syntax,
            &self.theme,
        )?)
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

/// First whitespace-separated token of a fence info string.
fn language_token(info: &str) -> &str {
    info.split_whitespace().next().unwrap_or("")
}
