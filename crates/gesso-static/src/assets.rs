//! Asset pipeline for generated CSS and JavaScript.
//!
//! The builder copies user stylesheets and scripts byte-for-byte; only the
//! scaffolded defaults below run through minification.

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Default stylesheet scaffolded into new sites.
    pub fn default_css() -> String {
        DEFAULT_CSS.to_string()
    }

    /// Menu toggle script scaffolded into new sites as `js/nav.js`.
    pub fn nav_js() -> String {
        NAV_JS.to_string()
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

const DEFAULT_CSS: &str = r#"/* gesso default theme */

:root {
  --content-max-width: 720px;
  --header-height: 64px;
  --color-bg: #ffffff;
  --color-fg: #1a1a1a;
  --color-muted: #6b6b6b;
  --color-accent: #2b6cb0;
  --color-border: #e2e2e2;
}

* {
  box-sizing: border-box;
  margin: 0;
  padding: 0;
}

body {
  font-family: system-ui, -apple-system, sans-serif;
  background: var(--color-bg);
  color: var(--color-fg);
  line-height: 1.6;
}

/* Header and navigation */
.header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  height: var(--header-height);
  padding: 0 1.5rem;
  border-bottom: 1px solid var(--color-border);
}

.nav__logo {
  font-weight: 700;
  font-size: 1.25rem;
  color: var(--color-fg);
  text-decoration: none;
}

.nav__toggle {
  display: none;
  background: none;
  border: none;
  font-size: 1.5rem;
  color: var(--color-fg);
  cursor: pointer;
}

.nav__list {
  display: flex;
  gap: 1rem;
  list-style: none;
}

.nav__item a {
  color: var(--color-muted);
  text-decoration: none;
  transition: color 0.15s;
}

.nav__item a:hover,
.nav__item--active a {
  color: var(--color-accent);
}

/* Content */
.main {
  max-width: var(--content-max-width);
  margin: 0 auto;
  padding: 2rem 1.5rem;
}

.page__title {
  font-size: 2rem;
  margin-bottom: 0.5rem;
}

.page__date {
  color: var(--color-muted);
  font-size: 0.875rem;
  margin-bottom: 1.5rem;
}

.page__content p {
  margin-bottom: 1rem;
}

.page__content a {
  color: var(--color-accent);
}

.page__content img,
.page__content picture {
  max-width: 100%;
  height: auto;
}

.page__content pre {
  border: 1px solid var(--color-border);
  border-radius: 0.375rem;
  padding: 1rem;
  overflow-x: auto;
  font-size: 0.875rem;
  margin-bottom: 1rem;
}

/* Index listing */
.excerpts__item {
  border-top: 1px solid var(--color-border);
  padding: 1.5rem 0;
}

.excerpts__title {
  font-size: 1.25rem;
  margin-bottom: 0.5rem;
}

.excerpts__title a {
  color: var(--color-fg);
  text-decoration: none;
}

.excerpts__title a:hover {
  color: var(--color-accent);
}

/* Collapsed nav on small screens */
@media (max-width: 640px) {
  .nav__toggle {
    display: block;
  }

  .nav__menu {
    display: none;
    position: absolute;
    top: var(--header-height);
    left: 0;
    right: 0;
    background: var(--color-bg);
    border-bottom: 1px solid var(--color-border);
    padding: 1rem 1.5rem;
  }

  .nav__menu--open {
    display: block;
  }

  .nav__list {
    flex-direction: column;
  }
}
"#;

// Matches the markup the base template emits: a single .nav__toggle button
// holding a remixicon <i>. Expanded state always pairs with the close icon.
const NAV_JS: &str = r#"const toggle = document.querySelector('.nav__toggle');
const menu = document.querySelector('.nav__menu');

if (toggle) {
  toggle.addEventListener('click', () => {
    const expanded = toggle.getAttribute('aria-expanded') === 'true';
    toggle.setAttribute('aria-expanded', String(!expanded));

    const icon = toggle.querySelector('i');
    icon.classList.toggle('ri-menu-line');
    icon.classList.toggle('ri-close-line');

    if (menu) {
      menu.classList.toggle('nav__menu--open');
    }
  });
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minifies_css() {
        let css = "body {\n  color: red;\n}\n";

        let minified = AssetPipeline::minify_css(css).unwrap();

        assert!(minified.len() < css.len());
        assert!(minified.contains("color:red"));
    }

    #[test]
    fn minify_rejects_invalid_css() {
        assert!(AssetPipeline::minify_css("body { color: }").is_err());
    }

    #[test]
    fn default_css_minifies_cleanly() {
        let minified = AssetPipeline::minify_css(&AssetPipeline::default_css()).unwrap();

        assert!(minified.contains(".nav__toggle"));
    }

    #[test]
    fn nav_js_flips_aria_expanded_and_swaps_icons() {
        let js = AssetPipeline::nav_js();

        assert!(js.contains(".nav__toggle"));
        assert!(js.contains("aria-expanded"));
        // icon classes are toggled as a pair so expanded always shows close
        assert!(js.contains("ri-menu-line"));
        assert!(js.contains("ri-close-line"));
        assert!(js.contains("String(!expanded)"));
    }
}
