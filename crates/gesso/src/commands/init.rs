//! Scaffold a new site in the current directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use gesso_static::assets::AssetPipeline;

/// Run the init command.
pub async fn run(yes: bool) -> Result<()> {
    tracing::info!("Initializing gesso site...");

    let src_dir = Path::new("src");

    if src_dir.exists() {
        if !yes {
            tracing::warn!("src/ directory already exists. Use --yes to overwrite.");
            return Ok(());
        }
    } else {
        fs::create_dir_all(src_dir).context("Failed to create src directory")?;
    }

    let config_path = Path::new("site.toml");
    if !config_path.exists() || yes {
        fs::write(config_path, DEFAULT_CONFIG).context("Failed to write site.toml")?;
        tracing::info!("Created site.toml");
    }

    let env_path = Path::new(".env");
    if !env_path.exists() || yes {
        fs::write(env_path, DEFAULT_ENV).context("Failed to write .env")?;
        tracing::info!("Created .env");
    }

    let index_path = src_dir.join("index.md");
    if !index_path.exists() || yes {
        fs::write(&index_path, DEFAULT_INDEX).context("Failed to write index.md")?;
        tracing::info!("Created src/index.md");
    }

    let about_path = src_dir.join("about.md");
    if !about_path.exists() || yes {
        fs::write(&about_path, DEFAULT_ABOUT).context("Failed to write about.md")?;
        tracing::info!("Created src/about.md");
    }

    let css_path = src_dir.join("style.css");
    if !css_path.exists() || yes {
        fs::write(&css_path, AssetPipeline::default_css()).context("Failed to write style.css")?;
        tracing::info!("Created src/style.css");
    }

    let js_dir = src_dir.join("js");
    fs::create_dir_all(&js_dir).context("Failed to create js directory")?;
    let nav_path = js_dir.join("nav.js");
    if !nav_path.exists() || yes {
        fs::write(&nav_path, AssetPipeline::nav_js()).context("Failed to write nav.js")?;
        tracing::info!("Created src/js/nav.js");
    }

    let assets_dir = src_dir.join("assets");
    if !assets_dir.exists() {
        fs::create_dir_all(&assets_dir).context("Failed to create assets directory")?;
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'gesso dev' to start the development server.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Gesso Configuration

# Site title, used in page titles and the nav header
title = "My Site"

# Base URL (for deployment)
base_url = "/"

# Source and output directories
input_dir = "src"
output_dir = "dist"

# Env file exposed to templates as `env`
env_file = ".env"

# Minify generated CSS
minify = true

[markdown]
html = true
breaks = true
linkify = true
heading_attributes = true
"#;

const DEFAULT_ENV: &str = r#"# Variables here are available to templates as {{ env.NAME }}
SITE_AUTHOR=Your Name
"#;

const DEFAULT_INDEX: &str = r#"---
title: Home
order: 1
---

Welcome to your new site.

--excerpt--

## Getting started

Edit `src/index.md` and the dev server reloads the page. Images dropped in
`src/assets/` are picked up automatically:

```md
![A photo](/assets/photo.jpg)
```
"#;

const DEFAULT_ABOUT: &str = r#"---
title: About
order: 2
---

This page lives at `/about/`. Add more markdown files under `src/` and they
show up in the navigation, ordered by the `order` field.
"#;
