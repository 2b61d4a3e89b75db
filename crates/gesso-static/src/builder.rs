//! Static site builder.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use walkdir::WalkDir;

use gesso_images::{ImagePipeline, RasterBackend};
use gesso_md::{extract_excerpt, extract_frontmatter, Frontmatter, Renderer};

use crate::assets::AssetPipeline;
use crate::config::SiteConfig;
use crate::env::{load_env, EnvError};
use crate::templates::{Context, NavItem, PageSummary, TemplateEngine};

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages generated
    pub pages: usize,

    /// Number of passthrough assets copied
    pub assets: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read source: {0}")]
    Read(String),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Failed to render {path}: {message}")]
    Render { path: String, message: String },

    #[error("Failed to render template: {0}")]
    Template(String),

    #[error("Failed to write output: {0}")]
    Write(String),

    #[error(transparent)]
    Env(#[from] EnvError),
}

/// A page to be built.
#[derive(Debug)]
struct PageInfo {
    /// Source file path
    source_path: PathBuf,

    /// Relative path from the input directory
    relative_path: PathBuf,

    /// Output path
    output_path: PathBuf,

    /// Parsed front matter, if the file had any
    frontmatter: Option<Frontmatter>,

    /// Excerpt split off the body, if the page declared one
    excerpt: Option<String>,

    /// Markdown body with the excerpt marker removed
    body: String,
}

impl PageInfo {
    fn title(&self) -> String {
        self.frontmatter
            .as_ref()
            .map(|f| f.title.clone())
            .unwrap_or_else(|| {
                self.relative_path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("Untitled")
                    .to_string()
            })
    }
}

/// Static site builder.
pub struct StaticBuilder {
    config: SiteConfig,
    templates: TemplateEngine,
    highlighter: gesso_md::Highlighter,
    images: ImagePipeline,
}

impl StaticBuilder {
    /// Create a new static builder.
    ///
    /// Loads the env file eagerly so a malformed file fails the build up
    /// front; a missing file just leaves templates with an empty `env`.
    pub fn new(config: SiteConfig) -> Result<Self, BuildError> {
        let env_vars = match load_env(&config.env_file)? {
            Some(vars) => vars,
            None => {
                tracing::warn!(
                    "Env file not found: {}; templates see an empty env",
                    config.env_file.display()
                );
                Default::default()
            }
        };

        let images = ImagePipeline::new(
            Box::new(RasterBackend::new()),
            config.input_dir.clone(),
            config.output_dir.clone(),
        );

        Ok(Self {
            templates: TemplateEngine::new(env_vars),
            highlighter: gesso_md::Highlighter::new(),
            images,
            config,
        })
    }

    /// Build the static site.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BuildError::Write(e.to_string()))?;

        let pages = self.discover_pages()?;
        let nav = self.build_navigation(&pages);
        let summaries = self.page_summaries(&pages)?;

        let results: Vec<Result<(), BuildError>> = pages
            .par_iter()
            .map(|page| self.build_page(page, &nav, &summaries))
            .collect();
        for result in results {
            result?;
        }

        let assets = self.copy_passthrough()?;

        let duration = start.elapsed();
        tracing::info!(
            pages = pages.len(),
            assets,
            ms = duration.as_millis() as u64,
            "site built"
        );

        Ok(BuildResult {
            pages: pages.len(),
            assets,
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Discover all markdown pages in the input directory.
    ///
    /// The script directory is passthrough territory and never contains
    /// pages.
    fn discover_pages(&self) -> Result<Vec<PageInfo>, BuildError> {
        let input_dir = &self.config.input_dir;
        if !input_dir.exists() {
            return Err(BuildError::Read(format!(
                "Input directory not found: {}",
                input_dir.display()
            )));
        }

        let script_dir = input_dir.join("js");
        let mut pages = Vec::new();

        for entry in WalkDir::new(input_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if !path.is_file() || path.starts_with(&script_dir) {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }

            let content = fs::read_to_string(path)
                .map_err(|e| BuildError::Read(format!("{}: {}", path.display(), e)))?;

            let (frontmatter, rest) =
                extract_frontmatter(&content).map_err(|e| BuildError::Parse {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            let (excerpt, body) = extract_excerpt(rest);

            let relative_path = path.strip_prefix(input_dir).unwrap_or(path).to_path_buf();
            let output_path = self.calculate_output_path(&relative_path, &frontmatter);

            pages.push(PageInfo {
                source_path: path.to_path_buf(),
                relative_path,
                output_path,
                frontmatter,
                excerpt,
                body,
            });
        }

        // Sort by front matter order, unordered pages last, ties by title
        pages.sort_by_key(|p| {
            let order = p
                .frontmatter
                .as_ref()
                .and_then(|f| f.order)
                .unwrap_or(999);
            (order, p.title())
        });

        Ok(pages)
    }

    /// Calculate output path for a page.
    fn calculate_output_path(
        &self,
        relative: &Path,
        frontmatter: &Option<Frontmatter>,
    ) -> PathBuf {
        if let Some(fm) = frontmatter {
            if let Some(slug) = &fm.slug {
                return self.config.output_dir.join(slug).join("index.html");
            }
        }

        let stem = relative
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("index");
        let parent = relative.parent().unwrap_or(Path::new(""));

        if stem == "index" {
            // src/index.md -> dist/index.html
            self.config.output_dir.join(parent).join("index.html")
        } else {
            // src/about.md -> dist/about/index.html
            self.config
                .output_dir
                .join(parent)
                .join(stem)
                .join("index.html")
        }
    }

    /// Build the navigation list from pages.
    fn build_navigation(&self, pages: &[PageInfo]) -> Vec<NavItem> {
        pages
            .iter()
            .filter(|p| p.frontmatter.as_ref().map(|f| f.nav).unwrap_or(true))
            .map(|p| NavItem {
                title: p.title(),
                path: self.path_to_url(&p.output_path),
                active: false,
            })
            .collect()
    }

    /// Convert an output path to a site URL.
    fn path_to_url(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.config.output_dir).unwrap_or(path);

        let url = relative
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        if url.is_empty() {
            self.config.base_url.clone()
        } else {
            format!("{}{}/", self.config.base_url, url)
        }
    }

    /// Summaries of listable pages for the index: navigation-visible pages
    /// other than the index itself, with their excerpts rendered.
    fn page_summaries(&self, pages: &[PageInfo]) -> Result<Vec<PageSummary>, BuildError> {
        let renderer = Renderer::new(self.config.markdown_options())
            .with_highlighter(&self.highlighter)
            .with_image_renderer(&self.images);

        pages
            .iter()
            .filter(|p| p.relative_path != Path::new("index.md"))
            .filter(|p| p.frontmatter.as_ref().map(|f| f.nav).unwrap_or(true))
            .map(|p| {
                let excerpt = p
                    .excerpt
                    .as_deref()
                    .map(|e| renderer.render(e))
                    .transpose()
                    .map_err(|e| BuildError::Render {
                        path: p.source_path.display().to_string(),
                        message: e.to_string(),
                    })?;

                Ok(PageSummary {
                    title: p.title(),
                    path: self.path_to_url(&p.output_path),
                    excerpt,
                })
            })
            .collect()
    }

    /// Build a single page.
    fn build_page(
        &self,
        page: &PageInfo,
        nav: &[NavItem],
        summaries: &[PageSummary],
    ) -> Result<(), BuildError> {
        let renderer = Renderer::new(self.config.markdown_options())
            .with_highlighter(&self.highlighter)
            .with_image_renderer(&self.images);

        let render_error = |e: gesso_md::RenderError| BuildError::Render {
            path: page.source_path.display().to_string(),
            message: e.to_string(),
        };

        let content = renderer.render(&page.body).map_err(render_error)?;
        let excerpt = page
            .excerpt
            .as_deref()
            .map(|e| renderer.render(e))
            .transpose()
            .map_err(render_error)?;

        let page_url = self.path_to_url(&page.output_path);
        let nav = nav
            .iter()
            .map(|item| NavItem {
                active: item.path == page_url,
                ..item.clone()
            })
            .collect();

        // The root index gets the listing template; everything else is a page
        let is_index = page.relative_path == Path::new("index.md");
        let template = if is_index { "index.html" } else { "page.html" };

        let context = Context {
            title: page.title(),
            site_title: self.config.title.clone(),
            description: page
                .frontmatter
                .as_ref()
                .and_then(|f| f.description.clone()),
            date: page.frontmatter.as_ref().and_then(|f| f.date.clone()),
            content,
            excerpt,
            nav,
            pages: if is_index {
                summaries.to_vec()
            } else {
                Vec::new()
            },
            base_url: self.config.base_url.clone(),
        };

        let html = self
            .templates
            .render_page(template, &context)
            .map_err(|e| BuildError::Template(e.to_string()))?;

        if let Some(parent) = page.output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::Write(e.to_string()))?;
        }
        fs::write(&page.output_path, html).map_err(|e| BuildError::Write(e.to_string()))?;

        Ok(())
    }

    /// Copy passthrough assets: top-level stylesheets and the script
    /// directory, byte-for-byte. Falls back to the scaffold defaults when the
    /// source has neither.
    fn copy_passthrough(&self) -> Result<usize, BuildError> {
        let mut copied = 0;
        let mut copied_css = false;

        // Top-level *.css
        let entries = fs::read_dir(&self.config.input_dir)
            .map_err(|e| BuildError::Read(e.to_string()))?;
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("css") {
                continue;
            }
            let Some(name) = path.file_name() else {
                continue;
            };
            fs::copy(&path, self.config.output_dir.join(name))
                .map_err(|e| BuildError::Write(e.to_string()))?;
            copied += 1;
            copied_css = true;
        }

        // Script directory, recursively
        let script_dir = self.config.input_dir.join("js");
        let mut copied_js = false;
        if script_dir.exists() {
            for entry in WalkDir::new(&script_dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
            {
                let relative = entry
                    .path()
                    .strip_prefix(&self.config.input_dir)
                    .unwrap_or(entry.path());
                let dest = self.config.output_dir.join(relative);
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent).map_err(|e| BuildError::Write(e.to_string()))?;
                }
                fs::copy(entry.path(), &dest)
                    .map_err(|e| BuildError::Write(e.to_string()))?;
                copied += 1;
                copied_js = true;
            }
        }

        if !copied_css || !copied_js {
            copied += self.write_fallback_assets(!copied_css, !copied_js)?;
        }

        Ok(copied)
    }

    /// Write the scaffold defaults for whatever the source tree is missing,
    /// so the emitted templates never reference dead URLs.
    fn write_fallback_assets(&self, css: bool, js: bool) -> Result<usize, BuildError> {
        let mut written = 0;

        if css {
            let css_content = AssetPipeline::default_css();
            let css_content = if self.config.minify {
                AssetPipeline::minify_css(&css_content).unwrap_or(css_content)
            } else {
                css_content
            };
            fs::write(self.config.output_dir.join("style.css"), css_content)
                .map_err(|e| BuildError::Write(e.to_string()))?;
            written += 1;
        }

        if js {
            let js_dir = self.config.output_dir.join("js");
            fs::create_dir_all(&js_dir).map_err(|e| BuildError::Write(e.to_string()))?;
            fs::write(js_dir.join("nav.js"), AssetPipeline::nav_js())
                .map_err(|e| BuildError::Write(e.to_string()))?;
            written += 1;
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn site(temp: &Path) -> SiteConfig {
        SiteConfig {
            input_dir: temp.join("src"),
            output_dir: temp.join("dist"),
            env_file: temp.join(".env"),
            ..Default::default()
        }
    }

    fn write_page(dir: &Path, name: &str, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    #[tokio::test]
    async fn builds_simple_site() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write_page(
            &config.input_dir,
            "index.md",
            "---\ntitle: Home\n---\n\n# Welcome\n",
        );

        let builder = StaticBuilder::new(config.clone()).unwrap();
        let result = builder.build().await.unwrap();

        assert_eq!(result.pages, 1);
        let html = fs::read_to_string(config.output_dir.join("index.html")).unwrap();
        assert!(html.contains("Welcome"));
        assert!(html.contains(r#"class="nav__toggle""#));
    }

    #[tokio::test]
    async fn named_pages_get_directory_urls() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write_page(&config.input_dir, "about.md", "---\ntitle: About\n---\nhi");

        StaticBuilder::new(config.clone())
            .unwrap()
            .build()
            .await
            .unwrap();

        assert!(config.output_dir.join("about/index.html").exists());
    }

    #[tokio::test]
    async fn nested_pages_keep_their_directory() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write_page(
            &config.input_dir.join("notes"),
            "first.md",
            "---\ntitle: First\n---\nhi",
        );

        StaticBuilder::new(config.clone())
            .unwrap()
            .build()
            .await
            .unwrap();

        assert!(config.output_dir.join("notes/first/index.html").exists());
    }

    #[tokio::test]
    async fn slug_overrides_output_path() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write_page(
            &config.input_dir,
            "post-1.md",
            "---\ntitle: Post\nslug: hello-world\n---\nhi",
        );

        StaticBuilder::new(config.clone())
            .unwrap()
            .build()
            .await
            .unwrap();

        assert!(config.output_dir.join("hello-world/index.html").exists());
    }

    #[tokio::test]
    async fn navigation_follows_front_matter_order() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write_page(
            &config.input_dir,
            "zebra.md",
            "---\ntitle: Zebra\norder: 1\n---\nhi",
        );
        write_page(
            &config.input_dir,
            "apple.md",
            "---\ntitle: Apple\norder: 2\n---\nhi",
        );

        StaticBuilder::new(config.clone())
            .unwrap()
            .build()
            .await
            .unwrap();

        let html = fs::read_to_string(config.output_dir.join("zebra/index.html")).unwrap();
        let zebra = html.find(">Zebra<").unwrap();
        let apple = html.find(">Apple<").unwrap();
        assert!(zebra < apple);
    }

    #[tokio::test]
    async fn hidden_pages_stay_out_of_navigation() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write_page(
            &config.input_dir,
            "index.md",
            "---\ntitle: Home\n---\nhi",
        );
        write_page(
            &config.input_dir,
            "secret.md",
            "---\ntitle: Secret\nnav: false\n---\nhi",
        );

        StaticBuilder::new(config.clone())
            .unwrap()
            .build()
            .await
            .unwrap();

        let html = fs::read_to_string(config.output_dir.join("index.html")).unwrap();
        assert!(!html.contains(">Secret<"));
        // the page itself still builds
        assert!(config.output_dir.join("secret/index.html").exists());
    }

    #[tokio::test]
    async fn index_lists_other_pages_with_excerpts() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write_page(
            &config.input_dir,
            "index.md",
            "---\ntitle: Home\norder: 1\n---\nWelcome.",
        );
        write_page(
            &config.input_dir,
            "post.md",
            "---\ntitle: Post\norder: 2\n---\n\nLead paragraph.\n\n--excerpt--\n\nThe rest.\n",
        );

        StaticBuilder::new(config.clone())
            .unwrap()
            .build()
            .await
            .unwrap();

        let index = fs::read_to_string(config.output_dir.join("index.html")).unwrap();
        assert!(index.contains(r#"<a href="/post/">Post</a>"#));
        assert!(index.contains("Lead paragraph."));
        assert!(!index.contains("The rest."));

        // the listing section only appears on the index
        let post = fs::read_to_string(config.output_dir.join("post/index.html")).unwrap();
        assert!(!post.contains(r#"class="excerpts""#));
    }

    #[tokio::test]
    async fn excerpt_marker_is_stripped_from_output() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write_page(
            &config.input_dir,
            "index.md",
            "---\ntitle: Home\n---\n\nLead paragraph.\n\n--excerpt--\n\nThe rest.\n",
        );

        StaticBuilder::new(config.clone())
            .unwrap()
            .build()
            .await
            .unwrap();

        let html = fs::read_to_string(config.output_dir.join("index.html")).unwrap();
        assert!(html.contains("Lead paragraph."));
        assert!(html.contains("The rest."));
        assert!(!html.contains("--excerpt--"));
    }

    #[tokio::test]
    async fn stylesheets_are_copied_byte_for_byte() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write_page(&config.input_dir, "index.md", "---\ntitle: Home\n---\nhi");
        // deliberately unformatted so any rewrite would show
        let css = "body{color:red}  \n\n/* keep me */\n";
        fs::write(config.input_dir.join("style.css"), css).unwrap();

        StaticBuilder::new(config.clone())
            .unwrap()
            .build()
            .await
            .unwrap();

        let copied = fs::read(config.output_dir.join("style.css")).unwrap();
        assert_eq!(copied, css.as_bytes());
    }

    #[tokio::test]
    async fn script_directory_is_copied_recursively() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write_page(&config.input_dir, "index.md", "---\ntitle: Home\n---\nhi");
        let js_dir = config.input_dir.join("js");
        fs::create_dir_all(js_dir.join("lib")).unwrap();
        fs::write(js_dir.join("nav.js"), "// nav\n").unwrap();
        fs::write(js_dir.join("lib/util.js"), "// util\n").unwrap();

        StaticBuilder::new(config.clone())
            .unwrap()
            .build()
            .await
            .unwrap();

        assert_eq!(
            fs::read(config.output_dir.join("js/nav.js")).unwrap(),
            b"// nav\n"
        );
        assert_eq!(
            fs::read(config.output_dir.join("js/lib/util.js")).unwrap(),
            b"// util\n"
        );
    }

    #[tokio::test]
    async fn fallback_assets_fill_an_empty_source_tree() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write_page(&config.input_dir, "index.md", "---\ntitle: Home\n---\nhi");

        StaticBuilder::new(config.clone())
            .unwrap()
            .build()
            .await
            .unwrap();

        let css = fs::read_to_string(config.output_dir.join("style.css")).unwrap();
        assert!(css.contains(".nav__toggle"));
        let js = fs::read_to_string(config.output_dir.join("js/nav.js")).unwrap();
        assert!(js.contains("aria-expanded"));
    }

    #[tokio::test]
    async fn missing_env_file_still_builds() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write_page(&config.input_dir, "index.md", "---\ntitle: Home\n---\nhi");

        // no .env written
        let result = StaticBuilder::new(config).unwrap().build().await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn malformed_env_file_fails_up_front() {
        let temp = tempdir().unwrap();
        let config = site(temp.path());
        write_page(&config.input_dir, "index.md", "---\ntitle: Home\n---\nhi");
        fs::write(&config.env_file, "NOT A VALID LINE\n").unwrap();

        assert!(StaticBuilder::new(config).is_err());
    }
}
