//! Markdown-to-HTML rendering.
//!
//! The renderer walks pulldown-cmark's event stream and rewrites it according
//! to [`MarkdownOptions`]: soft breaks become hard breaks, bare URLs become
//! links, raw HTML is passed through or escaped. Fenced code blocks are
//! replaced by highlighted HTML when a [`Highlighter`] is attached, and image
//! tokens are replaced by the output of an [`ImageRenderer`] when one is
//! installed.

use std::sync::OnceLock;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::highlight::{HighlightError, Highlighter};

/// Rendering options for the markdown converter.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownOptions {
    /// Pass raw HTML through unchanged (escaped when false)
    pub html: bool,

    /// Convert soft line breaks to `<br>`
    pub breaks: bool,

    /// Auto-link bare `http(s)://` URLs in text
    pub linkify: bool,

    /// Allow inline `{#id .class}` attributes on headings
    pub heading_attributes: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            html: true,
            breaks: true,
            linkify: true,
            heading_attributes: true,
        }
    }
}

/// Hook for overriding how image tokens are rendered.
///
/// Implementations receive the raw source path, collected alt text, and
/// optional title, and return a replacement HTML fragment.
pub trait ImageRenderer: Sync {
    fn render(&self, src: &str, alt: &str, title: Option<&str>) -> Result<String, RenderError>;
}

/// Errors that can occur while rendering markdown.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Highlight error: {0}")]
    Highlight(#[from] HighlightError),

    #[error("Image rendering failed for {src}: {message}")]
    Image { src: String, message: String },
}

/// Markdown renderer.
pub struct Renderer<'a> {
    options: MarkdownOptions,
    highlighter: Option<&'a Highlighter>,
    images: Option<&'a dyn ImageRenderer>,
}

impl<'a> Renderer<'a> {
    /// Create a renderer with the given options and no plugins attached.
    pub fn new(options: MarkdownOptions) -> Self {
        Self {
            options,
            highlighter: None,
            images: None,
        }
    }

    /// Attach a code block highlighter.
    pub fn with_highlighter(mut self, highlighter: &'a Highlighter) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    /// Attach an image rendering override.
    pub fn with_image_renderer(mut self, images: &'a dyn ImageRenderer) -> Self {
        self.images = Some(images);
        self
    }

    /// Render markdown content to an HTML fragment.
    pub fn render(&self, content: &str) -> Result<String, RenderError> {
        let mut opts = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;
        if self.options.heading_attributes {
            opts |= Options::ENABLE_HEADING_ATTRIBUTES;
        }

        let mut events: Vec<Event> = Vec::new();

        // Buffers for runs of events that get replaced wholesale
        let mut code: Option<(String, String)> = None; // (info, source)
        let mut image: Option<(String, String, String)> = None; // (dest, title, alt)

        let mut in_plain_code = false;
        let mut link_depth = 0usize;

        for event in Parser::new_ext(content, opts) {
            // Inside an intercepted image: collect alt text until the close tag
            if image.is_some() {
                match event {
                    Event::End(TagEnd::Image) => {
                        if let (Some(hook), Some((dest, title, alt))) = (self.images, image.take())
                        {
                            let title = (!title.is_empty()).then_some(title.as_str());
                            let fragment = hook.render(&dest, &alt, title)?;
                            events.push(Event::Html(CowStr::from(fragment)));
                        }
                    }
                    Event::Text(t) | Event::Code(t) => {
                        if let Some((_, _, alt)) = image.as_mut() {
                            alt.push_str(&t);
                        }
                    }
                    Event::SoftBreak | Event::HardBreak => {
                        if let Some((_, _, alt)) = image.as_mut() {
                            alt.push(' ');
                        }
                    }
                    _ => {}
                }
                continue;
            }

            // Inside an intercepted code block: collect source until the close tag
            if code.is_some() {
                match event {
                    Event::Text(t) => {
                        if let Some((_, buf)) = code.as_mut() {
                            buf.push_str(&t);
                        }
                    }
                    Event::End(TagEnd::CodeBlock) => {
                        if let (Some(hl), Some((info, source))) = (self.highlighter, code.take()) {
                            let fragment = hl.highlight(&source, &info)?;
                            events.push(Event::Html(CowStr::from(fragment)));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    if self.highlighter.is_some() {
                        let info = match &kind {
                            CodeBlockKind::Fenced(info) => info.to_string(),
                            CodeBlockKind::Indented => String::new(),
                        };
                        code = Some((info, String::new()));
                    } else {
                        in_plain_code = true;
                        events.push(Event::Start(Tag::CodeBlock(kind)));
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_plain_code = false;
                    events.push(Event::End(TagEnd::CodeBlock));
                }

                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => {
                    if self.images.is_some() {
                        image = Some((dest_url.to_string(), title.to_string(), String::new()));
                    } else {
                        events.push(Event::Start(Tag::Image {
                            link_type,
                            dest_url,
                            title,
                            id,
                        }));
                    }
                }

                Event::Start(tag @ Tag::Link { .. }) => {
                    link_depth += 1;
                    events.push(Event::Start(tag));
                }
                Event::End(TagEnd::Link) => {
                    link_depth = link_depth.saturating_sub(1);
                    events.push(Event::End(TagEnd::Link));
                }

                Event::SoftBreak if self.options.breaks => events.push(Event::HardBreak),

                Event::Html(raw) if !self.options.html => events.push(Event::Text(raw)),
                Event::InlineHtml(raw) if !self.options.html => events.push(Event::Text(raw)),

                Event::Text(text)
                    if self.options.linkify && !in_plain_code && link_depth == 0 =>
                {
                    push_linkified(&mut events, &text);
                }

                other => events.push(other),
            }
        }

        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        Ok(out)
    }
}

/// Punctuation that ends a sentence rather than a URL.
const TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

fn url_regex() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| Regex::new(r"https?://[^\s<>]+").expect("valid URL regex"))
}

/// Split a text run around bare URLs, emitting autolink events for each.
fn push_linkified<'e>(events: &mut Vec<Event<'e>>, text: &str) {
    let mut last = 0;

    for m in url_regex().find_iter(text) {
        let url = m.as_str().trim_end_matches(TRAILING);
        if url.is_empty() {
            continue;
        }

        if m.start() > last {
            events.push(Event::Text(text[last..m.start()].to_string().into()));
        }

        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: url.to_string().into(),
            title: "".into(),
            id: "".into(),
        }));
        events.push(Event::Text(url.to_string().into()));
        events.push(Event::End(TagEnd::Link));

        last = m.start() + url.len();
    }

    if last < text.len() {
        events.push(Event::Text(text[last..].to_string().into()));
    }
}
