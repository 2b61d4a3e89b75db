//! Template engine for rendering site pages.

use std::collections::BTreeMap;

use minijinja::value::Value;
use minijinja::{context, Environment};

/// A navigation item.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NavItem {
    /// Display title
    pub title: String,
    /// URL path
    pub path: String,
    /// Whether this is the active page
    pub active: bool,
}

/// A page entry on the index listing.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PageSummary {
    /// Display title
    pub title: String,
    /// URL path
    pub path: String,
    /// Rendered excerpt HTML, if the page declared one
    pub excerpt: Option<String>,
}

/// Context for rendering a page template.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Context {
    /// Page title
    pub title: String,
    /// Site title
    pub site_title: String,
    /// Meta description
    pub description: Option<String>,
    /// Publication date, rendered as-is
    pub date: Option<String>,
    /// Rendered content HTML
    pub content: String,
    /// Rendered excerpt HTML, if the page declared one
    pub excerpt: Option<String>,
    /// Navigation items
    pub nav: Vec<NavItem>,
    /// Pages listed on the index, empty elsewhere
    pub pages: Vec<PageSummary>,
    /// Base URL
    pub base_url: String,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with default templates.
    ///
    /// `env_vars` is exposed to every template as the `env` mapping.
    pub fn new(env_vars: BTreeMap<String, String>) -> Self {
        let mut env = Environment::new();

        env.add_template_owned("base.html".to_string(), BASE_TEMPLATE.to_string())
            .expect("Failed to add base template");
        env.add_template_owned("page.html".to_string(), PAGE_TEMPLATE.to_string())
            .expect("Failed to add page template");
        env.add_template_owned("index.html".to_string(), INDEX_TEMPLATE.to_string())
            .expect("Failed to add index template");
        env.add_template_owned("nav.html".to_string(), NAV_TEMPLATE.to_string())
            .expect("Failed to add nav template");

        env.add_filter("limit", limit);
        env.add_global("env", Value::from_serialize(&env_vars));

        Self { env }
    }

    /// Render a page using the specified template.
    pub fn render_page(
        &self,
        template: &str,
        context: &Context,
    ) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template)?;

        tmpl.render(context! {
            title => &context.title,
            site_title => &context.site_title,
            description => &context.description,
            date => &context.date,
            content => &context.content,
            excerpt => &context.excerpt,
            nav => &context.nav,
            pages => &context.pages,
            base_url => &context.base_url,
        })
    }

    /// Render a one-off template string against a context value.
    pub fn render_str(&self, source: &str, ctx: Value) -> Result<String, minijinja::Error> {
        self.env.render_str(source, ctx)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

/// Truncate a sequence to its first `count` items.
fn limit(value: Value, count: usize) -> Result<Value, minijinja::Error> {
    let items: Vec<Value> = value.try_iter()?.take(count).collect();
    Ok(Value::from(items))
}

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title }} - {{ site_title }}</title>
  {% if description %}<meta name="description" content="{{ description }}">
  {% endif %}<link rel="stylesheet" href="{{ base_url }}style.css">
</head>
<body>
  <header class="header">
    <a href="{{ base_url }}" class="nav__logo">{{ site_title }}</a>
    <button class="nav__toggle" aria-expanded="false" aria-label="Toggle menu">
      <i class="ri-menu-line"></i>
    </button>
    {% include "nav.html" %}
  </header>
  <main class="main">
    {% block content %}{% endblock %}
  </main>
  <script src="{{ base_url }}js/nav.js"></script>
</body>
</html>"##;

const PAGE_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="page">
  <h1 class="page__title">{{ title }}</h1>
  {% if date %}<p class="page__date">{{ date }}</p>
  {% endif %}<div class="page__content">
    {{ content | safe }}
  </div>
</article>
{% endblock %}"##;

const INDEX_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="page">
  <h1 class="page__title">{{ title }}</h1>
  <div class="page__content">
    {{ content | safe }}
  </div>
</article>
{% if pages %}<section class="excerpts">
  {% for item in pages | limit(5) %}
  <article class="excerpts__item">
    <h2 class="excerpts__title"><a href="{{ item.path }}">{{ item.title }}</a></h2>
    {% if item.excerpt %}<div class="excerpts__body">{{ item.excerpt | safe }}</div>
    {% endif %}
  </article>
  {% endfor %}
</section>
{% endif %}{% endblock %}"##;

const NAV_TEMPLATE: &str = r##"<nav class="nav__menu">
  <ul class="nav__list">
  {% for item in nav %}
    <li class="nav__item{% if item.active %} nav__item--active{% endif %}">
      <a href="{{ item.path }}">{{ item.title }}</a>
    </li>
  {% endfor %}
  </ul>
</nav>"##;
