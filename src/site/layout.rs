//! Layout renderer: converts content to html and wraps it in the page shell.
//!
//! # Template placeholders
//!
//! | Placeholder     | Value                                         |
//! |-----------------|-----------------------------------------------|
//! | `{title}`       | page title (escaped)                          |
//! | `{description}` | page description (escaped)                    |
//! | `{content}`     | rendered page body                            |
//! | `{stylesheets}` | `<link>` tags for the css bundles             |
//! | `{scripts}`     | `<script>` tags for the js bundles            |
//! | `{site}`        | site name from `[base] title` (escaped)       |
//! | `{language}`    | `[base] language` (escaped)                   |
//!
//! Substitution is a single pass over the template, so text inside the
//! content that looks like a placeholder is left alone. Braces that don't
//! enclose a known name (inline css, js) pass through untouched.

use super::{
    RenderedResponse, SiteError,
    store::{ContentDocument, ContentKind},
};
use crate::assets::AssetManifest;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html::push_html};
use std::{collections::HashSet, fs, path::Path};

/// Page shell used when `[build] layout` is unset.
const BUILTIN_LAYOUT: &str = include_str!("../embed/layout.html");

#[derive(Debug, Clone)]
pub struct Layout {
    template: String,
    site: String,
    language: String,
}

impl Layout {
    pub fn new(template: impl Into<String>, site: &str, language: &str) -> Self {
        Self {
            template: template.into(),
            site: escape_html(site),
            language: escape_html(language),
        }
    }

    /// Layout from a template file, or the built-in one when `path` is `None`.
    pub fn load(path: Option<&Path>, site: &str, language: &str) -> Result<Self, SiteError> {
        let template = match path {
            Some(path) => {
                fs::read_to_string(path).map_err(|err| SiteError::Io(path.to_path_buf(), err))?
            }
            None => BUILTIN_LAYOUT.to_owned(),
        };
        Ok(Self::new(template, site, language))
    }

    pub fn render(
        &self,
        doc: &ContentDocument,
        title: &str,
        description: &str,
        assets: &AssetManifest,
    ) -> RenderedResponse {
        let content = match doc.kind {
            ContentKind::Markdown => render_markdown(&doc.source),
            ContentKind::Html => doc.source.clone(),
        };
        let title = escape_html(title);
        let description = escape_html(description);
        let stylesheets = stylesheet_tags(assets);
        let scripts = script_tags(assets);

        let html = fill(&self.template, |name| match name {
            "title" => Some(title.as_str()),
            "description" => Some(description.as_str()),
            "content" => Some(content.as_str()),
            "stylesheets" => Some(stylesheets.as_str()),
            "scripts" => Some(scripts.as_str()),
            "site" => Some(self.site.as_str()),
            "language" => Some(self.language.as_str()),
            _ => None,
        });

        RenderedResponse::html(html)
    }
}

// ============================================================================
// Markdown
// ============================================================================

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_SMART_PUNCTUATION
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Render markdown to html.
///
/// Quotes and dashes are typographically substituted, and every heading
/// without an explicit `{#id}` gets a slug id so API entries can be linked.
pub fn render_markdown(source: &str) -> String {
    let mut events: Vec<Event<'_>> = Parser::new_ext(source, markdown_options()).collect();
    assign_heading_ids(&mut events);

    let mut html = String::with_capacity(source.len() * 3 / 2);
    push_html(&mut html, events.into_iter());
    html
}

fn assign_heading_ids(events: &mut [Event<'_>]) {
    // Explicit `{#id}`s are taken first so generated slugs route around them
    let mut seen: HashSet<String> = events
        .iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();
    let mut i = 0;

    while i < events.len() {
        if !matches!(events[i], Event::Start(Tag::Heading { id: None, .. })) {
            i += 1;
            continue;
        }

        let mut text = String::new();
        let mut end = i + 1;
        while end < events.len() && !matches!(events[end], Event::End(TagEnd::Heading(_))) {
            if let Event::Text(t) | Event::Code(t) = &events[end] {
                text.push_str(t);
            }
            end += 1;
        }

        let slug = slugify(&text);
        if !slug.is_empty() {
            let id = unique_id(&slug, &seen);
            seen.insert(id.clone());

            if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[i] {
                *slot = Some(CowStr::from(id));
            }
        }
        i = end;
    }
}

/// `slug`, or `slug-1`, `slug-2`, ... whichever is free first.
fn unique_id(slug: &str, seen: &HashSet<String>) -> String {
    if !seen.contains(slug) {
        return slug.to_owned();
    }
    (1..)
        .map(|n| format!("{slug}-{n}"))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or_else(|| slug.to_owned())
}

/// Lowercase, collapse non-alphanumeric runs into `-`, trim hyphens.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev_hyphen = true;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

// ============================================================================
// Template
// ============================================================================

/// Replace `{name}` tokens for which `lookup` returns a value.
///
/// Only the name characters right after each `{` are inspected, so a
/// template full of css braces is still a single linear pass.
fn fill<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let name_len = after.bytes().take_while(|&b| is_placeholder_byte(b)).count();
        let value = (name_len > 0 && after[name_len..].starts_with('}'))
            .then(|| lookup(&after[..name_len]))
            .flatten();

        match value {
            Some(value) => {
                out.push_str(value);
                rest = &after[name_len + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

const fn is_placeholder_byte(b: u8) -> bool {
    b.is_ascii_lowercase() || b == b'_'
}

fn stylesheet_tags(assets: &AssetManifest) -> String {
    assets
        .stylesheets
        .iter()
        .map(|href| format!(r#"<link rel="stylesheet" href="{}">"#, escape_html(href)))
        .collect::<Vec<_>>()
        .join("\n    ")
}

fn script_tags(assets: &AssetManifest) -> String {
    assets
        .scripts
        .iter()
        .map(|src| format!(r#"<script src="{}"></script>"#, escape_html(src)))
        .collect::<Vec<_>>()
        .join("\n    ")
}

/// Escape text for html content and double-quoted attributes.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn markdown(source: &str) -> ContentDocument {
        ContentDocument {
            key: "api".into(),
            kind: ContentKind::Markdown,
            source: source.into(),
        }
    }

    fn manifest() -> AssetManifest {
        AssetManifest {
            stylesheets: vec!["/stylesheets/application-1a2b3c4d.css".into()],
            scripts: vec!["/javascripts/application-5e6f7a8b.js".into()],
        }
    }

    #[test]
    fn test_render_builtin_layout() {
        let layout = Layout::load(None, "Letters", "en").unwrap();
        let res = layout.render(
            &markdown("# The API\n\nUse `o.p`."),
            "The API",
            "Debug from A to Z",
            &manifest(),
        );
        let body = &*res.body;

        assert_eq!(res.status, 200);
        assert!(body.contains("<title>The API</title>"));
        assert!(body.contains(r#"<meta name="description" content="Debug from A to Z">"#));
        assert!(body.contains(r#"<h1 id="the-api">The API</h1>"#));
        assert!(body.contains("<code>o.p</code>"));
        assert!(body.contains(r#"href="/stylesheets/application-1a2b3c4d.css""#));
        assert!(body.contains(r#"src="/javascripts/application-5e6f7a8b.js""#));
        assert!(body.contains(r#"<html lang="en">"#));
        assert!(!body.contains("{title}"));
        assert!(!body.contains("{content}"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let layout = Layout::load(None, "Letters", "en").unwrap();
        let doc = markdown("## a (assert)\n\n> \"quoted\" -- text\n\n```ruby\no.a { |x| x }\n```");

        let first = layout.render(&doc, "The API", "desc", &manifest());
        let second = layout.render(&doc, "The API", "desc", &manifest());
        assert_eq!(first.body, second.body);
    }

    #[test]
    fn test_html_content_passes_through() {
        let layout = Layout::new("<main>{content}</main>", "Letters", "en");
        let doc = ContentDocument {
            key: "ideas".into(),
            kind: ContentKind::Html,
            source: "<form action=\"/ideas\"># not a heading</form>".into(),
        };
        let res = layout.render(&doc, "Ideas", "", &AssetManifest::default());

        assert_eq!(
            &*res.body,
            "<main><form action=\"/ideas\"># not a heading</form></main>"
        );
    }

    #[test]
    fn test_title_and_description_are_escaped() {
        let layout = Layout::new("<title>{title}</title>|{description}", "Letters", "en");
        let res = layout.render(
            &markdown(""),
            "<A & Z>",
            r#"starting with "A""#,
            &AssetManifest::default(),
        );

        assert_eq!(
            &*res.body,
            "<title>&lt;A &amp; Z&gt;</title>|starting with &quot;A&quot;"
        );
    }

    #[test]
    fn test_content_placeholders_not_expanded() {
        let layout = Layout::new("<title>{title}</title>{content}", "Letters", "en");
        let doc = ContentDocument {
            key: "ideas".into(),
            kind: ContentKind::Html,
            source: "{title}".into(),
        };
        let res = layout.render(&doc, "Ideas", "", &AssetManifest::default());

        assert_eq!(&*res.body, "<title>Ideas</title>{title}");
    }

    #[test]
    fn test_fill_leaves_unknown_braces() {
        let out = fill("body { color: red } {unknown} {title} {", |name| {
            (name == "title").then_some("T")
        });
        assert_eq!(out, "body { color: red } {unknown} T {");
    }

    #[test]
    fn test_fill_brace_heavy_template() {
        let css = "a{}".repeat(20_000);
        let template = format!("<style>{css}</style>{{title}}{{ title}}{{title");
        let out = fill(&template, |name| (name == "title").then_some("T"));
        assert_eq!(out, format!("<style>{css}</style>T{{ title}}{{title"));
    }

    #[test]
    fn test_smart_punctuation() {
        let html = render_markdown("\"Letters\" -- it's tiny");
        assert!(html.contains("“Letters”"));
        assert!(html.contains("–"));
        assert!(html.contains("it’s"));
    }

    #[test]
    fn test_heading_ids() {
        let html = render_markdown("### a (assert)\n\n### a (assert)\n\n### `b` (beep) {#beep}");
        assert!(html.contains(r#"<h3 id="a-assert">"#));
        assert!(html.contains(r#"<h3 id="a-assert-1">"#));
        assert!(html.contains(r#"<h3 id="beep">"#));
    }

    #[test]
    fn test_heading_ids_are_unique() {
        let html = render_markdown(
            "### b (beep) {#a-assert}\n\n### a (assert)\n\n### a assert 1\n\n### a (assert)",
        );
        assert_eq!(html.matches(r#"id="a-assert""#).count(), 1);
        assert_eq!(html.matches(r#"id="a-assert-1""#).count(), 1);
        assert!(html.contains(r#"<h3 id="a-assert-1">a (assert)</h3>"#));
        assert!(html.contains(r#"<h3 id="a-assert-1-1">a assert 1</h3>"#));
        assert!(html.contains(r#"<h3 id="a-assert-2">a (assert)</h3>"#));
    }

    #[test]
    fn test_code_fence_language() {
        let html = render_markdown("```ruby\nputs 1\n```");
        assert!(html.contains(r#"<code class="language-ruby">"#));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("The API"), "the-api");
        assert_eq!(slugify("  z (zen) "), "z-zen");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_load_missing_template() {
        let err = Layout::load(Some(Path::new("/no/such/layout.html")), "Letters", "en")
            .unwrap_err();
        assert!(matches!(err, SiteError::Io(..)));
    }
}
