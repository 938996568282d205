//! HTML post-processing of rendered page bodies.
//!
//! Steps run in a fixed order over the body of every freshly built page:
//!
//! 1. **Absolute links**: `href`/`src` values starting with `:` are made
//!    relative to the page (`:static/a.css` → `../static/a.css`).
//! 2. **Pelican links**: `{filename}post.md` → `post.html`, with a
//!    deprecation warning.
//! 3. **Interlinks**: `name>rest` → `<interlink url>rest`; `this>` points at
//!    the site root. Unknown names are left alone and reported.
//! 4. **TOC extraction**: the first `<div class="toc">` moves from the body
//!    into [`Page::toc`].
//! 5. **Heading downgrade** (optional): h1..h5 become h2..h6.
//! 6. **Title as heading** (optional): prepend an `<h1>` with the page title
//!    when the body has none.

use crate::config::Context;
use crate::pages::Page;
use maud::html;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static LINK_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(href|src)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});
static PELICAN_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{filename\}(\.?)(.+)\.md(.*)").unwrap());
static TOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<div class="toc">.*?</div>"#).unwrap());
static HEADING_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(/?)h([1-5])\b").unwrap());
static H1_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<h1\b").unwrap());

type Step = fn(&Context, &mut Page);

/// Ordered chain of body rewrites.
pub struct PostProcessor {
    steps: Vec<Step>,
}

impl PostProcessor {
    pub fn new() -> Self {
        Self {
            steps: vec![
                replace_absolute_links,
                replace_pelican_links,
                replace_interlinks,
                extract_toc,
                downgrade_headings,
                title_as_heading,
            ],
        }
    }

    pub fn process_page(&self, ctx: &Context, page: &mut Page) {
        for step in &self.steps {
            step(ctx, page);
        }
    }
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrite `href`/`src` attribute values. `rewrite` receives the lowercased
/// attribute name and its raw value; `None` keeps the attribute as is.
fn rewrite_links(body: &str, mut rewrite: impl FnMut(&str, &str) -> Option<String>) -> String {
    LINK_ATTR_RE
        .replace_all(body, |caps: &Captures| {
            let attr = caps[1].to_lowercase();
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            match rewrite(&attr, value) {
                Some(new) => format!("{}=\"{}\"", &caps[1], new.replace('"', "&quot;")),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Markdown output percent-encodes characters such as `{`, `}` and `>`.
fn decoded(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

fn replace_absolute_links(_ctx: &Context, page: &mut Page) {
    let webroot = page.webroot.clone();
    page.body = rewrite_links(&page.body, |_, value| {
        let rest = value.strip_prefix(':').filter(|rest| !rest.is_empty())?;
        Some(format!("{}/{}", webroot, rest.trim_start_matches('/')))
    });
}

fn replace_pelican_links(_ctx: &Context, page: &mut Page) {
    let webroot = page.webroot.clone();
    let mut warnings = Vec::new();
    page.body = rewrite_links(&page.body, |attr, value| {
        if attr != "href" {
            return None;
        }
        let url = decoded(value);
        let caps = PELICAN_LINK_RE.captures(&url)?;
        warnings.push(format!("Pelican links are deprecated: \"{url}\"."));
        let (dot, filename, rest) = (&caps[1], &caps[2], &caps[3]);
        Some(if dot.is_empty() {
            format!("{webroot}/{filename}.html{rest}")
        } else {
            format!("{dot}{filename}.html{rest}")
        })
    });
    page.warnings.extend(warnings);
}

fn replace_interlinks(ctx: &Context, page: &mut Page) {
    let this = format!("{}/", page.webroot);
    let mut warnings = Vec::new();
    page.body = rewrite_links(&page.body, |_, value| {
        let url = decoded(value);
        let (name, rest) = url.split_once('>').filter(|(name, _)| !name.is_empty())?;
        let target = if name == "this" {
            Some(this.as_str())
        } else {
            ctx.interlinks.get(name).map(String::as_str)
        };
        match target {
            Some(base) => Some(format!("{base}{rest}")),
            None => {
                warnings.push(format!("Unknown interlink \"{name}\" in \"{url}\"."));
                None
            }
        }
    });
    page.warnings.extend(warnings);
}

fn extract_toc(_ctx: &Context, page: &mut Page) {
    let Some(found) = TOC_RE.find(&page.body) else {
        page.toc = None;
        return;
    };
    let range = found.range();
    page.toc = Some(found.as_str().to_string());
    page.body.replace_range(range, "");
}

fn downgrade_headings(ctx: &Context, page: &mut Page) {
    if !ctx.downgrade_headings {
        return;
    }
    page.body = HEADING_TAG_RE
        .replace_all(&page.body, |caps: &Captures| {
            let level: u8 = caps[2].parse().unwrap_or(5);
            format!("<{}h{}", &caps[1], level + 1)
        })
        .into_owned();
}

fn title_as_heading(ctx: &Context, page: &mut Page) {
    if !ctx.title_as_heading || H1_RE.is_match(&page.body) {
        return;
    }
    let heading = html! { h1 { (page.title()) } };
    page.body = format!("{}\n{}", heading.into_string(), page.body);
}
