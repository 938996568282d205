//! Markdown pages.
//!
//! On top of CommonMark (tables, footnotes, strikethrough, heading
//! attributes) the parser understands:
//!
//! - a leading `Key: value` metadata block, ended by a blank line
//! - thumbnail images, `![Alt](:static/a.jpg|200x)`
//! - gallery blocks:
//!
//! ```text
//! +Gallery 3cols
//! +[Sunrise](:static/photos/sunrise.jpg|300x200)
//! +[Harbor](:static/photos/harbor.jpg|300x200)
//! ```
//!
//! - a `[TOC]` line, replaced by a nested list of the page's headings
//! - div blocks, nestable, closed by `{:}` or `{:name}`:
//!
//! ```text
//! {note: wide #intro}
//! Wrapped in `<div id="intro" class="note wide">`.
//! {:note}
//! ```
//!
//! - admonitions, `!!! warning "Careful"` followed by an indented body
//! - empty styled spans, `{. badge badge-info}`
//! - definition lists

use super::Parsed;
use crate::thumbnail::{Thumbnail, ThumbnailError, parse_size, parse_thumbnail_src};
use maud::{Markup, html};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkdownError {
    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),
    #[error("Unbalanced div block: {0}")]
    UnbalancedDiv(String),
}

static META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ ]{0,3}([A-Za-z0-9_-]+):\s*(.*)$").unwrap());
static META_MORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ ]{4,}(.*)$").unwrap());
static GALLERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+ ][Gg]allery(?:\s+(\d+)cols)?\s*$").unwrap());
static GALLERY_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\[(.+)\]\((.+)\|(.+)\)\s*$").unwrap());
static DIV_BEGIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{(#?[-_a-zA-Z0-9]+):((?:\s*[.#]?[-_a-zA-Z0-9]+)*)\s*\}$").unwrap()
});
static DIV_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{:(#?[-_a-zA-Z0-9]*)\}$").unwrap());
static ADMONITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^!!! ?([\w-]+(?: +[\w-]+)*)(?: +"(.*?)")? *$"#).unwrap());
static SPAN_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\.\s+([-a-zA-Z_ ]+)\}").unwrap());

const TOC_MARKER: &str = "<!-- toc -->";

pub(super) fn parse(text: &str) -> Result<Parsed, MarkdownError> {
    let (metadata, content) = split_metadata(text);
    let mut parsed = Parsed {
        metadata,
        ..Default::default()
    };

    let content = expand_blocks(content, &mut parsed)?;
    let mut events: Vec<Event> =
        TextMergeStream::new(Parser::new_ext(&content, options())).collect();
    let headings = assign_heading_ids(&mut events);
    let events = span_classes(thumbnail_links(events, &mut parsed)?);

    let mut body = String::with_capacity(content.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut body, events.into_iter());
    if body.contains(TOC_MARKER) {
        body = body.replace(TOC_MARKER, &render_toc(&headings).into_string());
    }
    parsed.body = body;
    Ok(parsed)
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_DEFINITION_LIST
}

// ============================================================================
// Metadata
// ============================================================================

/// Split off the metadata block. Keys are lowercased; continuation lines
/// are joined with a space.
fn split_metadata(text: &str) -> (BTreeMap<String, String>, &str) {
    let mut metadata = BTreeMap::new();
    let mut key: Option<String> = None;
    let mut offset = 0;
    let mut first = true;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if first && trimmed.starts_with("---") && trimmed.trim_end() == "---" {
            first = false;
            offset += line.len();
            continue;
        }
        first = false;

        if trimmed.trim().is_empty() || trimmed == "---" || trimmed == "..." {
            offset += line.len();
            break;
        }
        if let Some(caps) = META_RE.captures(trimmed) {
            let k = caps[1].to_lowercase();
            metadata.insert(k.clone(), caps[2].trim().to_string());
            key = Some(k);
        } else if let Some(caps) = META_MORE_RE.captures(trimmed)
            && let Some(k) = &key
            && let Some(value) = metadata.get_mut(k)
        {
            value.push(' ');
            value.push_str(caps[1].trim());
        } else {
            break;
        }
        offset += line.len();
    }

    if metadata.is_empty() {
        (metadata, text)
    } else {
        (metadata, &text[offset..])
    }
}

// ============================================================================
// Block extensions: galleries, divs, admonitions and the TOC marker
// ============================================================================

/// Replace block extensions outside fenced code. Div blocks still open at
/// the end are closed there.
fn expand_blocks(content: &str, parsed: &mut Parsed) -> Result<String, MarkdownError> {
    let lines: Vec<&str> = content.lines().collect();
    let mut out = String::with_capacity(content.len());
    let mut fence: Option<&str> = None;
    let mut divs: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim_start();

        if let Some(marker) = fence {
            if trimmed.starts_with(marker) {
                fence = None;
            }
        } else if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            fence = Some(&trimmed[..3]);
        } else if line.trim() == "[TOC]" {
            out.push('\n');
            out.push_str(TOC_MARKER);
            out.push_str("\n\n");
            i += 1;
            continue;
        } else if let Some(caps) = DIV_BEGIN_RE.captures(line.trim()) {
            out.push('\n');
            out.push_str(&open_div(&caps[1], &caps[2]));
            out.push_str("\n\n");
            divs.push(caps[1].to_string());
            i += 1;
            continue;
        } else if let Some(caps) = DIV_END_RE.captures(line.trim()) {
            let name = &caps[1];
            match divs.pop() {
                Some(open) if name.is_empty() || name == open => {}
                Some(open) => {
                    return Err(MarkdownError::UnbalancedDiv(format!(
                        "{{:{name}}} closes {{{open}:}}"
                    )));
                }
                None => {
                    return Err(MarkdownError::UnbalancedDiv(format!(
                        "{{:{name}}} without an open div"
                    )));
                }
            }
            out.push_str("\n</div>\n\n");
            i += 1;
            continue;
        } else if let Some(caps) = ADMONITION_RE.captures(line) {
            let mut body = String::new();
            let mut end = i + 1;
            while let Some(next) = lines.get(end) {
                if next.trim().is_empty() {
                    body.push('\n');
                } else if let Some(rest) = next.strip_prefix("    ").or(next.strip_prefix('\t')) {
                    body.push_str(rest);
                    body.push('\n');
                } else {
                    break;
                }
                end += 1;
            }
            let class = caps[1].to_lowercase();
            let title = match caps.get(2) {
                Some(title) => title.as_str().to_string(),
                None => capitalize(class.split(' ').next().unwrap_or_default()),
            };
            out.push_str(&format!("\n<div class=\"admonition {class}\">\n"));
            if !title.is_empty() {
                out.push_str(&html! { p.admonition-title { (title) } }.into_string());
                out.push('\n');
            }
            out.push('\n');
            out.push_str(&expand_blocks(&body, parsed)?);
            out.push_str("\n</div>\n\n");
            i = end;
            continue;
        } else if let Some(caps) = GALLERY_RE.captures(line)
            && (i == 0 || lines[i - 1].trim().is_empty())
        {
            let items = lines[i + 1..]
                .iter()
                .take_while(|l| GALLERY_ITEM_RE.is_match(l))
                .count();
            let block_end = i + 1 + items;
            if items > 0 && lines.get(block_end).is_none_or(|l| l.trim().is_empty()) {
                let columns = caps.get(1).and_then(|m| m.as_str().parse().ok());
                let gallery = render_gallery(columns, &lines[i + 1..block_end], parsed)?;
                out.push('\n');
                out.push_str(&gallery.into_string());
                out.push_str("\n\n");
                i = block_end;
                continue;
            }
        }

        out.push_str(line);
        out.push('\n');
        i += 1;
    }
    for _ in divs {
        out.push_str("\n</div>\n");
    }
    Ok(out)
}

/// Opening tag for `{name: props}`. The name is the first class unless it
/// is `div`; `#x` sets the id (last one wins), `.x` and `x` add classes.
fn open_div(name: &str, props: &str) -> String {
    let mut id = None;
    let mut classes = Vec::new();
    let name = (name != "div").then_some(name);
    for prop in name.into_iter().chain(props.split_whitespace()) {
        match prop.strip_prefix('#') {
            Some(value) => id = Some(value),
            None => classes.push(prop.trim_start_matches('.')),
        }
    }
    let mut tag = "<div".to_string();
    if let Some(id) = id {
        tag.push_str(&format!(" id=\"{id}\""));
    }
    if !classes.is_empty() {
        tag.push_str(&format!(" class=\"{}\"", classes.join(" ")));
    }
    tag.push('>');
    tag
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Bootstrap column class for `columns` per row, reduced until it divides 12.
fn column_class(columns: Option<u32>) -> String {
    match columns {
        Some(n) if n > 0 => {
            let mut n = n.min(12);
            while 12 % n != 0 {
                n -= 1;
            }
            format!("col-md-{}", 12 / n)
        }
        _ => "col-md-4".to_string(),
    }
}

fn render_gallery(
    columns: Option<u32>,
    lines: &[&str],
    parsed: &mut Parsed,
) -> Result<Markup, MarkdownError> {
    let col_class = column_class(columns);
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let Some(caps) = GALLERY_ITEM_RE.captures(line) else {
            continue;
        };
        let title = caps[1].to_string();
        let url = &caps[2];
        let original_url = match url.strip_prefix(':') {
            Some(rest) => rest,
            None => {
                parsed.warnings.push(format!(
                    "Gallery image url must start with \":\": \"{url}\"."
                ));
                url
            }
        };
        let (width, height) = parse_size(&caps[3])?;
        let thumbnail = Thumbnail::new(original_url, width, height)?;
        parsed
            .thumbnails
            .insert(thumbnail.filename().to_string(), thumbnail.clone());
        items.push((title, thumbnail));
    }

    Ok(html! {
        div.gallery {
            div.container {
                div.thumbnails.row.text-center.justify-content-center data-toggle="lightbox" {
                    @for (title, thumbnail) in &items {
                        div class=(col_class) {
                            a title=(title) href={ ":" (thumbnail.original_url()) } class="thumbnail" {
                                img src={ ":" (thumbnail.filename()) }
                                    class="img-thumbnail img-fluid"
                                    alt=(title)
                                    width=[thumbnail.width()]
                                    height=[thumbnail.height()];
                            }
                        }
                    }
                }
            }
        }
    })
}

// ============================================================================
// Inline extension: thumbnail images
// ============================================================================

struct PendingThumbnail<'a> {
    thumbnail: Thumbnail,
    title: CowStr<'a>,
    alt: String,
}

/// Replace `![alt](url|WxH)` images with a link to the original wrapping
/// the thumbnail.
fn thumbnail_links<'a>(
    events: Vec<Event<'a>>,
    parsed: &mut Parsed,
) -> Result<Vec<Event<'a>>, MarkdownError> {
    let mut out = Vec::with_capacity(events.len());
    let mut pending: Option<PendingThumbnail> = None;

    for event in events {
        match event {
            Event::Start(Tag::Image {
                ref dest_url,
                ref title,
                ..
            }) if pending.is_none() => match parse_thumbnail_src(dest_url)? {
                Some(thumbnail) => {
                    if !dest_url.starts_with(':') {
                        parsed.warnings.push(format!(
                            "Gallery image url must start with \":\": \"{}\".",
                            dest_url.split('|').next().unwrap_or_default()
                        ));
                    }
                    parsed
                        .thumbnails
                        .insert(thumbnail.filename().to_string(), thumbnail.clone());
                    pending = Some(PendingThumbnail {
                        thumbnail,
                        title: title.clone(),
                        alt: String::new(),
                    });
                }
                None => out.push(event),
            },
            Event::End(TagEnd::Image) if pending.is_some() => {
                if let Some(p) = pending.take() {
                    let title = (!p.title.is_empty()).then(|| p.title.to_string());
                    let markup = html! {
                        a href={ ":" (p.thumbnail.original_url()) } class="no-gallery thumbnail" {
                            img src={ ":" (p.thumbnail.filename()) } alt=(p.alt) title=[title];
                        }
                    };
                    out.push(Event::InlineHtml(markup.into_string().into()));
                }
            }
            Event::Text(ref text) | Event::Code(ref text) if pending.is_some() => {
                if let Some(p) = pending.as_mut() {
                    p.alt.push_str(text);
                }
            }
            _ if pending.is_some() => {}
            other => out.push(other),
        }
    }
    Ok(out)
}

// ============================================================================
// Inline extension: styled spans
// ============================================================================

/// Replace `{. class names}` in running text with an empty
/// `<span class="class names">`. Code and image alt text are left alone.
fn span_classes(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut verbatim = 0usize;

    for event in events {
        match &event {
            Event::Start(Tag::CodeBlock(_) | Tag::Image { .. }) => verbatim += 1,
            Event::End(TagEnd::CodeBlock | TagEnd::Image) => {
                verbatim = verbatim.saturating_sub(1);
            }
            Event::Text(text) if verbatim == 0 && SPAN_CLASS_RE.is_match(text) => {
                let text: &str = text;
                let mut last = 0;
                for caps in SPAN_CLASS_RE.captures_iter(text) {
                    let Some(whole) = caps.get(0) else {
                        continue;
                    };
                    if whole.start() > last {
                        out.push(Event::Text(text[last..whole.start()].to_string().into()));
                    }
                    let span = html! { span class=(caps[1].trim()) {} };
                    out.push(Event::InlineHtml(span.into_string().into()));
                    last = whole.end();
                }
                if last < text.len() {
                    out.push(Event::Text(text[last..].to_string().into()));
                }
                continue;
            }
            _ => {}
        }
        out.push(event);
    }
    out
}

// ============================================================================
// Headings and TOC
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct TocEntry {
    level: u8,
    id: String,
    text: String,
}

/// Give every heading an id (keeping explicit `{#id}` ones) and return
/// them in document order.
fn assign_heading_ids(events: &mut [Event]) -> Vec<TocEntry> {
    let mut used = HashSet::new();
    let mut entries = Vec::new();
    let mut i = 0;

    while i < events.len() {
        let Event::Start(Tag::Heading { level, .. }) = &events[i] else {
            i += 1;
            continue;
        };
        let level = *level as u8;
        let mut text = String::new();
        let mut end = i + 1;
        while end < events.len() && !matches!(events[end], Event::End(TagEnd::Heading(_))) {
            if let Event::Text(t) | Event::Code(t) = &events[end] {
                text.push_str(t);
            }
            end += 1;
        }

        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            let slug = match id {
                Some(explicit) => explicit.to_string(),
                None => unique_slug(&text, &mut used),
            };
            used.insert(slug.clone());
            *id = Some(slug.clone().into());
            entries.push(TocEntry {
                level,
                id: slug,
                text,
            });
        }
        i = end + 1;
    }
    entries
}

/// Lowercase, alphanumerics kept, whitespace and dashes collapsed to `-`.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_alphanumeric() || c == '_' {
            slug.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

fn unique_slug(text: &str, used: &mut HashSet<String>) -> String {
    let base = slugify(text);
    if !used.contains(&base) {
        return base;
    }
    (1..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or(base)
}

struct TocNode<'a> {
    entry: &'a TocEntry,
    children: Vec<TocNode<'a>>,
}

fn insert_node<'a>(nodes: &mut Vec<TocNode<'a>>, entry: &'a TocEntry) {
    if let Some(last) = nodes.last_mut()
        && entry.level > last.entry.level
    {
        insert_node(&mut last.children, entry);
    } else {
        nodes.push(TocNode {
            entry,
            children: Vec::new(),
        });
    }
}

fn render_nodes(nodes: &[TocNode]) -> Markup {
    html! {
        ul {
            @for node in nodes {
                li {
                    a href={ "#" (node.entry.id) } { (node.entry.text) }
                    @if !node.children.is_empty() {
                        (render_nodes(&node.children))
                    }
                }
            }
        }
    }
}

fn render_toc(entries: &[TocEntry]) -> Markup {
    let mut roots = Vec::new();
    for entry in entries {
        insert_node(&mut roots, entry);
    }
    html! {
        div.toc { (render_nodes(&roots)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Metadata
    // =========================================================================

    #[test]
    fn metadata_block_is_split_off() {
        let parsed = parse("Title: Hello\nTemplate: wide\n\n# Heading\n").unwrap();
        assert_eq!(parsed.metadata["title"], "Hello");
        assert_eq!(parsed.metadata["template"], "wide");
        assert!(parsed.body.contains("<h1 id=\"heading\">Heading</h1>"));
        assert!(!parsed.body.contains("Title:"));
    }

    #[test]
    fn metadata_keys_are_lowercased_and_continued() {
        let (meta, rest) = split_metadata("Summary: first\n    second\nDATASETS: a, b\n\nbody\n");
        assert_eq!(meta["summary"], "first second");
        assert_eq!(meta["datasets"], "a, b");
        assert_eq!(rest, "body\n");
    }

    #[test]
    fn yaml_style_delimiters() {
        let (meta, rest) = split_metadata("---\ntitle: Dashed\n---\nbody\n");
        assert_eq!(meta["title"], "Dashed");
        assert_eq!(rest, "body\n");
    }

    #[test]
    fn no_metadata_keeps_whole_text() {
        let (meta, rest) = split_metadata("Just a paragraph.\n");
        assert!(meta.is_empty());
        assert_eq!(rest, "Just a paragraph.\n");
    }

    // =========================================================================
    // Thumbnails and galleries
    // =========================================================================

    #[test]
    fn thumbnail_image_becomes_link() {
        let parsed = parse("![Dawn](:static/dawn.jpg|200x)\n").unwrap();
        assert!(
            parsed.body.contains(
                r#"<a href=":static/dawn.jpg" class="no-gallery thumbnail"><img src=":static/dawn[200x].jpg" alt="Dawn"></a>"#
            ),
            "{}",
            parsed.body
        );
        assert!(parsed.thumbnails.contains_key("static/dawn[200x].jpg"));
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn plain_image_is_untouched() {
        let parsed = parse("![Logo](logo.png)\n").unwrap();
        assert!(parsed.body.contains(r#"<img src="logo.png" alt="Logo" />"#));
        assert!(parsed.thumbnails.is_empty());
    }

    #[test]
    fn thumbnail_without_colon_warns() {
        let parsed = parse("![x](static/a.jpg|x50)\n").unwrap();
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.thumbnails.contains_key("static/a[x50].jpg"));
    }

    #[test]
    fn gallery_block() {
        let text = "Intro\n\n+Gallery 5cols\n+[Sunrise](:static/sun.jpg|300x200)\n+[Harbor](static/harbor.jpg|300x)\n\nAfter\n";
        let parsed = parse(text).unwrap();
        assert!(parsed.body.contains(r#"<div class="gallery">"#));
        assert!(parsed.body.contains(r#"<div class="col-md-3">"#));
        assert!(parsed.body.contains(
            r#"<img src=":static/sun[300x200].jpg" class="img-thumbnail img-fluid" alt="Sunrise" width="300" height="200">"#
        ));
        assert!(parsed.body.contains("<p>After</p>"));
        assert_eq!(parsed.thumbnails.len(), 2);
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn gallery_needs_items() {
        let parsed = parse("+Gallery\n\ntext\n").unwrap();
        assert!(!parsed.body.contains("gallery"));
    }

    #[test]
    fn column_classes() {
        assert_eq!(column_class(None), "col-md-4");
        assert_eq!(column_class(Some(2)), "col-md-6");
        assert_eq!(column_class(Some(5)), "col-md-3");
        assert_eq!(column_class(Some(7)), "col-md-2");
        assert_eq!(column_class(Some(20)), "col-md-1");
    }

    // =========================================================================
    // Headings and TOC
    // =========================================================================

    #[test]
    fn headings_get_unique_ids() {
        let parsed = parse("# Intro\n\n## Intro\n\n## Set up `cargo`\n").unwrap();
        assert!(parsed.body.contains(r#"<h1 id="intro">"#));
        assert!(parsed.body.contains(r#"<h2 id="intro-1">"#));
        assert!(parsed.body.contains(r#"<h2 id="set-up-cargo">"#));
    }

    #[test]
    fn explicit_heading_id_is_kept() {
        let parsed = parse("# Intro {#start}\n").unwrap();
        assert!(parsed.body.contains(r#"<h1 id="start">"#));
    }

    #[test]
    fn toc_marker_renders_nested_list() {
        let parsed = parse("[TOC]\n\n# One\n\n## One A\n\n# Two\n").unwrap();
        assert!(parsed.body.contains(
            r##"<div class="toc"><ul><li><a href="#one">One</a><ul><li><a href="#one-a">One A</a></li></ul></li><li><a href="#two">Two</a></li></ul></div>"##
        ), "{}", parsed.body);
    }

    #[test]
    fn toc_marker_in_code_is_literal() {
        let parsed = parse("```\n[TOC]\n```\n").unwrap();
        assert!(parsed.body.contains("[TOC]"));
        assert!(!parsed.body.contains("class=\"toc\""));
    }

    // =========================================================================
    // Divs, admonitions, spans, definition lists
    // =========================================================================

    #[test]
    fn div_blocks_wrap_markdown() {
        let text = "{note: wide #intro}\n*Inside*\n\n{div: .inner}\nDeeper\n{:}\n{:note}\n\nAfter\n";
        let parsed = parse(text).unwrap();
        assert!(
            parsed.body.contains(r#"<div id="intro" class="note wide">"#),
            "{}",
            parsed.body
        );
        assert!(parsed.body.contains("<em>Inside</em>"));
        assert!(parsed.body.contains(r#"<div class="inner">"#));
        assert_eq!(parsed.body.matches("</div>").count(), 2);
        let closed = parsed.body.rfind("</div>").unwrap();
        assert!(parsed.body.find("<p>After</p>").unwrap() > closed);
    }

    #[test]
    fn unclosed_div_is_closed_at_the_end() {
        let parsed = parse("{box:}\ntext\n").unwrap();
        assert!(parsed.body.contains(r#"<div class="box">"#));
        assert!(parsed.body.trim_end().ends_with("</div>"));
    }

    #[test]
    fn mismatched_div_end_is_an_error() {
        assert!(matches!(
            parse("{box:}\ntext\n{:card}\n"),
            Err(MarkdownError::UnbalancedDiv(_))
        ));
        assert!(matches!(parse("{:}\n"), Err(MarkdownError::UnbalancedDiv(_))));
    }

    #[test]
    fn div_markers_in_code_are_literal() {
        let parsed = parse("```\n{box:}\n```\n").unwrap();
        assert!(parsed.body.contains("{box:}"));
        assert!(!parsed.body.contains("<div"));
    }

    #[test]
    fn admonition_block() {
        let text = "!!! Warning\n    Mind the **gap**.\n\n    Second.\n\nOutside\n";
        let parsed = parse(text).unwrap();
        assert!(parsed.body.contains(
            r#"<div class="admonition warning">
<p class="admonition-title">Warning</p>"#
        ), "{}", parsed.body);
        assert!(parsed.body.contains("<strong>gap</strong>"));
        assert!(parsed.body.contains("<p>Second.</p>"));
        let closed = parsed.body.find("</div>").unwrap();
        assert!(parsed.body.find("<p>Outside</p>").unwrap() > closed);
    }

    #[test]
    fn admonition_titles() {
        let parsed = parse("!!! tip \"Read <this>\"\n    x\n").unwrap();
        assert!(parsed.body.contains(r#"<p class="admonition-title">Read &lt;this&gt;</p>"#));
        let parsed = parse("!!! note \"\"\n    x\n").unwrap();
        assert!(!parsed.body.contains("admonition-title"));
    }

    #[test]
    fn span_class_pattern() {
        let parsed = parse("Status {. badge badge-info} done, `{. kept}`\n").unwrap();
        assert!(
            parsed
                .body
                .contains(r#"Status <span class="badge badge-info"></span> done"#),
            "{}",
            parsed.body
        );
        assert!(parsed.body.contains("<code>{. kept}</code>"));
    }

    #[test]
    fn definition_list() {
        let parsed = parse("Term\n: Definition\n").unwrap();
        assert!(parsed.body.contains("<dl>"), "{}", parsed.body);
        assert!(parsed.body.contains("<dt>Term</dt>"));
    }

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  A -- B  "), "a-b");
        assert_eq!(slugify("???"), "section");
    }
}
