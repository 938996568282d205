//! Source pages: detection, parsing and output path resolution.
//!
//! Every file under the pages directory whose extension matches a known
//! [`PageKind`] becomes one output document. Kinds are tried in the order of
//! [`PAGE_KINDS`]; the first match wins.
//!
//! ## Paths
//!
//! A page's URL path comes from its `path` metadata when present, otherwise
//! from its location under the pages directory:
//!
//! ```text
//! pages/index.md           →  /
//! pages/about.md           →  /about/
//! pages/blog/index.md      →  /blog/
//! pages/blog/first-post.md →  /blog/first-post/
//! pages/legacy/old.html    →  /legacy/old.html
//! ```
//!
//! Directory paths are written as `index.html`. The page's `webroot` is the
//! relative prefix that leads from its output file back to the output root
//! (`.` at the top level, `..` one level down, and so on).

mod html;
mod markdown;

pub use markdown::MarkdownError;

use crate::thumbnail::Thumbnail;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{path}: {source}")]
    Markdown {
        path: PathBuf,
        source: MarkdownError,
    },
    #[error("{0}: no <body> element found")]
    MissingBody(PathBuf),
}

/// Closed set of page types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Markdown,
    Html,
}

/// Detection order: (extensions, kind).
pub const PAGE_KINDS: &[(&[&str], PageKind)] = &[
    (&["md", "mkd"], PageKind::Markdown),
    (&["html", "htm"], PageKind::Html),
];

impl PageKind {
    /// The first kind whose extensions match `path`, if any.
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        PAGE_KINDS
            .iter()
            .find(|(exts, _)| exts.contains(&ext.as_str()))
            .map(|(_, kind)| *kind)
    }

    /// URL path for a page at `relative` (relative to the pages directory).
    pub fn default_path(self, relative: &Path) -> String {
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        match self {
            PageKind::Html => format!("/{}", parts.join("/")),
            PageKind::Markdown => {
                let Some((file, dirs)) = parts.split_last() else {
                    return "/".to_string();
                };
                let stem = Path::new(file)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let mut segments: Vec<&str> = dirs.iter().map(String::as_str).collect();
                if stem != "index" {
                    segments.push(&stem);
                }
                if segments.is_empty() {
                    "/".to_string()
                } else {
                    format!("/{}/", segments.join("/"))
                }
            }
        }
    }
}

/// Parser output shared by all page kinds.
#[derive(Debug, Default)]
struct Parsed {
    metadata: BTreeMap<String, String>,
    body: String,
    thumbnails: BTreeMap<String, Thumbnail>,
    warnings: Vec<String>,
}

/// A processed page, ready for post-processing and rendering.
#[derive(Debug, Clone)]
pub struct Page {
    pub source: PathBuf,
    pub kind: PageKind,
    /// Lowercased metadata keys; always has `title` and `template`.
    pub metadata: BTreeMap<String, String>,
    /// Normalized URL path: leading `/`, trailing `/` unless it names a file.
    pub path: String,
    /// Output file, relative to the output root (`blog/index.html`).
    pub output_file: String,
    /// Relative prefix from the output file back to the output root.
    pub webroot: String,
    pub body: String,
    pub toc: Option<String>,
    /// Thumbnails requested by this page, keyed by generated filename.
    pub thumbnails: BTreeMap<String, Thumbnail>,
    pub warnings: Vec<String>,
}

impl Page {
    /// Output filename without directories (`index.html`, `old.html`).
    pub fn filename(&self) -> &str {
        self.output_file
            .rsplit('/')
            .next()
            .unwrap_or(&self.output_file)
    }

    pub fn title(&self) -> &str {
        self.metadata.get("title").map(String::as_str).unwrap_or("")
    }

    pub fn template(&self) -> &str {
        self.metadata
            .get("template")
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Read and parse `source`.
///
/// `default_path` is used unless the page sets `path` in its metadata;
/// `default_template` fills in a missing `template`.
pub fn process(
    source: &Path,
    kind: PageKind,
    default_path: &str,
    default_template: &str,
) -> Result<Page, PageError> {
    let text = std::fs::read_to_string(source)?;
    let parsed = match kind {
        PageKind::Markdown => markdown::parse(&text).map_err(|e| PageError::Markdown {
            path: source.to_path_buf(),
            source: e,
        })?,
        PageKind::Html => {
            html::parse(&text).ok_or_else(|| PageError::MissingBody(source.to_path_buf()))?
        }
    };

    let mut metadata = parsed.metadata;
    if !metadata.contains_key("title") {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        metadata.insert("title".to_string(), stem);
    }
    metadata
        .entry("template".to_string())
        .or_insert_with(|| default_template.to_string());

    let path = normalize_path(
        metadata
            .get("path")
            .map(String::as_str)
            .unwrap_or(default_path),
    );
    let output_file = output_file(&path);
    let webroot = webroot(&path);

    Ok(Page {
        source: source.to_path_buf(),
        kind,
        metadata,
        path,
        output_file,
        webroot,
        body: parsed.body,
        toc: None,
        thumbnails: parsed.thumbnails,
        warnings: parsed.warnings,
    })
}

/// Leading `/`, and a trailing `/` unless the path names an HTML file.
pub fn normalize_path(path: &str) -> String {
    let mut path = path.trim().to_string();
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    let lower = path.to_lowercase();
    if !path.ends_with('/') && !lower.ends_with(".html") && !lower.ends_with(".htm") {
        path.push('/');
    }
    path
}

/// Output file for a normalized path, relative to the output root.
pub fn output_file(path: &str) -> String {
    let relative = path.trim_start_matches('/');
    if relative.is_empty() || relative.ends_with('/') {
        format!("{relative}index.html")
    } else {
        relative.to_string()
    }
}

/// Relative prefix from the page's output file to the output root.
pub fn webroot(path: &str) -> String {
    let depth = path.trim_start_matches('/').matches('/').count();
    if depth == 0 {
        ".".to_string()
    } else {
        vec![".."; depth].join("/")
    }
}
