//! Shared test utilities for the unit test suites.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_site();
//! let ctx = test_context(tmp.path());
//! write_file(&ctx.pages_dir.join("news.md"), "Title: News\n\nHello");
//! set_mtime(&ctx.pages_dir.join("news.md"), 1_000);
//! ```

use std::fs;
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

use crate::config::{Context, SiteConfig};
use crate::output::BuildEvent;

/// Minimal page template: title and body.
pub const PAGE_TEMPLATE: &str =
    "<html><head><title>{{ title }}</title></head><body>{{ body|safe }}</body></html>";

// =========================================================================
// Files
// =========================================================================

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Set the modification time of `path` to `secs` after the epoch.
pub fn set_mtime(path: &Path, secs: u64) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

pub fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

// =========================================================================
// Sites
// =========================================================================

/// Stock-config [`Context`] for a site rooted at `root`. Creates the pages
/// and templates directories when missing.
pub fn test_context(root: &Path) -> Context {
    fs::create_dir_all(root.join("pages")).unwrap();
    fs::create_dir_all(root.join("templates")).unwrap();
    Context::resolve(root, &SiteConfig::default()).unwrap()
}

/// A small site in a temp directory:
///
/// ```text
/// pages/index.md
/// pages/blog/post.md
/// templates/page.html
/// static/css/site.css
/// ```
///
/// Every source gets an old mtime so freshly written outputs are newer.
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let files = [
        ("pages/index.md", "Title: Home\n\n# Welcome\n\nHello."),
        ("pages/blog/post.md", "Title: Post\n\nSee [home](:index.html)."),
        ("templates/page.html", PAGE_TEMPLATE),
        ("static/css/site.css", "body { margin: 0 }"),
    ];
    for (path, contents) in files {
        write_file(&root.join(path), contents);
        set_mtime(&root.join(path), 1_000);
    }
    tmp
}

/// Everything sent so far.
pub fn drain_events(rx: &Receiver<BuildEvent>) -> Vec<BuildEvent> {
    rx.try_iter().collect()
}
