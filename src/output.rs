//! CLI output formatting for build events.
//!
//! The generator never prints. It emits [`BuildEvent`]s; the binary turns
//! each one into display lines with [`format_build_event`] and prints them.
//!
//! # Output Format
//!
//! ```text
//! Pages
//!     Render: pages/blog/post.md → blog/post/index.html
//! Thumbnails
//!     Thumbnail: static/photos/dawn[400x].jpg (400x300)
//! Static files
//!     Copy: static/css/site.css → static/css/site.css
//! Cleanup
//!     Remove: old/index.html
//! Warning: pages/blog/post.md: Pelican links are deprecated: "{filename}a.md".
//! Build: 1 page rendered (4 fresh), 1 thumbnail created (0 fresh), 1 static file copied (12 fresh), 1 file removed
//! ```
//!
//! Items that were already fresh produce no lines; they only show up in the
//! summary counts.
//!
//! # Architecture
//!
//! Format functions are pure (no I/O) and return `Vec<String>` so they can
//! be tested directly.

use std::fmt;
use std::path::{Path, PathBuf};

/// Build phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pages,
    Thumbnails,
    StaticFiles,
    Cleanup,
}

/// Progress of a build, sent from the generator to whoever prints.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    PhaseStarted(Phase),
    PageRendered {
        source: PathBuf,
        target: PathBuf,
    },
    PageFresh {
        source: PathBuf,
        target: PathBuf,
    },
    ThumbnailCreated {
        source: PathBuf,
        target: PathBuf,
        width: u32,
        height: u32,
    },
    ThumbnailFresh {
        target: PathBuf,
    },
    StaticCopied {
        source: PathBuf,
        target: PathBuf,
    },
    StaticFresh {
        target: PathBuf,
    },
    Removed {
        target: PathBuf,
    },
    Warning(String),
    Finished(BuildStats),
}

/// Counts of what one build did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub pages_rendered: usize,
    pub pages_fresh: usize,
    pub thumbnails_created: usize,
    pub thumbnails_fresh: usize,
    pub static_copied: usize,
    pub static_fresh: usize,
    pub removed: usize,
    pub warnings: usize,
}

impl BuildStats {
    /// Count `event` into the totals.
    pub fn record(&mut self, event: &BuildEvent) {
        match event {
            BuildEvent::PageRendered { .. } => self.pages_rendered += 1,
            BuildEvent::PageFresh { .. } => self.pages_fresh += 1,
            BuildEvent::ThumbnailCreated { .. } => self.thumbnails_created += 1,
            BuildEvent::ThumbnailFresh { .. } => self.thumbnails_fresh += 1,
            BuildEvent::StaticCopied { .. } => self.static_copied += 1,
            BuildEvent::StaticFresh { .. } => self.static_fresh += 1,
            BuildEvent::Removed { .. } => self.removed += 1,
            BuildEvent::Warning(_) => self.warnings += 1,
            BuildEvent::PhaseStarted(_) | BuildEvent::Finished(_) => {}
        }
    }

    /// Files written by this build.
    pub fn written(&self) -> usize {
        self.pages_rendered + self.thumbnails_created + self.static_copied
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rendered ({} fresh), {} created ({} fresh), {} copied ({} fresh), {} removed",
            plural(self.pages_rendered, "page", "pages"),
            self.pages_fresh,
            plural(self.thumbnails_created, "thumbnail", "thumbnails"),
            self.thumbnails_fresh,
            plural(self.static_copied, "static file", "static files"),
            self.static_fresh,
            plural(self.removed, "file", "files"),
        )?;
        if self.warnings > 0 {
            write!(f, ", {}", plural(self.warnings, "warning", "warnings"))?;
        }
        Ok(())
    }
}

/// `path` relative to `base` when it lies below it, as written otherwise.
fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Format a single build event as display lines.
///
/// Sources are shown relative to `input_dir`, targets relative to
/// `output_root`.
pub fn format_build_event(event: &BuildEvent, input_dir: &Path, output_root: &Path) -> Vec<String> {
    let src = |p: &Path| display_path(p, input_dir);
    let dst = |p: &Path| display_path(p, output_root);
    match event {
        BuildEvent::PhaseStarted(phase) => vec![
            match phase {
                Phase::Pages => "Pages",
                Phase::Thumbnails => "Thumbnails",
                Phase::StaticFiles => "Static files",
                Phase::Cleanup => "Cleanup",
            }
            .to_string(),
        ],
        BuildEvent::PageRendered { source, target } => {
            vec![format!("    Render: {} → {}", src(source), dst(target))]
        }
        BuildEvent::ThumbnailCreated {
            target,
            width,
            height,
            ..
        } => vec![format!(
            "    Thumbnail: {} ({}x{})",
            dst(target),
            width,
            height
        )],
        BuildEvent::StaticCopied { source, target } => {
            vec![format!("    Copy: {} → {}", src(source), dst(target))]
        }
        BuildEvent::Removed { target } => vec![format!("    Remove: {}", dst(target))],
        BuildEvent::Warning(message) => vec![format!("Warning: {message}")],
        BuildEvent::Finished(stats) => vec![format!("Build: {stats}")],
        BuildEvent::PageFresh { .. }
        | BuildEvent::ThumbnailFresh { .. }
        | BuildEvent::StaticFresh { .. } => Vec::new(),
    }
}

/// Print a build event to stdout.
pub fn print_build_event(event: &BuildEvent, input_dir: &Path, output_root: &Path) {
    for line in format_build_event(event, input_dir, output_root) {
        println!("{}", line);
    }
}
