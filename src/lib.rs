//! # Simple Web
//!
//! A small static website generator with incremental rebuilds. Markdown and
//! HTML pages are rendered through Jinja-style templates, static directories
//! are copied, and thumbnails referenced by pages are resized from their
//! source images.
//!
//! # Incremental Builds
//!
//! Every file the generator writes is a *resource*: a record tying one
//! output file (the target) to the file it was produced from (the source).
//! A resource is fresh when its target exists and is at least as new as its
//! source; fresh resources are skipped. After each build the output
//! directory is swept and any file no resource accounts for is deleted, so
//! renamed or removed pages do not leave stale output behind.
//!
//! ```text
//! pages/blog/post.md      →  build/blog/post/index.html     (pages)
//! static/photos/dawn.jpg  →  build/static/photos/dawn[400x].jpg  (thumbnails)
//! static/css/site.css     →  build/static/css/site.css      (static_files)
//! ```
//!
//! There is no manifest on disk. The registry lives in memory and is rebuilt
//! from directory walks on every pass, which keeps long-running `serve`
//! sessions cheap while a fresh `build` simply compares modification times.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resources`] | Resource registry: source/target indices, freshness, stale-file sweep |
//! | [`generator`] | Build passes: pages, thumbnails, static files, cleanup; force flags; purge |
//! | [`pages`] | Page parsing (Markdown, HTML), metadata, galleries, TOC |
//! | [`postprocess`] | Link rewriting, TOC extraction, heading adjustments |
//! | [`templater`] | Named templates with fallbacks, sidecar data, clearable cache |
//! | [`thumbnail`] | Thumbnail requests (`url|WxH`) and their output file names |
//! | [`imaging`] | Image backend trait and the pure-Rust resizer |
//! | [`config`] | `config.toml` loading, layering and resolution into a [`config::Context`] |
//! | [`output`] | Build events and their console formatting |
//! | [`server`] | Development HTTP server over the output directory |
//!
//! # Design Decisions
//!
//! ## Events Instead of Printing
//!
//! The library never writes to the console. A [`generator::Generator`] sends
//! [`output::BuildEvent`]s over an optional channel; the binary formats them
//! on a printer thread. Tests read the same events to see what a build did.
//!
//! ## Missing Sources Are Never Fresh
//!
//! A resource whose source file has disappeared is stale regardless of its
//! target's age, so the sweep can rely on freshness alone.

pub mod config;
pub mod generator;
pub mod imaging;
pub mod output;
pub mod pages;
pub mod postprocess;
pub mod resources;
pub mod server;
pub mod templater;
pub mod thumbnail;

#[cfg(test)]
pub(crate) mod test_helpers;
