//! Build orchestration.
//!
//! A [`Generator`] owns the [`ResourceManager`] for one site and runs build
//! passes over it. Every pass goes through the same phases, in order:
//!
//! 1. **Pages**: walk the pages directory. A page whose previous output is
//!    still fresh is re-registered as is (its thumbnails carried forward);
//!    every other page is parsed, post-processed, rendered and written.
//! 2. **Thumbnails**: every thumbnail referenced by the current pages is
//!    mapped back to its static source image and resized when stale.
//! 3. **Static files**: each static directory is copied to
//!    `<output root>/<dir name>/`, skipping fresh files.
//! 4. **Cleanup**: the output root is swept; anything no resource produces
//!    any more is deleted.
//!
//! Freshness is judged from file modification times only, so template
//! edits go unnoticed unless the build is forced with [`Force::templates`].
//!
//! The generator never prints. Progress is reported as [`BuildEvent`]s on
//! an optional channel, and the totals are returned as [`BuildStats`].

use crate::config::Context;
use crate::imaging::{self, BackendError, ImageBackend, RustBackend};
use crate::output::{BuildEvent, BuildStats, Phase};
use crate::pages::{self, Page, PageError, PageKind};
use crate::postprocess::PostProcessor;
use crate::resources::{KindId, Resource, ResourceError, ResourceManager};
use crate::templater::{TemplateError, Templater};
use crate::thumbnail::Thumbnail;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Resource tracking failed: {0}")]
    Resource(#[from] ResourceError),
    #[error("Page processing failed: {0}")]
    Page(#[from] PageError),
    #[error("Rendering failed: {0}")]
    Template(#[from] TemplateError),
    #[error("Thumbnail {target} failed: {source}")]
    Thumbnail {
        target: PathBuf,
        source: BackendError,
    },
    #[error("Thumbnail \"{0}\" does not point into any static directory")]
    ThumbnailSourceNotFound(String),
    #[error("Dataset \"{name}\": {message}")]
    Dataset { name: String, message: String },
}

/// What to rebuild regardless of freshness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Force {
    pub all: bool,
    pub pages: bool,
    pub thumbnails: bool,
    pub static_files: bool,
    /// Drop cached templates. Implies rebuilding pages.
    pub templates: bool,
}

impl Force {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn everything() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    pub fn rebuild_pages(&self) -> bool {
        self.all || self.pages || self.templates
    }

    pub fn rebuild_thumbnails(&self) -> bool {
        self.all || self.thumbnails
    }

    pub fn rebuild_static_files(&self) -> bool {
        self.all || self.static_files
    }

    pub fn clear_templates(&self) -> bool {
        self.all || self.templates
    }
}

/// Incremental builder for one site.
pub struct Generator {
    ctx: Context,
    templater: Templater,
    post_processor: PostProcessor,
    backend: Box<dyn ImageBackend>,
    resources: ResourceManager,
    pages_kind: KindId,
    thumbnails_kind: KindId,
    static_kind: KindId,
    /// Thumbnails each tracked page asked for, keyed by page source.
    page_thumbnails: HashMap<PathBuf, BTreeMap<String, Thumbnail>>,
    /// Datasets loaded during the current build.
    datasets: HashMap<String, JsonValue>,
    events: Option<Sender<BuildEvent>>,
    stats: BuildStats,
}

impl Generator {
    pub fn new(ctx: Context) -> Self {
        Self::with_backend(ctx, Box::new(RustBackend::new()))
    }

    pub fn with_backend(ctx: Context, backend: Box<dyn ImageBackend>) -> Self {
        let templater = Templater::new(&ctx.templates_dir, &ctx.global_vars);
        let mut resources = ResourceManager::new();
        let pages_kind = resources.add_kind("pages");
        let thumbnails_kind = resources.add_kind("thumbnails");
        let static_kind = resources.add_kind("static_files");
        Self {
            ctx,
            templater,
            post_processor: PostProcessor::new(),
            backend,
            resources,
            pages_kind,
            thumbnails_kind,
            static_kind,
            page_thumbnails: HashMap::new(),
            datasets: HashMap::new(),
            events: None,
            stats: BuildStats::default(),
        }
    }

    /// Report progress on `events`.
    pub fn with_events(mut self, events: Sender<BuildEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    /// Run one build pass.
    ///
    /// A failing pass leaves the registry partially updated; the next pass
    /// rewalks everything and recovers.
    pub fn build(&mut self, force: Force) -> Result<BuildStats, BuildError> {
        self.stats = BuildStats::default();
        self.datasets.clear();
        for warning in std::mem::take(&mut self.ctx.warnings) {
            self.emit(BuildEvent::Warning(warning));
        }
        if force.clear_templates() {
            self.templater.clear_cache();
        }

        fs::create_dir_all(&self.ctx.output_root)?;
        self.build_pages(force.rebuild_pages())?;
        self.generate_thumbnails(force.rebuild_thumbnails())?;
        self.copy_static_files(force.rebuild_static_files())?;
        self.remove_stale_files()?;

        let stats = self.stats;
        self.emit(BuildEvent::Finished(stats));
        Ok(stats)
    }

    /// Delete the output directory and forget everything tracked.
    pub fn purge(&mut self) {
        purge(&self.ctx.output_dir);
        for kind in [self.pages_kind, self.thumbnails_kind, self.static_kind] {
            self.resources.remove_by_kind(kind);
        }
        self.page_thumbnails.clear();
    }

    fn emit(&mut self, event: BuildEvent) {
        self.stats.record(&event);
        if let Some(ref tx) = self.events {
            tx.send(event).ok();
        }
    }

    fn warn(&mut self, source: &Path, message: &str) {
        let source = source.strip_prefix(&self.ctx.input_dir).unwrap_or(source);
        self.emit(BuildEvent::Warning(format!(
            "{}: {}",
            source.display(),
            message
        )));
    }

    // =====================================================================
    // Pages
    // =====================================================================

    fn build_pages(&mut self, force: bool) -> Result<(), BuildError> {
        self.emit(BuildEvent::PhaseStarted(Phase::Pages));
        let previous: HashMap<PathBuf, Resource> = self
            .resources
            .remove_by_kind(self.pages_kind)
            .into_iter()
            .map(|r| (r.source().to_path_buf(), r))
            .collect();
        let mut previous_thumbnails = std::mem::take(&mut self.page_thumbnails);

        for (source, kind, default_path) in self.page_sources()? {
            if !force
                && let Some(prior) = previous.get(&source)
                && prior.is_fresh()
            {
                let target = prior.target().to_path_buf();
                self.resources.add(self.pages_kind, &source, &target);
                if let Some(thumbnails) = previous_thumbnails.remove(&source) {
                    self.page_thumbnails.insert(source.clone(), thumbnails);
                }
                self.emit(BuildEvent::PageFresh { source, target });
                continue;
            }
            self.build_page(&source, kind, &default_path)?;
        }
        Ok(())
    }

    /// Page sources under the pages directory with their default paths,
    /// in file name order. Hidden files and unknown extensions are skipped.
    fn page_sources(&self) -> Result<Vec<(PathBuf, PageKind, String)>, BuildError> {
        let mut sources = Vec::new();
        let walk = WalkDir::new(&self.ctx.pages_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
        for entry in walk {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(kind) = PageKind::detect(entry.path()) else {
                continue;
            };
            let relative = entry
                .path()
                .strip_prefix(&self.ctx.pages_dir)
                .unwrap_or(entry.path());
            let default_path = kind.default_path(relative);
            sources.push((entry.into_path(), kind, default_path));
        }
        Ok(sources)
    }

    fn build_page(
        &mut self,
        source: &Path,
        kind: PageKind,
        default_path: &str,
    ) -> Result<(), BuildError> {
        let mut page = pages::process(source, kind, default_path, &self.ctx.default_template)?;
        self.post_processor.process_page(&self.ctx, &mut page);
        for warning in std::mem::take(&mut page.warnings) {
            self.warn(source, &warning);
        }

        let rendered = self.render_page(&page)?;
        let target = self.ctx.output_root.join(&page.output_file);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, rendered)?;

        self.resources.add(self.pages_kind, source, &target);
        self.page_thumbnails
            .insert(source.to_path_buf(), page.thumbnails);
        self.emit(BuildEvent::PageRendered {
            source: source.to_path_buf(),
            target,
        });
        Ok(())
    }

    fn render_page(&mut self, page: &Page) -> Result<String, BuildError> {
        let mut variables: Map<String, JsonValue> = page
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect();
        variables.insert("path".into(), page.path.clone().into());
        variables.insert("canonical_path".into(), page.path.clone().into());
        variables.insert("webroot".into(), page.webroot.clone().into());
        variables.insert("filename".into(), page.filename().into());
        variables.insert(
            "toc".into(),
            page.toc.clone().map_or(JsonValue::Null, JsonValue::String),
        );

        let mut datasets = Map::new();
        for name in split_names(page.metadata.get("datasets")) {
            let name = normalize_name(&name);
            let data = self.dataset(&name)?;
            datasets.insert(name, data);
        }
        variables.insert("datasets".into(), JsonValue::Object(datasets));

        let mut body = page.body.clone();
        if self.ctx.enable_snippets {
            let mut seen = HashSet::new();
            for name in split_names(page.metadata.get("snippets")) {
                if !seen.insert(name.clone()) {
                    continue;
                }
                let normalized = normalize_name(&name);
                let template = format!("snippets/{normalized}.html");
                let snippet = self.templater.render(&[template], &variables)?;
                for marker in [&name, &normalized] {
                    body = body
                        .replace(&format!("[Snippet: {marker}]"), &snippet)
                        .replace(&format!("[snippet: {marker}]"), &snippet);
                }
            }
        }
        variables.insert("body".into(), body.into());

        let mut names = vec![format!("{}.html", page.template())];
        let default = format!("{}.html", self.ctx.default_template);
        if !names.contains(&default) {
            names.push(default);
        }
        Ok(self.templater.render(&names, &variables)?)
    }

    /// `<datasets_dir>/<name>.json`, loaded once per build. Without a
    /// datasets directory every dataset is `null`.
    fn dataset(&mut self, name: &str) -> Result<JsonValue, BuildError> {
        if let Some(data) = self.datasets.get(name) {
            return Ok(data.clone());
        }
        let failed = |message: String| BuildError::Dataset {
            name: name.to_string(),
            message,
        };
        let Some(dir) = &self.ctx.datasets_dir else {
            return Ok(JsonValue::Null);
        };
        let path = dir.join(format!("{name}.json"));
        let text = fs::read_to_string(&path)
            .map_err(|e| failed(format!("{}: {}", path.display(), e)))?;
        let data: JsonValue = serde_json::from_str(&text)
            .map_err(|e| failed(format!("{}: {}", path.display(), e)))?;
        self.datasets.insert(name.to_string(), data.clone());
        Ok(data)
    }

    // =====================================================================
    // Thumbnails
    // =====================================================================

    fn generate_thumbnails(&mut self, force: bool) -> Result<(), BuildError> {
        self.emit(BuildEvent::PhaseStarted(Phase::Thumbnails));
        self.resources.remove_by_kind(self.thumbnails_kind);

        let wanted: BTreeMap<String, Thumbnail> = self
            .page_thumbnails
            .values()
            .flat_map(|thumbnails| thumbnails.iter())
            .map(|(key, thumbnail)| (key.clone(), thumbnail.clone()))
            .collect();

        for thumbnail in wanted.values() {
            let source = self.thumbnail_source(thumbnail)?;
            let target = self
                .ctx
                .output_root
                .join(thumbnail.filename().trim_start_matches('/'));
            let fresh = self
                .resources
                .add(self.thumbnails_kind, &source, &target)
                .is_fresh();
            if fresh && !force {
                self.emit(BuildEvent::ThumbnailFresh { target });
                continue;
            }
            let params =
                imaging::create_thumbnail(&*self.backend, &source, &target, thumbnail)
                    .map_err(|source| BuildError::Thumbnail {
                        target: target.clone(),
                        source,
                    })?;
            self.emit(BuildEvent::ThumbnailCreated {
                source,
                target,
                width: params.width,
                height: params.height,
            });
        }
        Ok(())
    }

    /// The static file a thumbnail URL points at. The first URL segment
    /// names the static directory, the rest is the path inside it and may
    /// only hold plain segments.
    fn thumbnail_source(&self, thumbnail: &Thumbnail) -> Result<PathBuf, BuildError> {
        let not_found = || BuildError::ThumbnailSourceNotFound(thumbnail.original_url().into());
        let url = thumbnail.original_url().trim_start_matches('/');
        let (dir_name, rest) = url.split_once('/').ok_or_else(not_found)?;
        let plain = Path::new(rest)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if rest.is_empty() || !plain {
            return Err(not_found());
        }
        let static_dir = self
            .ctx
            .static_dirs
            .iter()
            .find(|dir| dir.file_name() == Some(OsStr::new(dir_name)))
            .ok_or_else(not_found)?;
        Ok(static_dir.join(rest))
    }

    // =====================================================================
    // Static files
    // =====================================================================

    fn copy_static_files(&mut self, force: bool) -> Result<(), BuildError> {
        self.emit(BuildEvent::PhaseStarted(Phase::StaticFiles));
        self.resources.remove_by_kind(self.static_kind);

        for static_dir in self.ctx.static_dirs.clone() {
            let Some(name) = static_dir.file_name() else {
                continue;
            };
            let target_root = self.ctx.output_root.join(name);
            for entry in WalkDir::new(&static_dir).sort_by_file_name() {
                let entry = entry?;
                let relative = entry
                    .path()
                    .strip_prefix(&static_dir)
                    .unwrap_or(entry.path());
                let target = if relative.as_os_str().is_empty() {
                    target_root.clone()
                } else {
                    target_root.join(relative)
                };

                if entry.file_type().is_dir() {
                    fs::create_dir_all(&target)?;
                    continue;
                }
                let fresh = self
                    .resources
                    .add(self.static_kind, entry.path(), &target)
                    .is_fresh();
                if fresh && !force {
                    self.emit(BuildEvent::StaticFresh { target });
                    continue;
                }
                fs::copy(entry.path(), &target)?;
                self.emit(BuildEvent::StaticCopied {
                    source: entry.into_path(),
                    target,
                });
            }
        }
        Ok(())
    }

    // =====================================================================
    // Cleanup
    // =====================================================================

    fn remove_stale_files(&mut self) -> Result<(), BuildError> {
        self.emit(BuildEvent::PhaseStarted(Phase::Cleanup));
        let output_root = self.ctx.output_root.clone();
        for target in self.resources.remove_stale_files(&output_root)? {
            self.emit(BuildEvent::Removed { target });
        }
        Ok(())
    }
}

/// Recursively delete `output_dir`. Errors (including a missing directory)
/// are ignored.
pub fn purge(output_dir: &Path) {
    fs::remove_dir_all(output_dir).ok();
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

/// Comma-separated metadata list, trimmed, empties dropped.
fn split_names(value: Option<&String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `Team Members` / `team-members` → `team_members`.
fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}
