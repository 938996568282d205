//! Source → target tracking for incremental builds.
//!
//! Every file the generator writes (a rendered page, a copied static file, a
//! thumbnail) is recorded as a [`Resource`]: the source it was produced from
//! and the target path it was written to. On the next build the generator
//! asks the [`ResourceManager`] whether a target is still fresh and only
//! re-invokes the expensive step when it is not.
//!
//! # Data model
//!
//! ```text
//! ResourceManager
//! ├── resources: ResourceId → Resource        (sole owner)
//! ├── targets:   target path → ResourceId     (at most one producer per target)
//! ├── sources:   source path → {ResourceId}   (one source may feed many targets)
//! └── kinds:     [Kind]                       (pages, static files, thumbnails)
//! ```
//!
//! Resources and kinds refer to each other by index, never by pointer: a
//! [`Resource`] stores the [`KindId`] it belongs to and a [`Kind`] stores the
//! set of [`ResourceId`]s it owns. All four structures are only mutated
//! through the manager, which keeps them in agreement.
//!
//! # Freshness
//!
//! Freshness is recomputed from filesystem mtimes on every query; nothing is
//! persisted between runs. A target is fresh when it exists, its source
//! exists, and the target is at least as new as the source. A missing
//! source is never fresh, so a resource whose source vanished cannot be
//! mistaken for an up-to-date one.
//!
//! # Stale-file sweep
//!
//! [`ResourceManager::remove_stale_files`] walks an output directory bottom-up
//! and deletes every file that is untracked or whose source is gone, then
//! removes directories left empty. It is the only place that deletes output.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Resource {0} is not tracked")]
    NotTracked(ResourceId),
    #[error("Resource {resource} is not a member of kind '{kind}'")]
    NotInKind { resource: ResourceId, kind: String },
}

/// Identifier of a tracked resource, unique for the manager's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable index of a [`Kind`] within its manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KindId(usize);

impl KindId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Modification time of a file, or `None` if it cannot be read.
///
/// `None` orders below every real timestamp.
pub fn file_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// A single source → target production record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    id: ResourceId,
    kind: KindId,
    source: PathBuf,
    target: PathBuf,
}

impl Resource {
    /// Bind a source → target pair to a kind. Performs no I/O.
    pub fn new(
        id: ResourceId,
        kind: KindId,
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id,
            kind,
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn kind(&self) -> KindId {
        self.kind
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// True iff the target is a file, the source still exists, and
    /// `mtime(target) >= mtime(source)`.
    pub fn is_fresh(&self) -> bool {
        if !self.target.is_file() || !self.source_exists() {
            return false;
        }
        file_mtime(&self.target) >= file_mtime(&self.source)
    }

    /// True iff the source path currently points at an existing file.
    pub fn source_exists(&self) -> bool {
        self.source.is_file()
    }
}

/// A named partition of resources (pages, static files, thumbnails).
///
/// Kinds only hold resource ids; the [`ResourceManager`] owns the resources
/// and is the only holder of `&mut Kind`.
#[derive(Debug, Clone)]
pub struct Kind {
    id: KindId,
    name: String,
    resources: BTreeSet<ResourceId>,
}

impl Kind {
    fn new(id: KindId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            resources: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> KindId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn contains(&self, resource: ResourceId) -> bool {
        self.resources.contains(&resource)
    }

    /// Member ids in allocation order.
    pub fn resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.resources.iter().copied()
    }

    pub fn add(&mut self, resource: ResourceId) {
        self.resources.insert(resource);
    }

    pub fn remove(&mut self, resource: ResourceId) -> Result<(), ResourceError> {
        if self.resources.remove(&resource) {
            Ok(())
        } else {
            Err(ResourceError::NotInKind {
                resource,
                kind: self.name.clone(),
            })
        }
    }

    /// Empty the kind, handing back the detached member ids.
    pub fn clear(&mut self) -> BTreeSet<ResourceId> {
        std::mem::take(&mut self.resources)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Kind: {}, {}, {}]", self.id, self.name, self.len())
    }
}

/// Registry of every tracked resource, indexed by source and by target.
///
/// Single-threaded: the build loop owns the manager and mutates it between
/// builds only. The development server reads written files from disk and
/// never touches the registry.
#[derive(Debug, Default)]
pub struct ResourceManager {
    resources: HashMap<ResourceId, Resource>,
    sources: HashMap<PathBuf, BTreeSet<ResourceId>>,
    targets: HashMap<PathBuf, ResourceId>,
    kinds: Vec<Kind>,
    next_id: u64,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new kind with the next sequential index.
    pub fn add_kind(&mut self, name: &str) -> KindId {
        let id = KindId(self.kinds.len());
        self.kinds.push(Kind::new(id, name));
        id
    }

    pub fn kind(&self, id: KindId) -> Option<&Kind> {
        self.kinds.get(id.0)
    }

    pub fn kinds(&self) -> &[Kind] {
        &self.kinds
    }

    /// Register `source → target`, returning the resource that now owns
    /// `target`.
    ///
    /// If `target` is already tracked the existing resource is kept (with its
    /// original kind) and rebound to `source` when the source changed.
    /// Otherwise a new resource is created in `kind`.
    ///
    /// # Panics
    ///
    /// Panics if `kind` was not allocated by this manager.
    pub fn add(
        &mut self,
        kind: KindId,
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> &Resource {
        let source = source.into();
        let target = target.into();

        if let Some(id) = self.targets.get(&target).copied()
            && let Some(resource) = self.resources.get_mut(&id)
        {
            if resource.source != source {
                let previous = std::mem::replace(&mut resource.source, source.clone());
                unlink_source(&mut self.sources, &previous, id);
                self.sources.entry(source).or_default().insert(id);
            }
            return &self.resources[&id];
        }

        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.sources.entry(source.clone()).or_default().insert(id);
        self.targets.insert(target.clone(), id);
        self.kinds[kind.0].add(id);
        self.resources
            .entry(id)
            .or_insert(Resource::new(id, kind, source, target))
    }

    /// Stop tracking a resource. Errors if it is not currently tracked.
    pub fn remove(&mut self, id: ResourceId) -> Result<Resource, ResourceError> {
        let kind = self
            .resources
            .get(&id)
            .map(|r| r.kind)
            .ok_or(ResourceError::NotTracked(id))?;
        if let Some(kind) = self.kinds.get_mut(kind.0) {
            kind.remove(id)?;
        }
        let resource = self
            .resources
            .remove(&id)
            .ok_or(ResourceError::NotTracked(id))?;
        unlink_source(&mut self.sources, &resource.source, id);
        self.targets.remove(&resource.target);
        Ok(resource)
    }

    /// Forget every resource of `kind` and clear the kind.
    ///
    /// Only bookkeeping is dropped; files on disk are left alone until the
    /// next [`remove_stale_files`](Self::remove_stale_files).
    pub fn remove_by_kind(&mut self, kind: KindId) -> Vec<Resource> {
        let Some(members) = self.kinds.get_mut(kind.0).map(Kind::clear) else {
            return Vec::new();
        };
        let mut removed = Vec::with_capacity(members.len());
        for id in members {
            if let Some(resource) = self.resources.remove(&id) {
                unlink_source(&mut self.sources, &resource.source, id);
                self.targets.remove(&resource.target);
                removed.push(resource);
            }
        }
        removed
    }

    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(&id)
    }

    /// The resource currently producing `target`.
    pub fn by_target(&self, target: &Path) -> Option<&Resource> {
        self.targets
            .get(target)
            .and_then(|id| self.resources.get(id))
    }

    /// Every resource fed by `source`, in allocation order.
    pub fn by_source(&self, source: &Path) -> Vec<&Resource> {
        self.sources
            .get(source)
            .into_iter()
            .flatten()
            .filter_map(|id| self.resources.get(id))
            .collect()
    }

    /// Every resource owned by `kind`, in allocation order.
    pub fn of_kind(&self, kind: KindId) -> Vec<&Resource> {
        self.kind(kind)
            .into_iter()
            .flat_map(Kind::resources)
            .filter_map(|id| self.resources.get(&id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Delete output files that no live resource accounts for.
    ///
    /// Walks `target_dir` contents-first. A file is deleted when no resource
    /// owns it or when its owner's source no longer exists (the owner is
    /// untracked as well). Directories are removed once their contents have
    /// been visited; "directory not empty" is expected and ignored, any other
    /// error propagates. `target_dir` itself is never removed.
    ///
    /// Returns the deleted file paths in walk order.
    pub fn remove_stale_files(&mut self, target_dir: &Path) -> Result<Vec<PathBuf>, ResourceError> {
        let mut removed = Vec::new();
        if !target_dir.is_dir() {
            return Ok(removed);
        }

        for entry in WalkDir::new(target_dir).min_depth(1).contents_first(true) {
            let entry = entry?;
            let path = entry.path();

            if entry.file_type().is_dir() {
                remove_dir_if_empty(path)?;
                continue;
            }

            let owner = self.targets.get(path).copied();
            let keep = owner
                .and_then(|id| self.resources.get(&id))
                .is_some_and(Resource::source_exists);
            if keep {
                continue;
            }
            if let Some(id) = owner {
                self.remove(id)?;
            }
            fs::remove_file(path)?;
            removed.push(path.to_path_buf());
        }

        Ok(removed)
    }

    /// Check that the target index, source index, and kinds agree.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.targets.len(), self.resources.len());
        for (id, resource) in &self.resources {
            assert_eq!(self.targets.get(&resource.target), Some(id));
            assert!(self.sources[&resource.source].contains(id));
            assert!(self.kinds[resource.kind.0].contains(*id));
        }
        for (source, ids) in &self.sources {
            assert!(!ids.is_empty(), "empty source entry for {}", source.display());
            for id in ids {
                assert_eq!(&self.resources[id].source, source);
            }
        }
        let members: usize = self.kinds.iter().map(Kind::len).sum();
        assert_eq!(members, self.resources.len());
    }
}

fn unlink_source(sources: &mut HashMap<PathBuf, BTreeSet<ResourceId>>, source: &Path, id: ResourceId) {
    if let Some(ids) = sources.get_mut(source) {
        ids.remove(&id);
        if ids.is_empty() {
            sources.remove(source);
        }
    }
}

fn remove_dir_if_empty(path: &Path) -> io::Result<()> {
    match fs::remove_dir(path) {
        Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{set_mtime, write_file};
    use tempfile::TempDir;

    fn manager_with_kind(name: &str) -> (ResourceManager, KindId) {
        let mut manager = ResourceManager::new();
        let kind = manager.add_kind(name);
        (manager, kind)
    }

    // =========================================================================
    // Resource freshness
    // =========================================================================

    #[test]
    fn missing_target_is_stale() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.md");
        write_file(&source, "# A");

        let resource = Resource::new(ResourceId(0), KindId(0), &source, tmp.path().join("out.html"));
        assert!(!resource.is_fresh());
        assert!(resource.source_exists());
    }

    #[test]
    fn target_newer_than_source_is_fresh() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.md");
        let target = tmp.path().join("a.html");
        write_file(&source, "# A");
        write_file(&target, "<h1>A</h1>");
        set_mtime(&source, 1_000);
        set_mtime(&target, 2_000);

        let resource = Resource::new(ResourceId(0), KindId(0), &source, &target);
        assert!(resource.is_fresh());
    }

    #[test]
    fn equal_mtimes_are_fresh() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.md");
        let target = tmp.path().join("a.html");
        write_file(&source, "# A");
        write_file(&target, "<h1>A</h1>");
        set_mtime(&source, 1_500);
        set_mtime(&target, 1_500);

        assert!(Resource::new(ResourceId(0), KindId(0), &source, &target).is_fresh());
    }

    #[test]
    fn touching_source_forward_makes_resource_stale() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.md");
        let target = tmp.path().join("a.html");
        write_file(&source, "# A");
        write_file(&target, "<h1>A</h1>");
        set_mtime(&source, 1_000);
        set_mtime(&target, 2_000);

        let resource = Resource::new(ResourceId(0), KindId(0), &source, &target);
        assert!(resource.is_fresh());

        set_mtime(&source, 3_000);
        assert!(!resource.is_fresh());
    }

    #[test]
    fn missing_source_is_never_fresh() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("a.html");
        write_file(&target, "<h1>A</h1>");

        let resource = Resource::new(ResourceId(0), KindId(0), tmp.path().join("gone.md"), &target);
        assert!(!resource.source_exists());
        assert!(!resource.is_fresh());
    }

    #[test]
    fn directory_target_is_not_fresh() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.md");
        write_file(&source, "# A");
        let target = tmp.path().join("dir");
        fs::create_dir(&target).unwrap();

        assert!(!Resource::new(ResourceId(0), KindId(0), &source, &target).is_fresh());
    }

    // =========================================================================
    // Kind
    // =========================================================================

    #[test]
    fn kinds_get_sequential_indices() {
        let mut manager = ResourceManager::new();
        let pages = manager.add_kind("pages");
        let statics = manager.add_kind("static_files");
        let thumbs = manager.add_kind("thumbnails");

        assert_eq!(pages.index(), 0);
        assert_eq!(statics.index(), 1);
        assert_eq!(thumbs.index(), 2);
        assert_eq!(manager.kind(statics).unwrap().name(), "static_files");
        assert_eq!(manager.kinds().len(), 3);
    }

    #[test]
    fn kind_remove_non_member_errors() {
        let mut kind = Kind::new(KindId(0), "pages");
        kind.add(ResourceId(1));
        assert!(kind.remove(ResourceId(1)).is_ok());
        assert!(matches!(
            kind.remove(ResourceId(1)),
            Err(ResourceError::NotInKind { .. })
        ));
    }

    #[test]
    fn kind_clear_returns_members() {
        let mut kind = Kind::new(KindId(2), "thumbnails");
        kind.add(ResourceId(4));
        kind.add(ResourceId(7));

        let members: Vec<_> = kind.clear().into_iter().collect();
        assert_eq!(members, vec![ResourceId(4), ResourceId(7)]);
        assert!(kind.is_empty());
        assert_eq!(kind.to_string(), "[Kind: 2, thumbnails, 0]");
    }

    // =========================================================================
    // ResourceManager::add
    // =========================================================================

    #[test]
    fn add_registers_in_all_indices() {
        let (mut manager, pages) = manager_with_kind("pages");
        let id = manager.add(pages, "/src/a.md", "/out/a/index.html").id();

        let resource = manager.by_target(Path::new("/out/a/index.html")).unwrap();
        assert_eq!(resource.id(), id);
        assert_eq!(resource.source(), Path::new("/src/a.md"));
        assert_eq!(resource.kind(), pages);
        assert_eq!(manager.by_source(Path::new("/src/a.md")).len(), 1);
        assert!(manager.kind(pages).unwrap().contains(id));
        manager.assert_consistent();
    }

    #[test]
    fn add_is_idempotent() {
        let (mut manager, pages) = manager_with_kind("pages");
        let first = manager.add(pages, "/src/a.md", "/out/a.html").id();
        let second = manager.add(pages, "/src/a.md", "/out/a.html").id();

        assert_eq!(first, second);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.kind(pages).unwrap().len(), 1);
        manager.assert_consistent();
    }

    #[test]
    fn add_rebinds_changed_source() {
        let (mut manager, pages) = manager_with_kind("pages");
        let first = manager.add(pages, "/src/old.md", "/out/a.html").id();
        let second = manager.add(pages, "/src/new.md", "/out/a.html");

        assert_eq!(second.id(), first);
        assert_eq!(second.source(), Path::new("/src/new.md"));
        assert_eq!(manager.len(), 1);
        assert!(manager.by_source(Path::new("/src/old.md")).is_empty());
        assert_eq!(manager.by_source(Path::new("/src/new.md")).len(), 1);
        manager.assert_consistent();
    }

    #[test]
    fn one_source_can_feed_many_targets() {
        let (mut manager, thumbs) = manager_with_kind("thumbnails");
        manager.add(thumbs, "/static/a.jpg", "/out/static/a[100x].jpg");
        manager.add(thumbs, "/static/a.jpg", "/out/static/a[x50].jpg");

        let targets: Vec<_> = manager
            .by_source(Path::new("/static/a.jpg"))
            .iter()
            .map(|r| r.target().to_path_buf())
            .collect();
        assert_eq!(
            targets,
            vec![
                PathBuf::from("/out/static/a[100x].jpg"),
                PathBuf::from("/out/static/a[x50].jpg")
            ]
        );
        manager.assert_consistent();
    }

    #[test]
    fn existing_target_keeps_original_kind() {
        let mut manager = ResourceManager::new();
        let pages = manager.add_kind("pages");
        let statics = manager.add_kind("static_files");
        manager.add(pages, "/src/a.html", "/out/a.html");
        let resource = manager.add(statics, "/static/a.html", "/out/a.html");

        assert_eq!(resource.kind(), pages);
        assert!(manager.kind(statics).unwrap().is_empty());
        manager.assert_consistent();
    }

    // =========================================================================
    // ResourceManager::remove / remove_by_kind
    // =========================================================================

    #[test]
    fn remove_untracks_everywhere() {
        let (mut manager, pages) = manager_with_kind("pages");
        let id = manager.add(pages, "/src/a.md", "/out/a.html").id();

        let removed = manager.remove(id).unwrap();
        assert_eq!(removed.target(), Path::new("/out/a.html"));
        assert!(manager.is_empty());
        assert!(manager.by_target(Path::new("/out/a.html")).is_none());
        assert!(manager.by_source(Path::new("/src/a.md")).is_empty());
        assert!(manager.kind(pages).unwrap().is_empty());
        manager.assert_consistent();
    }

    #[test]
    fn remove_untracked_resource_errors() {
        let (mut manager, pages) = manager_with_kind("pages");
        let id = manager.add(pages, "/src/a.md", "/out/a.html").id();
        manager.remove(id).unwrap();

        assert!(matches!(manager.remove(id), Err(ResourceError::NotTracked(r)) if r == id));
    }

    #[test]
    fn remove_by_kind_leaves_other_kinds_alone() {
        let mut manager = ResourceManager::new();
        let pages = manager.add_kind("pages");
        let statics = manager.add_kind("static_files");
        manager.add(pages, "/src/a.md", "/out/a.html");
        manager.add(pages, "/src/b.md", "/out/b.html");
        manager.add(statics, "/static/site.css", "/out/static/site.css");

        let removed = manager.remove_by_kind(pages);
        assert_eq!(removed.len(), 2);
        assert!(manager.kind(pages).unwrap().is_empty());
        assert!(manager.by_target(Path::new("/out/a.html")).is_none());
        assert!(manager.by_source(Path::new("/src/b.md")).is_empty());
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.of_kind(statics).len(), 1);
        manager.assert_consistent();
    }

    #[test]
    fn kind_is_reusable_after_remove_by_kind() {
        let (mut manager, pages) = manager_with_kind("pages");
        let old = manager.add(pages, "/src/a.md", "/out/a.html").id();
        manager.remove_by_kind(pages);
        let new = manager.add(pages, "/src/a.md", "/out/a.html").id();

        assert_ne!(old, new);
        assert_eq!(manager.of_kind(pages).len(), 1);
        manager.assert_consistent();
    }

    // =========================================================================
    // ResourceManager::remove_stale_files
    // =========================================================================

    #[test]
    fn sweep_removes_file_whose_source_was_deleted() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src/a.md");
        let target = tmp.path().join("out/a/index.html");
        write_file(&source, "# A");
        write_file(&target, "<h1>A</h1>");

        let (mut manager, pages) = manager_with_kind("pages");
        manager.add(pages, &source, &target);
        fs::remove_file(&source).unwrap();

        let removed = manager.remove_stale_files(&tmp.path().join("out")).unwrap();
        assert_eq!(removed, vec![target.clone()]);
        assert!(!target.exists());
        assert!(!tmp.path().join("out/a").exists(), "empty dir removed");
        assert!(tmp.path().join("out").is_dir(), "root dir kept");
        assert!(manager.is_empty());
        manager.assert_consistent();
    }

    #[test]
    fn sweep_keeps_tracked_file_with_live_source() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src/a.md");
        let target = tmp.path().join("out/a/index.html");
        write_file(&source, "# A");
        write_file(&target, "<h1>A</h1>");

        let (mut manager, pages) = manager_with_kind("pages");
        manager.add(pages, &source, &target);

        let removed = manager.remove_stale_files(&tmp.path().join("out")).unwrap();
        assert!(removed.is_empty());
        assert!(target.is_file());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn sweep_removes_untracked_files_but_keeps_busy_dirs() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src/a.md");
        let kept = tmp.path().join("out/docs/a.html");
        let orphan = tmp.path().join("out/docs/orphan.html");
        let nested_orphan = tmp.path().join("out/old/deep/x.css");
        write_file(&source, "# A");
        write_file(&kept, "a");
        write_file(&orphan, "orphan");
        write_file(&nested_orphan, "x");

        let (mut manager, pages) = manager_with_kind("pages");
        manager.add(pages, &source, &kept);

        let mut removed = manager.remove_stale_files(&tmp.path().join("out")).unwrap();
        removed.sort();
        assert_eq!(removed, vec![orphan.clone(), nested_orphan.clone()]);
        assert!(kept.is_file());
        assert!(!orphan.exists());
        assert!(!tmp.path().join("out/old").exists());
        assert!(tmp.path().join("out/docs").is_dir());
    }

    #[test]
    fn sweep_of_missing_directory_is_a_no_op() {
        let tmp = TempDir::new().unwrap();
        let mut manager = ResourceManager::new();
        let removed = manager.remove_stale_files(&tmp.path().join("nope")).unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn non_empty_directory_is_kept() {
        let tmp = TempDir::new().unwrap();
        write_file(&tmp.path().join("dir/a.txt"), "a");
        remove_dir_if_empty(&tmp.path().join("dir")).unwrap();
        assert!(tmp.path().join("dir/a.txt").is_file());

        remove_dir_if_empty(&tmp.path().join("empty")).unwrap_err();
        fs::create_dir(tmp.path().join("empty")).unwrap();
        remove_dir_if_empty(&tmp.path().join("empty")).unwrap();
        assert!(!tmp.path().join("empty").exists());
    }

    #[test]
    fn other_directory_removal_errors_propagate() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file.txt");
        write_file(&file, "not a directory");

        let err = remove_dir_if_empty(&file).unwrap_err();
        assert_ne!(err.kind(), io::ErrorKind::DirectoryNotEmpty);
        assert!(file.is_file());
    }
}
