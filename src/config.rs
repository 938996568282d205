//! Site configuration module.
//!
//! Handles loading, validating and layering `config.toml`, then resolving it
//! into a [`Context`]: absolute paths plus the global template variables.
//!
//! Layers, lowest first:
//!
//! 1. stock defaults ([`SiteConfig::default`])
//! 2. `config.toml` in the input directory (or the file given with `--config`)
//! 3. command-line overrides ([`Overrides`])
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//! output_dir = "build"
//! pages_dir = "pages"
//! templates_dir = "templates"
//! static_dirs = ["static"]
//! global_vars = "data/globals.json"
//! datasets_dir = "data"
//! template = "page"
//! path_prefix = ""
//! enable_snippets = true
//! downgrade_headings = false
//! title_as_heading = false
//!
//! [variables]        # extra global template variables
//! [interlinks]       # name = "https://..." for `name>path` links
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the input directory when none is given.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Config file not found: {0}")]
    MissingFile(PathBuf),
    #[error("{name}: directory \"{path}\" does not exist")]
    MissingDirectory { name: &'static str, path: PathBuf },
    #[error("Invalid global variables file {path}: {message}")]
    GlobalVars { path: PathBuf, message: String },
    #[error("Output directory \"{output}\" contains {name} \"{path}\"")]
    OverlappingOutput {
        output: PathBuf,
        name: &'static str,
        path: PathBuf,
    },
}

/// Site configuration loaded from `config.toml`.
///
/// Paths are kept as written; [`Context::resolve`] makes them absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Where the site is written.
    pub output_dir: String,
    /// Markdown and HTML sources.
    pub pages_dir: String,
    pub templates_dir: String,
    /// JSON object of global template variables.
    pub global_vars: String,
    /// Directory of `<name>.json` datasets pages can request.
    pub datasets_dir: String,
    /// Default template name, without `.html`.
    pub template: String,
    /// Sub-path of the output directory the site lives under.
    pub path_prefix: String,
    /// Substitute `[Snippet: name]` markers in page bodies.
    pub enable_snippets: bool,
    /// Shift every heading one level down (h1 → h2, ...).
    pub downgrade_headings: bool,
    /// Prepend the page title as `<h1>` when the body has none.
    pub title_as_heading: bool,
    /// Directories copied verbatim to `<output>/<dir name>/`.
    pub static_dirs: Vec<String>,
    pub variables: toml::Table,
    pub interlinks: BTreeMap<String, String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            output_dir: "build".to_string(),
            pages_dir: "pages".to_string(),
            templates_dir: "templates".to_string(),
            global_vars: "data/globals.json".to_string(),
            datasets_dir: "data".to_string(),
            template: "page".to_string(),
            path_prefix: String::new(),
            enable_snippets: true,
            downgrade_headings: false,
            title_as_heading: false,
            static_dirs: vec!["static".to_string()],
            variables: toml::Table::new(),
            interlinks: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("output_dir", &self.output_dir),
            ("pages_dir", &self.pages_dir),
            ("templates_dir", &self.templates_dir),
            ("template", &self.template),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }
        if self.static_dirs.iter().any(|d| d.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "static_dirs must not contain empty paths".into(),
            ));
        }
        Ok(())
    }

    /// `path_prefix` without leading or trailing slashes.
    pub fn normalized_path_prefix(&self) -> &str {
        self.path_prefix.trim_matches('/')
    }
}

/// Values given on the command line; they win over `config.toml`.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub pages_dir: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    /// Appended to the configured static directories.
    pub static_dirs: Vec<PathBuf>,
    pub template: Option<String>,
    pub path_prefix: Option<String>,
}

impl Overrides {
    /// The overrides as a TOML overlay. `configured_static` is the user
    /// file's `static_dirs`, which the command-line dirs extend.
    pub fn to_overlay(&self, configured_static: Option<&toml::Value>) -> toml::Value {
        let path = |p: &PathBuf| toml::Value::String(p.to_string_lossy().into_owned());
        let mut table = toml::Table::new();

        let paths = [
            ("output_dir", &self.output_dir),
            ("pages_dir", &self.pages_dir),
            ("templates_dir", &self.templates_dir),
        ];
        for (key, value) in paths {
            if let Some(value) = value {
                table.insert(key.to_string(), path(value));
            }
        }
        if let Some(template) = &self.template {
            table.insert("template".into(), toml::Value::String(template.clone()));
        }
        if let Some(prefix) = &self.path_prefix {
            table.insert("path_prefix".into(), toml::Value::String(prefix.clone()));
        }
        if !self.static_dirs.is_empty() {
            let mut dirs = configured_static
                .and_then(toml::Value::as_array)
                .cloned()
                .unwrap_or_default();
            dirs.extend(self.static_dirs.iter().map(path));
            table.insert("static_dirs".into(), toml::Value::Array(dirs));
        }
        toml::Value::Table(table)
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the site config for `input_dir`.
///
/// `config_file` (relative to `input_dir`) must exist when given; otherwise
/// `config.toml` is used if present. Command-line overrides go on top.
pub fn load_config(
    input_dir: &Path,
    config_file: Option<&Path>,
    overrides: &Overrides,
) -> Result<SiteConfig, ConfigError> {
    let user = match config_file {
        Some(file) => {
            let path = resolve_path(input_dir, file);
            Some(load_raw_config(&path)?.ok_or(ConfigError::MissingFile(path))?)
        }
        None => load_raw_config(&input_dir.join(CONFIG_FILE))?,
    };

    let overlay = overrides.to_overlay(user.as_ref().and_then(|u| u.get("static_dirs")));
    let base = match user {
        Some(user) => merge_toml(stock_defaults_value(), user),
        None => stock_defaults_value(),
    };
    resolve_config(base, Some(overlay))
}

/// Absolute form of `path`: `~` expands to `$HOME`, relative paths hang
/// off `base`.
pub fn resolve_path(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

/// Output directory for `config` (the directory `purge` removes).
pub fn output_dir(input_dir: &Path, config: &SiteConfig) -> PathBuf {
    resolve_path(input_dir, &config.output_dir)
}

/// A resolved site: absolute paths, global variables, rendering switches.
#[derive(Debug, Clone)]
pub struct Context {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// `output_dir/path_prefix`; every generated file lives below it.
    pub output_root: PathBuf,
    pub pages_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub static_dirs: Vec<PathBuf>,
    /// `None` when the datasets directory does not exist.
    pub datasets_dir: Option<PathBuf>,
    pub global_vars: Map<String, JsonValue>,
    pub interlinks: BTreeMap<String, String>,
    pub default_template: String,
    pub path_prefix: String,
    pub enable_snippets: bool,
    pub downgrade_headings: bool,
    pub title_as_heading: bool,
    /// Non-fatal problems found while resolving.
    pub warnings: Vec<String>,
}

impl Context {
    /// Resolve `config` against `input_dir`.
    ///
    /// Pages and templates directories must exist. Configured static
    /// directories must exist too, except the stock `static` one, which is
    /// dropped when absent. A missing globals file or datasets directory
    /// degrades to empty defaults. The output directory may not be or
    /// contain any source directory, since builds sweep it and `purge`
    /// deletes it.
    pub fn resolve(input_dir: &Path, config: &SiteConfig) -> Result<Self, ConfigError> {
        let input_dir = std::path::absolute(input_dir)?;
        let defaults = SiteConfig::default();
        let mut warnings = Vec::new();

        let output_dir = output_dir(&input_dir, config);
        let prefix = config.normalized_path_prefix();
        let output_root = if prefix.is_empty() {
            output_dir.clone()
        } else {
            output_dir.join(prefix)
        };

        let pages_dir = existing_dir(&input_dir, "pages_dir", &config.pages_dir)?;
        let templates_dir = existing_dir(&input_dir, "templates_dir", &config.templates_dir)?;

        let mut static_dirs = Vec::new();
        for dir in &config.static_dirs {
            let path = resolve_path(&input_dir, dir);
            if path.is_dir() {
                static_dirs.push(path);
            } else if config.static_dirs != defaults.static_dirs {
                return Err(ConfigError::MissingDirectory {
                    name: "static_dirs",
                    path,
                });
            }
        }

        let datasets_path = resolve_path(&input_dir, &config.datasets_dir);
        let mut sources = vec![
            ("input_dir", input_dir.as_path()),
            ("pages_dir", pages_dir.as_path()),
            ("templates_dir", templates_dir.as_path()),
            ("datasets_dir", datasets_path.as_path()),
        ];
        sources.extend(static_dirs.iter().map(|dir| ("static_dirs", dir.as_path())));
        check_output_dir(&output_dir, &sources)?;

        let datasets_dir = Some(datasets_path).filter(|path| path.is_dir());

        let globals_path = resolve_path(&input_dir, &config.global_vars);
        let mut global_vars = if globals_path.is_file() {
            load_global_vars(&globals_path)?
        } else {
            if config.global_vars != defaults.global_vars {
                warnings.push(format!(
                    "global_vars: file \"{}\" does not exist",
                    globals_path.display()
                ));
            }
            Map::new()
        };
        for (key, value) in &config.variables {
            let value = serde_json::to_value(value).map_err(|e| ConfigError::GlobalVars {
                path: globals_path.clone(),
                message: e.to_string(),
            })?;
            global_vars.insert(key.clone(), value);
        }

        let mut interlinks: BTreeMap<String, String> = global_vars
            .get("interlinks")
            .and_then(JsonValue::as_object)
            .map(|links| {
                links
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        interlinks.extend(config.interlinks.clone());

        Ok(Self {
            input_dir,
            output_dir,
            output_root,
            pages_dir,
            templates_dir,
            static_dirs,
            datasets_dir,
            global_vars,
            interlinks,
            default_template: config.template.clone(),
            path_prefix: prefix.to_string(),
            enable_snippets: config.enable_snippets,
            downgrade_headings: config.downgrade_headings,
            title_as_heading: config.title_as_heading,
            warnings,
        })
    }
}

/// Fail when `output_dir` is, or lies above, one of the named `sources`.
/// Paths are compared lexically after resolving `.` and `..`.
pub fn check_output_dir(
    output_dir: &Path,
    sources: &[(&'static str, &Path)],
) -> Result<(), ConfigError> {
    let output = normalize(output_dir);
    for &(name, path) in sources {
        if normalize(path).starts_with(&output) {
            return Err(ConfigError::OverlappingOutput {
                output: output_dir.to_path_buf(),
                name,
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn existing_dir(input_dir: &Path, name: &'static str, value: &str) -> Result<PathBuf, ConfigError> {
    let path = resolve_path(input_dir, value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(ConfigError::MissingDirectory { name, path })
    }
}

fn load_global_vars(path: &Path) -> Result<Map<String, JsonValue>, ConfigError> {
    let text = fs::read_to_string(path)?;
    let invalid = |message: String| ConfigError::GlobalVars {
        path: path.to_path_buf(),
        message,
    };
    match serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))? {
        JsonValue::Object(map) => Ok(map),
        _ => Err(invalid("expected a JSON object".to_string())),
    }
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Web Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Relative paths are resolved against
# the input directory (--input). Unknown keys cause an error.

# Where the generated site is written.
output_dir = "build"

# Markdown (.md, .mkd) and HTML (.html, .htm) pages.
pages_dir = "pages"

# Jinja templates. A template may have a sidecar data file
# (page.html -> page.json) available to it as `data`.
templates_dir = "templates"

# Directories copied verbatim to <output>/<directory name>/.
# A missing "static" directory is ignored; any other must exist.
static_dirs = ["static"]

# JSON object of global template variables. Optional.
global_vars = "data/globals.json"

# Pages list datasets in their metadata (`Datasets: menu, people`);
# each is loaded from <datasets_dir>/<name>.json.
datasets_dir = "data"

# Template used when a page does not set `Template:` (without ".html").
template = "page"

# Publish the site under a sub-path: with "docs/v1" pages are written to
# <output_dir>/docs/v1/. Leading and trailing slashes are ignored.
path_prefix = ""

# Replace `[Snippet: name]` in page bodies with templates/snippets/name.html.
enable_snippets = true

# Shift every heading one level down (h1 -> h2, ..., h5 -> h6).
downgrade_headings = false

# Add the page title as <h1> when a page has no h1 heading.
title_as_heading = false

# ---------------------------------------------------------------------------
# Extra global template variables (merged over global_vars).
# ---------------------------------------------------------------------------
[variables]
# site_name = "Example"

# ---------------------------------------------------------------------------
# Interlinks: `href="docs>api/"` becomes "https://docs.example.org/api/".
# `this>` always points at the site root.
# ---------------------------------------------------------------------------
[interlinks]
# docs = "https://docs.example.org/"
"##
}
