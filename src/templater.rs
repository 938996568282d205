//! Template rendering with [`minijinja`].
//!
//! Templates are loaded by name from the templates directory. A template may
//! ship a sidecar data file next to it (`page.html` → `page.json`) which is
//! exposed to the template as `data`. Loaded templates and their data are
//! cached until [`Templater::clear_cache`].
//!
//! Rendering takes a list of names: they are tried in order and only a
//! *not found* error falls through to the next one. Syntax errors and
//! render errors are reported immediately.

use minijinja::{Environment, ErrorKind, Value, path_loader};
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("None of the templates could be found: {}", .0.join(", "))]
    NotFound(Vec<String>),
    #[error("Template {name}: {source}")]
    Render {
        name: String,
        source: minijinja::Error,
    },
    #[error("Invalid template data {path}: {source}")]
    Data {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub struct Templater {
    dir: PathBuf,
    env: Environment<'static>,
    data: HashMap<String, JsonValue>,
}

impl Templater {
    /// A templater loading from `dir`, with `globals` visible to every template.
    pub fn new(dir: &Path, globals: &Map<String, JsonValue>) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(dir));
        for (name, value) in globals {
            env.add_global(name.clone(), Value::from_serialize(value));
        }
        env.add_filter("todict", to_dict);
        Self {
            dir: dir.to_path_buf(),
            env,
            data: HashMap::new(),
        }
    }

    /// Forget loaded templates and sidecar data so edits are picked up.
    pub fn clear_cache(&mut self) {
        self.env.clear_templates();
        self.data.clear();
    }

    /// Render the first template of `names` that exists.
    pub fn render(
        &mut self,
        names: &[String],
        variables: &Map<String, JsonValue>,
    ) -> Result<String, TemplateError> {
        let mut missing = Vec::new();
        for name in names {
            let template = match self.env.get_template(name) {
                Ok(template) => template,
                Err(e) if e.kind() == ErrorKind::TemplateNotFound => {
                    missing.push(name.clone());
                    continue;
                }
                Err(source) => {
                    return Err(TemplateError::Render {
                        name: name.clone(),
                        source,
                    });
                }
            };

            let data = template_data(&self.dir, &mut self.data, name)?;
            let mut context = variables.clone();
            context.insert("data".to_string(), data);
            return template
                .render(&context)
                .map_err(|source| TemplateError::Render {
                    name: name.clone(),
                    source,
                });
        }
        Err(TemplateError::NotFound(missing))
    }
}

/// Sidecar data for `name`: `<stem>.json` beside the template, or `{}`.
fn template_data(
    dir: &Path,
    cache: &mut HashMap<String, JsonValue>,
    name: &str,
) -> Result<JsonValue, TemplateError> {
    if let Some(data) = cache.get(name) {
        return Ok(data.clone());
    }
    let path = dir.join(Path::new(name).with_extension("json"));
    let data = if path.is_file() {
        let text = std::fs::read_to_string(&path)?;
        serde_json::from_str(&text).map_err(|source| TemplateError::Data {
            path: path.clone(),
            source,
        })?
    } else {
        JsonValue::Object(Map::new())
    };
    cache.insert(name.to_string(), data.clone());
    Ok(data)
}

/// `items|todict("key")`: a mapping from each item's `key` to the item.
fn to_dict(items: Option<Vec<Value>>, key: &str) -> Result<Value, minijinja::Error> {
    let mut map = BTreeMap::new();
    for item in items.unwrap_or_default() {
        let k = item.get_attr(key)?;
        map.insert(k.to_string(), item);
    }
    Ok(Value::from_serialize(&map))
}
