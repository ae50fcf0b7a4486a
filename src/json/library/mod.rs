//! Model Library
//!
//! Holds the model documents that components may be imported from, keyed by
//! the URL used in `import` blocks, and flattens models that import from them.
//!
//! # Example
//!
//! ```rust,ignore
//! use cellgen::json::library::ModelLibrary;
//!
//! let library = ModelLibrary::from_dir(Path::new("models"))?;
//!
//! // List available documents
//! for url in library.list() {
//!     println!("Available: {}", url);
//! }
//!
//! // Replace every imported component by its definition
//! let flat = library.resolve_imports(&model)?;
//! assert!(!flat.has_imports());
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, warn};

use crate::json::errors::JsonModelError;
use crate::json::model::JsonModel;
use crate::json::types::{Component, Connection, ImportSource, UnitsDefinition};

/// A registry of JSON model documents
#[derive(Debug, Clone)]
pub struct ModelLibrary {
    models: HashMap<String, JsonModel>,
}

impl ModelLibrary {
    /// Create a new empty library
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Load models from a directory (recursively searches for .json files)
    ///
    /// Each model is keyed by its path relative to `path`, with `/` separators.
    pub fn from_dir(path: &Path) -> Result<Self, JsonModelError> {
        let mut library = Self::new();
        library.load_dir(path)?;
        Ok(library)
    }

    /// Load models from a directory into this library
    pub fn load_dir(&mut self, path: &Path) -> Result<(), JsonModelError> {
        if !path.exists() {
            return Err(JsonModelError::LibraryError(format!(
                "Directory not found: {}",
                path.display()
            )));
        }

        Self::load_dir_recursive(path, path, &mut self.models)?;
        Ok(())
    }

    fn load_dir_recursive(
        root: &Path,
        path: &Path,
        models: &mut HashMap<String, JsonModel>,
    ) -> Result<(), JsonModelError> {
        let entries = std::fs::read_dir(path).map_err(|e| {
            JsonModelError::LibraryError(format!("Failed to read directory: {}", e))
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| {
                JsonModelError::LibraryError(format!("Failed to read entry: {}", e))
            })?;
            let file_path = entry.path();

            if file_path.is_dir() {
                Self::load_dir_recursive(root, &file_path, models)?;
            } else if file_path.extension().is_some_and(|ext| ext == "json") {
                let content = std::fs::read_to_string(&file_path).map_err(|e| {
                    JsonModelError::LibraryError(format!(
                        "Failed to read {}: {}",
                        file_path.display(),
                        e
                    ))
                })?;

                let url = file_path
                    .strip_prefix(root)
                    .unwrap_or(file_path.as_path())
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                match JsonModel::from_str(&content) {
                    Ok(model) => {
                        debug!(url = %url, model = %model.name, "loaded model");
                        models.insert(url, model);
                    }
                    Err(e) => {
                        warn!(path = %file_path.display(), error = %e, "skipping unparsable model");
                    }
                }
            }
        }

        Ok(())
    }

    /// Get a model by URL
    pub fn get(&self, url: &str) -> Option<&JsonModel> {
        self.models.get(url)
    }

    /// Check if a model exists
    pub fn contains(&self, url: &str) -> bool {
        self.models.contains_key(url)
    }

    /// Add a model to the library under `url`
    pub fn add(&mut self, url: impl Into<String>, model: JsonModel) {
        self.models.insert(url.into(), model);
    }

    /// Remove a model from the library
    pub fn remove(&mut self, url: &str) -> Option<JsonModel> {
        self.models.remove(url)
    }

    /// List all model URLs
    pub fn list(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        urls.sort();
        urls
    }

    /// Get the number of models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if the library is empty
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Flatten a model, replacing every imported component by a copy of its
    /// definition
    ///
    /// The copy takes the importing component's name and keeps the importing
    /// component's children. Connections inside an imported subtree and the
    /// units definitions of the imported document come along. Component names
    /// that would clash get a numeric suffix.
    pub fn resolve_imports(&self, model: &JsonModel) -> Result<JsonModel, JsonModelError> {
        if !model.has_imports() {
            return Ok(model.clone());
        }

        let mut state = Flattening {
            taken: model
                .components_preorder()
                .iter()
                .map(|c| c.name.clone())
                .collect(),
            connections: Vec::new(),
            units: model.units.clone(),
            chain: Vec::new(),
        };

        let mut names = HashMap::new();
        let mut components = Vec::with_capacity(model.components.len());
        for component in &model.components {
            components.push(self.expand(component, None, true, &mut names, &mut state)?);
        }

        let mut connections = remap_connections(&model.connections, &names);
        connections.append(&mut state.connections);

        Ok(JsonModel {
            schema: model.schema.clone(),
            name: model.name.clone(),
            units: state.units,
            components,
            connections,
        })
    }

    /// Expand one component, recursively resolving imports
    ///
    /// `names` maps the component names of the enclosing document to their
    /// final names.
    fn expand(
        &self,
        component: &Component,
        forced_name: Option<String>,
        keep_name: bool,
        names: &mut HashMap<String, String>,
        state: &mut Flattening,
    ) -> Result<Component, JsonModelError> {
        let name = match forced_name {
            Some(name) => name,
            None if keep_name => component.name.clone(),
            None => state.unique(&component.name),
        };
        names.insert(component.name.clone(), name.clone());

        let mut expanded = match &component.import {
            Some(import) => self.import(import, name.clone(), state)?,
            None => Component {
                name,
                variables: component.variables.clone(),
                math: component.math.clone(),
                components: Vec::new(),
                import: None,
            },
        };

        for child in &component.components {
            let child = self.expand(child, None, keep_name, names, state)?;
            expanded.components.push(child);
        }

        Ok(expanded)
    }

    /// Copy an imported component under `name`
    fn import(
        &self,
        source: &ImportSource,
        name: String,
        state: &mut Flattening,
    ) -> Result<Component, JsonModelError> {
        let key = source.to_string();
        if state.chain.contains(&key) {
            return Err(JsonModelError::CircularImport(format!(
                "{} -> {}",
                state.chain.join(" -> "),
                key
            )));
        }

        let document = self
            .get(&source.url)
            .ok_or_else(|| JsonModelError::ImportNotFound(source.url.clone()))?;
        let component = document.component(&source.component).ok_or_else(|| {
            JsonModelError::ImportedComponentNotFound {
                url: source.url.clone(),
                component: source.component.clone(),
            }
        })?;

        debug!(import = %key, name = %name, "resolving import");
        state.chain.push(key);

        let mut names = HashMap::new();
        let copy = self.expand(component, Some(name), false, &mut names, state)?;

        state.chain.pop();

        let inner: Vec<Connection> = document
            .connections
            .iter()
            .filter(|c| names.contains_key(&c.component_1) && names.contains_key(&c.component_2))
            .cloned()
            .collect();
        state
            .connections
            .extend(remap_connections(&inner, &names));

        for definition in &document.units {
            state.add_units(definition);
        }

        Ok(copy)
    }
}

impl Default for ModelLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulated state while flattening one model
struct Flattening {
    taken: HashSet<String>,
    connections: Vec<Connection>,
    units: Vec<UnitsDefinition>,
    chain: Vec<String>,
}

impl Flattening {
    /// Reserve a component name, adding a numeric suffix when it is taken
    fn unique(&mut self, name: &str) -> String {
        let mut candidate = name.to_string();
        let mut suffix = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}_{}", name, suffix);
            suffix += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }

    /// Add an imported units definition unless one with that name exists
    fn add_units(&mut self, definition: &UnitsDefinition) {
        if self.units.iter().all(|u| u.name != definition.name) {
            self.units.push(definition.clone());
        }
    }
}

/// Rename connection end points, keeping only connections whose components
/// were both renamed
fn remap_connections(
    connections: &[Connection],
    names: &HashMap<String, String>,
) -> Vec<Connection> {
    connections
        .iter()
        .filter_map(|connection| {
            Some(Connection {
                component_1: names.get(&connection.component_1)?.clone(),
                component_2: names.get(&connection.component_2)?.clone(),
                variables: connection.variables.clone(),
            })
        })
        .collect()
}
