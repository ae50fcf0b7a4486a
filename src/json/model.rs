//! Main JSON Model struct

use serde::{Deserialize, Serialize};

use crate::json::errors::JsonModelError;
use crate::json::types::*;

/// Supported schema versions
pub const SUPPORTED_SCHEMA_VERSIONS: &[&str] = &["1.0"];

/// A component model defined in JSON
///
/// A model is a tree of named components. Every component declares typed
/// variables and carries its equations as a MathML string; connections make
/// variables of different components equivalent.
///
/// # Example
///
/// ```ignore
/// use cellgen::json::JsonModel;
///
/// let json = r#"{
///     "schema": "1.0",
///     "name": "decay",
///     "components": [{
///         "name": "main",
///         "variables": [
///             { "name": "t", "units": "second" },
///             { "name": "x", "units": "dimensionless", "initial_value": 1 }
///         ],
///         "math": "<math xmlns=\"http://www.w3.org/1998/Math/MathML\">...</math>"
///     }]
/// }"#;
///
/// let model = JsonModel::from_str(json)?;
/// assert_eq!(model.name, "decay");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonModel {
    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────
    /// Schema version (e.g., "1.0")
    pub schema: String,

    /// Model name
    pub name: String,

    // ─────────────────────────────────────────────────────────────────────────
    // Content
    // ─────────────────────────────────────────────────────────────────────────
    /// Units definitions local to this model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<UnitsDefinition>,

    /// Top level components
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,

    /// Variable equivalences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
}

impl JsonModel {
    /// Create an empty model with the current schema version
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: SUPPORTED_SCHEMA_VERSIONS[SUPPORTED_SCHEMA_VERSIONS.len() - 1].to_string(),
            name: name.into(),
            units: Vec::new(),
            components: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Parse a JSON string into a JsonModel
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self, JsonModelError> {
        let model: Self = serde_json::from_str(json)?;
        model.check_schema_version()?;
        Ok(model)
    }

    /// Parse from a JSON Value
    pub fn from_value(value: serde_json::Value) -> Result<Self, JsonModelError> {
        let model: Self = serde_json::from_value(value)?;
        model.check_schema_version()?;
        Ok(model)
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, JsonModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check if the schema version is supported
    fn check_schema_version(&self) -> Result<(), JsonModelError> {
        if !SUPPORTED_SCHEMA_VERSIONS.contains(&self.schema.as_str()) {
            return Err(JsonModelError::UnsupportedSchema {
                version: self.schema.clone(),
                supported: SUPPORTED_SCHEMA_VERSIONS.join(", "),
            });
        }
        Ok(())
    }

    /// All components, depth first, parents before their children
    pub fn components_preorder(&self) -> Vec<&Component> {
        fn walk<'a>(components: &'a [Component], out: &mut Vec<&'a Component>) {
            for component in components {
                out.push(component);
                walk(&component.components, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.components, &mut out);
        out
    }

    /// Find a component anywhere in the tree
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components_preorder()
            .into_iter()
            .find(|c| c.name == name)
    }

    /// Find a variable of a component
    pub fn variable(&self, component: &str, name: &str) -> Option<&Variable> {
        self.component(component).and_then(|c| c.variable(name))
    }

    /// Check if any component is imported from another model
    pub fn has_imports(&self) -> bool {
        self.components_preorder().iter().any(|c| c.is_import())
    }

    /// Find a units definition local to this model
    pub fn units_definition(&self, name: &str) -> Option<&UnitsDefinition> {
        self.units.iter().find(|u| u.name == name)
    }
}
