//! JSON Model Definition
//!
//! This module provides the persisted form of a component model: a JSON
//! document holding units definitions, a tree of components and the
//! connections that make variables of different components equivalent.
//!
//! # Overview
//!
//! A component declares typed variables and carries its equations as a
//! MathML string. Components nest; a component may also be imported from
//! another model document held in a [`ModelLibrary`]. Before analysis a model
//! is flattened (imports resolved) and validated.
//!
//! # Quick Start
//!
//! ```ignore
//! use cellgen::json::{parse_json, validate_json};
//!
//! let json = r#"{
//!     "schema": "1.0",
//!     "name": "decay",
//!     "components": [{
//!         "name": "main",
//!         "variables": [
//!             { "name": "t", "units": "second" },
//!             { "name": "x", "units": "dimensionless", "initial_value": 1 }
//!         ],
//!         "math": "<math>...</math>"
//!     }]
//! }"#;
//!
//! // Parse and validate
//! let validated = validate_json(json)?;
//! println!("Valid model: {}", validated.inner().name);
//! ```
//!
//! # Imports
//!
//! ```ignore
//! use cellgen::json::{JsonModel, ModelLibrary};
//!
//! let library = ModelLibrary::from_dir(Path::new("models"))?;
//!
//! // Every { "import": { "url": ..., "component": ... } } is replaced by a copy
//! let flat = library.resolve_imports(&JsonModel::from_str(json)?)?;
//! ```
//!
//! # JSON Schema
//!
//! ## Model
//!
//! | Field | Description |
//! |-------|-------------|
//! | `schema` | Schema version (currently `"1.0"`) |
//! | `name` | Model name |
//! | `units` | Units definitions (optional) |
//! | `components` | Top level components (optional) |
//! | `connections` | Variable equivalences (optional) |
//!
//! ## Component
//!
//! | Field | Description |
//! |-------|-------------|
//! | `name` | Name, unique across the model |
//! | `variables` | `{ name, units, initial_value?, interface? }` entries |
//! | `math` | MathML string with one or more `<math>` elements |
//! | `components` | Encapsulated children |
//! | `import` | `{ url, component }` of an imported definition |
//!
//! ## Units
//!
//! A units definition is a product of `{ reference, prefix?, exponent?,
//! multiplier? }` terms; a definition without terms is a new base unit.
//! `prefix` is an SI prefix name (`"milli"`) or a power of ten (`-3`).
//!
//! # Error Handling
//!
//! All functions return `Result<T, JsonModelError>` with descriptive errors:
//!
//! ```ignore
//! match validate_json(json) {
//!     Ok(model) => println!("Valid model: {}", model.inner().name),
//!     Err(JsonModelError::UndefinedVariable { name, component, .. }) => {
//!         eprintln!("No variable {} in {}", name, component);
//!     }
//!     Err(JsonModelError::UnsupportedSchema { version, .. }) => {
//!         eprintln!("Schema {} not supported", version);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

mod errors;
pub mod library;
mod model;
mod types;
mod validation;

pub use errors::JsonModelError;
pub use library::ModelLibrary;
pub use model::{JsonModel, SUPPORTED_SCHEMA_VERSIONS};
pub use types::*;
pub use validation::{ValidatedModel, Validator};

/// Parse a JSON string into a JsonModel
pub fn parse_json(json: &str) -> Result<JsonModel, JsonModelError> {
    JsonModel::from_str(json)
}

/// Parse and validate a JSON model
pub fn validate_json(json: &str) -> Result<ValidatedModel, JsonModelError> {
    let model = JsonModel::from_str(json)?;
    let validator = Validator::new();
    validator.validate(&model)
}

/// Parse a JSON model, resolve its imports against `library` and validate it
pub fn resolve_json(json: &str, library: &ModelLibrary) -> Result<ValidatedModel, JsonModelError> {
    let model = JsonModel::from_str(json)?;
    let flat = library.resolve_imports(&model)?;
    Validator::new().validate(&flat)
}
