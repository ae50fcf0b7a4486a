//! Error types for JSON model parsing, validation and import resolution

use thiserror::Error;

use crate::mathml::MathError;
use crate::units::UnitsError;

/// Errors that can occur when working with JSON models
#[derive(Debug, Error)]
pub enum JsonModelError {
    // ─────────────────────────────────────────────────────────────────────────
    // Parsing Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to parse JSON
    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Unsupported schema version
    #[error("Unsupported schema version '{version}'. Supported versions: {supported}")]
    UnsupportedSchema { version: String, supported: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Structural Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Missing or empty required field
    #[error("Missing required field '{field}' in {context}")]
    MissingField { field: String, context: String },

    /// Duplicate component name anywhere in the component tree
    #[error("Duplicate component name: '{name}'")]
    DuplicateComponent { name: String },

    /// Duplicate variable name within one component
    #[error("Duplicate variable name '{name}' in component '{component}'")]
    DuplicateVariable { name: String, component: String },

    /// Duplicate units definition
    #[error("Duplicate units definition: '{name}'")]
    DuplicateUnits { name: String },

    /// A model units definition reuses a built-in name
    #[error("Units '{name}' redefine built-in units")]
    BuiltinUnitsRedefined { name: String },

    /// Component still carries an import after resolution was expected
    #[error("Component '{component}' imports '{import}' which has not been resolved")]
    UnresolvedImport { component: String, import: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Semantic Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Undefined component referenced by a connection
    #[error("Undefined component '{name}' referenced in {context}")]
    UndefinedComponent { name: String, context: String },

    /// Undefined variable referenced by a connection or an initial value
    #[error("Undefined variable '{name}' in component '{component}' referenced in {context}")]
    UndefinedVariable {
        name: String,
        component: String,
        context: String,
    },

    /// A connection joins a component to itself
    #[error("Connection joins component '{component}' to itself")]
    SelfConnection { component: String },

    /// Equivalent variables with units that do not share a dimension
    #[error(
        "Variable '{variable_1}' in component '{component_1}' and variable '{variable_2}' \
         in component '{component_2}' have incompatible units"
    )]
    IncompatibleConnection {
        component_1: String,
        variable_1: String,
        component_2: String,
        variable_2: String,
    },

    /// Variable declared but never used in math or connections (strict mode)
    #[error("Variable '{name}' in component '{component}' is never used")]
    UnusedVariable { name: String, component: String },

    /// Connected variable without an interface marker (strict mode)
    #[error("Variable '{name}' in component '{component}' is connected but has no interface")]
    MissingInterface { name: String, component: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Units Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Units resolution failed
    #[error("Units error: {0}")]
    Units(#[from] UnitsError),

    // ─────────────────────────────────────────────────────────────────────────
    // Math Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid MathML in a component
    #[error("Invalid math in component '{component}': {source}")]
    InvalidMath {
        component: String,
        #[source]
        source: MathError,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Library Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Imported document not found in library
    #[error("Import '{0}' not found in library")]
    ImportNotFound(String),

    /// Imported document has no such component
    #[error("Component '{component}' not found in imported model '{url}'")]
    ImportedComponentNotFound { url: String, component: String },

    /// Circular import detected
    #[error("Circular import detected: {0}")]
    CircularImport(String),

    /// General library error (file I/O, etc.)
    #[error("Library error: {0}")]
    LibraryError(String),
}

impl JsonModelError {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            context: context.into(),
        }
    }

    /// Create a duplicate component error
    pub fn duplicate_component(name: impl Into<String>) -> Self {
        Self::DuplicateComponent { name: name.into() }
    }

    /// Create a duplicate variable error
    pub fn duplicate_variable(name: impl Into<String>, component: impl Into<String>) -> Self {
        Self::DuplicateVariable {
            name: name.into(),
            component: component.into(),
        }
    }

    /// Create an undefined component error
    pub fn undefined_component(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UndefinedComponent {
            name: name.into(),
            context: context.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_variable(
        name: impl Into<String>,
        component: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::UndefinedVariable {
            name: name.into(),
            component: component.into(),
            context: context.into(),
        }
    }

    /// Create an invalid math error
    pub fn invalid_math(component: impl Into<String>, source: MathError) -> Self {
        Self::InvalidMath {
            component: component.into(),
            source,
        }
    }
}
