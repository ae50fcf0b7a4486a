//! Core type definitions for JSON models

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// Units
// ═══════════════════════════════════════════════════════════════════════════════

/// A named units definition, built from other units
///
/// A definition without any term introduces a new base unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitsDefinition {
    /// Name used by variables and other units definitions
    pub name: String,

    /// Product of terms making up this units
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<UnitTerm>,
}

impl UnitsDefinition {
    /// Create a definition from a list of terms
    pub fn new(name: impl Into<String>, units: Vec<UnitTerm>) -> Self {
        Self {
            name: name.into(),
            units,
        }
    }

    /// Whether this definition introduces a new base unit
    pub fn is_base_unit(&self) -> bool {
        self.units.is_empty()
    }
}

/// One factor of a units definition: `multiplier * (prefix * reference)^exponent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitTerm {
    /// Name of the referenced units (built-in or defined in the model)
    pub reference: String,

    /// SI prefix, by name or as a power of ten
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<UnitPrefix>,

    /// Exponent applied to the prefixed reference (default 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exponent: Option<f64>,

    /// Multiplier applied after exponentiation (default 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
}

impl UnitTerm {
    /// A plain reference to other units
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            prefix: None,
            exponent: None,
            multiplier: None,
        }
    }

    /// Set the prefix by name
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(UnitPrefix::Name(prefix.into()));
        self
    }

    /// Set the exponent
    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = Some(exponent);
        self
    }

    /// Set the multiplier
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    pub fn exponent(&self) -> f64 {
        self.exponent.unwrap_or(1.0)
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier.unwrap_or(1.0)
    }
}

/// Either a named SI prefix (`"milli"`) or a power of ten (`-3`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitPrefix {
    Power(i32),
    Name(String),
}

impl std::fmt::Display for UnitPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Power(power) => write!(f, "{}", power),
            Self::Name(name) => write!(f, "{}", name),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Variables
// ═══════════════════════════════════════════════════════════════════════════════

/// Visibility of a variable across component boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interface {
    /// Visible to the parent and siblings
    Public,
    /// Visible to encapsulated children
    Private,
    /// Visible in both directions
    PublicAndPrivate,
    /// Not visible outside its component
    None,
}

impl Interface {
    pub fn has_public(&self) -> bool {
        matches!(self, Self::Public | Self::PublicAndPrivate)
    }

    pub fn has_private(&self) -> bool {
        matches!(self, Self::Private | Self::PublicAndPrivate)
    }
}

impl std::fmt::Display for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
            Self::PublicAndPrivate => write!(f, "public_and_private"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Initial value of a variable: a literal, or another variable of the same component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitialValue {
    Number(f64),
    Text(String),
}

impl InitialValue {
    /// The literal text of this initial value, if it is a number
    ///
    /// Numeric strings are kept verbatim so that `"1e-3"` is generated as written.
    pub fn literal(&self) -> Option<String> {
        match self {
            Self::Number(value) => Some(value.to_string()),
            Self::Text(text) => {
                let trimmed = text.trim();
                trimmed.parse::<f64>().ok().map(|_| trimmed.to_string())
            }
        }
    }

    /// The name of the referenced variable, if this is not a literal
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(text) => {
                let trimmed = text.trim();
                if trimmed.parse::<f64>().is_ok() {
                    None
                } else {
                    Some(trimmed)
                }
            }
        }
    }
}

impl From<f64> for InitialValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for InitialValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl std::fmt::Display for InitialValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{}", value),
            Self::Text(text) => write!(f, "{}", text),
        }
    }
}

/// A variable declared by a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Variable {
    /// Name, unique within its component
    pub name: String,

    /// Name of the variable's units
    pub units: String,

    /// Optional initial value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<InitialValue>,

    /// Optional interface marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<Interface>,
}

impl Variable {
    pub fn new(name: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: units.into(),
            initial_value: None,
            interface: None,
        }
    }

    pub fn with_initial_value(mut self, value: impl Into<InitialValue>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn with_interface(mut self, interface: Interface) -> Self {
        self.interface = Some(interface);
        self
    }

    /// Whether the variable carries an initial value of any kind
    pub fn is_initialised(&self) -> bool {
        self.initial_value.is_some()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Components
// ═══════════════════════════════════════════════════════════════════════════════

/// Where an imported component comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportSource {
    /// Library key (usually a relative file name) of the source model
    pub url: String,

    /// Name of the component in the source model
    pub component: String,
}

impl std::fmt::Display for ImportSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.url, self.component)
    }
}

/// A component: variables, equations and encapsulated child components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Component {
    /// Name, unique across the whole model
    pub name: String,

    /// Declared variables, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Variable>,

    /// MathML text holding one or more `<math>` elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub math: Option<String>,

    /// Encapsulated child components
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,

    /// Import source, for components defined in another model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import: Option<ImportSource>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            math: None,
            components: Vec::new(),
            import: None,
        }
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn with_math(mut self, math: impl Into<String>) -> Self {
        self.math = Some(math.into());
        self
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    /// Look up a variable by name
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Position of a variable in declaration order
    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    pub fn is_import(&self) -> bool {
        self.import.is_some()
    }

    /// Whether the component has any non-blank math
    pub fn has_math(&self) -> bool {
        self.math.as_ref().is_some_and(|m| !m.trim().is_empty())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Connections
// ═══════════════════════════════════════════════════════════════════════════════

/// A pair of variables declared equivalent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariablePair {
    /// Variable in `component_1`
    pub variable_1: String,

    /// Variable in `component_2`
    pub variable_2: String,
}

/// Equivalences between the variables of two components
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Connection {
    pub component_1: String,
    pub component_2: String,
    pub variables: Vec<VariablePair>,
}

impl Connection {
    pub fn new(component_1: impl Into<String>, component_2: impl Into<String>) -> Self {
        Self {
            component_1: component_1.into(),
            component_2: component_2.into(),
            variables: Vec::new(),
        }
    }

    pub fn with_pair(mut self, variable_1: impl Into<String>, variable_2: impl Into<String>) -> Self {
        self.variables.push(VariablePair {
            variable_1: variable_1.into(),
            variable_2: variable_2.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_value_literal_and_reference() {
        let number: InitialValue = serde_json::from_str("0").unwrap();
        assert_eq!(number.literal().as_deref(), Some("0"));
        assert_eq!(number.variable_name(), None);

        let text: InitialValue = serde_json::from_str("\"1e-3\"").unwrap();
        assert_eq!(text.literal().as_deref(), Some("1e-3"));

        let reference: InitialValue = serde_json::from_str("\"k_init\"").unwrap();
        assert_eq!(reference.literal(), None);
        assert_eq!(reference.variable_name(), Some("k_init"));
    }

    #[test]
    fn test_unit_prefix_forms() {
        let term: UnitTerm =
            serde_json::from_str(r#"{ "reference": "second", "prefix": "milli" }"#).unwrap();
        assert_eq!(term.prefix, Some(UnitPrefix::Name("milli".to_string())));
        assert_eq!(term.exponent(), 1.0);

        let term: UnitTerm =
            serde_json::from_str(r#"{ "reference": "metre", "prefix": -2, "exponent": 3 }"#)
                .unwrap();
        assert_eq!(term.prefix, Some(UnitPrefix::Power(-2)));
        assert_eq!(term.exponent(), 3.0);
    }

    #[test]
    fn test_interface_flags() {
        let interface: Interface = serde_json::from_str("\"public_and_private\"").unwrap();
        assert!(interface.has_public());
        assert!(interface.has_private());
        assert!(!Interface::None.has_public());
    }

    #[test]
    fn test_variable_initial_value_field() {
        let variable: Variable = serde_json::from_str(
            r#"{ "name": "x", "units": "dimensionless", "initial_value": 1.5 }"#,
        )
        .unwrap();
        assert!(variable.is_initialised());
        assert_eq!(variable.initial_value, Some(InitialValue::Number(1.5)));
    }
}
