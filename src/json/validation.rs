//! Validation for JSON models

use std::collections::HashSet;

use crate::json::errors::JsonModelError;
use crate::json::model::JsonModel;
use crate::json::types::*;
use crate::mathml::{parse_math, MathElement};
use crate::units::{is_builtin, UnitsError, UnitsRegistry};

/// A validated JSON model
///
/// This wrapper type guarantees that the contained model has passed
/// all validation checks and is ready for analysis.
#[derive(Debug, Clone)]
pub struct ValidatedModel(JsonModel);

impl ValidatedModel {
    /// Get the inner JsonModel
    pub fn inner(&self) -> &JsonModel {
        &self.0
    }

    /// Consume the wrapper and return the inner JsonModel
    pub fn into_inner(self) -> JsonModel {
        self.0
    }
}

/// Validator for JSON models
pub struct Validator {
    /// Whether to treat warnings as errors
    strict: bool,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Create a strict validator that treats warnings as errors
    ///
    /// Strict validation also rejects unused variables and connected
    /// variables without an interface marker.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Validate a JSON model
    pub fn validate(&self, model: &JsonModel) -> Result<ValidatedModel, JsonModelError> {
        // 1. Validate names
        self.validate_names(model)?;

        // 2. Validate units definitions
        let registry = self.validate_units(model)?;

        // 3. Validate components and their variables
        for component in model.components_preorder() {
            self.validate_component(component, &registry)?;
        }

        // 4. Validate math
        let mut used = HashSet::new();
        for component in model.components_preorder() {
            self.validate_math(component, &mut used)?;
        }

        // 5. Validate connections
        self.validate_connections(model, &registry, &mut used)?;

        if self.strict {
            self.validate_usage(model, &used)?;
        }

        Ok(ValidatedModel(model.clone()))
    }

    /// Validate the model name and component names
    fn validate_names(&self, model: &JsonModel) -> Result<(), JsonModelError> {
        if model.name.trim().is_empty() {
            return Err(JsonModelError::missing_field("name", "model"));
        }

        let mut seen = HashSet::new();
        for component in model.components_preorder() {
            if component.name.trim().is_empty() {
                return Err(JsonModelError::missing_field(
                    "name",
                    format!("a component of model '{}'", model.name),
                ));
            }
            if !seen.insert(component.name.as_str()) {
                return Err(JsonModelError::duplicate_component(&component.name));
            }
        }

        Ok(())
    }

    /// Validate units definitions and build the units registry
    fn validate_units(&self, model: &JsonModel) -> Result<UnitsRegistry, JsonModelError> {
        let mut seen = HashSet::new();
        for definition in &model.units {
            if is_builtin(&definition.name) {
                return Err(JsonModelError::BuiltinUnitsRedefined {
                    name: definition.name.clone(),
                });
            }
            if !seen.insert(definition.name.as_str()) {
                return Err(JsonModelError::DuplicateUnits {
                    name: definition.name.clone(),
                });
            }
        }

        Ok(UnitsRegistry::new(&model.units)?)
    }

    /// Validate one component
    fn validate_component(
        &self,
        component: &Component,
        registry: &UnitsRegistry,
    ) -> Result<(), JsonModelError> {
        if let Some(import) = &component.import {
            return Err(JsonModelError::UnresolvedImport {
                component: component.name.clone(),
                import: import.to_string(),
            });
        }

        let mut seen = HashSet::new();
        for variable in &component.variables {
            if variable.name.trim().is_empty() {
                return Err(JsonModelError::missing_field(
                    "name",
                    format!("a variable of component '{}'", component.name),
                ));
            }
            if !seen.insert(variable.name.as_str()) {
                return Err(JsonModelError::duplicate_variable(
                    &variable.name,
                    &component.name,
                ));
            }
            if !registry.contains(&variable.units) {
                return Err(UnitsError::UnknownUnits(variable.units.clone()).into());
            }
        }

        for variable in &component.variables {
            let Some(reference) = variable.initial_value.as_ref().and_then(|v| v.variable_name())
            else {
                continue;
            };
            if component.variable(reference).is_none() {
                return Err(JsonModelError::undefined_variable(
                    reference,
                    &component.name,
                    format!("the initial value of '{}'", variable.name),
                ));
            }
        }

        Ok(())
    }

    /// Validate the MathML of a component, recording the variables it uses
    fn validate_math<'a>(
        &self,
        component: &'a Component,
        used: &mut HashSet<(&'a str, String)>,
    ) -> Result<(), JsonModelError> {
        let Some(math) = &component.math else {
            return Ok(());
        };

        let roots =
            parse_math(math).map_err(|e| JsonModelError::invalid_math(&component.name, e))?;

        fn collect(element: &MathElement, names: &mut Vec<String>) {
            if element.is("ci") {
                names.push(element.text.clone());
            }
            for child in &element.children {
                collect(child, names);
            }
        }

        let mut names = Vec::new();
        for root in &roots {
            collect(root, &mut names);
        }
        for name in names {
            used.insert((component.name.as_str(), name));
        }

        for variable in &component.variables {
            if let Some(reference) = variable.initial_value.as_ref().and_then(|v| v.variable_name())
            {
                used.insert((component.name.as_str(), reference.to_string()));
            }
        }

        Ok(())
    }

    /// Validate connections
    fn validate_connections<'a>(
        &self,
        model: &'a JsonModel,
        registry: &UnitsRegistry,
        used: &mut HashSet<(&'a str, String)>,
    ) -> Result<(), JsonModelError> {
        for connection in &model.connections {
            let context = format!(
                "connection between '{}' and '{}'",
                connection.component_1, connection.component_2
            );
            let component_1 = model
                .component(&connection.component_1)
                .ok_or_else(|| JsonModelError::undefined_component(&connection.component_1, &context))?;
            let component_2 = model
                .component(&connection.component_2)
                .ok_or_else(|| JsonModelError::undefined_component(&connection.component_2, &context))?;

            if component_1.name == component_2.name {
                return Err(JsonModelError::SelfConnection {
                    component: component_1.name.clone(),
                });
            }

            if connection.variables.is_empty() {
                return Err(JsonModelError::missing_field("variables", context));
            }

            for pair in &connection.variables {
                let variable_1 = component_1.variable(&pair.variable_1).ok_or_else(|| {
                    JsonModelError::undefined_variable(&pair.variable_1, &component_1.name, &context)
                })?;
                let variable_2 = component_2.variable(&pair.variable_2).ok_or_else(|| {
                    JsonModelError::undefined_variable(&pair.variable_2, &component_2.name, &context)
                })?;

                if !registry.compatible(&variable_1.units, &variable_2.units)? {
                    return Err(JsonModelError::IncompatibleConnection {
                        component_1: component_1.name.clone(),
                        variable_1: variable_1.name.clone(),
                        component_2: component_2.name.clone(),
                        variable_2: variable_2.name.clone(),
                    });
                }

                if self.strict {
                    for (component, variable) in
                        [(component_1, variable_1), (component_2, variable_2)]
                    {
                        if !matches!(variable.interface, Some(i) if i != Interface::None) {
                            return Err(JsonModelError::MissingInterface {
                                name: variable.name.clone(),
                                component: component.name.clone(),
                            });
                        }
                    }
                }

                used.insert((component_1.name.as_str(), variable_1.name.clone()));
                used.insert((component_2.name.as_str(), variable_2.name.clone()));
            }
        }

        Ok(())
    }

    /// Reject variables that are neither in math nor in a connection
    fn validate_usage<'a>(
        &self,
        model: &'a JsonModel,
        used: &HashSet<(&'a str, String)>,
    ) -> Result<(), JsonModelError> {
        for component in model.components_preorder() {
            for variable in &component.variables {
                if !used.contains(&(component.name.as_str(), variable.name.clone())) {
                    return Err(JsonModelError::UnusedVariable {
                        name: variable.name.clone(),
                        component: component.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
