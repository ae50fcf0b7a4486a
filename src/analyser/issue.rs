use std::fmt;

use serde::Serialize;

/// Severity of an [`Issue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Level {
    Error,
}

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    // ─────────────────────────────────────────────────────────────────────────
    // Found while building expression trees
    // ─────────────────────────────────────────────────────────────────────────
    UndefinedVariable,
    NonFirstOrderDerivative,
    MultipleVariablesOfIntegration,
    InitialisedVariableOfIntegration,
    DualInitialisation,

    // ─────────────────────────────────────────────────────────────────────────
    // Found while classifying variables
    // ─────────────────────────────────────────────────────────────────────────
    NotComputed,
    StateNotInitialised,
    ComputedMoreThanOnce,
}

impl IssueKind {
    /// Issues that stop analysis before classification
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UndefinedVariable
                | Self::NonFirstOrderDerivative
                | Self::MultipleVariablesOfIntegration
                | Self::InitialisedVariableOfIntegration
                | Self::DualInitialisation
        )
    }
}

/// A variable named by an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableRef {
    pub component: String,
    pub variable: String,
}

impl VariableRef {
    pub fn new(component: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            variable: variable.into(),
        }
    }
}

impl fmt::Display for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Variable '{}' in component '{}'",
            self.variable, self.component
        )
    }
}

/// A problem found while analysing a model
///
/// Issues are data: analysis always completes and reports them through
/// [`AnalysedModel::issues`](super::AnalysedModel::issues).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub description: String,
    pub level: Level,
    pub kind: IssueKind,
    pub variable: Option<VariableRef>,
}

impl Issue {
    fn error(kind: IssueKind, variable: VariableRef, description: String) -> Self {
        Self {
            description,
            level: Level::Error,
            kind,
            variable: Some(variable),
        }
    }

    pub fn undefined_variable(variable: VariableRef) -> Self {
        let description = format!(
            "{} is referenced in an equation, but it is not defined anywhere.",
            variable
        );
        Self::error(IssueKind::UndefinedVariable, variable, description)
    }

    pub fn non_first_order(variable: VariableRef) -> Self {
        let description = format!(
            "The differential equation for variable '{}' in component '{}' must be of the first order.",
            variable.variable, variable.component
        );
        Self::error(IssueKind::NonFirstOrderDerivative, variable, description)
    }

    pub fn multiple_vois(voi: VariableRef, other: VariableRef) -> Self {
        let description = format!(
            "{} and variable '{}' in component '{}' cannot both be a variable of integration.",
            voi, other.variable, other.component
        );
        Self::error(IssueKind::MultipleVariablesOfIntegration, other, description)
    }

    pub fn initialised_voi(variable: VariableRef) -> Self {
        let description = format!(
            "{} cannot be both a variable of integration and initialised.",
            variable
        );
        Self::error(IssueKind::InitialisedVariableOfIntegration, variable, description)
    }

    pub fn dual_initialisation(variable: VariableRef, tracked: VariableRef) -> Self {
        let description = format!(
            "{} and variable '{}' in component '{}' are equivalent and cannot therefore both be initialised.",
            variable, tracked.variable, tracked.component
        );
        Self::error(IssueKind::DualInitialisation, variable, description)
    }

    pub fn not_computed(variable: VariableRef) -> Self {
        let description = format!("{} is not computed.", variable);
        Self::error(IssueKind::NotComputed, variable, description)
    }

    pub fn state_not_initialised(variable: VariableRef) -> Self {
        let description = format!(
            "{} is used in an ODE, but it is not initialised.",
            variable
        );
        Self::error(IssueKind::StateNotInitialised, variable, description)
    }

    pub fn computed_more_than_once(variable: VariableRef) -> Self {
        let description = format!("{} is computed more than once.", variable);
        Self::error(IssueKind::ComputedMoreThanOnce, variable, description)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
