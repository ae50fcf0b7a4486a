use std::collections::HashMap;

use super::index::ModelIndex;
use super::{DeclId, EquationId, VariableId};

/// Classification of an equivalence class of variables
///
/// The declaration order is the order used to lay variables out for code
/// generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InternalKind {
    Unknown,
    ShouldBeState,
    VariableOfIntegration,
    State,
    Constant,
    ComputedTrueConstant,
    ComputedVariableBasedConstant,
    Algebraic,
    Overconstrained,
}

impl InternalKind {
    /// Kind after the variable was found differentiated
    pub fn made_state(self) -> Self {
        match self {
            Self::Unknown => Self::ShouldBeState,
            Self::Constant => Self::State,
            Self::ShouldBeState
            | Self::VariableOfIntegration
            | Self::State
            | Self::ComputedTrueConstant
            | Self::ComputedVariableBasedConstant
            | Self::Algebraic
            | Self::Overconstrained => self,
        }
    }

    /// Kind after an equation was found to compute the variable
    ///
    /// `true_constant` and `variable_based_constant` describe the right hand
    /// side of that equation.
    pub fn resolved_by(self, true_constant: bool, variable_based_constant: bool) -> Self {
        match self {
            Self::Unknown if true_constant => Self::ComputedTrueConstant,
            Self::Unknown if variable_based_constant => Self::ComputedVariableBasedConstant,
            Self::Unknown => Self::Algebraic,
            Self::ShouldBeState
            | Self::VariableOfIntegration
            | Self::State
            | Self::Constant
            | Self::ComputedTrueConstant
            | Self::ComputedVariableBasedConstant
            | Self::Algebraic
            | Self::Overconstrained => self,
        }
    }

    /// Kinds whose value is available to other equations without solving
    pub fn is_known(self) -> bool {
        matches!(
            self,
            Self::VariableOfIntegration
                | Self::State
                | Self::Constant
                | Self::ComputedTrueConstant
                | Self::ComputedVariableBasedConstant
        )
    }

    /// Kinds an equation can still settle
    pub fn is_computable(self) -> bool {
        matches!(
            self,
            Self::State
                | Self::ComputedTrueConstant
                | Self::ComputedVariableBasedConstant
                | Self::Algebraic
        )
    }
}

/// One equivalence class of declared variables
#[derive(Debug, Clone, PartialEq)]
pub struct InternalVariable {
    /// Declaration carrying the initial value, or the first one seen
    pub initial_value_variable: DeclId,
    /// Declaration reported for this class
    pub variable: DeclId,
    pub kind: InternalKind,
    pub index: Option<usize>,
    pub equation: Option<EquationId>,
}

impl InternalVariable {
    fn new(declaration: DeclId, initialised: bool) -> Self {
        let mut variable = Self {
            initial_value_variable: declaration,
            variable: declaration,
            kind: InternalKind::Unknown,
            index: None,
            equation: None,
        };
        variable.set_variable(declaration, initialised);
        variable
    }

    /// Track `declaration` as both the reported and the initial value variable
    pub fn set_variable(&mut self, declaration: DeclId, initialised: bool) {
        self.initial_value_variable = declaration;
        self.variable = declaration;
        if initialised {
            self.kind = InternalKind::Constant;
        }
    }

    pub fn make_voi(&mut self) {
        self.kind = InternalKind::VariableOfIntegration;
    }

    pub fn make_state(&mut self) {
        self.kind = self.kind.made_state();
    }
}

/// Arena of [`InternalVariable`]s, one per equivalence class met so far
#[derive(Debug, Default)]
pub struct VariableRegistry {
    variables: Vec<InternalVariable>,
    by_class: HashMap<usize, VariableId>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The record of the class containing `declaration`, created on first use
    pub fn resolve(&mut self, declaration: DeclId, index: &ModelIndex<'_>) -> VariableId {
        let class = index.class(declaration);
        if let Some(&id) = self.by_class.get(&class) {
            return id;
        }
        let initialised = index.declaration(declaration).initial_value.is_some();
        let id = self.variables.len();
        self.variables
            .push(InternalVariable::new(declaration, initialised));
        self.by_class.insert(class, id);
        id
    }

    /// The record of the class containing `declaration`, if any
    pub fn find(&self, declaration: DeclId, index: &ModelIndex<'_>) -> Option<VariableId> {
        self.by_class.get(&index.class(declaration)).copied()
    }

    pub fn get(&self, id: VariableId) -> &InternalVariable {
        &self.variables[id]
    }

    pub fn get_mut(&mut self, id: VariableId) -> &mut InternalVariable {
        &mut self.variables[id]
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn ids(&self) -> std::ops::Range<VariableId> {
        0..self.variables.len()
    }
}
