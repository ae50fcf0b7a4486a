//! Model analysis
//!
//! Turns a flattened [`JsonModel`] into an [`AnalysedModel`]: every
//! equivalence class of variables is classified (variable of integration,
//! state, constant, computed constant or algebraic), every equation is given
//! an evaluation order, and references are rescaled into the units of the
//! equation using them.
//!
//! Analysis never fails. Problems are reported as [`Issue`]s and reflected in
//! the [`ModelType`]; only `Ode` and `Algebraic` models expose variables and
//! equations.
//!
//! ```ignore
//! use cellgen::analyser::{Analyser, ModelType};
//!
//! let analysed = Analyser::new().analyse(&model);
//! if analysed.model_type() == ModelType::Ode {
//!     println!("{} states", analysed.state_count());
//! }
//! for issue in analysed.issues() {
//!     eprintln!("{}", issue);
//! }
//! ```

pub mod ast;
mod builder;
mod engine;
pub mod equation;
pub mod index;
pub mod issue;
pub mod registry;
mod scaling;

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::json::{InitialValue, JsonModel};

pub use ast::{Ast, AstKind, MathFunction, NodeId};
pub use equation::EquationKind;
pub use index::ModelIndex;
pub use issue::{Issue, IssueKind, Level, VariableRef};

/// Index of a declared variable in tree order, see [`ModelIndex`]
pub type DeclId = usize;
/// Index of an equivalence class record
pub type VariableId = usize;
/// Index of an equation in declaration order
pub type EquationId = usize;

/// A variable as declared by a component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclaredVariable {
    pub component: String,
    pub name: String,
    pub units: String,
    pub initial_value: Option<InitialValue>,
}

impl DeclaredVariable {
    pub fn reference(&self) -> VariableRef {
        VariableRef::new(&self.component, &self.name)
    }
}

/// Overall classification of an analysed model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Unknown,
    Invalid,
    Ode,
    Algebraic,
    Underconstrained,
    Overconstrained,
    UnsuitablyConstrained,
}

impl ModelType {
    /// Whether code can be generated for the model
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Ode | Self::Algebraic)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Invalid => "invalid",
            Self::Ode => "ode",
            Self::Algebraic => "algebraic",
            Self::Underconstrained => "underconstrained",
            Self::Overconstrained => "overconstrained",
            Self::UnsuitablyConstrained => "unsuitably constrained",
        };
        f.write_str(name)
    }
}

/// Role of a variable in an analysed model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    VariableOfIntegration,
    State,
    Constant,
    ComputedConstant,
    Algebraic,
}

/// A classified equivalence class of variables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysedVariable {
    /// Declaration providing the initial value
    pub initial_value_variable: DeclaredVariable,
    /// Declaration reported for the class
    pub variable: DeclaredVariable,
    pub kind: VariableType,
    /// Position in the states array for states, in the variables array
    /// otherwise
    pub index: usize,
}

/// An ordered equation
#[derive(Debug, Clone)]
pub struct AnalysedEquation {
    kind: EquationKind,
    ast: Ast,
    dependencies: Vec<usize>,
    is_state_rate_based: bool,
    variable: AnalysedVariable,
}

impl AnalysedEquation {
    pub fn kind(&self) -> EquationKind {
        self.kind
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Positions, in [`AnalysedModel::equations`], of the equations computing
    /// the values this one uses
    pub fn dependencies(&self) -> &[usize] {
        &self.dependencies
    }

    /// Whether the equation depends, directly or not, on a state or a rate
    pub fn is_state_rate_based(&self) -> bool {
        self.is_state_rate_based
    }

    /// The variable computed by this equation
    pub fn variable(&self) -> &AnalysedVariable {
        &self.variable
    }
}

/// Result of [`Analyser::analyse`]
#[derive(Debug, Clone)]
pub struct AnalysedModel {
    model_type: ModelType,
    issues: Vec<Issue>,
    voi: Option<AnalysedVariable>,
    states: Vec<AnalysedVariable>,
    variables: Vec<AnalysedVariable>,
    equations: Vec<AnalysedEquation>,
    declarations: Vec<DeclaredVariable>,
    classes: Vec<usize>,
    bindings: Vec<Option<(VariableType, usize)>>,
    functions: BTreeSet<MathFunction>,
}

macro_rules! need_functions {
    ($($name:ident => $function:ident),* $(,)?) => {
        $(
            pub fn $name(&self) -> bool {
                self.needs(MathFunction::$function)
            }
        )*
    };
}

impl AnalysedModel {
    fn invalid(
        model_type: ModelType,
        issues: Vec<Issue>,
        declarations: Vec<DeclaredVariable>,
        classes: Vec<usize>,
    ) -> Self {
        Self {
            model_type,
            issues,
            voi: None,
            states: Vec::new(),
            variables: Vec::new(),
            equations: Vec::new(),
            declarations,
            classes,
            bindings: Vec::new(),
            functions: BTreeSet::new(),
        }
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    pub fn voi(&self) -> Option<&AnalysedVariable> {
        self.voi.as_ref()
    }

    pub fn states(&self) -> &[AnalysedVariable] {
        &self.states
    }

    /// Constants, computed constants and algebraic variables
    pub fn variables(&self) -> &[AnalysedVariable] {
        &self.variables
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Equations, sorted by the kind and index of the variable they compute
    pub fn equations(&self) -> &[AnalysedEquation] {
        &self.equations
    }

    /// Whether two declarations are the same variable or connected, directly
    /// or through other components
    pub fn are_equivalent_variables(&self, a: &DeclaredVariable, b: &DeclaredVariable) -> bool {
        match (self.declaration_id(a), self.declaration_id(b)) {
            (Some(a), Some(b)) => self.classes[a] == self.classes[b],
            _ => false,
        }
    }

    /// Whether an equation uses `function`, natively available or not
    pub fn needs(&self, function: MathFunction) -> bool {
        self.functions.contains(&function)
    }

    /// Functions used by the equations, in declaration order
    pub fn needed_functions(&self) -> impl Iterator<Item = MathFunction> + '_ {
        self.functions.iter().copied()
    }

    need_functions! {
        need_eq_function => Eq,
        need_neq_function => Neq,
        need_lt_function => Lt,
        need_leq_function => Leq,
        need_gt_function => Gt,
        need_geq_function => Geq,
        need_and_function => And,
        need_or_function => Or,
        need_xor_function => Xor,
        need_not_function => Not,
        need_min_function => Min,
        need_max_function => Max,
        need_sec_function => Sec,
        need_csc_function => Csc,
        need_cot_function => Cot,
        need_sech_function => Sech,
        need_csch_function => Csch,
        need_coth_function => Coth,
        need_asec_function => Asec,
        need_acsc_function => Acsc,
        need_acot_function => Acot,
        need_asech_function => Asech,
        need_acsch_function => Acsch,
        need_acoth_function => Acoth,
    }

    fn declaration_id(&self, variable: &DeclaredVariable) -> Option<DeclId> {
        self.declarations
            .iter()
            .position(|d| d.component == variable.component && d.name == variable.name)
    }

    /// Kind and index of the class a declaration belongs to
    pub(crate) fn binding(&self, declaration: DeclId) -> Option<(VariableType, usize)> {
        self.bindings.get(declaration).copied().flatten()
    }

    /// Kind and index of the class of variable `name` declared by `component`
    pub(crate) fn binding_of(&self, component: &str, name: &str) -> Option<(VariableType, usize)> {
        self.declarations
            .iter()
            .position(|d| d.component == component && d.name == name)
            .and_then(|declaration| self.binding(declaration))
    }
}

/// Helper functions and relational operators the equations use
fn used_functions(equations: &[AnalysedEquation]) -> BTreeSet<MathFunction> {
    equations
        .iter()
        .flat_map(|equation| {
            let ast = equation.ast();
            ast.pre_order()
                .into_iter()
                .filter_map(move |node| MathFunction::from_kind(ast.kind(node)))
        })
        .collect()
}

/// Entry point of model analysis
#[derive(Debug, Clone, Default)]
pub struct Analyser;

impl Analyser {
    pub fn new() -> Self {
        Self
    }

    /// Analyse a flattened model
    ///
    /// The model is expected to be validated; anything validation would
    /// reject is skipped with a warning.
    pub fn analyse(&self, model: &JsonModel) -> AnalysedModel {
        engine::Engine::new(model).run()
    }
}
