use super::ast::Ast;
use super::index::ModelIndex;
use super::registry::{InternalKind, VariableRegistry};
use super::{EquationId, VariableId};

/// What an ordered equation computes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EquationKind {
    Unknown,
    TrueConstant,
    VariableBasedConstant,
    Rate,
    Algebraic,
}

/// Running counters shared by every equation check of one analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub state: usize,
    pub variable: usize,
    pub order: usize,
}

impl Counters {
    /// Counters for a model whose constants took the first `constants` indices
    pub fn after_constants(constants: usize) -> Self {
        Self {
            state: 0,
            variable: constants,
            order: 0,
        }
    }

    fn next(counter: &mut usize) -> usize {
        let value = *counter;
        *counter += 1;
        value
    }
}

/// One equation of the model and the bookkeeping of its ordering
#[derive(Debug, Clone)]
pub struct Equation {
    pub ast: Ast,
    /// Component the equation was declared in
    pub component: usize,
    /// Plain references not yet known
    pub variables: Vec<VariableId>,
    /// Differentiated references not yet known
    pub ode_variables: Vec<VariableId>,
    pub order: Option<usize>,
    pub kind: EquationKind,
    pub dependencies: Vec<EquationId>,
    pub computed_true_constant: bool,
    pub computed_variable_based_constant: bool,
    pub is_state_rate_based: bool,
    /// Variable this equation computes, once ordered
    pub variable: Option<VariableId>,
}

impl Equation {
    pub fn new(component: usize) -> Self {
        Self {
            ast: Ast::new(),
            component,
            variables: Vec::new(),
            ode_variables: Vec::new(),
            order: None,
            kind: EquationKind::Unknown,
            dependencies: Vec::new(),
            computed_true_constant: true,
            computed_variable_based_constant: true,
            is_state_rate_based: false,
            variable: None,
        }
    }

    pub(crate) fn add_variable(&mut self, variable: VariableId) {
        if !self.variables.contains(&variable) {
            self.variables.push(variable);
        }
    }

    pub(crate) fn add_ode_variable(&mut self, variable: VariableId) {
        if !self.ode_variables.contains(&variable) {
            self.ode_variables.push(variable);
        }
    }

    /// Try to order this equation
    ///
    /// Returns `true` when the equation was given an order during this call.
    /// `rate_based` reports the state/rate dependence of another equation.
    pub fn check(
        &mut self,
        id: EquationId,
        registry: &mut VariableRegistry,
        index: &ModelIndex<'_>,
        counters: &mut Counters,
        rate_based: impl Fn(EquationId) -> bool,
    ) -> bool {
        if self.order.is_some() {
            return false;
        }

        // A single reference that is already settled means this equation
        // constrains it a second time
        if let Some(last) = self.single_remaining() {
            let variable = registry.get_mut(last);
            if variable.index.is_some()
                && !matches!(
                    variable.kind,
                    InternalKind::Unknown | InternalKind::ShouldBeState
                )
            {
                variable.kind = InternalKind::Overconstrained;
                return false;
            }
        }

        let all = || self.variables.iter().chain(self.ode_variables.iter());
        let has_settled = all().any(|&v| registry.get(v).kind != InternalKind::Unknown);
        let has_non_constant = all().any(|&v| {
            !matches!(
                registry.get(v).kind,
                InternalKind::Unknown
                    | InternalKind::Constant
                    | InternalKind::ComputedTrueConstant
                    | InternalKind::ComputedVariableBasedConstant
            )
        });
        self.computed_true_constant &= !has_settled;
        self.computed_variable_based_constant &= !has_non_constant;

        if !self.is_state_rate_based {
            self.is_state_rate_based = !self.ode_variables.is_empty();
        }

        let is_known = |v: VariableId| {
            let variable = registry.get(v);
            variable.index.is_some() || variable.kind.is_known()
        };
        for &v in &self.variables {
            if !is_known(v) {
                continue;
            }
            let variable = registry.get(v);
            if !self.is_state_rate_based {
                self.is_state_rate_based = match variable.equation {
                    Some(equation) => rate_based(equation),
                    None => variable.kind == InternalKind::State,
                };
            }
            if let Some(equation) = variable.equation {
                self.dependencies.push(equation);
            }
        }

        self.variables.retain(|&v| !is_known(v));
        self.ode_variables.retain(|&v| {
            let variable = registry.get(v);
            variable.index.is_none() && variable.kind != InternalKind::VariableOfIntegration
        });

        let Some(last) = self.single_remaining() else {
            return false;
        };

        let component = self.component;
        let variable = registry.get_mut(last);
        if let Some(local) = index
            .component_variables(component)
            .find(|&decl| index.equivalent(decl, variable.variable))
        {
            variable.variable = local;
        }
        variable.kind = variable
            .kind
            .resolved_by(self.computed_true_constant, self.computed_variable_based_constant);
        if !variable.kind.is_computable() {
            return false;
        }

        variable.index = Some(if variable.kind == InternalKind::State {
            Counters::next(&mut counters.state)
        } else {
            Counters::next(&mut counters.variable)
        });
        variable.equation = Some(id);
        self.order = Some(Counters::next(&mut counters.order));
        self.kind = match variable.kind {
            InternalKind::State => EquationKind::Rate,
            InternalKind::ComputedTrueConstant => EquationKind::TrueConstant,
            InternalKind::ComputedVariableBasedConstant => EquationKind::VariableBasedConstant,
            _ => EquationKind::Algebraic,
        };
        self.variable = Some(last);
        true
    }

    fn single_remaining(&self) -> Option<VariableId> {
        match (self.variables.as_slice(), self.ode_variables.as_slice()) {
            ([only], []) | ([], [only]) => Some(*only),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{Component, JsonModel, Variable};

    fn model() -> JsonModel {
        let mut model = JsonModel::new("check");
        model.components.push(
            Component::new("main")
                .with_variable(Variable::new("x", "dimensionless"))
                .with_variable(Variable::new("y", "dimensionless"))
                .with_variable(Variable::new("k", "dimensionless").with_initial_value(2.0)),
        );
        model
    }

    #[test]
    fn test_true_constant_then_variable_based_constant() {
        let model = model();
        let index = ModelIndex::new(&model);
        let mut registry = VariableRegistry::new();
        let x = registry.resolve(0, &index);
        let y = registry.resolve(1, &index);
        let k = registry.resolve(2, &index);
        registry.get_mut(k).index = Some(0);

        // x = 3
        let mut first = Equation::new(0);
        first.add_variable(x);
        // y = x * k
        let mut second = Equation::new(0);
        second.add_variable(y);
        second.add_variable(x);
        second.add_variable(k);

        let mut counters = Counters::after_constants(1);
        assert!(!second.check(1, &mut registry, &index, &mut counters, |_| false));
        assert!(first.check(0, &mut registry, &index, &mut counters, |_| false));
        assert_eq!(first.kind, EquationKind::TrueConstant);
        assert_eq!(registry.get(x).index, Some(1));

        assert!(second.check(1, &mut registry, &index, &mut counters, |_| false));
        assert_eq!(second.kind, EquationKind::VariableBasedConstant);
        assert_eq!(second.dependencies, vec![0]);
        assert_eq!(second.order, Some(1));
        assert_eq!(registry.get(y).index, Some(2));
    }

    #[test]
    fn test_settled_single_variable_is_overconstrained() {
        let model = model();
        let index = ModelIndex::new(&model);
        let mut registry = VariableRegistry::new();
        let k = registry.resolve(2, &index);
        registry.get_mut(k).index = Some(0);

        let mut equation = Equation::new(0);
        equation.add_variable(k);
        equation.add_variable(k);
        assert_eq!(equation.variables.len(), 1);

        let mut counters = Counters::after_constants(1);
        assert!(!equation.check(0, &mut registry, &index, &mut counters, |_| false));
        assert_eq!(registry.get(k).kind, InternalKind::Overconstrained);
        assert_eq!(equation.order, None);
    }
}
