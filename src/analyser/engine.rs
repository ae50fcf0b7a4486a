use float_cmp::approx_eq;
use tracing::{debug, trace, warn};

use super::ast::{Ast, AstKind, NodeId};
use super::builder::EquationBuilder;
use super::equation::{Counters, Equation};
use super::index::ModelIndex;
use super::issue::Issue;
use super::registry::{InternalKind, VariableRegistry};
use super::scaling::UnitScaler;
use super::{
    used_functions, AnalysedEquation, AnalysedModel, AnalysedVariable, DeclId, ModelType,
    VariableId, VariableType,
};
use crate::json::JsonModel;
use crate::mathml::parse_math;
use crate::units::UnitsRegistry;

/// State of one analysis run
pub(crate) struct Engine<'a> {
    model: &'a JsonModel,
    index: ModelIndex<'a>,
    registry: VariableRegistry,
    equations: Vec<Equation>,
    issues: Vec<Issue>,
    voi: Option<DeclId>,
}

impl<'a> Engine<'a> {
    pub fn new(model: &'a JsonModel) -> Self {
        Self {
            model,
            index: ModelIndex::new(model),
            registry: VariableRegistry::new(),
            equations: Vec::new(),
            issues: Vec::new(),
            voi: None,
        }
    }

    pub fn run(mut self) -> AnalysedModel {
        let roots = self.index.roots().to_vec();
        for root in roots {
            self.walk(root);
        }

        if self.issues.is_empty() {
            for equation in 0..self.equations.len() {
                self.check_derivatives(equation);
            }
        }

        let model_type = if self.issues.is_empty() {
            self.classify()
        } else {
            ModelType::Invalid
        };
        debug!(
            model = %self.model.name,
            model_type = %model_type,
            issues = self.issues.len(),
            equations = self.equations.len(),
            "model analysed"
        );

        if model_type.is_valid() {
            self.finish(model_type)
        } else {
            let declarations = self.index.declarations().to_vec();
            let classes = self.classes();
            AnalysedModel::invalid(model_type, self.issues, declarations, classes)
        }
    }

    /// Equations of a component, then its variables, then its children
    fn walk(&mut self, component: usize) {
        let definition = self.index.component(component);
        if let Some(math) = &definition.math {
            match parse_math(math) {
                Ok(roots) => {
                    for element in roots.iter().flat_map(|root| root.children.iter()) {
                        let builder = EquationBuilder::new(
                            &self.index,
                            &mut self.registry,
                            &mut self.issues,
                            component,
                        );
                        if let Some(equation) = builder.build(element) {
                            self.equations.push(equation);
                        }
                    }
                }
                Err(e) => warn!(component = %definition.name, error = %e, "math ignored"),
            }
        }

        for declaration in self.index.component_variables(component) {
            let id = self.registry.resolve(declaration, &self.index);
            let tracked = self.registry.get(id).variable;
            let initialised = self.index.declaration(declaration).initial_value.is_some();
            let tracked_initialised = self.index.declaration(tracked).initial_value.is_some();
            if initialised && !tracked_initialised {
                self.registry.get_mut(id).set_variable(declaration, true);
            } else if declaration != tracked && initialised && tracked_initialised {
                self.issues.push(Issue::dual_initialisation(
                    self.index.declaration(declaration).reference(),
                    self.index.declaration(tracked).reference(),
                ));
            }
        }

        let children = self.index.children(component).to_vec();
        for child in children {
            self.walk(child);
        }
    }

    /// Find the variable of integration and the states of one equation
    fn check_derivatives(&mut self, equation: usize) {
        for finding in derivative_findings(&self.equations[equation].ast) {
            match finding {
                Finding::VariableOfIntegration(declaration) => self.found_voi(declaration),
                Finding::State(declaration) => {
                    if let Some(id) = self.registry.find(declaration, &self.index) {
                        self.registry.get_mut(id).make_state();
                    }
                }
                Finding::HigherOrder(declaration) => {
                    self.issues.push(Issue::non_first_order(
                        self.index.declaration(declaration).reference(),
                    ));
                }
            }
        }
    }

    fn found_voi(&mut self, declaration: DeclId) {
        match self.voi {
            None => {
                let variable = self.index.declaration(declaration);
                if variable.initial_value.is_some() {
                    self.issues.push(Issue::initialised_voi(variable.reference()));
                }
                let first = self
                    .index
                    .roots()
                    .iter()
                    .find_map(|&root| self.index.first_occurrence(declaration, root))
                    .unwrap_or(declaration);
                self.voi = Some(first);
                if let Some(id) = self.registry.find(declaration, &self.index) {
                    let record = self.registry.get_mut(id);
                    record.set_variable(first, false);
                    record.make_voi();
                }
                trace!(voi = %self.index.declaration(first).name, "variable of integration");
            }
            Some(voi) if !self.index.equivalent(voi, declaration) => {
                self.issues.push(Issue::multiple_vois(
                    self.index.declaration(voi).reference(),
                    self.index.declaration(declaration).reference(),
                ));
            }
            Some(_) => {}
        }
    }

    /// Order equations and classify variables
    fn classify(&mut self) -> ModelType {
        let index = &self.index;
        let registry = &mut self.registry;

        let mut order: Vec<VariableId> = registry.ids().collect();
        order.sort_by(|&a, &b| {
            let a = index.declaration(registry.get(a).initial_value_variable);
            let b = index.declaration(registry.get(b).initial_value_variable);
            (&a.component, &a.name).cmp(&(&b.component, &b.name))
        });

        let mut constants = 0;
        for &id in &order {
            let variable = registry.get_mut(id);
            if variable.kind == InternalKind::Constant {
                variable.index = Some(constants);
                constants += 1;
            }
        }

        let mut counters = Counters::after_constants(constants);
        loop {
            let mut progress = false;
            for id in 0..self.equations.len() {
                let (before, rest) = self.equations.split_at_mut(id);
                let Some((current, after)) = rest.split_first_mut() else {
                    break;
                };
                let rate_based = |other: usize| {
                    if other < id {
                        before[other].is_state_rate_based
                    } else if other > id {
                        after[other - id - 1].is_state_rate_based
                    } else {
                        false
                    }
                };
                progress |= current.check(id, registry, index, &mut counters, rate_based);
            }
            if !progress {
                break;
            }
        }

        let mut underconstrained = false;
        let mut overconstrained = false;
        for &id in &order {
            let variable = registry.get(id);
            let reference = index.declaration(variable.variable).reference();
            match variable.kind {
                InternalKind::Unknown => {
                    underconstrained = true;
                    self.issues.push(Issue::not_computed(reference));
                }
                InternalKind::ShouldBeState => {
                    underconstrained = true;
                    self.issues.push(Issue::state_not_initialised(reference));
                }
                InternalKind::Overconstrained => {
                    overconstrained = true;
                    self.issues.push(Issue::computed_more_than_once(reference));
                }
                _ => {}
            }
        }

        match (underconstrained, overconstrained) {
            (true, true) => ModelType::UnsuitablyConstrained,
            (true, false) => ModelType::Underconstrained,
            (false, true) => ModelType::Overconstrained,
            _ if self.voi.is_some() => ModelType::Ode,
            _ if !registry.is_empty() => ModelType::Algebraic,
            _ => ModelType::Unknown,
        }
    }

    fn finish(mut self, model_type: ModelType) -> AnalysedModel {
        let units = match UnitsRegistry::new(&self.model.units) {
            Ok(units) => Some(units),
            Err(e) => {
                warn!(model = %self.model.name, error = %e, "units not resolved, no scaling");
                None
            }
        };
        let scaler = UnitScaler::new(&self.index, &self.registry, units.as_ref());
        for equation in &mut self.equations {
            scaler.scale(&mut equation.ast);
        }

        let registry = &self.registry;
        let key = |id: VariableId| {
            let variable = registry.get(id);
            (variable.kind, variable.index)
        };

        let mut order: Vec<VariableId> = registry.ids().collect();
        order.sort_by_key(|&id| key(id));

        let mut analysed: Vec<Option<AnalysedVariable>> = vec![None; registry.len()];
        let mut voi = None;
        let mut states = Vec::new();
        let mut variables = Vec::new();
        for &id in &order {
            let variable = registry.get(id);
            let Some(kind) = variable_type(variable.kind) else {
                continue;
            };
            let index = match kind {
                VariableType::VariableOfIntegration => 0,
                VariableType::State => states.len(),
                _ => variables.len(),
            };
            let entry = AnalysedVariable {
                initial_value_variable: self
                    .index
                    .declaration(variable.initial_value_variable)
                    .clone(),
                variable: self.index.declaration(variable.variable).clone(),
                kind,
                index,
            };
            match kind {
                VariableType::VariableOfIntegration => voi = Some(entry.clone()),
                VariableType::State => states.push(entry.clone()),
                _ => variables.push(entry.clone()),
            }
            analysed[id] = Some(entry);
        }

        let bindings = (0..self.index.declarations().len())
            .map(|declaration| {
                registry
                    .find(declaration, &self.index)
                    .and_then(|id| analysed[id].as_ref())
                    .map(|variable| (variable.kind, variable.index))
            })
            .collect();

        let mut ordered: Vec<usize> = self
            .equations
            .iter()
            .enumerate()
            .filter(|(_, equation)| equation.order.is_some())
            .map(|(id, _)| id)
            .collect();
        ordered.sort_by_key(|&id| self.equations[id].variable.map(key));

        let mut position = vec![None; self.equations.len()];
        for (at, &id) in ordered.iter().enumerate() {
            position[id] = Some(at);
        }

        let mut equations = Vec::with_capacity(ordered.len());
        for &id in &ordered {
            let equation = &self.equations[id];
            let Some(variable) = equation.variable.and_then(|v| analysed[v].clone()) else {
                continue;
            };
            equations.push(AnalysedEquation {
                kind: equation.kind,
                ast: equation.ast.clone(),
                dependencies: equation
                    .dependencies
                    .iter()
                    .filter_map(|&dependency| position[dependency])
                    .collect(),
                is_state_rate_based: equation.is_state_rate_based,
                variable,
            });
        }

        let functions = used_functions(&equations);
        let classes = self.classes();
        AnalysedModel {
            model_type,
            issues: self.issues,
            voi,
            states,
            variables,
            equations,
            declarations: self.index.declarations().to_vec(),
            classes,
            bindings,
            functions,
        }
    }

    /// Equivalence class representative of every declaration
    fn classes(&self) -> Vec<usize> {
        (0..self.index.declarations().len())
            .map(|declaration| self.index.class(declaration))
            .collect()
    }
}

/// What a derivative tells about the variables it involves
enum Finding {
    VariableOfIntegration(DeclId),
    State(DeclId),
    HigherOrder(DeclId),
}

fn derivative_findings(ast: &Ast) -> Vec<Finding> {
    let mut findings = Vec::new();
    for node in ast.pre_order() {
        match ast.kind(node) {
            AstKind::Ci(declaration) => match ancestors(ast, node) {
                [Some(AstKind::Bvar), Some(AstKind::Diff)] => {
                    findings.push(Finding::VariableOfIntegration(*declaration));
                }
                [Some(AstKind::Diff), _] => findings.push(Finding::State(*declaration)),
                _ => {}
            },
            AstKind::Cn(value) => {
                let Some(diff) = degree_diff(ast, node) else {
                    continue;
                };
                let first_order = value
                    .parse::<f64>()
                    .map(|order| approx_eq!(f64, order, 1.0, ulps = 4))
                    .unwrap_or(false);
                if first_order {
                    continue;
                }
                if let Some(AstKind::Ci(declaration)) = ast.right(diff).map(|ci| ast.kind(ci)) {
                    findings.push(Finding::HigherOrder(*declaration));
                }
            }
            _ => {}
        }
    }
    findings
}

fn variable_type(kind: InternalKind) -> Option<VariableType> {
    match kind {
        InternalKind::VariableOfIntegration => Some(VariableType::VariableOfIntegration),
        InternalKind::State => Some(VariableType::State),
        InternalKind::Constant => Some(VariableType::Constant),
        InternalKind::ComputedTrueConstant | InternalKind::ComputedVariableBasedConstant => {
            Some(VariableType::ComputedConstant)
        }
        InternalKind::Algebraic => Some(VariableType::Algebraic),
        InternalKind::Unknown | InternalKind::ShouldBeState | InternalKind::Overconstrained => {
            None
        }
    }
}

/// Kinds of the parent and grandparent of a node
fn ancestors(ast: &Ast, node: NodeId) -> [Option<&AstKind>; 2] {
    let parent = ast.parent(node);
    let grandparent = parent.and_then(|parent| ast.parent(parent));
    [
        parent.map(|id| ast.kind(id)),
        grandparent.map(|id| ast.kind(id)),
    ]
}

/// The `diff` node owning the degree a `cn` sits in, if any
fn degree_diff(ast: &Ast, node: NodeId) -> Option<NodeId> {
    let degree = ast.parent(node)?;
    let bvar = ast.parent(degree)?;
    let diff = ast.parent(bvar)?;
    (ast.kind(degree) == &AstKind::Degree
        && ast.kind(bvar) == &AstKind::Bvar
        && ast.kind(diff) == &AstKind::Diff)
        .then_some(diff)
}
