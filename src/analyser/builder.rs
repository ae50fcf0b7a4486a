//! MathML to [`Ast`](super::ast::Ast) conversion

use super::ast::{AstKind, NodeId};
use super::equation::Equation;
use super::index::ModelIndex;
use super::issue::{Issue, VariableRef};
use super::registry::VariableRegistry;
use crate::mathml::MathElement;

/// How a `ci` is referenced by its surroundings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Plain,
    /// Argument of a `diff` apply
    DiffArgument,
    /// Inside the `bvar` of a `diff` apply
    DiffBvar,
}

pub(crate) struct EquationBuilder<'b, 'a> {
    index: &'b ModelIndex<'a>,
    registry: &'b mut VariableRegistry,
    issues: &'b mut Vec<Issue>,
    component: usize,
    equation: Equation,
}

impl<'b, 'a> EquationBuilder<'b, 'a> {
    pub fn new(
        index: &'b ModelIndex<'a>,
        registry: &'b mut VariableRegistry,
        issues: &'b mut Vec<Issue>,
        component: usize,
    ) -> Self {
        Self {
            index,
            registry,
            issues,
            component,
            equation: Equation::new(component),
        }
    }

    /// Build the equation held by one child element of `math`
    ///
    /// Returns `None` when nothing could be built from the element.
    pub fn build(mut self, element: &MathElement) -> Option<Equation> {
        let root = self.process(element, None, Role::Plain, true)?;
        self.equation.ast.set_root(Some(root));
        Some(self.equation)
    }

    fn process(
        &mut self,
        element: &MathElement,
        parent: Option<NodeId>,
        role: Role,
        top: bool,
    ) -> Option<NodeId> {
        match element.name.as_str() {
            "apply" => {
                let (operator, arguments) = element.children.split_first()?;
                let kind = match AstKind::from_operator(&operator.name)? {
                    AstKind::Eq if top => AstKind::Assignment,
                    kind => kind,
                };
                let role = if kind == AstKind::Diff {
                    Role::DiffArgument
                } else {
                    Role::Plain
                };
                Some(self.operation(kind, arguments, parent, role))
            }
            "piecewise" => Some(self.operation(
                AstKind::Piecewise,
                &element.children,
                parent,
                Role::Plain,
            )),
            "piece" => {
                let node = self.equation.ast.push(AstKind::Piece, parent);
                self.children(node, element, Role::Plain);
                Some(node)
            }
            "bvar" => {
                let node = self.equation.ast.push(AstKind::Bvar, parent);
                let inner = if role == Role::DiffArgument {
                    Role::DiffBvar
                } else {
                    Role::Plain
                };
                self.children(node, element, inner);
                Some(node)
            }
            "otherwise" | "degree" | "logbase" => {
                let kind = match element.name.as_str() {
                    "otherwise" => AstKind::Otherwise,
                    "degree" => AstKind::Degree,
                    _ => AstKind::Logbase,
                };
                let node = self.equation.ast.push(kind, parent);
                let left = element
                    .child(0)
                    .and_then(|child| self.process(child, Some(node), Role::Plain, false));
                self.equation.ast.set_left(node, left);
                Some(node)
            }
            "ci" => self.ci(element.text.trim(), parent, role),
            "cn" => {
                let parts = element.text_parts();
                let value = match parts.as_slice() {
                    [mantissa, exponent, ..] => {
                        format!("{}e{}", mantissa.trim(), exponent.trim())
                    }
                    _ => element.text.trim().to_string(),
                };
                Some(self.equation.ast.push(AstKind::Cn(value), parent))
            }
            name => match AstKind::from_operator(name) {
                Some(
                    kind @ (AstKind::True
                    | AstKind::False
                    | AstKind::E
                    | AstKind::Pi
                    | AstKind::Inf
                    | AstKind::Nan),
                ) => Some(self.equation.ast.push(kind, parent)),
                _ => None,
            },
        }
    }

    /// `kind(a1, kind(a2, ... kind(an-1, an)))`
    fn operation(
        &mut self,
        kind: AstKind,
        arguments: &[MathElement],
        parent: Option<NodeId>,
        role: Role,
    ) -> NodeId {
        let node = self.equation.ast.push(kind.clone(), parent);
        let left = arguments
            .first()
            .and_then(|first| self.process(first, Some(node), role, false));
        self.equation.ast.set_left(node, left);
        if arguments.len() >= 2 {
            let right = self.chain(&kind, &arguments[1..], node, role);
            self.equation.ast.set_right(node, right);
        }
        node
    }

    fn chain(
        &mut self,
        kind: &AstKind,
        arguments: &[MathElement],
        parent: NodeId,
        role: Role,
    ) -> Option<NodeId> {
        match arguments {
            [] => None,
            [only] => self.process(only, Some(parent), role, false),
            _ => Some(self.operation(kind.clone(), arguments, Some(parent), role)),
        }
    }

    /// First child as left, second child as right
    fn children(&mut self, node: NodeId, element: &MathElement, role: Role) {
        let left = element
            .child(0)
            .and_then(|child| self.process(child, Some(node), role, false));
        self.equation.ast.set_left(node, left);
        let right = element
            .child(1)
            .and_then(|child| self.process(child, Some(node), role, false));
        self.equation.ast.set_right(node, right);
    }

    fn ci(&mut self, name: &str, parent: Option<NodeId>, role: Role) -> Option<NodeId> {
        let Some(declaration) = self.index.lookup(self.component, name) else {
            let component = &self.index.component(self.component).name;
            self.issues
                .push(Issue::undefined_variable(VariableRef::new(component, name)));
            return None;
        };
        let variable = self.registry.resolve(declaration, self.index);
        match role {
            Role::DiffArgument => self.equation.add_ode_variable(variable),
            Role::DiffBvar => {}
            Role::Plain => self.equation.add_variable(variable),
        }
        Some(self.equation.ast.push(AstKind::Ci(declaration), parent))
    }
}
