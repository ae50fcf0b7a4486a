//! Expression rendering
//!
//! Turns one equation tree into target language text. Parentheses are only
//! added where the profile's operators would otherwise bind differently.

use float_cmp::approx_eq;

use super::profile::{GeneratorProfile, HelperFunction};
use crate::analyser::{AnalysedModel, Ast, AstKind, NodeId, VariableType};

/// Format a number literal so that the target reads it as a double
pub fn generate_double(value: &str) -> String {
    if value.contains('.') {
        return value.to_string();
    }
    match value.find(['e', 'E']) {
        Some(exponent) => format!("{}.0{}", &value[..exponent], &value[exponent..]),
        None => format!("{}.0", value),
    }
}

fn parenthesized(code: String) -> String {
    format!("({})", code)
}

fn approximately(code: &str, value: f64) -> bool {
    code.parse::<f64>()
        .map(|parsed| approx_eq!(f64, parsed, value, ulps = 4))
        .unwrap_or(false)
}

pub(crate) struct Renderer<'r> {
    model: &'r AnalysedModel,
    profile: &'r GeneratorProfile,
}

impl<'r> Renderer<'r> {
    pub fn new(model: &'r AnalysedModel, profile: &'r GeneratorProfile) -> Self {
        Self { model, profile }
    }

    /// Array element holding a variable of the given kind and index
    pub fn variable_name(&self, kind: VariableType, index: usize, rate: bool) -> String {
        let profile = self.profile;
        let array = match kind {
            VariableType::VariableOfIntegration => return profile.voi_string.clone(),
            VariableType::State if rate => &profile.rates_array_string,
            VariableType::State => &profile.states_array_string,
            VariableType::Constant | VariableType::ComputedConstant | VariableType::Algebraic => {
                &profile.variables_array_string
            }
        };
        format!(
            "{}{}{}{}",
            array, profile.open_array_string, index, profile.close_array_string
        )
    }

    /// Text of a whole equation
    pub fn equation(&self, ast: &Ast) -> String {
        ast.root()
            .map(|root| self.code(ast, root))
            .unwrap_or_default()
    }

    fn child(&self, ast: &Ast, node: Option<NodeId>) -> String {
        node.map(|node| self.code(ast, node)).unwrap_or_default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operator classes
    // ─────────────────────────────────────────────────────────────────────────

    fn kind_of<'a>(&self, ast: &'a Ast, node: Option<NodeId>) -> Option<&'a AstKind> {
        node.map(|node| ast.kind(node))
    }

    fn is_relational(&self, kind: Option<&AstKind>) -> bool {
        let p = self.profile;
        match kind {
            Some(AstKind::Eq) => p.has_eq_operator,
            Some(AstKind::Neq) => p.has_neq_operator,
            Some(AstKind::Lt) => p.has_lt_operator,
            Some(AstKind::Leq) => p.has_leq_operator,
            Some(AstKind::Gt) => p.has_gt_operator,
            Some(AstKind::Geq) => p.has_geq_operator,
            _ => false,
        }
    }

    fn is_and(&self, kind: Option<&AstKind>) -> bool {
        matches!(kind, Some(AstKind::And)) && self.profile.has_and_operator
    }

    fn is_or(&self, kind: Option<&AstKind>) -> bool {
        matches!(kind, Some(AstKind::Or)) && self.profile.has_or_operator
    }

    fn is_xor(&self, kind: Option<&AstKind>) -> bool {
        matches!(kind, Some(AstKind::Xor)) && self.profile.has_xor_operator
    }

    fn is_logical(&self, kind: Option<&AstKind>) -> bool {
        self.is_and(kind) || self.is_or(kind) || self.is_xor(kind)
    }

    fn is_piecewise(&self, kind: Option<&AstKind>) -> bool {
        matches!(kind, Some(AstKind::Piecewise)) && self.profile.has_conditional_operator
    }

    fn is_power(&self, kind: Option<&AstKind>) -> bool {
        matches!(kind, Some(AstKind::Power)) && self.profile.has_power_operator
    }

    fn is_root(&self, kind: Option<&AstKind>) -> bool {
        matches!(kind, Some(AstKind::Root)) && self.profile.has_power_operator
    }

    /// Operators that always need parentheses around them as operands
    fn is_loose(&self, kind: Option<&AstKind>) -> bool {
        self.is_relational(kind) || self.is_logical(kind) || self.is_piecewise(kind)
    }

    fn is_binary(&self, ast: &Ast, node: Option<NodeId>, kind: AstKind) -> bool {
        node.is_some_and(|node| *ast.kind(node) == kind && ast.right(node).is_some())
    }

    fn is_binary_additive(&self, ast: &Ast, node: Option<NodeId>) -> bool {
        self.is_binary(ast, node, AstKind::Plus) || self.is_binary(ast, node, AstKind::Minus)
    }

    /// Binary arithmetic rendered with an infix operator
    fn is_binary_arithmetic(&self, ast: &Ast, node: Option<NodeId>) -> bool {
        let kind = self.kind_of(ast, node);
        self.is_binary_additive(ast, node)
            || matches!(kind, Some(AstKind::Times | AstKind::Divide))
            || self.is_power(kind)
            || self.is_root(kind)
    }

    /// A literal such as `-1` that would merge with a preceding minus sign
    fn is_negative_literal(&self, kind: Option<&AstKind>) -> bool {
        matches!(kind, Some(AstKind::Cn(value)) if value.starts_with('-'))
    }

    /// Whether the right operand of a division needs parentheses
    fn divisor_needs_parentheses(&self, ast: &Ast, node: Option<NodeId>) -> bool {
        let kind = self.kind_of(ast, node);
        self.is_loose(kind)
            || matches!(kind, Some(AstKind::Times | AstKind::Divide))
            || self.is_binary_additive(ast, node)
    }

    /// Node whose value a qualifier carries
    fn unqualified(&self, ast: &Ast, node: Option<NodeId>) -> Option<NodeId> {
        match self.kind_of(ast, node) {
            Some(AstKind::Degree | AstKind::Logbase) => node.and_then(|node| ast.left(node)),
            _ => node,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Code
    // ─────────────────────────────────────────────────────────────────────────

    fn operator(&self, ast: &Ast, node: NodeId, op: &str) -> String {
        let kind = ast.kind(node);
        let left_node = ast.left(node);
        let right_node = ast.right(node);
        let mut left = self.child(ast, left_node);
        let mut right = self.child(ast, right_node);
        let l = self.kind_of(ast, left_node);
        let r = self.kind_of(ast, right_node);

        match kind {
            // Comparisons never chain
            AstKind::Eq | AstKind::Neq | AstKind::Lt | AstKind::Leq | AstKind::Gt | AstKind::Geq => {
                if self.is_loose(l) {
                    left = parenthesized(left);
                }
                if self.is_loose(r) {
                    right = parenthesized(right);
                }
            }
            AstKind::Plus => {
                if self.is_loose(l) {
                    left = parenthesized(left);
                }
                if self.is_loose(r) {
                    right = parenthesized(right);
                }
            }
            AstKind::Minus => {
                if self.is_loose(l) {
                    left = parenthesized(left);
                }
                if self.is_loose(r)
                    || matches!(r, Some(AstKind::Minus))
                    || self.is_binary(ast, right_node, AstKind::Plus)
                    || self.is_negative_literal(r)
                {
                    right = parenthesized(right);
                }
            }
            AstKind::Times => {
                if self.is_loose(l) || self.is_binary_additive(ast, left_node) {
                    left = parenthesized(left);
                }
                if self.is_loose(r) || self.is_binary_additive(ast, right_node) {
                    right = parenthesized(right);
                }
            }
            AstKind::Divide => {
                if self.is_loose(l) || self.is_binary_additive(ast, left_node) {
                    left = parenthesized(left);
                }
                if self.divisor_needs_parentheses(ast, right_node) {
                    right = parenthesized(right);
                }
            }
            AstKind::And | AstKind::Or | AstKind::Xor => {
                let needs = |operand: Option<&AstKind>, node: Option<NodeId>| {
                    let other_logical = match kind {
                        AstKind::And => self.is_or(operand) || self.is_xor(operand),
                        AstKind::Or => self.is_and(operand) || self.is_xor(operand),
                        _ => self.is_and(operand) || self.is_or(operand),
                    };
                    self.is_relational(operand)
                        || other_logical
                        || self.is_piecewise(operand)
                        || self.is_binary_additive(ast, node)
                        || self.is_power(operand)
                        || self.is_root(operand)
                };
                if needs(l, left_node) {
                    left = parenthesized(left);
                }
                if needs(r, right_node) {
                    right = parenthesized(right);
                }
            }
            AstKind::Power => {
                if self.is_loose(l)
                    || matches!(l, Some(AstKind::Minus | AstKind::Times | AstKind::Divide))
                    || self.is_binary(ast, left_node, AstKind::Plus)
                {
                    left = parenthesized(left);
                }
                if self.is_loose(r)
                    || matches!(l, Some(AstKind::Minus))
                    || matches!(r, Some(AstKind::Times | AstKind::Divide))
                    || self.is_power(r)
                    || self.is_root(r)
                    || self.is_binary(ast, right_node, AstKind::Plus)
                {
                    right = parenthesized(right);
                }
            }
            AstKind::Root => {
                let degree_node = self.unqualified(ast, left_node);
                let degree = self.kind_of(ast, degree_node);
                if self.is_loose(r)
                    || matches!(r, Some(AstKind::Minus | AstKind::Times | AstKind::Divide))
                    || self.is_binary(ast, right_node, AstKind::Plus)
                {
                    right = parenthesized(right);
                }
                if self.is_loose(degree)
                    || matches!(degree, Some(AstKind::Minus | AstKind::Times | AstKind::Divide))
                    || self.is_power(degree)
                    || self.is_root(degree)
                    || self.is_binary(ast, degree_node, AstKind::Plus)
                {
                    left = parenthesized(left);
                }
                return format!("{}{}(1.0{}{})", right, op, self.profile.divide_string, left);
            }
            _ => {}
        }

        format!("{}{}{}", left, op, right)
    }

    fn unary_minus(&self, ast: &Ast, node: NodeId) -> String {
        let operand = ast.left(node);
        let code = self.child(ast, operand);
        let kind = self.kind_of(ast, operand);
        let code = if self.is_loose(kind)
            || matches!(kind, Some(AstKind::Plus | AstKind::Minus))
            || self.is_negative_literal(kind)
        {
            parenthesized(code)
        } else {
            code
        };
        format!("{}{}", self.profile.minus_string, code)
    }

    fn call(&self, function: &str, arguments: &[String]) -> String {
        format!("{}({})", function, arguments.join(", "))
    }

    fn unary_call(&self, ast: &Ast, node: NodeId, function: &str) -> String {
        self.call(function, &[self.child(ast, ast.left(node))])
    }

    fn binary_call(&self, ast: &Ast, node: NodeId, function: &str) -> String {
        self.call(
            function,
            &[
                self.child(ast, ast.left(node)),
                self.child(ast, ast.right(node)),
            ],
        )
    }

    fn relation(&self, ast: &Ast, node: NodeId, native: bool, op: &str) -> String {
        if native {
            self.operator(ast, node, op)
        } else {
            self.binary_call(ast, node, op)
        }
    }

    fn if_statement(&self, condition: &str, value: &str) -> String {
        let template = if self.profile.has_conditional_operator {
            &self.profile.conditional_operator_if_string
        } else {
            &self.profile.piecewise_if_string
        };
        template
            .replace("<CONDITION>", condition)
            .replace("<IF_STATEMENT>", value)
    }

    fn else_statement(&self, value: &str) -> String {
        let template = if self.profile.has_conditional_operator {
            &self.profile.conditional_operator_else_string
        } else {
            &self.profile.piecewise_else_string
        };
        template.replace("<ELSE_STATEMENT>", value)
    }

    pub fn code(&self, ast: &Ast, node: NodeId) -> String {
        let p = self.profile;
        let left = ast.left(node);
        let right = ast.right(node);

        match ast.kind(node) {
            AstKind::Assignment => self.operator(ast, node, &p.assignment_string),

            AstKind::Eq => self.relation(ast, node, p.has_eq_operator, &p.eq_string),
            AstKind::Neq => self.relation(ast, node, p.has_neq_operator, &p.neq_string),
            AstKind::Lt => self.relation(ast, node, p.has_lt_operator, &p.lt_string),
            AstKind::Leq => self.relation(ast, node, p.has_leq_operator, &p.leq_string),
            AstKind::Gt => self.relation(ast, node, p.has_gt_operator, &p.gt_string),
            AstKind::Geq => self.relation(ast, node, p.has_geq_operator, &p.geq_string),
            AstKind::And => self.relation(ast, node, p.has_and_operator, &p.and_string),
            AstKind::Or => self.relation(ast, node, p.has_or_operator, &p.or_string),
            AstKind::Xor => self.relation(ast, node, p.has_xor_operator, &p.xor_string),
            AstKind::Not if p.has_not_operator => {
                let operand = self.child(ast, left);
                if self.is_loose(self.kind_of(ast, left)) || self.is_binary_arithmetic(ast, left) {
                    format!("{}{}", p.not_string, parenthesized(operand))
                } else {
                    format!("{}{}", p.not_string, operand)
                }
            }
            AstKind::Not => self.unary_call(ast, node, &p.not_string),

            AstKind::Plus if right.is_none() => self.child(ast, left),
            AstKind::Plus => self.operator(ast, node, &p.plus_string),
            AstKind::Minus if right.is_none() => self.unary_minus(ast, node),
            AstKind::Minus => self.operator(ast, node, &p.minus_string),
            AstKind::Times => self.operator(ast, node, &p.times_string),
            AstKind::Divide => self.operator(ast, node, &p.divide_string),
            AstKind::Power => {
                let exponent = self.child(ast, right);
                if approximately(&exponent, 0.5) {
                    self.unary_call(ast, node, &p.square_root_string)
                } else if approximately(&exponent, 2.0) && !p.square_string.is_empty() {
                    self.unary_call(ast, node, &p.square_string)
                } else if p.has_power_operator {
                    self.operator(ast, node, &p.power_string)
                } else {
                    self.call(&p.power_string, &[self.child(ast, left), exponent])
                }
            }
            AstKind::Root => match right {
                Some(radicand) => {
                    let degree_node = self.unqualified(ast, left);
                    let degree = self.child(ast, left);
                    if approximately(&degree, 2.0) {
                        self.call(&p.square_root_string, &[self.code(ast, radicand)])
                    } else if p.has_power_operator {
                        self.operator(ast, node, &p.power_string)
                    } else {
                        let degree = if self.divisor_needs_parentheses(ast, degree_node) {
                            parenthesized(degree)
                        } else {
                            degree
                        };
                        let inverse = format!("1.0{}{}", p.divide_string, degree);
                        self.call(&p.power_string, &[self.code(ast, radicand), inverse])
                    }
                }
                None => self.unary_call(ast, node, &p.square_root_string),
            },
            AstKind::Abs => self.unary_call(ast, node, &p.absolute_value_string),
            AstKind::Exp => self.unary_call(ast, node, &p.exponential_string),
            AstKind::Ln => self.unary_call(ast, node, &p.natural_logarithm_string),
            AstKind::Log => match right {
                Some(argument) => {
                    let base = self.child(ast, left);
                    let argument = self.code(ast, argument);
                    if approximately(&base, 10.0) {
                        self.call(&p.common_logarithm_string, &[argument])
                    } else {
                        format!(
                            "{}{}{}",
                            self.call(&p.natural_logarithm_string, &[argument]),
                            p.divide_string,
                            self.call(&p.natural_logarithm_string, &[base])
                        )
                    }
                }
                None => self.unary_call(ast, node, &p.common_logarithm_string),
            },
            AstKind::Ceiling => self.unary_call(ast, node, &p.ceiling_string),
            AstKind::Floor => self.unary_call(ast, node, &p.floor_string),
            AstKind::Min => self.binary_call(ast, node, &p.min_string),
            AstKind::Max => self.binary_call(ast, node, &p.max_string),
            AstKind::Rem => self.binary_call(ast, node, &p.remainder_string),

            AstKind::Diff => self.child(ast, right),

            AstKind::Sin => self.unary_call(ast, node, &p.sin_string),
            AstKind::Cos => self.unary_call(ast, node, &p.cos_string),
            AstKind::Tan => self.unary_call(ast, node, &p.tan_string),
            AstKind::Sec => self.unary_call(ast, node, &p.sec_string),
            AstKind::Csc => self.unary_call(ast, node, &p.csc_string),
            AstKind::Cot => self.unary_call(ast, node, &p.cot_string),
            AstKind::Sinh => self.unary_call(ast, node, &p.sinh_string),
            AstKind::Cosh => self.unary_call(ast, node, &p.cosh_string),
            AstKind::Tanh => self.unary_call(ast, node, &p.tanh_string),
            AstKind::Sech => self.unary_call(ast, node, &p.sech_string),
            AstKind::Csch => self.unary_call(ast, node, &p.csch_string),
            AstKind::Coth => self.unary_call(ast, node, &p.coth_string),
            AstKind::Asin => self.unary_call(ast, node, &p.asin_string),
            AstKind::Acos => self.unary_call(ast, node, &p.acos_string),
            AstKind::Atan => self.unary_call(ast, node, &p.atan_string),
            AstKind::Asec => self.unary_call(ast, node, &p.asec_string),
            AstKind::Acsc => self.unary_call(ast, node, &p.acsc_string),
            AstKind::Acot => self.unary_call(ast, node, &p.acot_string),
            AstKind::Asinh => self.unary_call(ast, node, &p.asinh_string),
            AstKind::Acosh => self.unary_call(ast, node, &p.acosh_string),
            AstKind::Atanh => self.unary_call(ast, node, &p.atanh_string),
            AstKind::Asech => self.unary_call(ast, node, &p.asech_string),
            AstKind::Acsch => self.unary_call(ast, node, &p.acsch_string),
            AstKind::Acoth => self.unary_call(ast, node, &p.acoth_string),

            AstKind::Piecewise => {
                let first = self.child(ast, left);
                let rest = match self.kind_of(ast, right) {
                    Some(AstKind::Piece) => {
                        let piece = self.child(ast, right);
                        self.else_statement(&format!(
                            "{}{}",
                            piece,
                            self.else_statement(&p.nan_string)
                        ))
                    }
                    Some(_) => self.else_statement(&self.child(ast, right)),
                    None => self.else_statement(&p.nan_string),
                };
                format!("{}{}", first, rest)
            }
            AstKind::Piece => {
                self.if_statement(&self.child(ast, right), &self.child(ast, left))
            }
            AstKind::Otherwise | AstKind::Degree | AstKind::Logbase | AstKind::Bvar => {
                self.child(ast, left)
            }

            AstKind::Ci(declaration) => match self.model.binding(*declaration) {
                Some((kind, index)) => {
                    let rate = ast.parent_kind(node) == Some(&AstKind::Diff);
                    self.variable_name(kind, index, rate)
                }
                None => p.nan_string.clone(),
            },
            AstKind::Cn(value) => generate_double(value),

            AstKind::True => p.true_string.clone(),
            AstKind::False => p.false_string.clone(),
            AstKind::E => p.e_string.clone(),
            AstKind::Pi => p.pi_string.clone(),
            AstKind::Inf => p.inf_string.clone(),
            AstKind::Nan => p.nan_string.clone(),
        }
    }
}

/// Helper function an expression kind requires, if the profile renders it as
/// a call to one
pub fn helper_for<'p>(profile: &'p GeneratorProfile, kind: &AstKind) -> Option<&'p HelperFunction> {
    let p = profile;
    let helper = match kind {
        AstKind::Eq if !p.has_eq_operator => &p.eq_function,
        AstKind::Neq if !p.has_neq_operator => &p.neq_function,
        AstKind::Lt if !p.has_lt_operator => &p.lt_function,
        AstKind::Leq if !p.has_leq_operator => &p.leq_function,
        AstKind::Gt if !p.has_gt_operator => &p.gt_function,
        AstKind::Geq if !p.has_geq_operator => &p.geq_function,
        AstKind::And if !p.has_and_operator => &p.and_function,
        AstKind::Or if !p.has_or_operator => &p.or_function,
        AstKind::Xor if !p.has_xor_operator => &p.xor_function,
        AstKind::Not if !p.has_not_operator => &p.not_function,
        AstKind::Min => &p.min_function,
        AstKind::Max => &p.max_function,
        AstKind::Sec => &p.sec_function,
        AstKind::Csc => &p.csc_function,
        AstKind::Cot => &p.cot_function,
        AstKind::Sech => &p.sech_function,
        AstKind::Csch => &p.csch_function,
        AstKind::Coth => &p.coth_function,
        AstKind::Asec => &p.asec_function,
        AstKind::Acsc => &p.acsc_function,
        AstKind::Acot => &p.acot_function,
        AstKind::Asech => &p.asech_function,
        AstKind::Acsch => &p.acsch_function,
        AstKind::Acoth => &p.acoth_function,
        _ => return None,
    };
    (!helper.is_empty()).then_some(helper)
}
