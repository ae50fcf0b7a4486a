use float_cmp::approx_eq;
use tracing::warn;

use super::ast::{Ast, AstKind, NodeId};
use super::index::ModelIndex;
use super::registry::VariableRegistry;
use super::DeclId;
use crate::units::UnitsRegistry;

/// Rewrites references so that every value is expressed in the units of the
/// equation that uses it
pub(crate) struct UnitScaler<'s, 'a> {
    index: &'s ModelIndex<'a>,
    registry: &'s VariableRegistry,
    units: Option<&'s UnitsRegistry>,
}

impl<'s, 'a> UnitScaler<'s, 'a> {
    pub fn new(
        index: &'s ModelIndex<'a>,
        registry: &'s VariableRegistry,
        units: Option<&'s UnitsRegistry>,
    ) -> Self {
        Self {
            index,
            registry,
            units,
        }
    }

    /// Multiplier converting the value of `declaration`'s class into its own
    /// units
    fn factor(&self, declaration: DeclId) -> f64 {
        let Some(id) = self.registry.find(declaration, self.index) else {
            return 1.0;
        };
        let primary = self.registry.get(id).variable;
        let local = &self.index.declaration(declaration).units;
        let reference = &self.index.declaration(primary).units;
        if local == reference {
            return 1.0;
        }
        let Some(units) = self.units else {
            return 1.0;
        };
        match units.scaling_factor(local, reference) {
            Ok(factor) => factor,
            Err(e) => {
                warn!(local = %local, reference = %reference, error = %e, "units not scaled");
                1.0
            }
        }
    }

    pub fn scale(&self, ast: &mut Ast) {
        for node in ast.post_order() {
            let AstKind::Ci(declaration) = *ast.kind(node) else {
                continue;
            };
            match ast.parent(node) {
                Some(diff) if ast.kind(diff) == &AstKind::Diff => self.scale_rate(ast, diff),
                Some(parent) if ast.kind(parent) == &AstKind::Bvar => {}
                _ => {
                    let factor = self.factor(declaration);
                    if !approx_eq!(f64, factor, 1.0, ulps = 4) {
                        let times = ast.push(AstKind::Times, None);
                        let scale = ast.push(AstKind::Cn(factor.to_string()), None);
                        ast.replace(node, times);
                        ast.set_left(times, Some(scale));
                        ast.set_right(times, Some(node));
                    }
                }
            }
        }
    }

    /// Scale a derivative by the units of its variable of integration
    fn scale_rate(&self, ast: &mut Ast, diff: NodeId) {
        let voi = ast.left(diff).and_then(|bvar| ast.left(bvar));
        let Some(AstKind::Ci(voi)) = voi.map(|voi| ast.kind(voi).clone()) else {
            return;
        };
        let factor = self.factor(voi);
        if approx_eq!(f64, factor, 1.0, ulps = 4) {
            return;
        }

        match ast.parent(diff) {
            Some(assignment)
                if ast.kind(assignment) == &AstKind::Assignment
                    && ast.left(assignment) == Some(diff) =>
            {
                let rhs = ast.right(assignment);
                let times = ast.push(AstKind::Times, None);
                let scale = ast.push(AstKind::Cn(factor.to_string()), None);
                ast.set_left(times, Some(scale));
                ast.set_right(times, rhs);
                ast.set_right(assignment, Some(times));
            }
            _ => {
                let times = ast.push(AstKind::Times, None);
                let scale = ast.push(AstKind::Cn((1.0 / factor).to_string()), None);
                ast.replace(diff, times);
                ast.set_left(times, Some(scale));
                ast.set_right(times, Some(diff));
            }
        }
    }
}
