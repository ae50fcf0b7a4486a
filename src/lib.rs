pub mod analyser;
pub mod error;
pub mod generator;
pub mod json;
pub mod mathml;
pub mod units;

use rayon::prelude::*;
use tracing::info;

pub use crate::analyser::{
    AnalysedEquation, AnalysedModel, AnalysedVariable, Analyser, EquationKind, Issue, IssueKind,
    ModelType, VariableType,
};
pub use crate::generator::{GeneratedCode, Generator, GeneratorProfile, ProfileKind};
pub use crate::json::{parse_json, resolve_json, validate_json, JsonModel, ModelLibrary};
pub use error::CellgenError;

// ============================================================================
// One-call entry points
// ============================================================================

/// Parse, validate and analyse a JSON model
pub fn analyse_json(json: &str) -> Result<AnalysedModel, CellgenError> {
    let validated = validate_json(json)?;
    Ok(Analyser::new().analyse(validated.inner()))
}

/// Parse, validate and analyse a JSON model, then generate code for it
///
/// Fails with [`CellgenError::AnalysisFailed`] when the model is neither an
/// ODE nor an algebraic model.
pub fn generate_code(
    json: &str,
    profile: &GeneratorProfile,
) -> Result<GeneratedCode, CellgenError> {
    let analysed = analyse_json(json)?;
    if !analysed.model_type().is_valid() {
        return Err(CellgenError::AnalysisFailed {
            model_type: analysed.model_type(),
            issues: analysed.issues().to_vec(),
        });
    }
    info!(
        model_type = %analysed.model_type(),
        states = analysed.state_count(),
        variables = analysed.variable_count(),
        profile = %profile.kind,
        "generating code"
    );
    Ok(Generator::new(&analysed, profile).generate())
}

/// Analyse independent models in parallel
pub fn analyse_all(models: &[JsonModel]) -> Vec<AnalysedModel> {
    let analyser = Analyser::new();
    models.par_iter().map(|model| analyser.analyse(model)).collect()
}

pub mod prelude {
    pub mod json {
        pub use crate::json::{
            Component, Connection, InitialValue, JsonModel, ModelLibrary, UnitTerm,
            UnitsDefinition, Validator, Variable,
        };
    }
    pub mod analyser {
        pub use crate::analyser::{
            AnalysedEquation, AnalysedModel, AnalysedVariable, Analyser, DeclaredVariable,
            EquationKind, Issue, IssueKind, Level, MathFunction, ModelType, VariableType,
        };
    }
    pub mod generator {
        pub use crate::generator::{
            GeneratedCode, Generator, GeneratorProfile, HelperFunction, ProfileKind,
        };
    }

    pub use crate::{analyse_all, analyse_json, generate_code, CellgenError};
}
