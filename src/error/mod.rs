use thiserror::Error;

use crate::analyser::{Issue, ModelType};
use crate::json::JsonModelError;
use crate::mathml::MathError;
use crate::units::UnitsError;

#[derive(Error, Debug)]
pub enum CellgenError {
    #[error("Error in the model description: {0}")]
    Model(#[from] JsonModelError),

    #[error("Error in the math: {0}")]
    Math(#[from] MathError),

    #[error("Error in the units: {0}")]
    Units(#[from] UnitsError),

    #[error("Error reading JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid generator profile: {0}")]
    Profile(String),

    #[error("Cannot generate code for a model classified as {model_type} ({} issues)", .issues.len())]
    AnalysisFailed {
        model_type: ModelType,
        issues: Vec<Issue>,
    },
}

impl CellgenError {
    /// Issues reported by the analysis, if that is what failed
    pub fn issues(&self) -> &[Issue] {
        match self {
            Self::AnalysisFailed { issues, .. } => issues,
            _ => &[],
        }
    }
}
