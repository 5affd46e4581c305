use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::spec::check::{DefinitionError, check_survey};
use crate::spec::survey::Survey;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to parse survey definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid survey definition: {0}")]
    Definition(#[from] DefinitionError),
}

/// Parses and checks a survey definition. Unknown opcodes, malformed keys,
/// bad arity and invalid regex literals are all reported here rather than
/// at evaluation time.
pub fn load_survey(json: &str) -> Result<Survey, LoadError> {
    let survey: Survey = serde_json::from_str(json)?;
    checked(survey)
}

pub fn load_survey_value(value: Value) -> Result<Survey, LoadError> {
    let survey: Survey = serde_json::from_value(value)?;
    checked(survey)
}

fn checked(survey: Survey) -> Result<Survey, LoadError> {
    check_survey(&survey)?;
    debug!(survey = %survey.id, version = %survey.version, "survey definition loaded");
    Ok(survey)
}
