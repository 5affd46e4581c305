use schemars::schema_for;
use serde_json::Value;

use crate::answers::AnswerSet;
use crate::spec::survey::Survey;

/// JSON schema of the survey definition format.
pub fn definition_schema() -> Value {
    serde_json::to_value(schema_for!(Survey)).unwrap_or(Value::Null)
}

/// JSON schema of a submitted answer set.
pub fn answer_set_schema() -> Value {
    serde_json::to_value(schema_for!(AnswerSet)).unwrap_or(Value::Null)
}
