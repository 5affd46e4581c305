use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::response::ItemResponse;
use crate::spec::item::ValidationKind;

/// Responses handed to the persistence collaborator on submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerSet {
    pub survey_id: String,
    pub version: String,
    /// Unix seconds.
    pub submitted_at: i64,
    pub responses: Vec<ItemResponse>,
}

impl AnswerSet {
    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn response(&self, item_key: &str) -> Option<&ItemResponse> {
        self.responses
            .iter()
            .find(|response| response.key == item_key)
    }
}

/// A validation rule that did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    pub item_key: String,
    pub rule_key: String,
    pub kind: ValidationKind,
}

/// Outcome of checking one item or page. Only hard failures make it invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<ValidationError>,
    #[serde(default)]
    pub warnings: Vec<ValidationError>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    pub fn merge(&mut self, other: ValidationResult) {
        self.valid &= other.valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Failed hard rule keys for one item.
    pub fn failed_rules(&self, item_key: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|error| error.item_key == item_key)
            .map(|error| error.rule_key.as_str())
            .collect()
    }
}
