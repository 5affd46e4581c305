use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::expr::{Expression, ExpressionArg};
use crate::spec::localized::LocalizedText;

/// Role of a response component, as understood by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ComponentRole {
    ResponseGroup,
    SingleChoiceGroup,
    MultipleChoiceGroup,
    DropDownGroup,
    Option,
    Input,
    DateInput,
    NumberInput,
    Text,
}

impl ComponentRole {
    /// Whether the component is something a respondent picks.
    pub fn is_selectable(&self) -> bool {
        matches!(
            self,
            ComponentRole::Option
                | ComponentRole::Input
                | ComponentRole::DateInput
                | ComponentRole::NumberInput
        )
    }
}

/// Extra properties; `min`/`max` may be expressions evaluated at render time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ComponentProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<ExpressionArg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<ExpressionArg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseComponent {
    pub key: String,
    pub role: ComponentRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<LocalizedText>,
    /// When true the component is shown but cannot be selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_condition: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ComponentProperties>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ResponseComponent>,
}
