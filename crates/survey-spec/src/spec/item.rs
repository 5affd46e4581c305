use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::expr::Expression;
use crate::spec::component::ResponseComponent;
use crate::spec::localized::LocalizedText;

/// A node of the survey tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SurveyItem {
    Group(GroupItem),
    Single(SingleItem),
    /// Authoring-time marker closing the current page.
    PageBreak { key: String },
}

impl SurveyItem {
    pub fn key(&self) -> &str {
        match self {
            SurveyItem::Group(group) => &group.key,
            SurveyItem::Single(single) => &single.key,
            SurveyItem::PageBreak { key } => key,
        }
    }

    pub fn condition(&self) -> Option<&Expression> {
        match self {
            SurveyItem::Group(group) => group.condition.as_ref(),
            SurveyItem::Single(single) => single.condition.as_ref(),
            SurveyItem::PageBreak { .. } => None,
        }
    }
}

/// How a group emits its children. Only declaration order is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum SelectionMethod {
    #[default]
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupItem {
    pub key: String,
    #[serde(default)]
    pub items: Vec<SurveyItem>,
    #[serde(default)]
    pub selection_method: SelectionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expression>,
}

/// A question (or display-only text) shown on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SingleItem {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expression>,
    /// Root response component, usually the `rg` response group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<ResponseComponent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<Validation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValidationKind {
    /// Must pass before the page can be left forward.
    Hard,
    /// Informational only.
    Soft,
}

/// Named rule attached to an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: ValidationKind,
    pub rule: Expression,
}
