use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::item::{GroupItem, SingleItem, SurveyItem};
use crate::spec::localized::LocalizedText;

/// Top-level survey definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    /// Expected time to fill in the survey.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<LocalizedText>,
    pub root: GroupItem,
}

impl Survey {
    /// Key of the root group; every item key is prefixed by it.
    pub fn root_key(&self) -> &str {
        &self.root.key
    }

    /// Leaf items in declaration order, regardless of visibility.
    pub fn single_items(&self) -> Vec<&SingleItem> {
        let mut out = Vec::new();
        collect_single_items(&self.root.items, &mut out);
        out
    }

    pub fn find_item(&self, key: &str) -> Option<&SurveyItem> {
        find_in(&self.root.items, key)
    }
}

fn collect_single_items<'a>(items: &'a [SurveyItem], out: &mut Vec<&'a SingleItem>) {
    for item in items {
        match item {
            SurveyItem::Single(single) => out.push(single),
            SurveyItem::Group(group) => collect_single_items(&group.items, out),
            SurveyItem::PageBreak { .. } => {}
        }
    }
}

fn find_in<'a>(items: &'a [SurveyItem], key: &str) -> Option<&'a SurveyItem> {
    for item in items {
        if item.key() == key {
            return Some(item);
        }
        if let SurveyItem::Group(group) = item
            && let Some(found) = find_in(&group.items, key)
        {
            return Some(found);
        }
    }
    None
}
