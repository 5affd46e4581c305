use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// Node of a recorded response tree, e.g. `rg` → `mcg` → selected option keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseItem {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ResponseItem>>,
}

impl ResponseItem {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            dtype: None,
            items: None,
        }
    }

    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::new(key)
        }
    }

    pub fn with_items(key: impl Into<String>, items: Vec<ResponseItem>) -> Self {
        Self {
            items: Some(items),
            ..Self::new(key)
        }
    }

    /// Wraps `leaf` in the parent nodes named by the leading segments of `path`.
    ///
    /// The last segment of `path` names `leaf` itself; it is renamed to match.
    pub fn nest(path: &str, mut leaf: ResponseItem) -> Self {
        let mut segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        let Some(last) = segments.pop() else {
            return leaf;
        };
        leaf.key = last.to_string();
        segments
            .into_iter()
            .rev()
            .fold(leaf, |child, segment| Self::with_items(segment, vec![child]))
    }

    /// Walks a dotted path whose first segment must name this item.
    pub fn find(&self, path: &str) -> Option<&ResponseItem> {
        let mut segments = path.split('.');
        if segments.next()? != self.key {
            return None;
        }
        let mut current = self;
        for segment in segments {
            current = current
                .items
                .as_ref()?
                .iter()
                .find(|child| child.key == segment)?;
        }
        Some(current)
    }

    /// Keys of the direct children; for a choice group, the selected options.
    pub fn child_keys(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .flatten()
            .map(|child| child.key.as_str())
    }
}

/// Recorded response for one survey item; the prefill and submission unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ItemResponse {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseItem>,
}

/// Ambient attributes carried over from a previous survey instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SurveyContext {
    #[serde(default)]
    pub participant_flags: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Responses recorded so far plus the ambient context they are evaluated in.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    responses: BTreeMap<String, ItemResponse>,
    context: SurveyContext,
    now: i64,
}

impl ResponseContext {
    pub fn new(context: SurveyContext) -> Self {
        Self {
            responses: BTreeMap::new(),
            context,
            now: OffsetDateTime::now_utc().unix_timestamp(),
        }
    }

    pub fn with_prefills(
        context: SurveyContext,
        prefills: impl IntoIterator<Item = ItemResponse>,
    ) -> Self {
        let mut ctx = Self::new(context);
        for prefill in prefills {
            ctx.set_response(prefill);
        }
        ctx
    }

    /// Pins the evaluation timestamp (unix seconds).
    pub fn with_now(mut self, now: i64) -> Self {
        self.now = now;
        self
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn context(&self) -> &SurveyContext {
        &self.context
    }

    pub fn response(&self, item_key: &str) -> Option<&ItemResponse> {
        self.responses.get(item_key)
    }

    /// Response node at `slot_path` (e.g. `rg.mcg`) of the given item.
    pub fn response_item(&self, item_key: &str, slot_path: &str) -> Option<&ResponseItem> {
        self.responses
            .get(item_key)?
            .response
            .as_ref()?
            .find(slot_path)
    }

    pub fn responses(&self) -> impl Iterator<Item = &ItemResponse> {
        self.responses.values()
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn set_response(&mut self, response: ItemResponse) {
        self.responses.insert(response.key.clone(), response);
    }

    pub fn clear_response(&mut self, item_key: &str) -> Option<ItemResponse> {
        self.responses.remove(item_key)
    }

    /// Records the option keys selected in the choice group at `slot_path`,
    /// replacing any earlier response for the item.
    pub fn select_keys(&mut self, item_key: &str, slot_path: &str, keys: &[&str]) {
        let options = keys.iter().map(|key| ResponseItem::new(*key)).collect();
        let group = ResponseItem::with_items("", options);
        self.set_response(ItemResponse {
            key: item_key.to_string(),
            response: Some(ResponseItem::nest(slot_path, group)),
        });
    }

    /// Records a free-text value at `slot_path`, replacing any earlier
    /// response for the item.
    pub fn set_value(&mut self, item_key: &str, slot_path: &str, value: &str) {
        let leaf = ResponseItem::with_value("", value);
        self.set_response(ItemResponse {
            key: item_key.to_string(),
            response: Some(ResponseItem::nest(slot_path, leaf)),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nest_builds_path_and_find_walks_it() {
        let item = ResponseItem::nest("rg.mcg", ResponseItem::with_items("", vec![ResponseItem::new("2")]));
        assert_eq!(item.key, "rg");
        let group = item.find("rg.mcg").expect("group");
        assert_eq!(group.child_keys().collect::<Vec<_>>(), vec!["2"]);
        assert!(item.find("other.mcg").is_none());
        assert!(item.find("rg.scg").is_none());
    }

    #[test]
    fn prefills_seed_the_context() {
        let prefill = ItemResponse {
            key: "weekly.q1".into(),
            response: Some(ResponseItem::with_value("rg", "yes")),
        };
        let ctx = ResponseContext::with_prefills(SurveyContext::default(), [prefill]);
        assert_eq!(ctx.len(), 1);
        assert_eq!(
            ctx.response_item("weekly.q1", "rg").and_then(|item| item.value.as_deref()),
            Some("yes")
        );
    }

    #[test]
    fn context_serializes_flags_camel_case() {
        let mut context = SurveyContext::default();
        context.participant_flags.insert("prev".into(), "1".into());
        let value = serde_json::to_value(&context).expect("serialize");
        assert_eq!(value["participantFlags"]["prev"], "1");
    }
}
