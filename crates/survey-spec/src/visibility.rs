use serde::Serialize;
use serde_json::Value;

use crate::expr::{Expression, ExpressionArg};
use crate::response::ResponseContext;
use crate::spec::component::{ComponentRole, ResponseComponent};
use crate::spec::item::{SingleItem, SurveyItem};
use crate::spec::survey::Survey;

pub type VisibilityMap = std::collections::BTreeMap<String, bool>;

/// Absent conditions always hold.
pub fn condition_holds(condition: Option<&Expression>, ctx: &ResponseContext) -> bool {
    condition.is_none_or(|expr| expr.evaluate_bool(ctx))
}

/// Visibility of every item in the tree, keyed by item key.
///
/// An item is visible when its own condition holds and every enclosing group
/// is visible; groups are resolved top-down.
pub fn resolve_visibility(survey: &Survey, ctx: &ResponseContext) -> VisibilityMap {
    let mut map = VisibilityMap::new();
    let root_visible = condition_holds(survey.root.condition.as_ref(), ctx);
    map.insert(survey.root.key.clone(), root_visible);
    resolve_items(&survey.root.items, root_visible, ctx, &mut map);
    map
}

fn resolve_items(
    items: &[SurveyItem],
    parent_visible: bool,
    ctx: &ResponseContext,
    map: &mut VisibilityMap,
) {
    for item in items {
        let visible = parent_visible && condition_holds(item.condition(), ctx);
        map.insert(item.key().to_string(), visible);
        if let SurveyItem::Group(group) = item {
            resolve_items(&group.items, visible, ctx, map);
        }
    }
}

/// Resolved state of one response component of an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentState {
    /// Dotted path from the item's root component, e.g. `rg.mcg.1`.
    pub path: String,
    pub role: ComponentRole,
    pub visible: bool,
    /// Rendered but not selectable.
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
}

/// Flattens the item's component tree, depth first, evaluating display
/// conditions, `disabled` rules and `min`/`max` bounds. Independent of the
/// item's own visibility.
pub fn resolve_components(item: &SingleItem, ctx: &ResponseContext) -> Vec<ComponentState> {
    let mut states = Vec::new();
    if let Some(root) = &item.components {
        resolve_component(root, "", true, false, ctx, &mut states);
    }
    states
}

fn resolve_component(
    component: &ResponseComponent,
    parent_path: &str,
    parent_visible: bool,
    parent_disabled: bool,
    ctx: &ResponseContext,
    out: &mut Vec<ComponentState>,
) {
    let path = if parent_path.is_empty() {
        component.key.clone()
    } else {
        format!("{}.{}", parent_path, component.key)
    };
    let visible = parent_visible && condition_holds(component.display_condition.as_ref(), ctx);
    let disabled = parent_disabled
        || component
            .disabled
            .as_ref()
            .is_some_and(|expr| expr.evaluate_bool(ctx));
    let bound = |arg: Option<&ExpressionArg>| {
        arg.map(|arg| arg.evaluate(ctx))
            .filter(|value| !value.is_null())
    };
    let properties = component.properties.as_ref();
    out.push(ComponentState {
        path: path.clone(),
        role: component.role,
        visible,
        disabled,
        min: bound(properties.and_then(|p| p.min.as_ref())),
        max: bound(properties.and_then(|p| p.max.as_ref())),
    });
    for child in &component.items {
        resolve_component(child, &path, visible, disabled, ctx, out);
    }
}
