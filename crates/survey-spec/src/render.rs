use serde_json::{Map, Value, json};

use crate::{
    answers::ValidationResult,
    navigation::SurveySession,
    response::ResponseItem,
    spec::{component::ResponseComponent, item::SingleItem, localized::LocalizedText},
    validate::validate_page,
    visibility::{ComponentState, resolve_components},
};

/// Labels for the page actions; defaults match the stock view.
#[derive(Debug, Clone)]
pub struct ActionLabels {
    pub back: String,
    pub next: String,
    pub submit: String,
}

impl Default for ActionLabels {
    fn default() -> Self {
        Self {
            back: "Back".into(),
            next: "Next".into(),
            submit: "Submit".into(),
        }
    }
}

/// Primary action offered on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Next,
    Submit,
}

impl PageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageAction::Next => "next",
            PageAction::Submit => "submit",
        }
    }
}

/// One response component as the view should draw it.
#[derive(Debug, Clone)]
pub struct RenderComponent {
    pub state: ComponentState,
    pub content: Option<String>,
}

/// Describes a single visible item for render outputs.
#[derive(Debug, Clone)]
pub struct RenderItem {
    pub key: String,
    pub title: Option<String>,
    pub help: Option<String>,
    pub components: Vec<RenderComponent>,
    pub response: Option<ResponseItem>,
    pub failed_rules: Vec<String>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub survey_id: String,
    pub survey_name: Option<String>,
    pub description: Option<String>,
    pub language: String,
    pub page_index: usize,
    pub page_count: usize,
    /// Progress is only drawn for multi-page surveys.
    pub show_progress: bool,
    pub action: PageAction,
    pub action_label: String,
    pub back_label: Option<String>,
    pub items: Vec<RenderItem>,
    pub validation: ValidationResult,
}

/// Builds the view model of page `index`, or `None` when it does not exist.
pub fn build_render_payload(
    session: &SurveySession,
    index: usize,
    language: &str,
    labels: &ActionLabels,
) -> Option<RenderPayload> {
    let survey = session.survey();
    let ctx = session.responses();
    let pages = session.pages();
    let page = pages.get(index)?;
    let page_count = pages.len();
    let validation = validate_page(page, ctx);

    let items = page
        .items
        .iter()
        .map(|item| render_item(item, session, language, &validation))
        .collect();

    let action = if index + 1 >= page_count {
        PageAction::Submit
    } else {
        PageAction::Next
    };
    let action_label = match action {
        PageAction::Next => labels.next.clone(),
        PageAction::Submit => labels.submit.clone(),
    };

    Some(RenderPayload {
        survey_id: survey.id.clone(),
        survey_name: resolve_text(survey.name.as_ref(), language),
        description: resolve_text(survey.description.as_ref(), language),
        language: language.to_string(),
        page_index: index,
        page_count,
        show_progress: page_count > 1,
        action,
        action_label,
        back_label: (index > 0).then(|| labels.back.clone()),
        items,
        validation,
    })
}

fn render_item(
    item: &SingleItem,
    session: &SurveySession,
    language: &str,
    validation: &ValidationResult,
) -> RenderItem {
    let ctx = session.responses();
    let mut contents = Vec::new();
    if let Some(root) = &item.components {
        collect_contents(root, &mut contents);
    }
    let components = resolve_components(item, ctx)
        .into_iter()
        .zip(contents)
        .map(|(state, content)| RenderComponent {
            state,
            content: resolve_text(content, language),
        })
        .collect();

    RenderItem {
        key: item.key.clone(),
        title: resolve_text(item.title.as_ref(), language),
        help: resolve_text(item.help.as_ref(), language),
        components,
        response: ctx
            .response(&item.key)
            .and_then(|response| response.response.clone()),
        failed_rules: validation
            .failed_rules(&item.key)
            .into_iter()
            .map(str::to_string)
            .collect(),
    }
}

// Same depth-first order as `resolve_components`.
fn collect_contents<'a>(
    component: &'a ResponseComponent,
    out: &mut Vec<Option<&'a LocalizedText>>,
) {
    out.push(component.content.as_ref());
    for child in &component.items {
        collect_contents(child, out);
    }
}

fn resolve_text(text: Option<&LocalizedText>, language: &str) -> Option<String> {
    text.and_then(|text| text.resolve(language))
        .map(str::to_string)
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let items = payload
        .items
        .iter()
        .map(|item| {
            let mut map = Map::new();
            map.insert("key".into(), Value::String(item.key.clone()));
            map.insert(
                "title".into(),
                item.title.clone().map(Value::String).unwrap_or(Value::Null),
            );
            if let Some(help) = &item.help {
                map.insert("help".into(), Value::String(help.clone()));
            }
            let components = item
                .components
                .iter()
                .map(|component| {
                    let mut entry = serde_json::to_value(&component.state)
                        .unwrap_or_else(|_| Value::Object(Map::new()));
                    if let (Some(content), Some(object)) =
                        (&component.content, entry.as_object_mut())
                    {
                        object.insert("content".into(), Value::String(content.clone()));
                    }
                    entry
                })
                .collect::<Vec<_>>();
            map.insert("components".into(), Value::Array(components));
            if let Some(response) = &item.response {
                map.insert(
                    "response".into(),
                    serde_json::to_value(response).unwrap_or(Value::Null),
                );
            }
            map.insert(
                "failed_rules".into(),
                Value::Array(
                    item.failed_rules
                        .iter()
                        .map(|rule| Value::String(rule.clone()))
                        .collect(),
                ),
            );
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "survey_id": payload.survey_id,
        "survey_name": payload.survey_name,
        "description": payload.description,
        "language": payload.language,
        "page": {
            "index": payload.page_index,
            "count": payload.page_count,
            "show_progress": payload.show_progress,
        },
        "action": {
            "kind": payload.action.as_str(),
            "label": payload.action_label,
            "back_label": payload.back_label,
        },
        "items": items,
        "validation": serde_json::to_value(&payload.validation).unwrap_or(Value::Null),
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Survey: {} ({})",
        payload.survey_name.as_deref().unwrap_or(&payload.survey_id),
        payload.survey_id
    ));
    if let Some(description) = &payload.description {
        lines.push(description.clone());
    }
    if payload.show_progress {
        lines.push(format!(
            "Page {}/{}",
            payload.page_index + 1,
            payload.page_count
        ));
    }

    for item in &payload.items {
        lines.push(format!(
            "* {} [{}]",
            item.title.as_deref().unwrap_or(""),
            item.key
        ));
        if let Some(help) = &item.help {
            lines.push(format!("  Help: {}", help));
        }
        for component in &item.components {
            if !component.state.visible || !component.state.role.is_selectable() {
                continue;
            }
            let key = component
                .state
                .path
                .rsplit('.')
                .next()
                .unwrap_or(&component.state.path);
            let mut entry = format!("  ({}) {}", key, component.content.as_deref().unwrap_or(""));
            if component.state.disabled {
                entry.push_str(" [disabled]");
            }
            if selected(item.response.as_ref(), &component.state.path) {
                entry.push_str(" [selected]");
            }
            lines.push(entry);
        }
        for rule in &item.failed_rules {
            lines.push(format!("  ! rule {} not satisfied", rule));
        }
    }

    let mut actions = Vec::new();
    if let Some(back) = &payload.back_label {
        actions.push(back.clone());
    }
    actions.push(payload.action_label.clone());
    lines.push(format!("Actions: {}", actions.join(" | ")));
    lines.join("\n")
}

fn selected(response: Option<&ResponseItem>, path: &str) -> bool {
    response.is_some_and(|response| response.find(path).is_some())
}
