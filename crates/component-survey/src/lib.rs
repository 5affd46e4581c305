use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::warn;

use survey_spec::{
    ActionLabels, ItemResponse, LoadError, NavigationError, NavigationState, RenderPayload,
    Survey, SurveyContext, SurveySession, Transition, build_render_payload, load_survey,
    page_url, parse_page_index, render_json_ui as spec_render_json_ui,
    render_text as spec_render_text,
};

const DEFAULT_SURVEY: &str = include_str!("../../survey-spec/tests/fixtures/weekly.json");
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_PAGES_PATH: &str = "/pages";

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config/{0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse response/{0}")]
    ResponseParse(#[source] serde_json::Error),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("survey '{0}' is not available")]
    SurveyUnavailable(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct LabelsConfig {
    #[serde(default)]
    back: Option<String>,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    submit: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    survey_json: Option<String>,
    #[serde(default)]
    language: Option<String>,
    /// Route prefix whose trailing segment carries the page index.
    #[serde(default)]
    pages_path: Option<String>,
    #[serde(default)]
    labels: Option<LabelsConfig>,
}

impl ComponentConfig {
    fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    fn pages_path(&self) -> &str {
        self.pages_path.as_deref().unwrap_or(DEFAULT_PAGES_PATH)
    }

    fn labels(&self) -> ActionLabels {
        let defaults = ActionLabels::default();
        match &self.labels {
            Some(labels) => ActionLabels {
                back: labels.back.clone().unwrap_or(defaults.back),
                next: labels.next.clone().unwrap_or(defaults.next),
                submit: labels.submit.clone().unwrap_or(defaults.submit),
            },
            None => defaults,
        }
    }
}

fn parse_config(config_json: &str) -> Result<ComponentConfig, ComponentError> {
    if config_json.trim().is_empty() {
        Ok(ComponentConfig::default())
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)
    }
}

fn ensure_survey(survey_id: &str, config: &ComponentConfig) -> Result<Survey, ComponentError> {
    let survey = load_survey(config.survey_json.as_deref().unwrap_or(DEFAULT_SURVEY))?;
    if survey.id != survey_id {
        Err(ComponentError::SurveyUnavailable(survey_id.to_string()))
    } else {
        Ok(survey)
    }
}

fn parse_context(ctx_json: &str) -> SurveyContext {
    if ctx_json.trim().is_empty() {
        return SurveyContext::default();
    }
    serde_json::from_str(ctx_json).unwrap_or_else(|err| {
        warn!(error = %err, "ignoring unparsable survey context");
        SurveyContext::default()
    })
}

fn parse_responses(responses_json: &str) -> Vec<ItemResponse> {
    if responses_json.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(responses_json).unwrap_or_else(|err| {
        warn!(error = %err, "ignoring unparsable responses");
        Vec::new()
    })
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

struct Request {
    config: ComponentConfig,
    session: SurveySession,
}

fn open_session(
    survey_id: &str,
    config_json: &str,
    ctx_json: &str,
    responses_json: &str,
) -> Result<Request, ComponentError> {
    let config = parse_config(config_json)?;
    let survey = ensure_survey(survey_id, &config)?;
    let session = SurveySession::new(
        survey,
        parse_context(ctx_json),
        parse_responses(responses_json),
    );
    Ok(Request { config, session })
}

/// Where the view ends up for `url`: a page, a redirect, or nothing to show.
enum Located {
    Page(usize),
    Redirect(String),
    Empty,
}

fn locate(request: &Request, url: &str) -> Located {
    let pages_path = request.config.pages_path();
    match request.session.resolve(parse_page_index(url, pages_path)) {
        NavigationState::AtPage(index) => Located::Page(index),
        NavigationState::Redirecting => Located::Redirect(page_url(pages_path, 0)),
        NavigationState::Empty => Located::Empty,
    }
}

pub fn describe(survey_id: &str, config_json: &str) -> String {
    respond(
        parse_config(config_json)
            .and_then(|config| ensure_survey(survey_id, &config))
            .and_then(|survey| serde_json::to_value(survey).map_err(ComponentError::JsonEncode)),
    )
}

pub fn pages(survey_id: &str, config_json: &str, ctx_json: &str, responses_json: &str) -> String {
    respond(
        open_session(survey_id, config_json, ctx_json, responses_json).map(|request| {
            let pages = request
                .session
                .pages()
                .iter()
                .map(|page| json!(page.keys()))
                .collect::<Vec<_>>();
            json!({ "count": pages.len(), "pages": pages })
        }),
    )
}

pub fn validate_responses(
    survey_id: &str,
    config_json: &str,
    ctx_json: &str,
    responses_json: &str,
) -> String {
    respond(
        open_session(survey_id, config_json, ctx_json, responses_json).and_then(|request| {
            let session = &request.session;
            let result = survey_spec::validate(session.survey(), session.responses());
            serde_json::to_value(result).map_err(ComponentError::JsonEncode)
        }),
    )
}

fn render_payload(request: &Request, index: usize) -> Option<RenderPayload> {
    build_render_payload(
        &request.session,
        index,
        request.config.language(),
        &request.config.labels(),
    )
}

pub fn render_json_ui(
    survey_id: &str,
    config_json: &str,
    ctx_json: &str,
    responses_json: &str,
    url: &str,
) -> String {
    respond(
        open_session(survey_id, config_json, ctx_json, responses_json).map(|request| {
            match locate(&request, url) {
                Located::Page(index) => match render_payload(&request, index) {
                    Some(payload) => {
                        let mut ui = spec_render_json_ui(&payload);
                        ui["url"] = Value::String(page_url(request.config.pages_path(), index));
                        ui
                    }
                    None => json!({ "status": "empty" }),
                },
                Located::Redirect(target) => json!({ "status": "redirect", "url": target }),
                Located::Empty => json!({ "status": "empty" }),
            }
        }),
    )
}

pub fn render_text(
    survey_id: &str,
    config_json: &str,
    ctx_json: &str,
    responses_json: &str,
    url: &str,
) -> String {
    respond_string(
        open_session(survey_id, config_json, ctx_json, responses_json).map(|request| {
            match locate(&request, url) {
                Located::Page(index) => render_payload(&request, index)
                    .map(|payload| spec_render_text(&payload))
                    .unwrap_or_default(),
                Located::Redirect(target) => format!("Redirect: {}", target),
                Located::Empty => "No pages to show.".to_string(),
            }
        }),
    )
}

fn transition_response(request: &Request, transition: Transition) -> Result<Value, ComponentError> {
    Ok(match transition {
        Transition::Moved { to, reset_scroll } => json!({
            "status": "moved",
            "url": page_url(request.config.pages_path(), to),
            "reset_scroll": reset_scroll,
        }),
        Transition::Blocked(validation) => json!({
            "status": "blocked",
            "validation": serde_json::to_value(validation).map_err(ComponentError::JsonEncode)?,
        }),
        Transition::Submitted(answers) => json!({
            "status": "submitted",
            "answers": serde_json::to_value(answers).map_err(ComponentError::JsonEncode)?,
        }),
    })
}

/// Primary page action: next page, or submission on the last page.
pub fn advance(
    survey_id: &str,
    config_json: &str,
    ctx_json: &str,
    responses_json: &str,
    url: &str,
) -> String {
    respond(
        open_session(survey_id, config_json, ctx_json, responses_json).and_then(|mut request| {
            let transition = match locate(&request, url) {
                Located::Page(index) => request.session.advance(index)?,
                Located::Empty => Transition::Submitted(request.session.submit()?),
                Located::Redirect(target) => {
                    return Ok(json!({ "status": "redirect", "url": target }));
                }
            };
            transition_response(&request, transition)
        }),
    )
}

pub fn back(
    survey_id: &str,
    config_json: &str,
    ctx_json: &str,
    responses_json: &str,
    url: &str,
) -> String {
    respond(
        open_session(survey_id, config_json, ctx_json, responses_json).and_then(|request| {
            match locate(&request, url) {
                Located::Page(index) => {
                    let transition = request.session.back(index)?;
                    transition_response(&request, transition)
                }
                Located::Redirect(target) => Ok(json!({ "status": "redirect", "url": target })),
                Located::Empty => Ok(json!({ "status": "empty" })),
            }
        }),
    )
}

/// Replaces (or adds) one item's response in the JSON response list.
pub fn record_response(responses_json: &str, response_json: &str) -> String {
    respond(
        serde_json::from_str::<ItemResponse>(response_json)
            .map_err(ComponentError::ResponseParse)
            .and_then(|response| {
                let mut responses = parse_responses(responses_json);
                match responses.iter_mut().find(|existing| existing.key == response.key) {
                    Some(existing) => *existing = response,
                    None => responses.push(response),
                }
                serde_json::to_value(responses).map_err(ComponentError::JsonEncode)
            }),
    )
}
