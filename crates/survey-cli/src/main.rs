mod wizard;

use clap::{Parser, Subcommand, ValueEnum};
use component_survey::{
    advance, back, pages as survey_pages, record_response, render_json_ui,
    render_text as component_render_text, validate_responses,
};
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use survey_spec::{AnswerSet, answer_set_schema, definition_schema, load_survey, page_url};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wizard::{
    PromptTarget, Verbosity, WizardItem, WizardPage, WizardPresenter, parse_answer,
    rule_failures,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const LOG_ENV: &str = "SURVEY_LOG";
const LANGUAGE_ENV: &str = "SURVEY_WIZARD_LANGUAGE";
const DEFAULT_LANGUAGE: &str = "en";
const PAGES_PATH: &str = "/pages";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Text-based survey wizard CLI",
    long_about = "Walks survey pages, checks definitions and inspects page layouts backed by the survey component"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SchemaKind {
    Definition,
    Answers,
}

#[derive(Subcommand)]
enum Command {
    /// Walk a survey page by page in a text shell.
    Wizard {
        /// Path to the survey definition JSON.
        #[arg(long, value_name = "SURVEY")]
        survey: PathBuf,
        /// Optional JSON array of prefilled item responses.
        #[arg(long, value_name = "RESPONSES")]
        responses: Option<PathBuf>,
        /// Optional JSON survey context (participant flags and friends).
        #[arg(long, value_name = "CONTEXT")]
        context: Option<PathBuf>,
        /// Language for titles and options (defaults to SURVEY_WIZARD_LANGUAGE or "en").
        #[arg(long)]
        language: Option<String>,
        /// Show verbose output (item keys, slots, soft warnings).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also emit answer JSON after submission.
        #[arg(long)]
        answers_json: bool,
        /// Additional render output for each page.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Load a survey definition and run the structural checks.
    Check {
        /// Path to the survey definition JSON.
        #[arg(long, value_name = "SURVEY")]
        survey: PathBuf,
    },
    /// Print the page partition for the given responses and context.
    Pages {
        #[arg(long, value_name = "SURVEY")]
        survey: PathBuf,
        #[arg(long, value_name = "RESPONSES")]
        responses: Option<PathBuf>,
        #[arg(long, value_name = "CONTEXT")]
        context: Option<PathBuf>,
    },
    /// Validate responses against every rule of the visible items.
    Validate {
        #[arg(long, value_name = "SURVEY")]
        survey: PathBuf,
        #[arg(long, value_name = "RESPONSES")]
        responses: PathBuf,
        #[arg(long, value_name = "CONTEXT")]
        context: Option<PathBuf>,
    },
    /// Print a JSON schema.
    Schema {
        #[arg(value_enum, default_value_t = SchemaKind::Definition)]
        kind: SchemaKind,
    },
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Wizard {
            survey,
            responses,
            context,
            language,
            verbose,
            answers_json,
            format,
        } => {
            let session = SessionInput::read(&survey, responses.as_deref(), context.as_deref())?;
            let language = resolve_language(language);
            run_wizard(session, &language, verbose, answers_json, format)
        }
        Command::Check { survey } => run_check(&survey),
        Command::Pages {
            survey,
            responses,
            context,
        } => run_pages(SessionInput::read(
            &survey,
            responses.as_deref(),
            context.as_deref(),
        )?),
        Command::Validate {
            survey,
            responses,
            context,
        } => run_validate(SessionInput::read(
            &survey,
            Some(responses.as_path()),
            context.as_deref(),
        )?),
        Command::Schema { kind } => {
            let schema = match kind {
                SchemaKind::Definition => definition_schema(),
                SchemaKind::Answers => answer_set_schema(),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_language(flag: Option<String>) -> String {
    flag.or_else(|| env::var(LANGUAGE_ENV).ok())
        .filter(|language| !language.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

/// Everything the component needs for one survey run, as JSON strings.
struct SessionInput {
    survey_id: String,
    survey_json: String,
    context_json: String,
    responses_json: String,
}

impl SessionInput {
    fn read(survey: &Path, responses: Option<&Path>, context: Option<&Path>) -> CliResult<Self> {
        let survey_json = fs::read_to_string(survey)?;
        let survey_id = load_survey(&survey_json)?.id;
        let responses_json = match responses {
            Some(path) => {
                let contents = fs::read_to_string(path)?;
                let value: Value = serde_json::from_str(&contents)?;
                if !value.is_array() {
                    return Err("responses file must contain a JSON array".into());
                }
                value.to_string()
            }
            None => "[]".to_string(),
        };
        let context_json = match context {
            Some(path) => fs::read_to_string(path)?,
            None => "{}".to_string(),
        };
        Ok(Self {
            survey_id,
            survey_json,
            context_json,
            responses_json,
        })
    }

    fn config_json(&self, language: &str) -> String {
        json!({
            "survey_json": self.survey_json,
            "language": language,
            "pages_path": PAGES_PATH,
        })
        .to_string()
    }
}

fn run_check(survey_path: &Path) -> CliResult<()> {
    let contents = fs::read_to_string(survey_path)?;
    let survey = load_survey(&contents)?;
    println!(
        "Survey '{}' (version {}) is valid: {} items",
        survey.id,
        survey.version,
        survey.single_items().len()
    );
    Ok(())
}

fn run_pages(input: SessionInput) -> CliResult<()> {
    let config_json = input.config_json(DEFAULT_LANGUAGE);
    let output = parse_component_result(&survey_pages(
        &input.survey_id,
        &config_json,
        &input.context_json,
        &input.responses_json,
    ))?;
    let pages = output["pages"].as_array().cloned().unwrap_or_default();
    println!("Pages: {}", pages.len());
    for (index, page) in pages.iter().enumerate() {
        let keys = page
            .as_array()
            .map(|keys| {
                keys.iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        println!("  {}: {}", index, keys);
    }
    Ok(())
}

fn run_validate(input: SessionInput) -> CliResult<()> {
    let config_json = input.config_json(DEFAULT_LANGUAGE);
    let result = parse_component_result(&validate_responses(
        &input.survey_id,
        &config_json,
        &input.context_json,
        &input.responses_json,
    ))?;
    let valid = result["valid"].as_bool().unwrap_or(false);
    println!(
        "Validation result: {}",
        if valid { "valid" } else { "invalid" }
    );
    describe_failures("Errors", &rule_failures(&result, "errors"));
    describe_failures("Warnings", &rule_failures(&result, "warnings"));

    if valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_failures(heading: &str, failures: &[(String, String)]) {
    if failures.is_empty() {
        return;
    }
    println!("{}:", heading);
    for (item, rule) in failures {
        println!("  {} - rule {}", item, rule);
    }
}

fn run_wizard(
    input: SessionInput,
    language: &str,
    verbose: bool,
    answers_json: bool,
    format: RenderMode,
) -> CliResult<()> {
    let config_json = input.config_json(language);
    let survey_id = input.survey_id.as_str();
    let context_json = input.context_json.as_str();
    let mut responses = input.responses_json.clone();
    let mut url = page_url(PAGES_PATH, 0);
    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), answers_json);

    loop {
        let ui_raw = render_json_ui(survey_id, &config_json, context_json, &responses, &url);
        let ui = parse_component_result(&ui_raw)?;
        match ui["status"].as_str() {
            Some("redirect") => {
                url = next_url(&ui)?;
                debug!(%url, "following redirect");
                continue;
            }
            Some("empty") => {
                let outcome = parse_component_result(&advance(
                    survey_id,
                    &config_json,
                    context_json,
                    &responses,
                    &url,
                ))?;
                finish(&presenter, &outcome)?;
                break;
            }
            _ => {}
        }

        print_render_output(format, &input, &config_json, &responses, &url, &ui_raw);
        let page = WizardPage::from_json(&ui).map_err(|err| format!("wizard UI error: {}", err))?;
        presenter.show_header(&page);
        presenter.show_page(&page);

        let mut go_back = false;
        for item in &page.items {
            match prompt_item(item, &presenter)? {
                PromptOutcome::Back => {
                    go_back = true;
                    break;
                }
                PromptOutcome::Keep => {}
                PromptOutcome::Answer(response) => {
                    let entry = json!({ "key": item.key, "response": response });
                    let updated = parse_component_result(&record_response(
                        &responses,
                        &entry.to_string(),
                    ))?;
                    responses = updated.to_string();
                }
            }
        }

        let outcome = if go_back {
            parse_component_result(&back(
                survey_id,
                &config_json,
                context_json,
                &responses,
                &url,
            ))?
        } else {
            parse_component_result(&advance(
                survey_id,
                &config_json,
                context_json,
                &responses,
                &url,
            ))?
        };

        match outcome["status"].as_str() {
            Some("moved") | Some("redirect") => url = next_url(&outcome)?,
            Some("blocked") => {
                presenter.show_blocked(&rule_failures(&outcome["validation"], "errors"));
            }
            Some("submitted") => {
                finish(&presenter, &outcome)?;
                break;
            }
            Some("empty") => {}
            other => {
                return Err(format!("unexpected wizard status: {:?}", other).into());
            }
        }
    }

    Ok(())
}

fn finish(presenter: &WizardPresenter, outcome: &Value) -> CliResult<()> {
    if outcome["status"] != "submitted" {
        return Err("survey was not submitted".into());
    }
    let answer_set: AnswerSet = serde_json::from_value(outcome["answers"].clone())?;
    presenter.show_completion(&answer_set);
    Ok(())
}

fn next_url(value: &Value) -> CliResult<String> {
    value["url"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| "component response is missing a url".into())
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

enum PromptOutcome {
    Answer(survey_spec::ResponseItem),
    Keep,
    Back,
}

fn prompt_item(item: &WizardItem, presenter: &WizardPresenter) -> CliResult<PromptOutcome> {
    if matches!(item.target, PromptTarget::Nothing) {
        presenter.show_prompt(item);
        return Ok(PromptOutcome::Keep);
    }
    loop {
        presenter.show_prompt(item);
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err("wizard input ended before the survey was submitted".into());
        }

        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("wizard aborted by user".into());
        }
        if trimmed.eq_ignore_ascii_case("back") {
            return Ok(PromptOutcome::Back);
        }

        match parse_answer(&item.target, trimmed) {
            Ok(Some(response)) => return Ok(PromptOutcome::Answer(response)),
            Ok(None) => return Ok(PromptOutcome::Keep),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

fn print_render_output(
    mode: RenderMode,
    input: &SessionInput,
    config_json: &str,
    responses_json: &str,
    url: &str,
    ui: &str,
) {
    match mode {
        RenderMode::Text => {
            let text = component_render_text(
                &input.survey_id,
                config_json,
                &input.context_json,
                responses_json,
                url,
            );
            debug!(page = %url, "rendered page:\n{}", text);
        }
        RenderMode::Json => println!("JSON UI:\n{}", ui),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_flag_wins_over_default() {
        assert_eq!(resolve_language(Some("nl".into())), "nl");
        assert!(!resolve_language(Some("  ".into())).trim().is_empty());
    }

    #[test]
    fn component_errors_become_cli_errors() {
        let err = parse_component_result(r#"{"error":"boom"}"#).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(parse_component_result(r#"{"status":"moved"}"#).is_ok());
    }
}
