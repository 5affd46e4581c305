use std::fmt::Write;

use serde_json::Value;
use survey_spec::{AnswerSet, ComponentRole, ResponseItem};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: page header and prompts only.
    Clean,
    /// Verbose output: item keys, warnings, component state.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints pages and prompts as the component yields them.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, page: &WizardPage) {
        if self.header_printed {
            return;
        }
        println!("Survey: {}", page.survey_name);
        if let Some(description) = &page.description {
            println!("{}", description);
        }
        self.header_printed = true;
    }

    pub fn show_page(&self, page: &WizardPage) {
        if page.show_progress {
            println!("Page {}/{}", page.index + 1, page.count);
        }
        if self.verbosity.is_verbose() {
            println!("Items on this page:");
            for item in &page.items {
                println!(" - {} ({})", item.key, item.title);
            }
            for warning in &page.warnings {
                println!("Warning: {} rule {} not satisfied", warning.0, warning.1);
            }
        }
        if page.items.is_empty() {
            println!("No visible items on this page; check your conditions.");
        }
    }

    pub fn show_prompt(&self, item: &WizardItem) {
        let mut line = item.title.clone();
        if let Some(hint) = item.target.hint() {
            line.push(' ');
            line.push_str(&hint);
        }
        println!("{}", line);
        if let Some(help) = &item.help {
            println!("{}", help);
        }
        if let PromptTarget::Choice { options, .. } = &item.target {
            for option in options {
                let mut entry = format!("  ({}) {}", option.key, option.label);
                if option.disabled {
                    entry.push_str(" [disabled]");
                }
                println!("{}", entry);
            }
        }
        if self.verbosity.is_verbose()
            && let Some(slot) = item.target.slot()
        {
            println!("Slot: {}", slot);
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if let Some(debug) = &error.debug_message {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_blocked(&self, failures: &[(String, String)]) {
        eprintln!("Validation errors:");
        for (item, rule) in failures {
            eprintln!("  {}: rule {} not satisfied", item, rule);
        }
    }

    pub fn show_completion(&self, answer_set: &AnswerSet) {
        println!("Done ✅");
        match answer_set.to_cbor() {
            Ok(bytes) => {
                println!("Answers (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize answers to CBOR: {}", err);
            }
        }
        if self.show_answers_json {
            match answer_set.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize answers to JSON: {}", err);
                }
            }
        }
    }
}

/// Page view extracted from the component's JSON UI.
pub struct WizardPage {
    pub survey_name: String,
    pub description: Option<String>,
    pub index: usize,
    pub count: usize,
    pub show_progress: bool,
    pub items: Vec<WizardItem>,
    /// `(item key, rule key)` of failing soft rules.
    pub warnings: Vec<(String, String)>,
}

impl WizardPage {
    pub fn from_json(json: &Value) -> Result<Self, String> {
        let survey_id = json
            .get("survey_id")
            .and_then(Value::as_str)
            .ok_or_else(|| "wizard payload missing survey_id".to_string())?;
        let survey_name = json
            .get("survey_name")
            .and_then(Value::as_str)
            .unwrap_or(survey_id)
            .to_string();
        let description = json
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let page = json
            .get("page")
            .and_then(Value::as_object)
            .ok_or_else(|| "wizard payload missing page".to_string())?;
        let index = page.get("index").and_then(Value::as_u64).unwrap_or(0) as usize;
        let count = page.get("count").and_then(Value::as_u64).unwrap_or(0) as usize;
        let show_progress = page
            .get("show_progress")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let items = json
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| "wizard payload missing items".to_string())?
            .iter()
            .map(WizardItem::from_json)
            .collect::<Result<_, _>>()?;
        let warnings = json
            .get("validation")
            .map(|validation| rule_failures(validation, "warnings"))
            .unwrap_or_default();
        Ok(Self {
            survey_name,
            description,
            index,
            count,
            show_progress,
            items,
            warnings,
        })
    }
}

/// `(item key, rule key)` pairs listed under `field` of a validation result.
pub fn rule_failures(validation: &Value, field: &str) -> Vec<(String, String)> {
    validation
        .get(field)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|entry| {
                    let item = entry
                        .get("item_key")
                        .and_then(Value::as_str)
                        .unwrap_or("<unknown>");
                    let rule = entry
                        .get("rule_key")
                        .and_then(Value::as_str)
                        .unwrap_or("<unknown>");
                    (item.to_string(), rule.to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}

/// One visible item of the page and what the wizard asks for it.
pub struct WizardItem {
    pub key: String,
    pub title: String,
    pub help: Option<String>,
    pub target: PromptTarget,
}

struct RenderedComponent {
    path: String,
    role: ComponentRole,
    visible: bool,
    disabled: bool,
    content: Option<String>,
    min: Option<f64>,
    max: Option<f64>,
}

impl WizardItem {
    fn from_json(value: &Value) -> Result<Self, String> {
        let key = value
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| "item missing key".to_string())?
            .to_string();
        let title = value
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(&key)
            .to_string();
        let help = value
            .get("help")
            .and_then(Value::as_str)
            .map(str::to_string);
        let components = value
            .get("components")
            .and_then(Value::as_array)
            .map(|components| {
                components
                    .iter()
                    .map(RenderedComponent::from_json)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();
        let target = PromptTarget::from_components(&components);
        Ok(Self {
            key,
            title,
            help,
            target,
        })
    }
}

impl RenderedComponent {
    fn from_json(value: &Value) -> Result<Self, String> {
        let path = value
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| "component missing path".to_string())?
            .to_string();
        let role = value
            .get("role")
            .cloned()
            .ok_or_else(|| format!("component '{}' missing role", path))
            .and_then(|role| {
                serde_json::from_value::<ComponentRole>(role)
                    .map_err(|err| format!("component '{}': {}", path, err))
            })?;
        Ok(Self {
            role,
            visible: value.get("visible").and_then(Value::as_bool).unwrap_or(true),
            disabled: value
                .get("disabled")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            content: value
                .get("content")
                .and_then(Value::as_str)
                .map(str::to_string),
            min: value.get("min").and_then(numeric_bound),
            max: value.get("max").and_then(numeric_bound),
            path,
        })
    }
}

fn numeric_bound(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Selectable option of a choice group.
pub struct ChoiceOption {
    pub key: String,
    pub label: String,
    pub disabled: bool,
}

/// The response slot the wizard prompts for.
pub enum PromptTarget {
    Choice {
        slot: String,
        multiple: bool,
        options: Vec<ChoiceOption>,
    },
    Value {
        slot: String,
        role: ComponentRole,
        /// Inclusive bounds resolved for the page, numeric inputs only.
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Display-only item.
    Nothing,
}

impl PromptTarget {
    /// First visible choice group wins; otherwise the first visible input.
    fn from_components(components: &[RenderedComponent]) -> Self {
        let visible = || components.iter().filter(|component| component.visible);
        let group = visible().find(|component| {
            matches!(
                component.role,
                ComponentRole::SingleChoiceGroup
                    | ComponentRole::MultipleChoiceGroup
                    | ComponentRole::DropDownGroup
            )
        });
        if let Some(group) = group {
            let prefix = format!("{}.", group.path);
            let options = visible()
                .filter(|component| component.role == ComponentRole::Option)
                .filter_map(|component| {
                    let key = component.path.strip_prefix(&prefix)?;
                    (!key.contains('.')).then(|| ChoiceOption {
                        key: key.to_string(),
                        label: component.content.clone().unwrap_or_else(|| key.to_string()),
                        disabled: component.disabled,
                    })
                })
                .collect();
            return PromptTarget::Choice {
                slot: group.path.clone(),
                multiple: group.role == ComponentRole::MultipleChoiceGroup,
                options,
            };
        }
        visible()
            .find(|component| {
                !component.disabled
                    && matches!(
                        component.role,
                        ComponentRole::Input | ComponentRole::DateInput | ComponentRole::NumberInput
                    )
            })
            .map(|component| PromptTarget::Value {
                slot: component.path.clone(),
                role: component.role,
                min: component.min,
                max: component.max,
            })
            .unwrap_or(PromptTarget::Nothing)
    }

    pub fn slot(&self) -> Option<&str> {
        match self {
            PromptTarget::Choice { slot, .. } | PromptTarget::Value { slot, .. } => Some(slot),
            PromptTarget::Nothing => None,
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            PromptTarget::Choice { multiple: true, .. } => {
                Some("(comma-separated option keys)".to_string())
            }
            PromptTarget::Choice { multiple: false, .. } => Some("(one option key)".to_string()),
            PromptTarget::Value {
                role: ComponentRole::DateInput,
                ..
            } => Some("(unix timestamp)".to_string()),
            PromptTarget::Value {
                role: ComponentRole::NumberInput,
                ..
            } => Some("(number)".to_string()),
            PromptTarget::Value { .. } => Some("(text)".to_string()),
            PromptTarget::Nothing => None,
        }
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

/// Turns a raw line into the response tree for `target`.
///
/// A blank line keeps whatever the item already recorded (`Ok(None)`).
pub fn parse_answer(
    target: &PromptTarget,
    raw: &str,
) -> Result<Option<ResponseItem>, AnswerParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    match target {
        PromptTarget::Choice {
            slot,
            multiple,
            options,
        } => {
            let keys: Vec<&str> = raw
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .collect();
            if !multiple && keys.len() != 1 {
                return Err(AnswerParseError::new(
                    "select exactly one option",
                    Some(describe_options(options)),
                ));
            }
            for key in &keys {
                match options.iter().find(|option| option.key == *key) {
                    None => {
                        return Err(AnswerParseError::new(
                            format!("unknown option '{}'", key),
                            Some(describe_options(options)),
                        ));
                    }
                    Some(option) if option.disabled => {
                        return Err(AnswerParseError::new(
                            format!("option '{}' is disabled", key),
                            None,
                        ));
                    }
                    Some(_) => {}
                }
            }
            let selected = keys.into_iter().map(ResponseItem::new).collect();
            Ok(Some(ResponseItem::nest(
                slot,
                ResponseItem::with_items("", selected),
            )))
        }
        PromptTarget::Value {
            slot,
            role,
            min,
            max,
        } => {
            if matches!(role, ComponentRole::DateInput | ComponentRole::NumberInput) {
                let number = raw.parse::<f64>().map_err(|_| {
                    AnswerParseError::new(
                        format!("'{}' is not a number", raw),
                        Some("a numeric value".to_string()),
                    )
                })?;
                if let Some(lower) = min
                    && number < *lower
                {
                    return Err(AnswerParseError::new(
                        format!("'{}' is below the minimum {}", raw, lower),
                        Some(describe_range(*min, *max)),
                    ));
                }
                if let Some(upper) = max
                    && number > *upper
                {
                    return Err(AnswerParseError::new(
                        format!("'{}' is above the maximum {}", raw, upper),
                        Some(describe_range(*min, *max)),
                    ));
                }
            }
            Ok(Some(ResponseItem::nest(
                slot,
                ResponseItem::with_value("", raw),
            )))
        }
        PromptTarget::Nothing => Ok(None),
    }
}

fn describe_range(min: Option<f64>, max: Option<f64>) -> String {
    let end = |bound: Option<f64>| bound.map(|value| value.to_string()).unwrap_or_default();
    format!("accepted range: {}..={}", end(min), end(max))
}

fn describe_options(options: &[ChoiceOption]) -> String {
    options
        .iter()
        .filter(|option| !option.disabled)
        .map(|option| option.key.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut encoded, "{:02x}", byte);
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn choice_item() -> WizardItem {
        WizardItem::from_json(&json!({
            "key": "weekly.q1",
            "title": "Symptoms",
            "components": [
                { "path": "rg", "role": "responseGroup", "visible": true, "disabled": false },
                { "path": "rg.mcg", "role": "multipleChoiceGroup", "visible": true, "disabled": false },
                { "path": "rg.mcg.0", "role": "option", "visible": true, "disabled": false, "content": "None" },
                { "path": "rg.mcg.1", "role": "option", "visible": true, "disabled": true, "content": "Fever" }
            ],
            "failed_rules": []
        }))
        .expect("item")
    }

    #[test]
    fn choice_target_collects_options() {
        let item = choice_item();
        let PromptTarget::Choice {
            slot,
            multiple,
            options,
        } = &item.target
        else {
            panic!("expected choice target");
        };
        assert_eq!(slot, "rg.mcg");
        assert!(*multiple);
        assert_eq!(options.len(), 2);
        assert!(options[1].disabled);
    }

    #[test]
    fn parse_answer_builds_nested_selection() {
        let item = choice_item();
        let response = parse_answer(&item.target, "0").unwrap().unwrap();
        assert_eq!(response.key, "rg");
        assert!(response.find("rg.mcg.0").is_some());
    }

    #[test]
    fn parse_answer_rejects_disabled_and_unknown_options() {
        let item = choice_item();
        assert!(parse_answer(&item.target, "1").is_err());
        assert!(parse_answer(&item.target, "9").is_err());
    }

    #[test]
    fn blank_answer_keeps_response() {
        let item = choice_item();
        assert!(parse_answer(&item.target, "").unwrap().is_none());
    }

    #[test]
    fn date_input_requires_number() {
        let target = PromptTarget::Value {
            slot: "rg.0".into(),
            role: ComponentRole::DateInput,
            min: None,
            max: None,
        };
        assert!(parse_answer(&target, "tomorrow").is_err());
        let response = parse_answer(&target, "1700000000").unwrap().unwrap();
        assert_eq!(
            response.find("rg.0").and_then(|leaf| leaf.value.as_deref()),
            Some("1700000000")
        );
    }

    #[test]
    fn date_input_stays_within_rendered_bounds() {
        let item = WizardItem::from_json(&json!({
            "key": "weekly.q3",
            "title": "Since when?",
            "components": [
                { "path": "rg", "role": "responseGroup", "visible": true, "disabled": false },
                {
                    "path": "rg.0", "role": "dateInput", "visible": true, "disabled": false,
                    "min": 1_697_408_000, "max": "1700000000"
                }
            ],
            "failed_rules": []
        }))
        .expect("item");
        let PromptTarget::Value { min, max, .. } = &item.target else {
            panic!("expected value target");
        };
        assert_eq!(*min, Some(1_697_408_000.0));
        assert_eq!(*max, Some(1_700_000_000.0));

        assert!(parse_answer(&item.target, "1600000000").is_err());
        assert!(parse_answer(&item.target, "1800000000").is_err());
        assert!(parse_answer(&item.target, "1700000000").unwrap().is_some());
        assert!(parse_answer(&item.target, "1698000000").unwrap().is_some());
    }

    #[test]
    fn hex_encoding_is_lowercase() {
        assert_eq!(encode_hex(&[0x0a, 0xff]), "0aff");
    }
}
