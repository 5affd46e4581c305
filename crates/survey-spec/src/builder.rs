//! Authoring helpers for building survey definitions in code.
//!
//! Keys follow the dotted-path convention: children of `weekly` are named
//! `weekly.<something>`. Response slots use the conventional component keys
//! below, so conditions written against `rg.scg` / `rg.mcg` line up with what
//! [`ResponseContext::select_keys`](crate::response::ResponseContext::select_keys)
//! records.

use crate::expr::Expression;
use crate::spec::component::{ComponentProperties, ComponentRole, ResponseComponent};
use crate::spec::item::{
    GroupItem, SelectionMethod, SingleItem, SurveyItem, Validation, ValidationKind,
};
use crate::spec::localized::LocalizedText;
use crate::spec::survey::Survey;

pub const RESPONSE_GROUP_KEY: &str = "rg";
pub const SINGLE_CHOICE_KEY: &str = "scg";
pub const MULTIPLE_CHOICE_KEY: &str = "mcg";

/// Slot path of a single choice group, `rg.scg`.
pub fn single_choice_slot() -> String {
    format!("{}.{}", RESPONSE_GROUP_KEY, SINGLE_CHOICE_KEY)
}

/// Slot path of a multiple choice group, `rg.mcg`.
pub fn multiple_choice_slot() -> String {
    format!("{}.{}", RESPONSE_GROUP_KEY, MULTIPLE_CHOICE_KEY)
}

impl From<SingleItem> for SurveyItem {
    fn from(item: SingleItem) -> Self {
        SurveyItem::Single(item)
    }
}

impl From<GroupItem> for SurveyItem {
    fn from(group: GroupItem) -> Self {
        SurveyItem::Group(group)
    }
}

/// English-only text, for definitions that are not localized.
pub fn text(value: &str) -> LocalizedText {
    LocalizedText::new([("en", value)])
}

pub fn localized(entries: &[(&str, &str)]) -> LocalizedText {
    LocalizedText::new(entries.iter().copied())
}

pub fn survey(root_key: &str, items: Vec<SurveyItem>) -> Survey {
    Survey {
        id: root_key.to_string(),
        version: "1".into(),
        name: None,
        description: None,
        duration: None,
        root: group(root_key, items),
    }
}

pub fn group(key: &str, items: Vec<SurveyItem>) -> GroupItem {
    GroupItem {
        key: key.to_string(),
        items,
        selection_method: SelectionMethod::Sequential,
        condition: None,
    }
}

pub fn page_break(key: &str) -> SurveyItem {
    SurveyItem::PageBreak {
        key: key.to_string(),
    }
}

/// Display-only item without a response component.
pub fn text_item(key: &str, title: &str) -> SingleItem {
    SingleItem {
        key: key.to_string(),
        title: Some(text(title)),
        help: None,
        condition: None,
        components: None,
        validations: Vec::new(),
    }
}

/// Selectable option; `disabled` greys it out without hiding it.
pub fn choice_option(
    key: &str,
    content: LocalizedText,
    disabled: Option<Expression>,
) -> ResponseComponent {
    ResponseComponent {
        key: key.to_string(),
        role: ComponentRole::Option,
        content: Some(content),
        disabled,
        display_condition: None,
        properties: None,
        items: Vec::new(),
    }
}

/// Date picker whose bounds are evaluated when the page is rendered.
pub fn date_input(
    key: &str,
    content: LocalizedText,
    min: Expression,
    max: Expression,
) -> ResponseComponent {
    ResponseComponent {
        key: key.to_string(),
        role: ComponentRole::DateInput,
        content: Some(content),
        disabled: None,
        display_condition: None,
        properties: Some(ComponentProperties {
            min: Some(min.into()),
            max: Some(max.into()),
        }),
        items: Vec::new(),
    }
}

pub fn single_choice_item(
    key: &str,
    title: LocalizedText,
    options: Vec<ResponseComponent>,
) -> SingleItem {
    choice_item(
        key,
        title,
        SINGLE_CHOICE_KEY,
        ComponentRole::SingleChoiceGroup,
        options,
    )
}

pub fn multiple_choice_item(
    key: &str,
    title: LocalizedText,
    options: Vec<ResponseComponent>,
) -> SingleItem {
    choice_item(
        key,
        title,
        MULTIPLE_CHOICE_KEY,
        ComponentRole::MultipleChoiceGroup,
        options,
    )
}

fn choice_item(
    key: &str,
    title: LocalizedText,
    group_key: &str,
    role: ComponentRole,
    options: Vec<ResponseComponent>,
) -> SingleItem {
    let choices = ResponseComponent {
        key: group_key.to_string(),
        role,
        content: None,
        disabled: None,
        display_condition: None,
        properties: None,
        items: options,
    };
    SingleItem {
        key: key.to_string(),
        title: Some(title),
        help: None,
        condition: None,
        components: Some(response_group(vec![choices])),
        validations: Vec::new(),
    }
}

fn response_group(items: Vec<ResponseComponent>) -> ResponseComponent {
    ResponseComponent {
        key: RESPONSE_GROUP_KEY.to_string(),
        role: ComponentRole::ResponseGroup,
        content: None,
        disabled: None,
        display_condition: None,
        properties: None,
        items,
    }
}

pub fn hard_validation(key: &str, rule: Expression) -> Validation {
    Validation {
        key: key.to_string(),
        kind: ValidationKind::Hard,
        rule,
    }
}

pub fn soft_validation(key: &str, rule: Expression) -> Validation {
    Validation {
        key: key.to_string(),
        kind: ValidationKind::Soft,
        rule,
    }
}

/// The usual "must be answered" rule: `hasResponse(item, rg)` tagged hard as `r1`.
pub fn required(item_key: &str) -> Validation {
    hard_validation("r1", Expression::has_response(item_key, RESPONSE_GROUP_KEY))
}

impl SingleItem {
    pub fn with_condition(mut self, condition: Expression) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validations.push(validation);
        self
    }

    pub fn with_help(mut self, help: LocalizedText) -> Self {
        self.help = Some(help);
        self
    }
}

impl GroupItem {
    pub fn with_condition(mut self, condition: Expression) -> Self {
        self.condition = Some(condition);
        self
    }
}
