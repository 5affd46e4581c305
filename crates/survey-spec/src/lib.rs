#![allow(missing_docs)]

pub mod answers;
pub mod builder;
pub mod expr;
pub mod load;
pub mod navigation;
pub mod pages;
pub mod render;
pub mod response;
pub mod schema;
pub mod spec;
pub mod validate;
pub mod visibility;

pub use answers::{AnswerSet, ValidationError, ValidationResult};
pub use expr::{Expression, ExpressionArg, Op};
pub use load::{LoadError, load_survey, load_survey_value};
pub use navigation::{
    NavigationError, NavigationState, PageAddress, SurveySession, Transition, page_url,
    parse_page_index, resolve_index,
};
pub use pages::{Page, survey_pages};
pub use render::{
    ActionLabels, PageAction, RenderComponent, RenderItem, RenderPayload, build_render_payload,
    render_json_ui, render_text,
};
pub use response::{ItemResponse, ResponseContext, ResponseItem, SurveyContext};
pub use schema::{answer_set_schema, definition_schema};
pub use spec::{
    ComponentRole, DefinitionError, GroupItem, LocalizedText, ResponseComponent, SingleItem,
    Survey, SurveyItem, Validation, ValidationKind,
};
pub use validate::{validate, validate_item, validate_page};
pub use visibility::{
    ComponentState, VisibilityMap, condition_holds, resolve_components, resolve_visibility,
};
