use crate::answers::{ValidationError, ValidationResult};
use crate::pages::{Page, survey_pages};
use crate::response::ResponseContext;
use crate::spec::item::{SingleItem, ValidationKind};
use crate::spec::survey::Survey;

/// Evaluates every rule attached to `item` against the context, which is
/// expected to already hold the item's own response.
pub fn validate_item(item: &SingleItem, ctx: &ResponseContext) -> ValidationResult {
    let mut result = ValidationResult::default();
    for validation in &item.validations {
        if validation.rule.evaluate_bool(ctx) {
            continue;
        }
        let error = ValidationError {
            item_key: item.key.clone(),
            rule_key: validation.key.clone(),
            kind: validation.kind,
        };
        match validation.kind {
            ValidationKind::Hard => {
                result.valid = false;
                result.errors.push(error);
            }
            ValidationKind::Soft => result.warnings.push(error),
        }
    }
    result
}

/// Validates the visible items of one page.
pub fn validate_page(page: &Page<'_>, ctx: &ResponseContext) -> ValidationResult {
    let mut result = ValidationResult::default();
    for item in &page.items {
        result.merge(validate_item(item, ctx));
    }
    result
}

/// Validates every currently visible item of the survey.
pub fn validate(survey: &Survey, ctx: &ResponseContext) -> ValidationResult {
    let mut result = ValidationResult::default();
    for page in survey_pages(survey, ctx) {
        result.merge(validate_page(&page, ctx));
    }
    result
}
