use std::collections::BTreeSet;

use regex::Regex;
use thiserror::Error;

use crate::expr::{Expression, ExpressionArg, Op};
use crate::spec::component::ResponseComponent;
use crate::spec::item::{GroupItem, SurveyItem};
use crate::spec::survey::Survey;

/// Structural problems found when a survey definition is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("duplicate item key '{0}'")]
    DuplicateKey(String),
    #[error("item key '{key}' is not nested under its parent '{parent}'")]
    KeyOutsideParent { key: String, parent: String },
    #[error("'{op}' in item '{item}' takes {expected} arguments, got {actual}")]
    Arity {
        item: String,
        op: &'static str,
        expected: String,
        actual: usize,
    },
    #[error("invalid pattern '{pattern}' in item '{item}': {message}")]
    InvalidPattern {
        item: String,
        pattern: String,
        message: String,
    },
}

/// Checks key nesting, key uniqueness, expression arity and literal regex
/// patterns across the whole tree. Unknown opcodes never get this far: they
/// are rejected while deserializing.
pub fn check_survey(survey: &Survey) -> Result<(), DefinitionError> {
    let mut seen = BTreeSet::new();
    seen.insert(survey.root.key.clone());
    if let Some(condition) = &survey.root.condition {
        check_expression(&survey.root.key, condition)?;
    }
    check_group(&survey.root, &mut seen)
}

fn check_group(group: &GroupItem, seen: &mut BTreeSet<String>) -> Result<(), DefinitionError> {
    let prefix = format!("{}.", group.key);
    for item in &group.items {
        let key = item.key();
        if !key.starts_with(&prefix) || key.len() == prefix.len() {
            return Err(DefinitionError::KeyOutsideParent {
                key: key.to_string(),
                parent: group.key.clone(),
            });
        }
        if !seen.insert(key.to_string()) {
            return Err(DefinitionError::DuplicateKey(key.to_string()));
        }
        if let Some(condition) = item.condition() {
            check_expression(key, condition)?;
        }
        match item {
            SurveyItem::Group(child) => check_group(child, seen)?,
            SurveyItem::Single(single) => {
                for validation in &single.validations {
                    check_expression(key, &validation.rule)?;
                }
                if let Some(component) = &single.components {
                    check_component(key, component)?;
                }
            }
            SurveyItem::PageBreak { .. } => {}
        }
    }
    Ok(())
}

fn check_component(item: &str, component: &ResponseComponent) -> Result<(), DefinitionError> {
    for expression in [&component.disabled, &component.display_condition]
        .into_iter()
        .flatten()
    {
        check_expression(item, expression)?;
    }
    if let Some(properties) = &component.properties {
        for arg in [&properties.min, &properties.max].into_iter().flatten() {
            if let ExpressionArg::Exp { exp } = arg {
                check_expression(item, exp)?;
            }
        }
    }
    for child in &component.items {
        check_component(item, child)?;
    }
    Ok(())
}

fn check_expression(item: &str, expression: &Expression) -> Result<(), DefinitionError> {
    let mut result = Ok(());
    expression.walk(&mut |node| {
        if result.is_ok() {
            result = check_node(item, node);
        }
    });
    result
}

fn check_node(item: &str, node: &Expression) -> Result<(), DefinitionError> {
    let (min, max) = node.name.arity();
    let actual = node.data.len();
    if actual < min || max.is_some_and(|max| actual > max) {
        let expected = match max {
            Some(max) if max == min => min.to_string(),
            Some(max) => format!("{}..={}", min, max),
            None => format!("at least {}", min),
        };
        return Err(DefinitionError::Arity {
            item: item.to_string(),
            op: node.name.as_str(),
            expected,
            actual,
        });
    }
    if node.name == Op::CheckResponseValueWithRegex
        && let Some(ExpressionArg::Str { str: pattern }) = node.data.get(2)
        && let Err(err) = Regex::new(pattern)
    {
        return Err(DefinitionError::InvalidPattern {
            item: item.to_string(),
            pattern: pattern.clone(),
            message: err.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{group, hard_validation, page_break, survey, text_item};

    #[test]
    fn accepts_well_formed_tree() {
        let definition = survey(
            "weekly",
            vec![
                text_item("weekly.q1", "First").into(),
                page_break("weekly.pb1"),
                group("weekly.g", vec![text_item("weekly.g.q2", "Second").into()]).into(),
            ],
        );
        assert_eq!(check_survey(&definition), Ok(()));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let definition = survey(
            "weekly",
            vec![
                text_item("weekly.q1", "First").into(),
                text_item("weekly.q1", "Again").into(),
            ],
        );
        assert_eq!(
            check_survey(&definition),
            Err(DefinitionError::DuplicateKey("weekly.q1".into()))
        );
    }

    #[test]
    fn rejects_key_outside_parent() {
        let definition = survey(
            "weekly",
            vec![group("weekly.g", vec![text_item("weekly.q2", "Stray").into()]).into()],
        );
        assert!(matches!(
            check_survey(&definition),
            Err(DefinitionError::KeyOutsideParent { .. })
        ));
    }

    #[test]
    fn rejects_bad_arity_in_nested_expression() {
        let mut item = text_item("weekly.q1", "First");
        item.condition = Some(Expression::not(Expression::new(Op::Eq, vec!["a".into()])));
        let definition = survey("weekly", vec![item.into()]);
        match check_survey(&definition) {
            Err(DefinitionError::Arity { op, actual, .. }) => {
                assert_eq!(op, "eq");
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn rejects_invalid_regex_literal_in_validation() {
        let mut item = text_item("weekly.q1", "First");
        item.validations.push(hard_validation(
            "r1",
            Expression::check_response_value_with_regex("weekly.q1", "rg.1", "(unclosed"),
        ));
        let definition = survey("weekly", vec![item.into()]);
        assert!(matches!(
            check_survey(&definition),
            Err(DefinitionError::InvalidPattern { .. })
        ));
    }
}
