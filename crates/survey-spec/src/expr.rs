use std::cmp::Ordering;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::response::{ResponseContext, ResponseItem};

/// Closed set of operations understood by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Op {
    ResponseHasKeysAny,
    ResponseHasOnlyKeysOtherThan,
    CheckResponseValueWithRegex,
    HasResponse,
    And,
    Or,
    Not,
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    IsDefined,
    TimestampWithOffset,
    GetContext,
    GetAttribute,
    GetResponseItem,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::ResponseHasKeysAny => "responseHasKeysAny",
            Op::ResponseHasOnlyKeysOtherThan => "responseHasOnlyKeysOtherThan",
            Op::CheckResponseValueWithRegex => "checkResponseValueWithRegex",
            Op::HasResponse => "hasResponse",
            Op::And => "and",
            Op::Or => "or",
            Op::Not => "not",
            Op::Eq => "eq",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::IsDefined => "isDefined",
            Op::TimestampWithOffset => "timestampWithOffset",
            Op::GetContext => "getContext",
            Op::GetAttribute => "getAttribute",
            Op::GetResponseItem => "getResponseItem",
        }
    }

    /// Accepted argument count as `(min, max)`; `None` means unbounded.
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Op::ResponseHasKeysAny | Op::ResponseHasOnlyKeysOtherThan => (3, None),
            Op::CheckResponseValueWithRegex => (3, Some(3)),
            Op::HasResponse | Op::GetAttribute | Op::GetResponseItem => (2, Some(2)),
            Op::And | Op::Or => (1, None),
            Op::Not | Op::IsDefined => (1, Some(1)),
            Op::Eq | Op::Lt | Op::Lte | Op::Gt | Op::Gte => (2, Some(2)),
            Op::TimestampWithOffset => (1, Some(2)),
            Op::GetContext => (0, Some(0)),
        }
    }
}

/// Argument of an expression: a literal or a nested expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "dtype", rename_all = "lowercase")]
pub enum ExpressionArg {
    Str { str: String },
    Num { num: f64 },
    Exp { exp: Expression },
}

impl ExpressionArg {
    pub fn evaluate(&self, ctx: &ResponseContext) -> Value {
        match self {
            ExpressionArg::Str { str } => Value::String(str.clone()),
            ExpressionArg::Num { num } => Number::from_f64(*num)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ExpressionArg::Exp { exp } => exp.evaluate(ctx),
        }
    }
}

impl From<&str> for ExpressionArg {
    fn from(value: &str) -> Self {
        ExpressionArg::Str { str: value.into() }
    }
}

impl From<String> for ExpressionArg {
    fn from(value: String) -> Self {
        ExpressionArg::Str { str: value }
    }
}

impl From<f64> for ExpressionArg {
    fn from(value: f64) -> Self {
        ExpressionArg::Num { num: value }
    }
}

impl From<i64> for ExpressionArg {
    fn from(value: i64) -> Self {
        ExpressionArg::Num { num: value as f64 }
    }
}

impl From<Expression> for ExpressionArg {
    fn from(value: Expression) -> Self {
        ExpressionArg::Exp { exp: value }
    }
}

/// Serializable condition node: an operation plus its ordered arguments.
///
/// Evaluation never fails. Missing responses, wrong argument types, or a
/// malformed pattern make the expression evaluate to `false` (or `null` for
/// accessors) so that an unanswered upstream item only hides or disables
/// what depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expression {
    pub name: Op,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<ExpressionArg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

impl Expression {
    pub fn new(name: Op, data: Vec<ExpressionArg>) -> Self {
        Self {
            name,
            data,
            return_type: None,
        }
    }

    pub fn response_has_keys_any(item_key: &str, slot_path: &str, keys: &[&str]) -> Self {
        Self::new(Op::ResponseHasKeysAny, slot_args(item_key, slot_path, keys))
    }

    pub fn response_has_only_keys_other_than(
        item_key: &str,
        slot_path: &str,
        keys: &[&str],
    ) -> Self {
        Self::new(
            Op::ResponseHasOnlyKeysOtherThan,
            slot_args(item_key, slot_path, keys),
        )
    }

    pub fn check_response_value_with_regex(item_key: &str, slot_path: &str, pattern: &str) -> Self {
        Self::new(
            Op::CheckResponseValueWithRegex,
            slot_args(item_key, slot_path, &[pattern]),
        )
    }

    pub fn has_response(item_key: &str, response_group_key: &str) -> Self {
        Self::new(
            Op::HasResponse,
            vec![item_key.into(), response_group_key.into()],
        )
    }

    pub fn and(expressions: impl IntoIterator<Item = Expression>) -> Self {
        Self::new(Op::And, expressions.into_iter().map(Into::into).collect())
    }

    pub fn or(expressions: impl IntoIterator<Item = Expression>) -> Self {
        Self::new(Op::Or, expressions.into_iter().map(Into::into).collect())
    }

    pub fn not(expression: Expression) -> Self {
        Self::new(Op::Not, vec![expression.into()])
    }

    pub fn eq(left: impl Into<ExpressionArg>, right: impl Into<ExpressionArg>) -> Self {
        Self::new(Op::Eq, vec![left.into(), right.into()])
    }

    pub fn timestamp_with_offset(seconds: i64) -> Self {
        Self::new(Op::TimestampWithOffset, vec![seconds.into()])
    }

    pub fn get_context() -> Self {
        Self::new(Op::GetContext, Vec::new())
    }

    pub fn get_attribute(container: Expression, name: &str) -> Self {
        Self::new(Op::GetAttribute, vec![container.into(), name.into()])
    }

    pub fn get_response_item(item_key: &str, slot_path: &str) -> Self {
        Self::new(Op::GetResponseItem, vec![item_key.into(), slot_path.into()])
    }

    /// `eq(getAttribute(getAttribute(getContext(), "participantFlags"), flag), value)`.
    pub fn participant_flag_equals(flag: &str, value: &str) -> Self {
        let flags = Self::get_attribute(Self::get_context(), "participantFlags");
        Self::eq(Self::get_attribute(flags, flag), value)
    }

    pub fn with_return_type(mut self, return_type: &str) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    /// Evaluates the expression against the response context. A declared
    /// `int` or `float` return type coerces the result, `null` if it is not
    /// numeric.
    pub fn evaluate(&self, ctx: &ResponseContext) -> Value {
        let value = self.apply(ctx);
        match self.return_type.as_deref() {
            Some("int") => as_number(&value)
                .filter(|number| number.is_finite())
                .map(|number| Value::from(number.trunc() as i64))
                .unwrap_or(Value::Null),
            Some("float") => as_number(&value)
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            _ => value,
        }
    }

    fn apply(&self, ctx: &ResponseContext) -> Value {
        match self.name {
            Op::ResponseHasKeysAny => {
                let candidates = self.str_args_from(ctx, 2);
                let result = self.selected_keys(ctx).is_some_and(|keys| {
                    keys.iter().any(|key| candidates.iter().any(|c| c == key))
                });
                Value::Bool(result)
            }
            Op::ResponseHasOnlyKeysOtherThan => {
                let excluded = self.str_args_from(ctx, 2);
                let result = self.selected_keys(ctx).is_some_and(|keys| {
                    !keys.is_empty() && keys.iter().all(|key| !excluded.iter().any(|e| e == key))
                });
                Value::Bool(result)
            }
            Op::CheckResponseValueWithRegex => {
                let result = self
                    .response_item(ctx)
                    .and_then(|item| item.value.as_deref())
                    .zip(self.str_arg(ctx, 2))
                    .is_some_and(|(value, pattern)| {
                        Regex::new(&pattern)
                            .map(|regex| regex.is_match(value))
                            .unwrap_or(false)
                    });
                Value::Bool(result)
            }
            Op::HasResponse => Value::Bool(self.response_item(ctx).is_some()),
            Op::And => {
                let results = self.bool_args(ctx);
                Value::Bool(!results.is_empty() && results.iter().all(|value| *value))
            }
            Op::Or => {
                let results = self.bool_args(ctx);
                Value::Bool(results.iter().any(|value| *value))
            }
            Op::Not => match self.arg(ctx, 0) {
                Value::Bool(value) => Value::Bool(!value),
                _ => Value::Bool(false),
            },
            Op::Eq => Value::Bool(values_equal(&self.arg(ctx, 0), &self.arg(ctx, 1))),
            Op::Lt => self.compare(ctx, Ordering::is_lt),
            Op::Lte => self.compare(ctx, Ordering::is_le),
            Op::Gt => self.compare(ctx, Ordering::is_gt),
            Op::Gte => self.compare(ctx, Ordering::is_ge),
            Op::IsDefined => Value::Bool(!self.arg(ctx, 0).is_null()),
            Op::TimestampWithOffset => {
                let Some(offset) = as_number(&self.arg(ctx, 0)) else {
                    return Value::Null;
                };
                let reference = match self.data.get(1) {
                    Some(arg) => match as_number(&arg.evaluate(ctx)) {
                        Some(reference) => reference as i64,
                        None => return Value::Null,
                    },
                    None => ctx.now(),
                };
                Value::from(reference.saturating_add(offset as i64))
            }
            Op::GetContext => serde_json::to_value(ctx.context()).unwrap_or(Value::Null),
            Op::GetAttribute => {
                let container = self.arg(ctx, 0);
                self.str_arg(ctx, 1)
                    .and_then(|name| container.get(&name).cloned())
                    .unwrap_or(Value::Null)
            }
            Op::GetResponseItem => self
                .response_item(ctx)
                .and_then(|item| serde_json::to_value(item).ok())
                .unwrap_or(Value::Null),
        }
    }

    /// Evaluates the expression as a condition; only `true` is satisfied.
    pub fn evaluate_bool(&self, ctx: &ResponseContext) -> bool {
        matches!(self.evaluate(ctx), Value::Bool(true))
    }

    /// Visits this expression and every nested one, depth first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expression)) {
        visit(self);
        for arg in &self.data {
            if let ExpressionArg::Exp { exp } = arg {
                exp.walk(visit);
            }
        }
    }

    fn arg(&self, ctx: &ResponseContext, index: usize) -> Value {
        self.data
            .get(index)
            .map(|arg| arg.evaluate(ctx))
            .unwrap_or(Value::Null)
    }

    fn str_arg(&self, ctx: &ResponseContext, index: usize) -> Option<String> {
        match self.arg(ctx, index) {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    fn str_args_from(&self, ctx: &ResponseContext, start: usize) -> Vec<String> {
        (start..self.data.len())
            .filter_map(|index| self.str_arg(ctx, index))
            .collect()
    }

    fn bool_args(&self, ctx: &ResponseContext) -> Vec<bool> {
        self.data
            .iter()
            .map(|arg| matches!(arg.evaluate(ctx), Value::Bool(true)))
            .collect()
    }

    fn response_item<'c>(&self, ctx: &'c ResponseContext) -> Option<&'c ResponseItem> {
        let item_key = self.str_arg(ctx, 0)?;
        let slot_path = self.str_arg(ctx, 1)?;
        ctx.response_item(&item_key, &slot_path)
    }

    fn selected_keys(&self, ctx: &ResponseContext) -> Option<Vec<String>> {
        self.response_item(ctx)
            .map(|item| item.child_keys().map(str::to_string).collect())
    }

    fn compare(&self, ctx: &ResponseContext, accept: fn(Ordering) -> bool) -> Value {
        let left = as_number(&self.arg(ctx, 0));
        let right = as_number(&self.arg(ctx, 1));
        let result = left
            .zip(right)
            .and_then(|(left, right)| left.partial_cmp(&right))
            .is_some_and(accept);
        Value::Bool(result)
    }
}

fn slot_args(item_key: &str, slot_path: &str, rest: &[&str]) -> Vec<ExpressionArg> {
    let mut args: Vec<ExpressionArg> = vec![item_key.into(), slot_path.into()];
    args.extend(rest.iter().map(|value| ExpressionArg::from(*value)));
    args
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}
