//! Mapping rules: a small expression language over a read-only JSON context.
//!
//! A [`RuleSet`] is a list of [`FieldRule`]s, each naming one response field
//! and the [`Expr`] that computes it from the destination event. Expressions
//! are side-effect free: they only look values up, pick between them and
//! concatenate text. The same rule sets are rendered into the gateway's
//! mapping template by [`crate::compiler::vtl`] and evaluated in-process here.
//!
//! # Missing values
//!
//! Lookups that find nothing (or `null`) yield "missing". [`Expr::Coalesce`]
//! skips missing alternatives. What happens when a required field is still
//! missing at the end depends on [`EvalMode`]:
//!
//! - [`EvalMode::DefaultOnMissing`] substitutes `""` and carries on. This is
//!   what the gateway does, and what a deployment relies on so that a
//!   response is always sent.
//! - [`EvalMode::Strict`] reports [`ResponderError::MissingField`], which is
//!   useful for spotting upstream shape changes in tests.
//!
//! # Example
//!
//! ```rust
//! use cfn_custom_resource_responder::rules::{EvalMode, Expr};
//! use serde_json::json;
//!
//! let ctx = json!({"detail": {"requestPayload": {"RequestId": "req-1"}}});
//! let expr = Expr::coalesce(vec![
//!     Expr::text("detail.responsePayload.PhysicalResourceId"),
//!     Expr::text("detail.requestPayload.RequestId"),
//! ]);
//! let value = expr.evaluate(&ctx, EvalMode::Strict).unwrap();
//! assert_eq!(value, Some(json!("req-1")));
//! ```

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{ResponderError, ResponderResult};
use crate::resolver::handler_text;

/// A path into the JSON context, one object key per segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Creates a path from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parses a dotted path such as `detail.requestPayload.RequestId`.
    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.').filter(|s| !s.is_empty()))
    }

    /// Returns the path segments.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Appends one segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Splits off the last segment.
    pub fn split_last(&self) -> Option<(FieldPath, &str)> {
        let (last, parent) = self.0.split_last()?;
        Some((Self(parent.to_vec()), last.as_str()))
    }

    /// Looks the path up; `None` when any segment is absent or a non-object
    /// is encountered on the way.
    pub fn lookup<'a>(&self, ctx: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .try_fold(ctx, |value, segment| value.as_object()?.get(segment))
    }

    /// Looks the path up, treating `null` as absent.
    pub fn lookup_present<'a>(&self, ctx: &'a Value) -> Option<&'a Value> {
        self.lookup(ctx).filter(|value| !value.is_null())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

/// JSON value kinds a rule can insist on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    /// Any JSON object
    Object,
    /// `true` or `false`
    Boolean,
    /// A string with at least one character
    NonEmptyString,
}

impl JsonKind {
    /// Returns true if `value` has this kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Boolean => value.is_boolean(),
            Self::NonEmptyString => value.as_str().is_some_and(|s| !s.is_empty()),
        }
    }
}

/// A boolean test over the context.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The path resolves to a non-null value.
    Present(FieldPath),
    /// The path resolves to exactly this string.
    Equals {
        /// Path to test
        path: FieldPath,
        /// Expected string value
        value: String,
    },
    /// At least one of the conditions holds.
    Any(Vec<Condition>),
}

impl Condition {
    /// Creates a presence test.
    pub fn present(path: impl Into<FieldPath>) -> Self {
        Self::Present(path.into())
    }

    /// Creates a string equality test.
    pub fn equals(path: impl Into<FieldPath>, value: impl Into<String>) -> Self {
        Self::Equals {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Evaluates the condition. Conditions never fail: an absent path is
    /// simply not equal to anything.
    pub fn holds(&self, ctx: &Value) -> bool {
        match self {
            Self::Present(path) => path.lookup_present(ctx).is_some(),
            Self::Equals { path, value } => {
                path.lookup(ctx).and_then(Value::as_str) == Some(value.as_str())
            }
            Self::Any(conditions) => conditions.iter().any(|c| c.holds(ctx)),
        }
    }
}

/// A side-effect free expression producing an optional JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant.
    Literal(Value),
    /// The value at a path, verbatim.
    Path(FieldPath),
    /// The value at a path rendered as text: strings pass through, other
    /// values become their JSON text.
    Text(FieldPath),
    /// Text of every part joined together. Missing parts become `""` in
    /// [`EvalMode::DefaultOnMissing`] and an error in [`EvalMode::Strict`].
    Concat(Vec<Expr>),
    /// The first alternative that is not missing.
    Coalesce(Vec<Expr>),
    /// The value at a path, only if it is one of the allowed strings.
    OneOf {
        /// Path to read
        path: FieldPath,
        /// Accepted values
        allowed: Vec<String>,
    },
    /// The value at a path, only if it has the given kind.
    OfKind {
        /// Path to read
        path: FieldPath,
        /// Required kind
        kind: JsonKind,
    },
    /// `then` when the condition holds, `otherwise` when it does not.
    When {
        /// Branch selector
        condition: Condition,
        /// Taken when the condition holds
        then: Box<Expr>,
        /// Taken when it does not
        otherwise: Box<Expr>,
    },
}

impl Expr {
    /// Creates a string literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(Value::String(value.into()))
    }

    /// Creates a verbatim path lookup.
    pub fn path(path: impl Into<FieldPath>) -> Self {
        Self::Path(path.into())
    }

    /// Creates a text lookup.
    pub fn text(path: impl Into<FieldPath>) -> Self {
        Self::Text(path.into())
    }

    /// Creates a concatenation.
    pub fn concat(parts: Vec<Expr>) -> Self {
        Self::Concat(parts)
    }

    /// Creates a coalesce.
    pub fn coalesce(alternatives: Vec<Expr>) -> Self {
        Self::Coalesce(alternatives)
    }

    /// Creates an allow-list lookup.
    pub fn one_of<I, S>(path: impl Into<FieldPath>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf {
            path: path.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a kind-checked lookup.
    pub fn of_kind(path: impl Into<FieldPath>, kind: JsonKind) -> Self {
        Self::OfKind {
            path: path.into(),
            kind,
        }
    }

    /// Creates a conditional.
    pub fn when(condition: Condition, then: Expr, otherwise: Expr) -> Self {
        Self::When {
            condition,
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    /// Evaluates the expression against `ctx`.
    ///
    /// `Ok(None)` means the value is missing. Errors only arise in
    /// [`EvalMode::Strict`], from a [`Expr::Concat`] part that is missing.
    pub fn evaluate(&self, ctx: &Value, mode: EvalMode) -> ResponderResult<Option<Value>> {
        let value = match self {
            Self::Literal(value) => Some(value.clone()),
            Self::Path(path) => path.lookup_present(ctx).cloned(),
            Self::Text(path) => path.lookup(ctx).and_then(handler_text).map(Value::String),
            Self::Concat(parts) => {
                let mut text = String::new();
                for part in parts {
                    match part.evaluate(ctx, mode)? {
                        Some(value) => text.push_str(&handler_text(&value).unwrap_or_default()),
                        None if mode.is_strict() => {
                            return Err(ResponderError::missing_field(part.describe()));
                        }
                        None => {}
                    }
                }
                Some(Value::String(text))
            }
            Self::Coalesce(alternatives) => {
                for alternative in alternatives {
                    if let Some(value) = alternative.evaluate(ctx, mode)? {
                        return Ok(Some(value));
                    }
                }
                None
            }
            Self::OneOf { path, allowed } => path
                .lookup(ctx)
                .filter(|value| {
                    value
                        .as_str()
                        .is_some_and(|s| allowed.iter().any(|a| a == s))
                })
                .cloned(),
            Self::OfKind { path, kind } => {
                path.lookup(ctx).filter(|value| kind.matches(value)).cloned()
            }
            Self::When {
                condition,
                then,
                otherwise,
            } => {
                return if condition.holds(ctx) {
                    then.evaluate(ctx, mode)
                } else {
                    otherwise.evaluate(ctx, mode)
                };
            }
        };
        Ok(value)
    }

    /// Short description used in error messages: the first path the
    /// expression reads, or `<literal>`.
    pub fn describe(&self) -> String {
        self.paths()
            .first()
            .map(|path| path.to_string())
            .unwrap_or_else(|| "<literal>".to_string())
    }

    /// Every path the expression reads, in evaluation order.
    pub fn paths(&self) -> Vec<&FieldPath> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a FieldPath>) {
        match self {
            Self::Literal(_) => {}
            Self::Path(path) | Self::Text(path) => out.push(path),
            Self::OneOf { path, .. } | Self::OfKind { path, .. } => out.push(path),
            Self::Concat(parts) | Self::Coalesce(parts) => {
                for part in parts {
                    part.collect_paths(out);
                }
            }
            Self::When {
                then, otherwise, ..
            } => {
                then.collect_paths(out);
                otherwise.collect_paths(out);
            }
        }
    }
}

/// How evaluation treats a required value that is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalMode {
    /// Report a [`ResponderError::MissingField`].
    Strict,
    /// Substitute an empty string. The gateway's behaviour.
    #[default]
    DefaultOnMissing,
}

impl EvalMode {
    /// Returns true for [`EvalMode::Strict`].
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

/// Whether a field must appear in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Always emitted; missing values follow [`EvalMode`].
    Required,
    /// Emitted only when the expression yields a value.
    Optional,
}

/// One output field and how to compute it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    /// Output key
    pub name: String,
    /// Value expression
    pub expr: Expr,
    /// Required or optional
    pub presence: Presence,
}

impl FieldRule {
    /// Creates a required field.
    pub fn required(name: impl Into<String>, expr: Expr) -> Self {
        Self {
            name: name.into(),
            expr,
            presence: Presence::Required,
        }
    }

    /// Creates an optional field.
    pub fn optional(name: impl Into<String>, expr: Expr) -> Self {
        Self {
            name: name.into(),
            expr,
            presence: Presence::Optional,
        }
    }

    /// Returns true for required fields.
    pub fn is_required(&self) -> bool {
        matches!(self.presence, Presence::Required)
    }
}

/// Which invocation outcome a rule set handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultVariant {
    /// The handler returned
    Success,
    /// The handler raised
    Failure,
}

impl fmt::Display for ResultVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Failure => write!(f, "Failure"),
        }
    }
}

/// The rules producing a complete response body for one variant.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    /// The variant this set handles
    pub variant: ResultVariant,
    /// Output fields in emission order
    pub fields: Vec<FieldRule>,
}

impl RuleSet {
    /// Creates a rule set.
    pub fn new(variant: ResultVariant, fields: Vec<FieldRule>) -> Self {
        Self { variant, fields }
    }

    /// Returns the rule for a field name.
    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == name)
    }

    /// Computes the response body for `ctx`.
    pub fn apply(&self, ctx: &Value, mode: EvalMode) -> ResponderResult<Map<String, Value>> {
        let mut body = Map::new();
        for rule in &self.fields {
            match rule.expr.evaluate(ctx, mode)? {
                Some(value) => {
                    body.insert(rule.name.clone(), value);
                }
                None if !rule.is_required() => {}
                None if mode.is_strict() => {
                    return Err(ResponderError::missing_field(format!(
                        "{} ({})",
                        rule.name,
                        rule.expr.describe()
                    )));
                }
                None => {
                    tracing::debug!(field = %rule.name, "Substituting empty string for missing field");
                    body.insert(rule.name.clone(), Value::String(String::new()));
                }
            }
        }
        Ok(body)
    }
}

/// Both rule sets plus the test that picks between them.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingRules {
    /// Holds for failure events
    pub failure_when: Condition,
    /// Rules for the success path
    pub success: RuleSet,
    /// Rules for the failure path
    pub failure: RuleSet,
}

impl MappingRules {
    /// Returns the rule set that applies to `ctx`.
    pub fn select(&self, ctx: &Value) -> &RuleSet {
        if self.failure_when.holds(ctx) {
            &self.failure
        } else {
            &self.success
        }
    }

    /// Selects and applies the matching rule set.
    pub fn apply(&self, ctx: &Value, mode: EvalMode) -> ResponderResult<Map<String, Value>> {
        self.select(ctx).apply(ctx, mode)
    }
}
