//! Rendering of mapping rules into the gateway's Velocity mapping template.
//!
//! The template runs inside the gateway for every destination event. It
//! first points the storage integration at the ResponseURL (path and query
//! string overrides), then writes the response body: one `#if` chain per
//! field, each branch mirroring one alternative of the field's [`Expr`].
//!
//! Absent values never abort the template. A required field whose every
//! branch is guarded gets a final `#else` emitting `""`, which is the
//! gateway-side form of [`EvalMode::DefaultOnMissing`].
//!
//! [`EvalMode::DefaultOnMissing`]: crate::rules::EvalMode::DefaultOnMissing

use serde_json::Value;

use crate::compiler::request_field;
use crate::rules::{Condition, Expr, FieldPath, FieldRule, JsonKind, MappingRules, RuleSet};

/// Renders the request mapping template for both rule sets.
pub fn render_request_template(rules: &MappingRules) -> String {
    let mut renderer = Renderer::default();
    renderer.preamble();
    renderer.line("#set($sep = \"\")");
    renderer.line("{");
    renderer.line(&format!("#if({})", condition(&rules.failure_when)));
    renderer.rule_set(&rules.failure);
    renderer.line("#else");
    renderer.rule_set(&rules.success);
    renderer.line("#end");
    renderer.line("}");
    renderer.finish()
}

/// Renders a single rule set as a standalone JSON body template.
pub fn render_rule_set(rules: &RuleSet) -> String {
    let mut renderer = Renderer::default();
    renderer.line("#set($sep = \"\")");
    renderer.line("{");
    renderer.rule_set(rules);
    renderer.line("}");
    renderer.finish()
}

/// A guarded alternative: emit `value` when `guard` holds (or always).
#[derive(Debug, Clone)]
struct Branch {
    guard: Option<String>,
    value: String,
}

impl Branch {
    fn always(value: String) -> Self {
        Self { guard: None, value }
    }

    fn when(guard: String, value: String) -> Self {
        Self {
            guard: Some(guard),
            value,
        }
    }

    fn and(self, extra: &str) -> Self {
        let guard = match self.guard {
            Some(guard) => format!("{} && {}", extra, guard),
            None => extra.to_string(),
        };
        Self::when(guard, self.value)
    }
}

#[derive(Default)]
struct Renderer {
    lines: Vec<String>,
    next_var: usize,
}

impl Renderer {
    fn line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    fn fresh_var(&mut self) -> String {
        let name = format!("$part{}", self.next_var);
        self.next_var += 1;
        name
    }

    /// Points the storage integration at the pre-signed ResponseURL.
    ///
    /// `https://host/<path>?<query>`: the path becomes the `{path}` parameter
    /// of the integration URI, each query pair an integration query string.
    fn preamble(&mut self) {
        let url = json_path(&request_field("ResponseURL"));
        self.line(&format!("#set($fullPath = $input.path('{}').split('/', 4)[3])", url));
        self.line("#set($context.requestOverride.path.path = $util.urlDecode($fullPath.split('\\?', 2)[0]))");
        self.line("#foreach($qsPair in $fullPath.split('\\?', 2)[1].split('&'))");
        self.line("#set($qsKey = $util.urlDecode($qsPair.split('=', 2)[0]))");
        self.line("#set($qsValue = $util.urlDecode($qsPair.split('=', 2)[1]))");
        self.line("#set($context.requestOverride.querystring[$qsKey] = $qsValue)");
        self.line("#end");
    }

    fn rule_set(&mut self, rules: &RuleSet) {
        for field in &rules.fields {
            self.field(field);
        }
    }

    fn field(&mut self, rule: &FieldRule) {
        let key = quote_json(&rule.name);
        let branches = self.json_branches(&rule.expr);
        let emit = |value: &str| format!("${{sep}}{}: {}\n#set($sep = \",\")", key, value);

        let mut chain: Vec<String> = Vec::new();
        let mut closed = false;
        for branch in branches {
            match branch.guard {
                Some(guard) => {
                    let directive = if chain.is_empty() { "#if" } else { "#elseif" };
                    chain.push(format!("{}({})", directive, guard));
                    chain.push(emit(&branch.value));
                }
                None => {
                    if !chain.is_empty() {
                        chain.push("#else".to_string());
                    }
                    chain.push(emit(&branch.value));
                    closed = true;
                    break;
                }
            }
        }

        if !closed && rule.is_required() {
            if chain.is_empty() {
                chain.push(emit("\"\""));
            } else {
                chain.push("#else".to_string());
                chain.push(emit("\"\""));
            }
        }
        let opened = chain.first().is_some_and(|line| line.starts_with("#if("));
        if opened {
            chain.push("#end".to_string());
        }
        for line in chain {
            self.line(&line);
        }
    }

    /// Branches whose values are JSON value text.
    fn json_branches(&mut self, expr: &Expr) -> Vec<Branch> {
        match expr {
            Expr::Literal(value) => vec![Branch::always(value.to_string())],
            Expr::Path(path) => vec![Branch::when(present(path), input_json(path))],
            Expr::Text(path) => text_alternatives(path)
                .into_iter()
                .map(|branch| Branch {
                    value: format!("\"{}\"", branch.value),
                    ..branch
                })
                .collect(),
            Expr::OneOf { path, allowed } => {
                vec![Branch::when(one_of_guard(path, allowed), input_json(path))]
            }
            Expr::OfKind { path, kind } => {
                vec![Branch::when(kind_guard(path, *kind), input_json(path))]
            }
            Expr::Coalesce(alternatives) => {
                let branches: Vec<Branch> = alternatives
                    .iter()
                    .flat_map(|alternative| self.json_branches(alternative))
                    .collect();
                until_unguarded(branches)
            }
            Expr::When {
                condition: test,
                then,
                otherwise,
            } => {
                let test = condition(test);
                let negated = format!("!({})", test);
                let mut branches: Vec<Branch> = self
                    .json_branches(then)
                    .into_iter()
                    .map(|branch| branch.and(&format!("({})", test)))
                    .collect();
                branches.extend(
                    self.json_branches(otherwise)
                        .into_iter()
                        .map(|branch| branch.and(&negated)),
                );
                branches
            }
            Expr::Concat(parts) => {
                let vars = self.concat_parts(parts);
                vec![Branch::always(format!("\"{}\"", interpolate(&vars)))]
            }
        }
    }

    /// Branches whose values are Velocity expressions yielding JSON-escaped
    /// text, for use inside `#set`.
    fn text_branches(&mut self, expr: &Expr) -> Vec<Branch> {
        match expr {
            Expr::Literal(value) => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                vec![Branch::always(velocity_string(&escape_json_text(&text)))]
            }
            Expr::Path(path) | Expr::Text(path) => text_alternatives(path),
            Expr::OneOf { path, allowed } => vec![Branch::when(one_of_guard(path, allowed), text_of(path))],
            Expr::OfKind { path, kind } => {
                let value = match kind {
                    JsonKind::NonEmptyString => text_of(path),
                    JsonKind::Object | JsonKind::Boolean => json_text_of(path),
                };
                vec![Branch::when(kind_guard(path, *kind), value)]
            }
            Expr::Coalesce(alternatives) => {
                let branches: Vec<Branch> = alternatives
                    .iter()
                    .flat_map(|alternative| self.text_branches(alternative))
                    .collect();
                until_unguarded(branches)
            }
            Expr::When {
                condition: test,
                then,
                otherwise,
            } => {
                let test = condition(test);
                let negated = format!("!({})", test);
                let mut branches: Vec<Branch> = self
                    .text_branches(then)
                    .into_iter()
                    .map(|branch| branch.and(&format!("({})", test)))
                    .collect();
                branches.extend(
                    self.text_branches(otherwise)
                        .into_iter()
                        .map(|branch| branch.and(&negated)),
                );
                branches
            }
            Expr::Concat(parts) => {
                let vars = self.concat_parts(parts);
                vec![Branch::always(format!("\"{}\"", interpolate(&vars)))]
            }
        }
    }

    /// Emits one `#set` chain per part and returns the variables holding them.
    ///
    /// Every variable starts as `""`, so a part with no matching branch
    /// contributes nothing.
    fn concat_parts(&mut self, parts: &[Expr]) -> Vec<String> {
        let mut vars = Vec::with_capacity(parts.len());
        for part in parts {
            let var = self.fresh_var();
            let branches = self.text_branches(part);
            let unguarded_first = branches.first().is_some_and(|branch| branch.guard.is_none());
            if unguarded_first {
                self.line(&format!("#set({} = {})", var, branches[0].value));
            } else {
                self.line(&format!("#set({} = \"\")", var));
                let mut first = true;
                for branch in branches {
                    match branch.guard {
                        Some(guard) => {
                            let directive = if first { "#if" } else { "#elseif" };
                            self.line(&format!("{}({})", directive, guard));
                        }
                        None => self.line("#else"),
                    }
                    self.line(&format!("#set({} = {})", var, branch.value));
                    first = false;
                }
                if !first {
                    self.line("#end");
                }
            }
            vars.push(var);
        }
        vars
    }
}

fn until_unguarded(branches: Vec<Branch>) -> Vec<Branch> {
    let mut kept = Vec::with_capacity(branches.len());
    for branch in branches {
        let unguarded = branch.guard.is_none();
        kept.push(branch);
        if unguarded {
            break;
        }
    }
    kept
}

fn interpolate(vars: &[String]) -> String {
    vars.iter()
        .map(|var| format!("${{{}}}", var.trim_start_matches('$')))
        .collect()
}

/// Renders a path as the gateway's JSONPath syntax.
fn json_path(path: &FieldPath) -> String {
    let mut out = String::from("$");
    for segment in path.segments() {
        if is_identifier(segment) {
            out.push('.');
            out.push_str(segment);
        } else {
            out.push_str(&format!("[\"{}\"]", segment));
        }
    }
    out
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn input_json(path: &FieldPath) -> String {
    format!("$input.json('{}')", json_path(path))
}

fn input_path(path: &FieldPath) -> String {
    format!("$input.path('{}')", json_path(path))
}

/// Escaped text of a string value.
fn text_of(path: &FieldPath) -> String {
    format!("$util.escapeJavaScript({}).replaceAll(\"\\\\'\",\"'\")", input_path(path))
}

/// Escaped JSON text of any value.
fn json_text_of(path: &FieldPath) -> String {
    format!("$util.escapeJavaScript({}).replaceAll(\"\\\\'\",\"'\")", input_json(path))
}

/// A present value as text: strings verbatim, anything else as its JSON
/// text, matching what the in-process evaluator renders.
fn text_alternatives(path: &FieldPath) -> Vec<Branch> {
    vec![
        Branch::when(format!("{} && {}", present(path), is_string(path)), text_of(path)),
        Branch::when(present(path), json_text_of(path)),
    ]
}

fn is_string(path: &FieldPath) -> String {
    format!("{}.startsWith('\"')", input_json(path))
}

/// The value exists and is not JSON `null`.
fn present(path: &FieldPath) -> String {
    let parent = match path.split_last() {
        Some((parent, leaf)) => format!("{}.containsKey('{}')", input_path(&parent), leaf),
        None => "true".to_string(),
    };
    format!("{} && {} != 'null'", parent, input_json(path))
}

fn one_of_guard(path: &FieldPath, allowed: &[String]) -> String {
    let options: Vec<String> = allowed
        .iter()
        .map(|value| format!("{} == '{}'", input_path(path), value))
        .collect();
    format!("{} && ({})", present(path), options.join(" || "))
}

fn kind_guard(path: &FieldPath, kind: JsonKind) -> String {
    let json = input_json(path);
    let check = match kind {
        JsonKind::Object => format!("{}.startsWith('{{')", json),
        JsonKind::Boolean => format!("({} == 'true' || {} == 'false')", json, json),
        JsonKind::NonEmptyString => format!("{}.startsWith('\"') && {} != '\"\"'", json, json),
    };
    format!("{} && {}", present(path), check)
}

/// Renders a condition as a Velocity boolean expression.
fn condition(condition: &Condition) -> String {
    match condition {
        Condition::Present(path) => present(path),
        Condition::Equals { path, value } => format!("{} == '{}'", input_path(path), value),
        Condition::Any(conditions) => {
            let parts: Vec<String> = conditions.iter().map(|c| format!("({})", self::condition(c))).collect();
            parts.join(" || ")
        }
    }
}

fn quote_json(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

fn escape_json_text(text: &str) -> String {
    let quoted = quote_json(text);
    quoted[1..quoted.len() - 1].to_string()
}

/// Single-quoted Velocity string literal (not interpolated).
fn velocity_string(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile, compile_failure_rules, compile_success_rules};
    use crate::rules::ResultVariant;

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_json_path_rendering() {
        assert_eq!(json_path(&FieldPath::parse("detail.requestPayload.RequestId")), "$.detail.requestPayload.RequestId");
        assert_eq!(json_path(&FieldPath::new(["detail-type"])), "$[\"detail-type\"]");
    }

    #[test]
    fn test_request_template_is_balanced() {
        let template = render_request_template(&compile());
        let openers = count(&template, "#if(") + count(&template, "#foreach(");
        assert_eq!(openers, count(&template, "#end"));
        assert!(template.trim_end().ends_with('}'));
    }

    #[test]
    fn test_request_template_overrides_destination() {
        let template = render_request_template(&compile());
        assert!(template.contains("$input.path('$.detail.requestPayload.ResponseURL')"));
        assert!(template.contains("$context.requestOverride.path.path"));
        assert!(template.contains("$context.requestOverride.querystring[$qsKey]"));
    }

    #[test]
    fn test_request_template_dispatches_on_failure() {
        let template = render_request_template(&compile());
        assert!(template.contains("containsKey('functionError')"));
        assert!(template.contains("$input.path('$[\"detail-type\"]') == 'Lambda Function Invocation Result - Failure'"));
    }

    #[test]
    fn test_every_field_emitted_once_per_branch() {
        let success = render_rule_set(&compile_success_rules());
        for name in ["Status", "Reason", "PhysicalResourceId", "StackId", "RequestId", "LogicalResourceId", "Data", "NoEcho"] {
            assert!(success.contains(&format!("${{sep}}\"{}\": ", name)), "{} not emitted", name);
        }
        let failure = render_rule_set(&compile_failure_rules());
        assert_eq!(count(&failure, "${sep}\"Status\": \"FAILED\""), 1);
        assert!(!failure.contains("\"Data\""));
    }

    #[test]
    fn test_required_fields_fall_back_to_empty_string() {
        let failure = render_rule_set(&compile_failure_rules());
        // StackId, RequestId, LogicalResourceId and PhysicalResourceId are all guarded.
        assert_eq!(count(&failure, ": \"\"\n"), 4);
    }

    #[test]
    fn test_failure_reason_uses_concat_variables() {
        let failure = render_rule_set(&compile_failure_rules());
        assert!(failure.contains("#set($part0 = \"\")"));
        assert!(failure.contains("#set($part1 = ': ')"));
        assert!(failure.contains("${sep}\"Reason\": \"${part0}${part1}${part2}\""));
        assert!(failure.contains("$util.escapeJavaScript($input.path('$.detail.responsePayload.errorMessage'))"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let rules = compile();
        assert_eq!(render_request_template(&rules), render_request_template(&rules));
        assert_eq!(rules.success.variant, ResultVariant::Success);
    }

    fn render_field(rules: &RuleSet, name: &str) -> String {
        let mut renderer = Renderer::default();
        renderer.field(rules.field(name).unwrap());
        renderer.finish()
    }

    const SUCCESS_PHYSICAL_ID: &str = r#"#if($input.path('$.detail.responsePayload').containsKey('PhysicalResourceId') && $input.json('$.detail.responsePayload.PhysicalResourceId') != 'null' && $input.json('$.detail.responsePayload.PhysicalResourceId').startsWith('"'))
${sep}"PhysicalResourceId": "$util.escapeJavaScript($input.path('$.detail.responsePayload.PhysicalResourceId')).replaceAll("\\'","'")"
#set($sep = ",")
#elseif($input.path('$.detail.responsePayload').containsKey('PhysicalResourceId') && $input.json('$.detail.responsePayload.PhysicalResourceId') != 'null')
${sep}"PhysicalResourceId": "$util.escapeJavaScript($input.json('$.detail.responsePayload.PhysicalResourceId')).replaceAll("\\'","'")"
#set($sep = ",")
#elseif(($input.path('$.detail.requestPayload.RequestType') == 'Create') && $input.path('$.detail.requestPayload').containsKey('RequestId') && $input.json('$.detail.requestPayload.RequestId') != 'null' && $input.json('$.detail.requestPayload.RequestId').startsWith('"'))
${sep}"PhysicalResourceId": "$util.escapeJavaScript($input.path('$.detail.requestPayload.RequestId')).replaceAll("\\'","'")"
#set($sep = ",")
#elseif(($input.path('$.detail.requestPayload.RequestType') == 'Create') && $input.path('$.detail.requestPayload').containsKey('RequestId') && $input.json('$.detail.requestPayload.RequestId') != 'null')
${sep}"PhysicalResourceId": "$util.escapeJavaScript($input.json('$.detail.requestPayload.RequestId')).replaceAll("\\'","'")"
#set($sep = ",")
#elseif(!($input.path('$.detail.requestPayload.RequestType') == 'Create') && $input.path('$.detail.requestPayload').containsKey('PhysicalResourceId') && $input.json('$.detail.requestPayload.PhysicalResourceId') != 'null' && $input.json('$.detail.requestPayload.PhysicalResourceId').startsWith('"'))
${sep}"PhysicalResourceId": "$util.escapeJavaScript($input.path('$.detail.requestPayload.PhysicalResourceId')).replaceAll("\\'","'")"
#set($sep = ",")
#elseif(!($input.path('$.detail.requestPayload.RequestType') == 'Create') && $input.path('$.detail.requestPayload').containsKey('PhysicalResourceId') && $input.json('$.detail.requestPayload.PhysicalResourceId') != 'null')
${sep}"PhysicalResourceId": "$util.escapeJavaScript($input.json('$.detail.requestPayload.PhysicalResourceId')).replaceAll("\\'","'")"
#set($sep = ",")
#else
${sep}"PhysicalResourceId": ""
#set($sep = ",")
#end
"#;

    const FAILURE_PHYSICAL_ID: &str = r#"#if(($input.path('$.detail.requestPayload.RequestType') == 'Create') && $input.path('$.detail.requestPayload').containsKey('RequestId') && $input.json('$.detail.requestPayload.RequestId') != 'null' && $input.json('$.detail.requestPayload.RequestId').startsWith('"'))
${sep}"PhysicalResourceId": "$util.escapeJavaScript($input.path('$.detail.requestPayload.RequestId')).replaceAll("\\'","'")"
#set($sep = ",")
#elseif(($input.path('$.detail.requestPayload.RequestType') == 'Create') && $input.path('$.detail.requestPayload').containsKey('RequestId') && $input.json('$.detail.requestPayload.RequestId') != 'null')
${sep}"PhysicalResourceId": "$util.escapeJavaScript($input.json('$.detail.requestPayload.RequestId')).replaceAll("\\'","'")"
#set($sep = ",")
#elseif(!($input.path('$.detail.requestPayload.RequestType') == 'Create') && $input.path('$.detail.requestPayload').containsKey('PhysicalResourceId') && $input.json('$.detail.requestPayload.PhysicalResourceId') != 'null' && $input.json('$.detail.requestPayload.PhysicalResourceId').startsWith('"'))
${sep}"PhysicalResourceId": "$util.escapeJavaScript($input.path('$.detail.requestPayload.PhysicalResourceId')).replaceAll("\\'","'")"
#set($sep = ",")
#elseif(!($input.path('$.detail.requestPayload.RequestType') == 'Create') && $input.path('$.detail.requestPayload').containsKey('PhysicalResourceId') && $input.json('$.detail.requestPayload.PhysicalResourceId') != 'null')
${sep}"PhysicalResourceId": "$util.escapeJavaScript($input.json('$.detail.requestPayload.PhysicalResourceId')).replaceAll("\\'","'")"
#set($sep = ",")
#else
${sep}"PhysicalResourceId": ""
#set($sep = ",")
#end
"#;

    const FAILURE_REASON: &str = r#"#set($part0 = "")
#if($input.path('$.detail.responsePayload').containsKey('errorType') && $input.json('$.detail.responsePayload.errorType') != 'null' && $input.json('$.detail.responsePayload.errorType').startsWith('"') && $input.json('$.detail.responsePayload.errorType') != '""')
#set($part0 = $util.escapeJavaScript($input.path('$.detail.responsePayload.errorType')).replaceAll("\\'","'"))
#elseif($input.path('$.detail.requestContext').containsKey('condition') && $input.json('$.detail.requestContext.condition') != 'null' && $input.json('$.detail.requestContext.condition').startsWith('"'))
#set($part0 = $util.escapeJavaScript($input.path('$.detail.requestContext.condition')).replaceAll("\\'","'"))
#elseif($input.path('$.detail.requestContext').containsKey('condition') && $input.json('$.detail.requestContext.condition') != 'null')
#set($part0 = $util.escapeJavaScript($input.json('$.detail.requestContext.condition')).replaceAll("\\'","'"))
#end
#set($part1 = ': ')
#set($part2 = "")
#if($input.path('$.detail.responsePayload').containsKey('errorMessage') && $input.json('$.detail.responsePayload.errorMessage') != 'null' && $input.json('$.detail.responsePayload.errorMessage').startsWith('"'))
#set($part2 = $util.escapeJavaScript($input.path('$.detail.responsePayload.errorMessage')).replaceAll("\\'","'"))
#elseif($input.path('$.detail.responsePayload').containsKey('errorMessage') && $input.json('$.detail.responsePayload.errorMessage') != 'null')
#set($part2 = $util.escapeJavaScript($input.json('$.detail.responsePayload.errorMessage')).replaceAll("\\'","'"))
#end
${sep}"Reason": "${part0}${part1}${part2}"
#set($sep = ",")
"#;

    const SUCCESS_REASON: &str = r#"#if($input.path('$.detail.responsePayload').containsKey('Reason') && $input.json('$.detail.responsePayload.Reason') != 'null' && $input.json('$.detail.responsePayload.Reason').startsWith('"'))
${sep}"Reason": "$util.escapeJavaScript($input.path('$.detail.responsePayload.Reason')).replaceAll("\\'","'")"
#set($sep = ",")
#elseif($input.path('$.detail.responsePayload').containsKey('Reason') && $input.json('$.detail.responsePayload.Reason') != 'null')
${sep}"Reason": "$util.escapeJavaScript($input.json('$.detail.responsePayload.Reason')).replaceAll("\\'","'")"
#set($sep = ",")
#else
${sep}"Reason": ""
#set($sep = ",")
#end
"#;

    const SUCCESS_DATA: &str = r#"#if($input.path('$.detail.responsePayload').containsKey('Data') && $input.json('$.detail.responsePayload.Data') != 'null' && $input.json('$.detail.responsePayload.Data').startsWith('{'))
${sep}"Data": $input.json('$.detail.responsePayload.Data')
#set($sep = ",")
#end
"#;

    const FAILURE_STACK_ID: &str = r#"#if($input.path('$.detail.requestPayload').containsKey('StackId') && $input.json('$.detail.requestPayload.StackId') != 'null')
${sep}"StackId": $input.json('$.detail.requestPayload.StackId')
#set($sep = ",")
#else
${sep}"StackId": ""
#set($sep = ",")
#end
"#;

    #[test]
    fn test_success_physical_id_prefers_handler_then_request_type() {
        assert_eq!(render_field(&compile_success_rules(), "PhysicalResourceId"), SUCCESS_PHYSICAL_ID);
    }

    #[test]
    fn test_failure_physical_id_ends_in_empty_fallback() {
        assert_eq!(render_field(&compile_failure_rules(), "PhysicalResourceId"), FAILURE_PHYSICAL_ID);
    }

    #[test]
    fn test_failure_reason_golden() {
        assert_eq!(render_field(&compile_failure_rules(), "Reason"), FAILURE_REASON);
    }

    #[test]
    fn test_text_field_renders_strings_and_other_values() {
        let rendered = render_field(&compile_success_rules(), "Reason");
        assert_eq!(rendered, SUCCESS_REASON);
        // Strings go through `$input.path`; numbers and objects through `$input.json`.
        assert!(rendered.contains("$input.json('$.detail.responsePayload.Reason').startsWith('\"')"));
        assert!(rendered.contains("$util.escapeJavaScript($input.json('$.detail.responsePayload.Reason'))"));
    }

    #[test]
    fn test_optional_field_has_no_fallback() {
        assert_eq!(render_field(&compile_success_rules(), "Data"), SUCCESS_DATA);
    }

    #[test]
    fn test_request_identity_field_golden() {
        assert_eq!(render_field(&compile_failure_rules(), "StackId"), FAILURE_STACK_ID);
    }

    #[test]
    fn test_velocity_string_escapes_quotes() {
        assert_eq!(velocity_string("it's"), "'it''s'");
        assert_eq!(escape_json_text("a\"b"), "a\\\"b");
    }
}
