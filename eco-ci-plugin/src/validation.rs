use std::sync::OnceLock;

use evalexpr::EmptyContext;
use regex::Regex;
use serde_json::Value;
use time::OffsetDateTime;

use crate::pipeline::{ConfigParams, PluginError, PluginParams};

/// Validated plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcoCiConfig {
    pub repo: String,
    pub branch: String,
    pub workflow: u64,
    pub start_date: Option<OffsetDateTime>,
    pub end_date: Option<OffsetDateTime>,
}

/// Typed view of an input record: where the window starts and how long it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationInput {
    pub timestamp: OffsetDateTime,
    /// Seconds.
    pub duration: f64,
}

fn repo_pattern() -> Result<&'static Regex, PluginError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+/[a-zA-Z0-9_-]+$"))
        .as_ref()
        .map_err(|e| PluginError::Config(format!("repo pattern failed to compile: {e}")))
}

/// Evaluate an arithmetic duration such as `"11 * 60 * 60"`.
///
/// The empty context has no variables, no assignments and no builtin
/// functions, so only literals and operators evaluate.
pub fn evaluate_duration(expr: &str) -> Result<f64, evalexpr::EvalexprError> {
    evalexpr::eval_number_with_context(expr, &EmptyContext)
}

fn required(field: &str) -> String {
    format!("\"{field}\" parameter is required. Error code: invalid_type.")
}

fn expected(field: &str, kind: &str, value: &Value) -> String {
    format!(
        "\"{field}\" parameter is expected {kind}, received {}. Error code: invalid_type.",
        type_name(value)
    )
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate the plugin configuration, reporting every problem at once.
///
/// Rules:
/// - config must be present and non-empty.
/// - `repo` is `owner/name`.
/// - `branch` is a string and `workflow` a non-negative integer.
/// - `start-date` / `end-date` are optional parseable timestamps.
pub fn validate_config(config: Option<&ConfigParams>) -> Result<EcoCiConfig, PluginError> {
    let config = match config {
        Some(c) if !c.is_empty() => c,
        _ => return Err(PluginError::Config("Config is not provided.".to_string())),
    };

    let repo_pattern = repo_pattern()?;
    let mut issues = Vec::new();

    let repo = match config.get("repo") {
        None | Some(Value::Null) => {
            issues.push(required("repo"));
            None
        }
        Some(Value::String(s)) if repo_pattern.is_match(s) => Some(s.clone()),
        Some(Value::String(_)) => {
            issues.push("\"repo\" parameter is invalid. Error code: invalid_string.".to_string());
            None
        }
        Some(other) => {
            issues.push(expected("repo", "string", other));
            None
        }
    };

    let branch = match config.get("branch") {
        None | Some(Value::Null) => {
            issues.push(required("branch"));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            issues.push(expected("branch", "string", other));
            None
        }
    };

    let workflow = match config.get("workflow") {
        None | Some(Value::Null) => {
            issues.push(required("workflow"));
            None
        }
        Some(Value::Number(n)) => match n.as_u64() {
            Some(id) => Some(id),
            None => {
                issues.push(format!(
                    "\"workflow\" parameter must be a non-negative integer, received {n}. Error code: invalid_type."
                ));
                None
            }
        },
        Some(other) => {
            issues.push(expected("workflow", "number", other));
            None
        }
    };

    let start_date = optional_date(config, "start-date", &mut issues);
    let end_date = optional_date(config, "end-date", &mut issues);

    match (repo, branch, workflow) {
        (Some(repo), Some(branch), Some(workflow)) if issues.is_empty() => Ok(EcoCiConfig {
            repo,
            branch,
            workflow,
            start_date,
            end_date,
        }),
        _ => {
            metrics::counter!("eco_ci_validation_rejected_total").increment(1);
            Err(PluginError::Config(issues.join(",")))
        }
    }
}

fn optional_date(config: &ConfigParams, field: &str, issues: &mut Vec<String>) -> Option<OffsetDateTime> {
    match config.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            let parsed = green_coding_client::timestamp::parse(s);
            if parsed.is_none() {
                issues.push(format!("\"{field}\" parameter is not a valid date: '{s}'."));
            }
            parsed
        }
        Some(other) => {
            issues.push(expected(field, "string or date", other));
            None
        }
    }
}

/// Validate one input record, reporting failures against its index.
pub fn validate_input(input: &PluginParams, index: usize) -> Result<ObservationInput, PluginError> {
    let fail = |message: String| {
        metrics::counter!("eco_ci_validation_rejected_total").increment(1);
        PluginError::InputValidation { index, message }
    };

    let timestamp = match input.get("timestamp") {
        None | Some(Value::Null) => return Err(fail(required("timestamp"))),
        Some(Value::String(s)) => green_coding_client::timestamp::parse(s)
            .ok_or_else(|| fail(format!("\"timestamp\" parameter is not a valid date: '{s}'.")))?,
        Some(other) => return Err(fail(expected("timestamp", "string or date", other))),
    };

    let duration = match input.get("duration") {
        None | Some(Value::Null) => return Err(fail(required("duration"))),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| fail(format!("\"duration\" parameter is not representable: {n}.")))?,
        Some(Value::String(s)) => {
            evaluate_duration(s).map_err(|e| fail(format!("\"duration\" parameter '{s}' is invalid: {e}.")))?
        }
        Some(other) => return Err(fail(expected("duration", "number or string", other))),
    };

    if !duration.is_finite() {
        return Err(fail("\"duration\" must be a finite number.".to_string()));
    }
    if duration < 0.0 {
        return Err(fail("\"duration\" must be non-negative.".to_string()));
    }

    Ok(ObservationInput { timestamp, duration })
}
