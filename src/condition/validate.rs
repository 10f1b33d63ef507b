//! Structural validation of condition trees
//!
//! One validator produces a structured report. Callers that only need a
//! verdict use `is_valid()`; callers that need the reasons read `issues()`
//! or `messages()`.
//!
//! Checks (recursive):
//! - leaf conditions name a non-empty field
//! - comparison values are orderable (number, text, date, bool)
//! - `matches` patterns compile as regular expressions
//! - set conditions carry at least one value
//! - `not` has exactly one child; `and`/`or` have at least two

use regex::Regex;
use serde_json::Value;

use crate::errors::{QueryError, QueryErrorCode};

use super::model::{CompositeOp, Condition, PatternOp};

/// A single validation failure
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Location in the query, e.g. `conditions[0].conditions[1]`
    pub path: String,
    /// Error code the issue maps to
    pub code: QueryErrorCode,
    /// Human-readable message
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, code: QueryErrorCode, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Outcome of a validation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no issues were found
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Human-readable rendering of every issue
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub(crate) fn add(&mut self, path: &str, code: QueryErrorCode, message: impl Into<String>) {
        self.push(ValidationIssue::new(path, code, message));
    }

    /// Appends every issue of another report
    pub fn merge(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }

    /// Converts a failed report into an error.
    ///
    /// The first issue's code becomes the error code; all messages are
    /// listed under the `errors` detail.
    pub fn into_result(self) -> Result<(), QueryError> {
        let Some(first) = self.issues.first() else {
            return Ok(());
        };

        let messages: Vec<Value> = self.messages().into_iter().map(Value::from).collect();
        let summary = if messages.len() == 1 {
            first.to_string()
        } else {
            format!("{} (and {} more)", first, messages.len() - 1)
        };

        Err(QueryError::new(first.code, summary).with_detail("errors", Value::Array(messages)))
    }
}

/// Validates condition trees
pub struct ConditionValidator;

impl ConditionValidator {
    /// Validates a condition tree, reporting every issue found
    pub fn validate(condition: &Condition) -> ValidationReport {
        let mut report = ValidationReport::new();
        Self::validate_at(condition, "", &mut report);
        report
    }

    /// Validates untyped input.
    ///
    /// Input that does not parse as one of the known variants yields an
    /// invalid report rather than an error.
    pub fn validate_json(value: &Value) -> ValidationReport {
        match Condition::from_json(value) {
            Ok(condition) => Self::validate(&condition),
            Err(err) => {
                let mut report = ValidationReport::new();
                report.add("", err.code(), err.message());
                report
            }
        }
    }

    /// Validates `condition`, prefixing issue paths with `path`
    pub(crate) fn validate_at(condition: &Condition, path: &str, report: &mut ValidationReport) {
        if let Some(field) = condition.field() {
            if field.trim().is_empty() {
                report.add(path, QueryErrorCode::InvalidField, "Condition field must not be empty");
            }
        }

        match condition {
            Condition::Equality { .. } | Condition::Null { .. } => {}
            Condition::Comparison {
                operator, value, ..
            } => {
                if !value.is_orderable() {
                    report.add(
                        path,
                        QueryErrorCode::InvalidValue,
                        format!(
                            "Operator '{}' requires a number, text, date, or bool value, found {}",
                            operator.as_str(),
                            value.kind().as_str()
                        ),
                    );
                }
            }
            Condition::Pattern {
                operator, value, ..
            } => {
                if *operator == PatternOp::Matches {
                    if let Err(e) = Regex::new(value) {
                        report.add(
                            path,
                            QueryErrorCode::InvalidValue,
                            format!("Invalid regular expression: {}", e),
                        );
                    }
                }
            }
            Condition::Set {
                operator, values, ..
            } => {
                if values.is_empty() {
                    report.add(
                        path,
                        QueryErrorCode::InvalidValue,
                        format!("Operator '{}' requires at least one value", operator.as_str()),
                    );
                }
            }
            Condition::Composite {
                operator,
                conditions,
            } => {
                match operator {
                    CompositeOp::Not if conditions.len() != 1 => report.add(
                        path,
                        QueryErrorCode::InvalidSyntax,
                        format!("'not' requires exactly one condition, found {}", conditions.len()),
                    ),
                    CompositeOp::And | CompositeOp::Or if conditions.len() < 2 => report.add(
                        path,
                        QueryErrorCode::InvalidSyntax,
                        format!(
                            "'{}' requires at least two conditions, found {}",
                            operator.as_str(),
                            conditions.len()
                        ),
                    ),
                    _ => {}
                }

                for (i, child) in conditions.iter().enumerate() {
                    let child_path = if path.is_empty() {
                        format!("conditions[{}]", i)
                    } else {
                        format!("{}.conditions[{}]", path, i)
                    };
                    Self::validate_at(child, &child_path, report);
                }
            }
        }
    }
}

impl Condition {
    /// Validates this condition tree
    pub fn validate(&self) -> ValidationReport {
        ConditionValidator::validate(self)
    }

    /// Returns true if this condition tree is structurally valid
    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }
}
