//! Condition tree structures
//!
//! A closed set of filter-expression variants. Values of these types are
//! immutable once built; the optimizer produces new trees.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{LayerResult, QueryError};
use crate::value::FieldValue;

/// Equality operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EqualityOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl EqualityOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            EqualityOp::Eq => "=",
            EqualityOp::Ne => "!=",
        }
    }
}

/// Ordering comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
        }
    }
}

/// String pattern operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternOp {
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "endsWith")]
    EndsWith,
    /// Regular expression match
    #[serde(rename = "matches")]
    Matches,
}

impl PatternOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternOp::Contains => "contains",
            PatternOp::StartsWith => "startsWith",
            PatternOp::EndsWith => "endsWith",
            PatternOp::Matches => "matches",
        }
    }
}

/// Set membership operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetOp {
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
}

impl SetOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetOp::In => "in",
            SetOp::NotIn => "not_in",
        }
    }
}

/// Null check operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullOp {
    #[serde(rename = "is_null")]
    IsNull,
    #[serde(rename = "is_not_null")]
    IsNotNull,
}

impl NullOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            NullOp::IsNull => "is_null",
            NullOp::IsNotNull => "is_not_null",
        }
    }
}

/// Boolean combinators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeOp {
    And,
    Or,
    Not,
}

impl CompositeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeOp::And => "and",
            CompositeOp::Or => "or",
            CompositeOp::Not => "not",
        }
    }
}

fn default_case_sensitive() -> bool {
    true
}

/// One node of a boolean filter-expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// `field = value` / `field != value`; the value may be null
    Equality {
        field: String,
        operator: EqualityOp,
        value: FieldValue,
    },
    /// `field > value` and friends
    Comparison {
        field: String,
        operator: ComparisonOp,
        value: FieldValue,
    },
    /// String matching on text fields
    Pattern {
        field: String,
        operator: PatternOp,
        value: String,
        #[serde(default = "default_case_sensitive", rename = "caseSensitive")]
        case_sensitive: bool,
    },
    /// `field in [..]` / `field not_in [..]`
    Set {
        field: String,
        operator: SetOp,
        values: Vec<FieldValue>,
    },
    /// `field is_null` / `field is_not_null`
    Null { field: String, operator: NullOp },
    /// AND / OR / NOT over child conditions
    Composite {
        operator: CompositeOp,
        conditions: Vec<Condition>,
    },
}

/// Variant tag of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    Equality,
    Comparison,
    Pattern,
    Set,
    Null,
    Composite,
}

impl ConditionKind {
    /// Serialized tag names, in declaration order
    pub const TAGS: [&'static str; 6] =
        ["equality", "comparison", "pattern", "set", "null", "composite"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionKind::Equality => "equality",
            ConditionKind::Comparison => "comparison",
            ConditionKind::Pattern => "pattern",
            ConditionKind::Set => "set",
            ConditionKind::Null => "null",
            ConditionKind::Composite => "composite",
        }
    }
}

impl Condition {
    /// Returns the variant tag
    pub fn kind(&self) -> ConditionKind {
        match self {
            Condition::Equality { .. } => ConditionKind::Equality,
            Condition::Comparison { .. } => ConditionKind::Comparison,
            Condition::Pattern { .. } => ConditionKind::Pattern,
            Condition::Set { .. } => ConditionKind::Set,
            Condition::Null { .. } => ConditionKind::Null,
            Condition::Composite { .. } => ConditionKind::Composite,
        }
    }

    /// Returns the field of a leaf condition, `None` for composites
    pub fn field(&self) -> Option<&str> {
        match self {
            Condition::Equality { field, .. }
            | Condition::Comparison { field, .. }
            | Condition::Pattern { field, .. }
            | Condition::Set { field, .. }
            | Condition::Null { field, .. } => Some(field),
            Condition::Composite { .. } => None,
        }
    }

    /// Returns the operator name
    pub fn operator_name(&self) -> &'static str {
        match self {
            Condition::Equality { operator, .. } => operator.as_str(),
            Condition::Comparison { operator, .. } => operator.as_str(),
            Condition::Pattern { operator, .. } => operator.as_str(),
            Condition::Set { operator, .. } => operator.as_str(),
            Condition::Null { operator, .. } => operator.as_str(),
            Condition::Composite { operator, .. } => operator.as_str(),
        }
    }

    /// Returns true for AND/OR/NOT nodes
    pub fn is_composite(&self) -> bool {
        matches!(self, Condition::Composite { .. })
    }

    /// Returns the children of a composite node (empty for leaves)
    pub fn children(&self) -> &[Condition] {
        match self {
            Condition::Composite { conditions, .. } => conditions,
            _ => &[],
        }
    }

    /// Every field referenced anywhere in the tree, in first-seen order
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::Composite { conditions, .. } => {
                for child in conditions {
                    child.collect_fields(out);
                }
            }
            leaf => {
                if let Some(f) = leaf.field() {
                    if !out.contains(&f) {
                        out.push(f);
                    }
                }
            }
        }
    }

    /// Parses a condition from untyped JSON.
    ///
    /// # Errors
    ///
    /// - INVALID_SYNTAX if the input is not an object or the `type` tag is unknown
    /// - INVALID_OPERATOR if an operator is outside the variant's allowed set
    pub fn from_json(value: &Value) -> LayerResult<Condition> {
        let obj = value
            .as_object()
            .ok_or_else(|| QueryError::invalid_syntax("Condition must be an object"))?;

        match obj.get("type").and_then(Value::as_str) {
            Some(tag) if ConditionKind::TAGS.contains(&tag) => {}
            Some(tag) => {
                return Err(QueryError::invalid_syntax(format!(
                    "Unknown condition type '{}'",
                    tag
                ))
                .with_detail("type", tag))
            }
            None => return Err(QueryError::invalid_syntax("Condition is missing 'type'")),
        }

        serde_json::from_value(value.clone()).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("unknown variant") {
                QueryError::invalid_operator(msg)
            } else {
                QueryError::invalid_syntax(msg)
            }
        })
    }

    /// Renders the condition as JSON
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_equality() {
        let cond = Condition::from_json(&json!({
            "type": "equality", "field": "name", "operator": "=", "value": "Alice"
        }))
        .unwrap();
        assert_eq!(cond.kind(), ConditionKind::Equality);
        assert_eq!(cond.field(), Some("name"));
        assert_eq!(cond.operator_name(), "=");
    }

    #[test]
    fn test_equality_value_may_be_null_but_not_absent() {
        let cond = Condition::from_json(&json!({
            "type": "equality", "field": "a", "operator": "=", "value": null
        }))
        .unwrap();
        match cond {
            Condition::Equality { value, .. } => assert_eq!(value, FieldValue::Null),
            other => panic!("unexpected {:?}", other),
        }

        let missing = json!({"type": "equality", "field": "a", "operator": "="});
        let err = Condition::from_json(&missing).unwrap_err();
        assert_eq!(err.code().code(), "INVALID_SYNTAX");
        assert!(!crate::condition::ConditionValidator::validate_json(&missing).is_valid());
    }

    #[test]
    fn test_parse_pattern_defaults_case_sensitive() {
        let cond = Condition::from_json(&json!({
            "type": "pattern", "field": "name", "operator": "startsWith", "value": "Al"
        }))
        .unwrap();
        match cond {
            Condition::Pattern { case_sensitive, .. } => assert!(case_sensitive),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_composite() {
        let cond = Condition::from_json(&json!({
            "type": "composite",
            "operator": "or",
            "conditions": [
                {"type": "null", "field": "a", "operator": "is_null"},
                {"type": "set", "field": "b", "operator": "in", "values": [1, 2]}
            ]
        }))
        .unwrap();
        assert_eq!(cond.children().len(), 2);
        assert_eq!(cond.fields(), vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = Condition::from_json(&json!({"type": "fuzzy", "field": "a"})).unwrap_err();
        assert_eq!(err.code().code(), "INVALID_SYNTAX");
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = Condition::from_json(&json!({
            "type": "comparison", "field": "a", "operator": "~", "value": 1
        }))
        .unwrap_err();
        assert_eq!(err.code().code(), "INVALID_OPERATOR");
    }

    #[test]
    fn test_json_roundtrip_shape() {
        let cond = Condition::from_json(&json!({
            "type": "comparison", "field": "age", "operator": ">=", "value": 18
        }))
        .unwrap();
        assert_eq!(cond.to_json()["operator"], ">=");
        assert_eq!(cond.to_json()["value"], 18);
    }
}
