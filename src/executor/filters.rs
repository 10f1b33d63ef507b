//! Condition evaluation
//!
//! A condition tree is compiled once (regexes built, case folding applied)
//! and then evaluated per entity with short-circuiting AND/OR.
//!
//! Matching rules:
//! - an absent field reads as null
//! - equality and set membership compare by value identity
//! - ordering comparisons only match values of the same kind
//! - pattern operators only match text

use regex::{Regex, RegexBuilder};

use crate::condition::{
    ComparisonOp, CompositeOp, Condition, EqualityOp, NullOp, PatternOp, SetOp,
};
use crate::errors::{LayerResult, QueryError};
use crate::value::{Entity, FieldValue};

#[derive(Debug)]
enum Matcher {
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Regex(Regex),
}

#[derive(Debug)]
enum Node {
    Equality {
        field: String,
        negate: bool,
        value: FieldValue,
    },
    Comparison {
        field: String,
        op: ComparisonOp,
        value: FieldValue,
    },
    Pattern {
        field: String,
        matcher: Matcher,
        case_sensitive: bool,
    },
    Set {
        field: String,
        negate: bool,
        values: Vec<FieldValue>,
    },
    Null {
        field: String,
        negate: bool,
    },
    And(Vec<Node>),
    Or(Vec<Node>),
    Not(Box<Node>),
}

/// A compiled, reusable condition evaluator
#[derive(Debug)]
pub struct ConditionFilter {
    root: Node,
}

impl ConditionFilter {
    /// Validates and compiles a condition tree
    pub fn compile(condition: &Condition) -> LayerResult<Self> {
        condition.validate().into_result()?;
        Ok(Self {
            root: Self::compile_node(condition)?,
        })
    }

    fn compile_node(condition: &Condition) -> LayerResult<Node> {
        let node = match condition {
            Condition::Equality {
                field,
                operator,
                value,
            } => Node::Equality {
                field: field.clone(),
                negate: *operator == EqualityOp::Ne,
                value: value.clone(),
            },
            Condition::Comparison {
                field,
                operator,
                value,
            } => Node::Comparison {
                field: field.clone(),
                op: *operator,
                value: value.clone(),
            },
            Condition::Pattern {
                field,
                operator,
                value,
                case_sensitive,
            } => {
                let needle = if *case_sensitive {
                    value.clone()
                } else {
                    value.to_lowercase()
                };
                let matcher = match operator {
                    PatternOp::Contains => Matcher::Contains(needle),
                    PatternOp::StartsWith => Matcher::StartsWith(needle),
                    PatternOp::EndsWith => Matcher::EndsWith(needle),
                    PatternOp::Matches => Matcher::Regex(
                        RegexBuilder::new(value)
                            .case_insensitive(!case_sensitive)
                            .build()
                            .map_err(|e| {
                                QueryError::invalid_value(format!("Invalid regular expression: {}", e))
                                    .with_detail("field", field.as_str())
                            })?,
                    ),
                };
                Node::Pattern {
                    field: field.clone(),
                    matcher,
                    case_sensitive: *case_sensitive,
                }
            }
            Condition::Set {
                field,
                operator,
                values,
            } => Node::Set {
                field: field.clone(),
                negate: *operator == SetOp::NotIn,
                values: values.clone(),
            },
            Condition::Null { field, operator } => Node::Null {
                field: field.clone(),
                negate: *operator == NullOp::IsNotNull,
            },
            Condition::Composite {
                operator,
                conditions,
            } => {
                let children = conditions
                    .iter()
                    .map(Self::compile_node)
                    .collect::<LayerResult<Vec<_>>>()?;
                match operator {
                    CompositeOp::And => Node::And(children),
                    CompositeOp::Or => Node::Or(children),
                    CompositeOp::Not => {
                        let child = children.into_iter().next().ok_or_else(|| {
                            QueryError::invalid_syntax("'not' requires exactly one condition")
                        })?;
                        Node::Not(Box::new(child))
                    }
                }
            }
        };
        Ok(node)
    }

    /// Checks if an entity matches
    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        Self::eval(&self.root, entity)
    }

    /// Keeps matching entities, preserving order
    pub fn apply<E: Entity>(&self, mut data: Vec<E>) -> Vec<E> {
        data.retain(|entity| self.matches(entity));
        data
    }

    fn eval<E: Entity>(node: &Node, entity: &E) -> bool {
        match node {
            Node::Equality {
                field,
                negate,
                value,
            } => Self::read(entity, field).same_as(value) != *negate,
            Node::Comparison { field, op, value } => {
                let Some(ordering) = Self::read(entity, field).compare(value) else {
                    return false;
                };
                match op {
                    ComparisonOp::Gt => ordering.is_gt(),
                    ComparisonOp::Gte => ordering.is_ge(),
                    ComparisonOp::Lt => ordering.is_lt(),
                    ComparisonOp::Lte => ordering.is_le(),
                }
            }
            Node::Pattern {
                field,
                matcher,
                case_sensitive,
            } => {
                let actual = Self::read(entity, field);
                let Some(text) = actual.as_str() else {
                    return false;
                };
                if let Matcher::Regex(re) = matcher {
                    return re.is_match(text);
                }

                let folded;
                let haystack = if *case_sensitive {
                    text
                } else {
                    folded = text.to_lowercase();
                    folded.as_str()
                };
                match matcher {
                    Matcher::Contains(needle) => haystack.contains(needle.as_str()),
                    Matcher::StartsWith(needle) => haystack.starts_with(needle.as_str()),
                    Matcher::EndsWith(needle) => haystack.ends_with(needle.as_str()),
                    Matcher::Regex(_) => false,
                }
            }
            Node::Set {
                field,
                negate,
                values,
            } => {
                let actual = Self::read(entity, field);
                values.iter().any(|v| actual.same_as(v)) != *negate
            }
            Node::Null { field, negate } => Self::read(entity, field).is_null() != *negate,
            Node::And(children) => children.iter().all(|c| Self::eval(c, entity)),
            Node::Or(children) => children.iter().any(|c| Self::eval(c, entity)),
            Node::Not(child) => !Self::eval(child, entity),
        }
    }

    fn read<E: Entity>(entity: &E, field: &str) -> FieldValue {
        entity.field(field).unwrap_or(FieldValue::Null)
    }
}
