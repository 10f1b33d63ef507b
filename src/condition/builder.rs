//! Condition factories
//!
//! Constructors never fail. Malformed shapes (empty value lists, a `not`
//! with two children) are caught by validation, not construction.

use crate::value::FieldValue;

use super::model::{ComparisonOp, CompositeOp, Condition, EqualityOp, NullOp, PatternOp, SetOp};

impl Condition {
    /// Create an equality condition
    pub fn equality(field: impl Into<String>, operator: EqualityOp, value: impl Into<FieldValue>) -> Self {
        Condition::Equality {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Create a comparison condition
    pub fn comparison(
        field: impl Into<String>,
        operator: ComparisonOp,
        value: impl Into<FieldValue>,
    ) -> Self {
        Condition::Comparison {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Create a pattern condition
    pub fn pattern(
        field: impl Into<String>,
        operator: PatternOp,
        value: impl Into<String>,
        case_sensitive: bool,
    ) -> Self {
        Condition::Pattern {
            field: field.into(),
            operator,
            value: value.into(),
            case_sensitive,
        }
    }

    /// Create a set membership condition
    pub fn set<V: Into<FieldValue>>(
        field: impl Into<String>,
        operator: SetOp,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Condition::Set {
            field: field.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a null check condition
    pub fn null_check(field: impl Into<String>, operator: NullOp) -> Self {
        Condition::Null {
            field: field.into(),
            operator,
        }
    }

    /// Create a composite condition
    pub fn composite(operator: CompositeOp, conditions: Vec<Condition>) -> Self {
        Condition::Composite {
            operator,
            conditions,
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::equality(field, EqualityOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::equality(field, EqualityOp::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::comparison(field, ComparisonOp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::comparison(field, ComparisonOp::Gte, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::comparison(field, ComparisonOp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::comparison(field, ComparisonOp::Lte, value)
    }

    /// Case-sensitive substring match
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::pattern(field, PatternOp::Contains, value, true)
    }

    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::pattern(field, PatternOp::StartsWith, value, true)
    }

    pub fn ends_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::pattern(field, PatternOp::EndsWith, value, true)
    }

    /// Regular expression match
    pub fn matches(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::pattern(field, PatternOp::Matches, value, true)
    }

    pub fn is_in<V: Into<FieldValue>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::set(field, SetOp::In, values)
    }

    pub fn not_in<V: Into<FieldValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::set(field, SetOp::NotIn, values)
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::null_check(field, NullOp::IsNull)
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::null_check(field, NullOp::IsNotNull)
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Self::composite(CompositeOp::And, conditions)
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Self::composite(CompositeOp::Or, conditions)
    }

    pub fn not(condition: Condition) -> Self {
        Self::composite(CompositeOp::Not, vec![condition])
    }

    /// Returns a copy of a pattern condition with case sensitivity changed.
    ///
    /// Other variants are returned unchanged.
    pub fn case_insensitive(self) -> Self {
        match self {
            Condition::Pattern {
                field,
                operator,
                value,
                ..
            } => Condition::Pattern {
                field,
                operator,
                value,
                case_sensitive: false,
            },
            other => other,
        }
    }
}
