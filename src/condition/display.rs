//! Human-readable rendering for diagnostics and logs

use std::fmt;

use super::model::{CompositeOp, Condition};

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Equality {
                field,
                operator,
                value,
            } => write!(f, "{} {} {}", field, operator.as_str(), value),
            Condition::Comparison {
                field,
                operator,
                value,
            } => write!(f, "{} {} {}", field, operator.as_str(), value),
            Condition::Pattern {
                field,
                operator,
                value,
                case_sensitive,
            } => {
                write!(f, "{} {} \"{}\"", field, operator.as_str(), value)?;
                if !case_sensitive {
                    write!(f, " (case-insensitive)")?;
                }
                Ok(())
            }
            Condition::Set {
                field,
                operator,
                values,
            } => {
                write!(f, "{} {} [", field, operator.as_str())?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Condition::Null { field, operator } => write!(f, "{} {}", field, operator.as_str()),
            Condition::Composite {
                operator: CompositeOp::Not,
                conditions,
            } => {
                write!(f, "NOT (")?;
                for (i, c) in conditions.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, ")")
            }
            Condition::Composite {
                operator,
                conditions,
            } => {
                let joiner = match operator {
                    CompositeOp::Or => " OR ",
                    _ => " AND ",
                };
                write!(f, "(")?;
                for (i, c) in conditions.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", joiner)?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, ")")
            }
        }
    }
}
