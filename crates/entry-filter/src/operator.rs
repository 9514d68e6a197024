//! Comparison operators and sibling relations.
//!
//! Both parse case-insensitively from their textual form (`"NOT LIKE"`,
//! `"Or"`) and always render lower case.

use crate::error::{FilterError, FilterResult};
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a leaf predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    /// column = value
    #[default]
    Eq,
    /// column != value
    Ne,
    /// column > value
    Gt,
    /// column >= value
    Gte,
    /// column < value
    Lt,
    /// column <= value
    Lte,
    /// column LIKE pattern
    Like,
    /// column NOT LIKE pattern
    NotLike,
    /// column IN (list)
    In,
    /// column NOT IN (list)
    NotIn,
    /// column BETWEEN a AND b
    Between,
    /// column NOT BETWEEN a AND b
    NotBetween,
    /// column IS NULL
    IsNull,
    /// column IS NOT NULL
    IsNotNull,
}

impl Operator {
    /// Every supported operator, in declaration order.
    pub const ALL: [Operator; 14] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Like,
        Operator::NotLike,
        Operator::In,
        Operator::NotIn,
        Operator::Between,
        Operator::NotBetween,
        Operator::IsNull,
        Operator::IsNotNull,
    ];

    /// Parse an operator, ignoring ASCII case.
    pub fn parse(s: &str) -> FilterResult<Self> {
        let op = match s.to_lowercase().as_str() {
            "=" => Operator::Eq,
            "!=" => Operator::Ne,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "like" => Operator::Like,
            "not like" => Operator::NotLike,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            "between" => Operator::Between,
            "not between" => Operator::NotBetween,
            "is null" => Operator::IsNull,
            "is not null" => Operator::IsNotNull,
            other => return Err(FilterError::InvalidOperator(other.to_string())),
        };
        Ok(op)
    }

    /// Lower-case textual form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Between => "between",
            Operator::NotBetween => "not between",
            Operator::IsNull => "is null",
            Operator::IsNotNull => "is not null",
        }
    }

    /// SQL keyword form (`NOT LIKE`, `>=`, ...).
    pub fn sql(&self) -> &'static str {
        match self {
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Between => "BETWEEN",
            Operator::NotBetween => "NOT BETWEEN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            other => other.as_str(),
        }
    }

    /// `is null` / `is not null` take no value.
    pub fn is_null_check(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

impl FromStr for Operator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::parse(s)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a node attaches to the siblings before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Relation {
    #[default]
    And,
    Or,
}

impl Relation {
    /// Parse a relation, ignoring ASCII case.
    pub fn parse(s: &str) -> FilterResult<Self> {
        match s.to_lowercase().as_str() {
            "and" => Ok(Relation::And),
            "or" => Ok(Relation::Or),
            other => Err(FilterError::InvalidRelation(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::And => "and",
            Relation::Or => "or",
        }
    }

    pub fn is_or(&self) -> bool {
        matches!(self, Relation::Or)
    }
}

impl FromStr for Relation {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relation::parse(s)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_accepts_every_form_case_insensitively() {
        for op in Operator::ALL {
            assert_eq!(Operator::parse(op.as_str()).unwrap(), op);
            assert_eq!(Operator::parse(&op.as_str().to_uppercase()).unwrap(), op);
        }
        assert_eq!("Not Between".parse::<Operator>().unwrap(), Operator::NotBetween);
    }

    #[test]
    fn operator_normalizes_to_lower_case() {
        let op = Operator::parse("IS NOT NULL").unwrap();
        assert_eq!(op.to_string(), "is not null");
        assert_eq!(op.sql(), "IS NOT NULL");
    }

    #[test]
    fn operator_rejects_unknown() {
        for bad in ["==", "<>", "ilike", "contains", "", " =", "notlike"] {
            let err = Operator::parse(bad).unwrap_err();
            assert!(err.is_invalid_operator(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn relation_parsing() {
        assert_eq!(Relation::parse("AND").unwrap(), Relation::And);
        assert_eq!(Relation::parse("oR").unwrap(), Relation::Or);
        for bad in ["xor", "", "&&", "and "] {
            assert!(Relation::parse(bad).unwrap_err().is_invalid_relation());
        }
    }

    #[test]
    fn null_checks() {
        let null_checks: Vec<_> = Operator::ALL
            .into_iter()
            .filter(Operator::is_null_check)
            .collect();
        assert_eq!(null_checks, vec![Operator::IsNull, Operator::IsNotNull]);
    }
}
