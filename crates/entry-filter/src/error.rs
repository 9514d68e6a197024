//! Error types for entry-filter

use thiserror::Error;

/// Result type alias for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

/// Error types for building and compiling entry filters
#[derive(Debug, Error)]
pub enum FilterError {
    /// Operator outside the supported set
    #[error("The value {0} is not a valid operator.")]
    InvalidOperator(String),

    /// Relation other than `and` / `or`
    #[error("The value {0} is not a valid relation.")]
    InvalidRelation(String),

    /// Leaf descriptor without a `field` or `value`
    #[error("The where clause must contain both field and value properties (missing `{0}`).")]
    MissingFilterField(&'static str),

    /// Value shape does not fit the operator (e.g. `in` without an array)
    #[error("Invalid value for operator '{operator}': {message}")]
    InvalidValue {
        operator: &'static str,
        message: String,
    },

    /// Identifier / configuration validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filter or config decode error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration file could not be read
    #[error("Config error: {0}")]
    Config(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl FilterError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an invalid value error for an operator
    pub fn invalid_value(operator: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            operator,
            message: message.into(),
        }
    }

    /// Check if this is an invalid operator error
    pub fn is_invalid_operator(&self) -> bool {
        matches!(self, Self::InvalidOperator(_))
    }

    /// Check if this is an invalid relation error
    pub fn is_invalid_relation(&self) -> bool {
        matches!(self, Self::InvalidRelation(_))
    }

    /// Check if this is a missing field/value error
    pub fn is_missing_field(&self) -> bool {
        matches!(self, Self::MissingFilterField(_))
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for FilterError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for FilterError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
