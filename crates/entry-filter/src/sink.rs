//! The query-builder capability a [`WhereClause`](crate::WhereClause) compiles into.
//!
//! Every primitive comes in an `and` form and an `or_` form. The `or_` form
//! attaches the predicate to the preceding one with OR; the first predicate
//! of a scope ignores its connective. Values are passed through untouched;
//! checking that e.g. `in` received an array is the implementor's job.

use crate::operator::Operator;
use serde_json::Value;

/// Receiver of compiled predicates.
///
/// See [`crate::qb::ExprSink`] for the PostgreSQL implementation.
pub trait QueryPredicateSink {
    /// `column <op> value` for `=, !=, >, >=, <, <=, like, not like`.
    fn where_compare(&mut self, column: &str, op: Operator, value: &Value);
    fn or_where_compare(&mut self, column: &str, op: Operator, value: &Value);

    /// `column IN (values...)`
    fn where_in(&mut self, column: &str, values: &Value);
    fn or_where_in(&mut self, column: &str, values: &Value);

    /// `column NOT IN (values...)`
    fn where_not_in(&mut self, column: &str, values: &Value);
    fn or_where_not_in(&mut self, column: &str, values: &Value);

    /// `column BETWEEN a AND b`
    fn where_between(&mut self, column: &str, range: &Value);
    fn or_where_between(&mut self, column: &str, range: &Value);

    /// `column NOT BETWEEN a AND b`
    fn where_not_between(&mut self, column: &str, range: &Value);
    fn or_where_not_between(&mut self, column: &str, range: &Value);

    /// `column IS NULL`
    fn where_null(&mut self, column: &str);
    fn or_where_null(&mut self, column: &str);

    /// `column IS NOT NULL`
    fn where_not_null(&mut self, column: &str);
    fn or_where_not_null(&mut self, column: &str);

    /// Open a parenthesized scope; everything `build` adds lands inside it.
    fn where_nested<F>(&mut self, build: F)
    where
        F: FnOnce(&mut Self);

    fn or_where_nested<F>(&mut self, build: F)
    where
        F: FnOnce(&mut Self);
}
