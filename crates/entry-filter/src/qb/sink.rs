//! [`QueryPredicateSink`] implementation producing an [`Expr`].

use crate::config::FilterConfig;
use crate::error::{FilterError, FilterResult};
use crate::ident::Ident;
use crate::operator::{Operator, Relation};
use crate::qb::expr::Expr;
use crate::sink::QueryPredicateSink;
use crate::where_clause::WhereClause;
use serde_json::Value;

/// How tests on the attribute table are tied back to the entity row.
#[derive(Debug, Clone)]
struct Correlation {
    table: String,
    condition: String,
}

impl Correlation {
    fn new(config: &FilterConfig) -> Self {
        let entity = &config.entity;
        let attrs = &config.attributes;
        Self {
            table: attrs.table.clone(),
            condition: format!(
                "{}.{} = {}.{}",
                attrs.table, attrs.entity_key, entity.table, entity.key
            ),
        }
    }
}

/// Collects sink calls for one scope and folds them into an [`Expr`].
///
/// Columns are validated as SQL identifiers and values are checked against
/// their operator (`in` needs an array, `between` a `[from, to]` pair). The
/// first problem is kept and reported by [`ExprSink::finish`]; later calls
/// are ignored once a problem has been recorded.
///
/// When a scope is closed, the tests it holds on the attribute table are
/// wrapped in a correlated `EXISTS` (see [`Expr::correlate`]). A custom
/// field's tag/value pair therefore has to match one attribute row, and two
/// custom fields may match two different rows of the same entry.
#[derive(Debug)]
pub struct ExprSink {
    chain: Vec<(Relation, Expr)>,
    build_error: Option<FilterError>,
    correlation: Correlation,
}

impl Default for ExprSink {
    fn default() -> Self {
        Self::with_config(&FilterConfig::default())
    }
}

impl ExprSink {
    /// Sink for the default entry schema.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &FilterConfig) -> Self {
        Self {
            chain: Vec::new(),
            build_error: None,
            correlation: Correlation::new(config),
        }
    }

    /// Build `filter` into a fresh sink and finish it.
    pub fn compile(filter: &WhereClause) -> FilterResult<Expr> {
        Self::compile_with(filter, &FilterConfig::default())
    }

    /// Like [`ExprSink::compile`], for a configured schema.
    pub fn compile_with(filter: &WhereClause, config: &FilterConfig) -> FilterResult<Expr> {
        let mut sink = Self::with_config(config);
        filter.build(&mut sink);
        sink.finish()
    }

    /// Whether nothing has been added yet.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// The collected expression, or the first recorded problem.
    ///
    /// An empty sink yields an empty `Expr::And`, which renders as `""`.
    pub fn finish(mut self) -> FilterResult<Expr> {
        if let Some(err) = self.build_error.take() {
            return Err(err);
        }
        let chain = std::mem::take(&mut self.chain);
        Ok(self.fold(chain).unwrap_or(Expr::And(Vec::new())))
    }

    fn fold(&self, chain: Vec<(Relation, Expr)>) -> Option<Expr> {
        let Correlation { table, condition } = &self.correlation;
        Expr::from_chain(chain).map(|expr| expr.correlate(table, condition))
    }

    fn fail(&mut self, err: FilterError) {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }

    fn push<F>(&mut self, relation: Relation, column: &str, make: F)
    where
        F: FnOnce(String) -> FilterResult<Expr>,
    {
        if self.build_error.is_some() {
            return;
        }
        match Ident::parse(column).and_then(|ident| make(ident.to_sql())) {
            Ok(expr) => self.chain.push((relation, expr)),
            Err(err) => self.fail(err),
        }
    }

    fn compare(&mut self, relation: Relation, column: &str, op: Operator, value: &Value) {
        self.push(relation, column, |column| match op {
            Operator::Eq
            | Operator::Ne
            | Operator::Gt
            | Operator::Gte
            | Operator::Lt
            | Operator::Lte
            | Operator::Like
            | Operator::NotLike => Ok(Expr::Compare {
                column,
                op,
                value: value.clone(),
            }),
            other => Err(FilterError::invalid_value(
                other.as_str(),
                "not a comparison operator",
            )),
        });
    }

    fn list(&mut self, relation: Relation, column: &str, values: &Value, negated: bool) {
        let op = if negated { Operator::NotIn } else { Operator::In };
        self.push(relation, column, |column| {
            let values = values
                .as_array()
                .ok_or_else(|| FilterError::invalid_value(op.as_str(), "expected an array"))?
                .clone();
            Ok(if negated {
                Expr::not_in(column, values)
            } else {
                Expr::in_list(column, values)
            })
        });
    }

    fn range(&mut self, relation: Relation, column: &str, range: &Value, negated: bool) {
        let op = if negated {
            Operator::NotBetween
        } else {
            Operator::Between
        };
        self.push(relation, column, |column| match range.as_array().map(Vec::as_slice) {
            Some([from, to]) => Ok(Expr::Between {
                column,
                from: from.clone(),
                to: to.clone(),
                negated,
            }),
            _ => Err(FilterError::invalid_value(
                op.as_str(),
                "expected a [from, to] pair",
            )),
        });
    }

    fn null_check(&mut self, relation: Relation, column: &str, is_null: bool) {
        self.push(relation, column, |column| {
            Ok(Expr::NullCheck { column, is_null })
        });
    }

    fn scope<F>(&mut self, relation: Relation, build: F)
    where
        F: FnOnce(&mut Self),
    {
        if self.build_error.is_some() {
            return;
        }
        let mut inner = Self {
            chain: Vec::new(),
            build_error: None,
            correlation: self.correlation.clone(),
        };
        build(&mut inner);
        if let Some(err) = inner.build_error {
            self.fail(err);
            return;
        }
        if let Some(expr) = self.fold(inner.chain) {
            self.chain.push((relation, expr));
        }
    }
}

impl QueryPredicateSink for ExprSink {
    fn where_compare(&mut self, column: &str, op: Operator, value: &Value) {
        self.compare(Relation::And, column, op, value);
    }

    fn or_where_compare(&mut self, column: &str, op: Operator, value: &Value) {
        self.compare(Relation::Or, column, op, value);
    }

    fn where_in(&mut self, column: &str, values: &Value) {
        self.list(Relation::And, column, values, false);
    }

    fn or_where_in(&mut self, column: &str, values: &Value) {
        self.list(Relation::Or, column, values, false);
    }

    fn where_not_in(&mut self, column: &str, values: &Value) {
        self.list(Relation::And, column, values, true);
    }

    fn or_where_not_in(&mut self, column: &str, values: &Value) {
        self.list(Relation::Or, column, values, true);
    }

    fn where_between(&mut self, column: &str, range: &Value) {
        self.range(Relation::And, column, range, false);
    }

    fn or_where_between(&mut self, column: &str, range: &Value) {
        self.range(Relation::Or, column, range, false);
    }

    fn where_not_between(&mut self, column: &str, range: &Value) {
        self.range(Relation::And, column, range, true);
    }

    fn or_where_not_between(&mut self, column: &str, range: &Value) {
        self.range(Relation::Or, column, range, true);
    }

    fn where_null(&mut self, column: &str) {
        self.null_check(Relation::And, column, true);
    }

    fn or_where_null(&mut self, column: &str) {
        self.null_check(Relation::Or, column, true);
    }

    fn where_not_null(&mut self, column: &str) {
        self.null_check(Relation::And, column, false);
    }

    fn or_where_not_null(&mut self, column: &str) {
        self.null_check(Relation::Or, column, false);
    }

    fn where_nested<F>(&mut self, build: F)
    where
        F: FnOnce(&mut Self),
    {
        self.scope(Relation::And, build);
    }

    fn or_where_nested<F>(&mut self, build: F)
    where
        F: FnOnce(&mut Self),
    {
        self.scope(Relation::Or, build);
    }
}
