//! Boolean expression tree rendered as a parameterized WHERE fragment.
//!
//! `Expr::build()` assigns `$n` placeholders in rendering order, so the SQL and
//! the [`ParamList`] always line up.

use crate::operator::{Operator, Relation};
use crate::qb::param::ParamList;
use serde_json::Value;

/// Expression node for a WHERE clause.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// All conditions must be true.
    And(Vec<Expr>),

    /// At least one condition must be true.
    Or(Vec<Expr>),

    /// column op $n (`=`, `!=`, `<`, `LIKE`, ...)
    Compare {
        column: String,
        op: Operator,
        value: Value,
    },

    /// column IS [NOT] NULL
    NullCheck { column: String, is_null: bool },

    /// column [NOT] IN ($1, $2, ...)
    InList {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },

    /// column [NOT] BETWEEN $n AND $m
    Between {
        column: String,
        from: Value,
        to: Value,
        negated: bool,
    },

    /// EXISTS (SELECT 1 FROM table WHERE correlation AND filter)
    Exists {
        table: String,
        correlation: String,
        filter: Box<Expr>,
    },

    /// Always true (empty NOT IN list).
    True,

    /// Always false (empty IN list).
    False,
}

impl Expr {
    /// `column IN (values)`; an empty list can never match.
    pub fn in_list(column: impl Into<String>, values: Vec<Value>) -> Self {
        if values.is_empty() {
            return Expr::False;
        }
        Expr::InList {
            column: column.into(),
            values,
            negated: false,
        }
    }

    /// `column NOT IN (values)`; an empty list always matches.
    pub fn not_in(column: impl Into<String>, values: Vec<Value>) -> Self {
        if values.is_empty() {
            return Expr::True;
        }
        Expr::InList {
            column: column.into(),
            values,
            negated: true,
        }
    }

    /// Fold a scope's `(relation, expr)` chain into a tree with SQL
    /// precedence: `a AND b OR c AND d` becomes `(a AND b) OR (c AND d)`.
    /// The first element's relation is ignored.
    pub fn from_chain(chain: Vec<(Relation, Expr)>) -> Option<Expr> {
        let mut runs: Vec<Vec<Expr>> = Vec::new();
        for (relation, expr) in chain {
            match runs.last_mut() {
                Some(run) if !relation.is_or() => run.push(expr),
                _ => runs.push(vec![expr]),
            }
        }
        let mut terms: Vec<Expr> = runs.into_iter().map(Expr::all).collect();
        match terms.len() {
            0 => None,
            1 => terms.pop(),
            _ => Some(Expr::Or(terms)),
        }
    }

    fn all(mut exprs: Vec<Expr>) -> Expr {
        if exprs.len() == 1 {
            exprs.remove(0)
        } else {
            Expr::And(exprs)
        }
    }

    /// Move the tests on `table` into correlated `EXISTS` subqueries.
    ///
    /// Every maximal AND-run that only tests columns of `table` becomes one
    /// `EXISTS (SELECT 1 FROM table WHERE correlation AND ...)`, so the tests
    /// in a run must hold on the same row of `table`, while separate runs may
    /// match different rows. Expressions not touching `table` are unchanged.
    pub fn correlate(self, table: &str, correlation: &str) -> Expr {
        match self.touches(table) {
            (false, _) => self,
            (true, false) => Expr::Exists {
                table: table.to_string(),
                correlation: correlation.to_string(),
                filter: Box::new(self),
            },
            (true, true) => match self {
                Expr::Or(exprs) => Expr::Or(
                    exprs
                        .into_iter()
                        .map(|e| e.correlate(table, correlation))
                        .collect(),
                ),
                Expr::And(exprs) => {
                    let mut out = Vec::with_capacity(exprs.len());
                    let mut run = Vec::new();
                    let mut slot = None;
                    for expr in exprs {
                        if expr.touches(table) == (true, false) {
                            slot.get_or_insert(out.len());
                            run.push(expr);
                        } else {
                            out.push(expr.correlate(table, correlation));
                        }
                    }
                    if let Some(at) = slot {
                        out.insert(at, Expr::all(run).correlate(table, correlation));
                    }
                    Expr::And(out)
                }
                other => other,
            },
        }
    }

    /// `(tests table, tests anything else)`. Constants test neither;
    /// an `EXISTS` counts as testing something else.
    fn touches(&self, table: &str) -> (bool, bool) {
        match self {
            Expr::And(exprs) | Expr::Or(exprs) => {
                exprs.iter().fold((false, false), |(on, off), e| {
                    let (e_on, e_off) = e.touches(table);
                    (on || e_on, off || e_off)
                })
            }
            Expr::Compare { column, .. }
            | Expr::NullCheck { column, .. }
            | Expr::InList { column, .. }
            | Expr::Between { column, .. } => {
                let on = column
                    .strip_prefix(table)
                    .is_some_and(|rest| rest.starts_with('.'));
                (on, !on)
            }
            Expr::Exists { .. } => (false, true),
            Expr::True | Expr::False => (false, false),
        }
    }

    /// Check if this expression contains no conditions.
    pub fn is_empty(&self) -> bool {
        match self {
            Expr::And(exprs) | Expr::Or(exprs) => exprs.iter().all(Expr::is_empty),
            _ => false,
        }
    }

    /// Render into a fresh parameter list.
    pub fn to_sql(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let sql = self.build(&mut params);
        (sql, params)
    }

    /// Build the SQL fragment, appending parameters to `params`.
    pub fn build(&self, params: &mut ParamList) -> String {
        match self {
            Expr::And(exprs) => join(exprs, " AND ", params, |e| matches!(e, Expr::Or(_))),
            Expr::Or(exprs) => join(exprs, " OR ", params, |e| matches!(e, Expr::And(_))),
            Expr::Compare { column, op, value } => {
                let idx = params.push_json(value);
                format!("{} {} ${}", column, op.sql(), idx)
            }
            Expr::NullCheck { column, is_null } => {
                if *is_null {
                    format!("{} IS NULL", column)
                } else {
                    format!("{} IS NOT NULL", column)
                }
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    return if *negated { "1=1".to_string() } else { "1=0".to_string() };
                }
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| format!("${}", params.push_json(v)))
                    .collect();
                let op = if *negated { "NOT IN" } else { "IN" };
                format!("{} {} ({})", column, op, placeholders.join(", "))
            }
            Expr::Between {
                column,
                from,
                to,
                negated,
            } => {
                let idx1 = params.push_json(from);
                let idx2 = params.push_json(to);
                let op = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                format!("{} {} ${} AND ${}", column, op, idx1, idx2)
            }
            Expr::Exists {
                table,
                correlation,
                filter,
            } => {
                let inner = filter.build(params);
                if inner.is_empty() {
                    format!("EXISTS (SELECT 1 FROM {table} WHERE {correlation})")
                } else if matches!(**filter, Expr::Or(_)) {
                    format!("EXISTS (SELECT 1 FROM {table} WHERE {correlation} AND ({inner}))")
                } else {
                    format!("EXISTS (SELECT 1 FROM {table} WHERE {correlation} AND {inner})")
                }
            }
            Expr::True => "1=1".to_string(),
            Expr::False => "1=0".to_string(),
        }
    }
}

/// Join non-empty children, parenthesizing those `needs_parens` selects.
fn join(
    exprs: &[Expr],
    sep: &str,
    params: &mut ParamList,
    needs_parens: impl Fn(&Expr) -> bool,
) -> String {
    exprs
        .iter()
        .filter(|e| !e.is_empty())
        .map(|e| {
            let sql = e.build(params);
            if needs_parens(e) {
                format!("({})", sql)
            } else {
                sql
            }
        })
        .collect::<Vec<_>>()
        .join(sep)
}
