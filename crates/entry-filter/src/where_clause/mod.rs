//! Recursive predicate tree for entry filters.
//!
//! A [`WhereClause`] is either a leaf (`column <operator> value`) or a group
//! whose children form one parenthesized sub-expression. Each node's
//! [`Relation`] says how it attaches to the sibling before it; a group's
//! relation applies to the group as a whole.
//!
//! ```ignore
//! use entry_filter::{FilterItem, WhereClause, qb::ExprSink};
//!
//! let filter = WhereClause::from_items(&[
//!     FilterItem::leaf("entry_status_id", 1),
//!     FilterItem::group(vec![
//!         FilterItem::leaf("title", "A"),
//!         FilterItem::leaf("title", "B").relation("or"),
//!     ]),
//! ])?;
//!
//! let (sql, params) = ExprSink::compile(&filter)?.to_sql();
//! // entries.entry_status_id = $1 AND (entries.title = $2 OR entries.title = $3)
//! ```

mod resolve;

pub use resolve::{ColumnResolver, EntryColumnResolver};

use crate::error::{FilterError, FilterResult};
use crate::item::FilterItem;
use crate::operator::{Operator, Relation};
use crate::sink::QueryPredicateSink;
use serde_json::Value;

/// A node of the predicate tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WhereClause {
    column: Option<String>,
    operator: Operator,
    value: Value,
    relation: Relation,
    nested: Vec<WhereClause>,
}

impl WhereClause {
    /// Create a node from textual operator and relation.
    ///
    /// Both are matched case-insensitively; anything outside the supported
    /// sets fails with [`FilterError::InvalidOperator`] /
    /// [`FilterError::InvalidRelation`].
    pub fn new(
        column: Option<String>,
        operator: &str,
        value: Value,
        relation: &str,
    ) -> FilterResult<Self> {
        Ok(Self {
            column,
            operator: Operator::parse(operator)?,
            value,
            relation: Relation::parse(relation)?,
            nested: Vec::new(),
        })
    }

    /// Leaf with the `and` relation.
    pub fn leaf(column: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            column: Some(column.into()),
            operator,
            value,
            ..Self::default()
        }
    }

    /// Group node over `children`.
    pub fn group(relation: Relation, children: Vec<WhereClause>) -> Self {
        Self {
            relation,
            nested: children,
            ..Self::default()
        }
    }

    /// Root group resolved from filter items with the default entry schema.
    pub fn from_items(items: &[FilterItem]) -> FilterResult<Self> {
        Self::from_items_with(items, &EntryColumnResolver::default())
    }

    /// Root group resolved from filter items with a custom resolver.
    pub fn from_items_with<R>(items: &[FilterItem], resolver: &R) -> FilterResult<Self>
    where
        R: ColumnResolver + ?Sized,
    {
        let mut root = Self::default();
        root.create_nested_entry_data_with(items, resolver)?;
        Ok(root)
    }

    // ==================== Accessors ====================

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn nested(&self) -> &[WhereClause] {
        &self.nested
    }

    pub fn is_group(&self) -> bool {
        !self.nested.is_empty()
    }

    /// Whether any leaf in this subtree targets a column of `table`.
    pub fn references_table(&self, table: &str) -> bool {
        let targets = self.column.as_deref().is_some_and(|column| {
            column
                .strip_prefix(table)
                .is_some_and(|rest| rest.starts_with('.'))
        });
        targets || self.nested.iter().any(|child| child.references_table(table))
    }

    // ==================== Setters ====================

    pub fn set_column(&mut self, column: Option<String>) -> &mut Self {
        self.column = column;
        self
    }

    /// Replace the value. Its shape is checked by the sink, not here.
    pub fn set_value(&mut self, value: Value) -> &mut Self {
        self.value = value;
        self
    }

    pub fn set_operator(&mut self, operator: &str) -> FilterResult<&mut Self> {
        self.operator = Operator::parse(operator)?;
        Ok(self)
    }

    pub fn set_relation(&mut self, relation: &str) -> FilterResult<&mut Self> {
        self.relation = Relation::parse(relation)?;
        Ok(self)
    }

    // ==================== Compilation ====================

    /// Emit this node onto `query`.
    ///
    /// Groups delegate to [`WhereClause::build_nested`]. Leaves call the sink
    /// primitive matching their operator, in its `or_` form when the relation
    /// is `or`. A node with neither column nor children emits nothing.
    ///
    /// Not idempotent: building twice appends the predicate twice.
    pub fn build<Q: QueryPredicateSink>(&self, query: &mut Q) {
        if self.is_group() {
            self.build_nested(query);
            return;
        }
        let Some(column) = self.column.as_deref() else {
            return;
        };

        let or = self.relation.is_or();
        let value = &self.value;
        match self.operator {
            op @ (Operator::Eq
            | Operator::Ne
            | Operator::Gt
            | Operator::Gte
            | Operator::Lt
            | Operator::Lte
            | Operator::Like
            | Operator::NotLike) => {
                if or {
                    query.or_where_compare(column, op, value);
                } else {
                    query.where_compare(column, op, value);
                }
            }
            Operator::In => {
                if or {
                    query.or_where_in(column, value);
                } else {
                    query.where_in(column, value);
                }
            }
            Operator::NotIn => {
                if or {
                    query.or_where_not_in(column, value);
                } else {
                    query.where_not_in(column, value);
                }
            }
            Operator::Between => {
                if or {
                    query.or_where_between(column, value);
                } else {
                    query.where_between(column, value);
                }
            }
            Operator::NotBetween => {
                if or {
                    query.or_where_not_between(column, value);
                } else {
                    query.where_not_between(column, value);
                }
            }
            Operator::IsNull => {
                if or {
                    query.or_where_null(column);
                } else {
                    query.where_null(column);
                }
            }
            Operator::IsNotNull => {
                if or {
                    query.or_where_not_null(column);
                } else {
                    query.where_not_null(column);
                }
            }
        }
    }

    /// Open a grouped scope on `query` (OR-attached when this node's relation
    /// is `or`) and build every child into it, in order.
    pub fn build_nested<Q: QueryPredicateSink>(&self, query: &mut Q) {
        let children = &self.nested;
        let build = |scope: &mut Q| {
            for child in children {
                child.build(scope);
            }
        };
        if self.relation.is_or() {
            query.or_where_nested(build);
        } else {
            query.where_nested(build);
        }
    }

    // ==================== Field resolution ====================

    /// Resolve `items` with the default entry schema and append them as
    /// children of this node.
    pub fn create_nested_entry_data(&mut self, items: &[FilterItem]) -> FilterResult<()> {
        self.create_nested_entry_data_with(items, &EntryColumnResolver::default())
    }

    /// Resolve `items` with `resolver` and append them as children.
    ///
    /// Every item becomes one child group: a group item recurses, a leaf item
    /// holds the predicates its field resolved to. On error nothing is
    /// appended.
    pub fn create_nested_entry_data_with<R>(
        &mut self,
        items: &[FilterItem],
        resolver: &R,
    ) -> FilterResult<()>
    where
        R: ColumnResolver + ?Sized,
    {
        let children = resolve_items(items, resolver)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "entry_filter",
            items = items.len(),
            children = children.len(),
            "resolved entry filter items"
        );
        self.nested.extend(children);
        Ok(())
    }
}

fn resolve_items<R>(items: &[FilterItem], resolver: &R) -> FilterResult<Vec<WhereClause>>
where
    R: ColumnResolver + ?Sized,
{
    items.iter().map(|item| resolve_item(item, resolver)).collect()
}

fn resolve_item<R>(item: &FilterItem, resolver: &R) -> FilterResult<WhereClause>
where
    R: ColumnResolver + ?Sized,
{
    match item {
        FilterItem::Group { relation, items } => {
            let relation = parse_relation(relation.as_deref())?;
            Ok(WhereClause::group(relation, resolve_items(items, resolver)?))
        }
        FilterItem::Leaf {
            field,
            operator,
            value,
            relation,
        } => {
            let relation = parse_relation(relation.as_deref())?;
            let field = field
                .as_deref()
                .ok_or(FilterError::MissingFilterField("field"))?;
            // Field and value are checked before the operator; only a valid
            // null check may leave the value out.
            let value = match value {
                Some(v) if !v.is_null() => v.clone(),
                _ if operator
                    .as_deref()
                    .and_then(|op| Operator::parse(op).ok())
                    .is_some_and(|op| op.is_null_check()) =>
                {
                    Value::Null
                }
                _ => return Err(FilterError::MissingFilterField("value")),
            };
            let op = match operator.as_deref() {
                Some(op) => Operator::parse(op)?,
                None => Operator::Eq,
            };
            Ok(WhereClause::group(relation, resolver.resolve(field, op, value)))
        }
    }
}

fn parse_relation(relation: Option<&str>) -> FilterResult<Relation> {
    relation.map_or(Ok(Relation::And), Relation::parse)
}
