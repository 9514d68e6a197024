//! Logical field → physical column resolution.

use super::WhereClause;
use crate::config::FilterConfig;
use crate::operator::Operator;
use serde_json::Value;

/// Maps one logical `field <op> value` test onto the leaf predicates that
/// implement it. The returned leaves are AND-ed inside their own group.
pub trait ColumnResolver {
    fn resolve(&self, field: &str, op: Operator, value: Value) -> Vec<WhereClause>;
}

/// Default policy: allow-listed fields hit the entity table directly, any
/// other field is a custom field stored in the attribute table.
#[derive(Debug, Clone, Default)]
pub struct EntryColumnResolver {
    config: FilterConfig,
}

impl EntryColumnResolver {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }
}

impl ColumnResolver for EntryColumnResolver {
    fn resolve(&self, field: &str, op: Operator, value: Value) -> Vec<WhereClause> {
        let entity = &self.config.entity;
        if entity.has_column(field) {
            return vec![WhereClause::leaf(entity.column(field), op, value)];
        }

        let attrs = &self.config.attributes;
        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "entry_filter",
            field,
            operator = %op,
            table = %attrs.table,
            "resolving custom field through attribute table"
        );
        vec![
            WhereClause::leaf(attrs.tag(), Operator::Eq, Value::String(field.to_string())),
            WhereClause::leaf(attrs.value(), op, value),
        ]
    }
}

impl<R: ColumnResolver + ?Sized> ColumnResolver for &R {
    fn resolve(&self, field: &str, op: Operator, value: Value) -> Vec<WhereClause> {
        (**self).resolve(field, op, value)
    }
}
