//! Declarative filter descriptors.
//!
//! A filter is an ordered list of items, each explicitly tagged as a leaf or a
//! group:
//!
//! ```json
//! [
//!   {"kind": "leaf", "field": "entry_status_id", "value": 1},
//!   {"kind": "group", "relation": "or", "items": [
//!     {"kind": "leaf", "field": "title", "operator": "like", "value": "%rust%"},
//!     {"kind": "leaf", "field": "subtitle", "operator": "like", "value": "%rust%"}
//!   ]}
//! ]
//! ```
//!
//! Keys other than `kind` are optional here; missing `field`/`value` is
//! reported by [`crate::WhereClause::create_nested_entry_data`] so callers get
//! the same error whether the filter came from JSON or from code.

use crate::error::FilterResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One filter descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", deny_unknown_fields)]
pub enum FilterItem {
    /// A single `field <operator> value` test.
    Leaf {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        operator: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relation: Option<String>,
    },
    /// A parenthesized sub-filter.
    Group {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relation: Option<String>,
        #[serde(default)]
        items: Vec<FilterItem>,
    },
}

impl FilterItem {
    /// Leaf with the default `=` operator and `and` relation.
    pub fn leaf(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterItem::Leaf {
            field: Some(field.into()),
            operator: None,
            value: Some(value.into()),
            relation: None,
        }
    }

    /// Group with the default `and` relation.
    pub fn group(items: Vec<FilterItem>) -> Self {
        FilterItem::Group {
            relation: None,
            items,
        }
    }

    /// Set the operator. No effect on groups.
    pub fn operator(mut self, op: impl Into<String>) -> Self {
        if let FilterItem::Leaf { operator, .. } = &mut self {
            *operator = Some(op.into());
        }
        self
    }

    /// Set the relation to the preceding sibling.
    pub fn relation(mut self, rel: impl Into<String>) -> Self {
        match &mut self {
            FilterItem::Leaf { relation, .. } | FilterItem::Group { relation, .. } => {
                *relation = Some(rel.into());
            }
        }
        self
    }

    pub fn is_group(&self) -> bool {
        matches!(self, FilterItem::Group { .. })
    }
}

/// Decode a JSON array of filter items.
pub fn parse_items(json: &str) -> FilterResult<Vec<FilterItem>> {
    Ok(serde_json::from_str(json)?)
}

/// Decode filter items from an already-parsed JSON value.
pub fn items_from_value(value: Value) -> FilterResult<Vec<FilterItem>> {
    Ok(serde_json::from_value(value)?)
}
