//! # entry-filter
//!
//! Declarative entry filters compiled into nested WHERE predicates.
//!
//! ## Features
//!
//! - **Tagged input**: filters are lists of `leaf` / `group` items (JSON via serde)
//! - **Predicate tree**: [`WhereClause`] nodes with per-node `and` / `or` relations
//! - **Field resolution**: known entry columns map directly, custom fields map to
//!   a tag/value pair on the attribute (EAV) table
//! - **Pluggable output**: trees compile into any [`QueryPredicateSink`]; the
//!   [`qb`] module ships a PostgreSQL implementation
//!
//! ## Example
//!
//! ```ignore
//! use entry_filter::{WhereClause, parse_items, qb::ExprSink};
//!
//! let items = parse_items(r#"[
//!     {"kind": "leaf", "field": "title", "operator": "like", "value": "%rust%"},
//!     {"kind": "leaf", "field": "color", "value": "red", "relation": "or"}
//! ]"#)?;
//!
//! let filter = WhereClause::from_items(&items)?;
//! let (sql, params) = ExprSink::compile(&filter)?.to_sql();
//! // entries.title LIKE $1 OR EXISTS (SELECT 1 FROM entry_data
//! //     WHERE entry_data.entry_id = entries.id
//! //     AND entry_data.content_type_field_short_tag = $2 AND entry_data.data = $3)
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod ident;
pub mod item;
pub mod operator;
pub mod qb;
pub mod sink;
pub mod where_clause;

pub use client::GenericClient;
pub use config::{AttributeSchema, EntitySchema, FilterConfig};
pub use error::{FilterError, FilterResult};
pub use ident::Ident;
pub use item::{FilterItem, items_from_value, parse_items};
pub use operator::{Operator, Relation};
pub use sink::QueryPredicateSink;
pub use where_clause::{ColumnResolver, EntryColumnResolver, WhereClause};
