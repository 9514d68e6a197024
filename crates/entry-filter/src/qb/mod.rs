//! PostgreSQL adapter for compiled filters.
//!
//! [`ExprSink`] receives the calls a [`WhereClause`](crate::WhereClause) emits
//! and folds them into an [`Expr`] tree; [`EntrySelect`] wraps that tree in a
//! `SELECT` over the entity table. Custom-field tests become correlated
//! `EXISTS` subqueries on the attribute table.
//!
//! ```ignore
//! use entry_filter::{FilterItem, WhereClause, qb::EntrySelect};
//!
//! let filter = WhereClause::from_items(&[
//!     FilterItem::leaf("author_id", 7),
//!     FilterItem::leaf("color", "red").relation("or"),
//! ])?;
//!
//! let rows = EntrySelect::new()
//!     .filter(filter)
//!     .limit(20)
//!     .fetch_all(&client)
//!     .await?;
//! ```

mod expr;
mod param;
mod select;
mod sink;

pub use expr::Expr;
pub use param::{Param, ParamList};
pub use select::{BuiltQuery, EntrySelect};
pub use sink::ExprSink;

#[cfg(test)]
mod tests;
