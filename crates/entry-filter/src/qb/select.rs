//! SELECT over the entity table, filtered by one or more [`WhereClause`] trees.

use crate::client::GenericClient;
use crate::config::FilterConfig;
use crate::error::FilterResult;
use crate::ident::Ident;
use crate::qb::expr::Expr;
use crate::qb::param::ParamList;
use crate::qb::sink::ExprSink;
use crate::where_clause::WhereClause;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Entry query builder.
///
/// Custom-field tests reach the attribute table through correlated `EXISTS`
/// subqueries, so the entity table is never joined and each entry is
/// returned at most once.
#[derive(Clone, Debug, Default)]
pub struct EntrySelect {
    config: FilterConfig,
    /// SELECT columns (default `<entity>.*`), validated as identifiers
    select_cols: Vec<String>,
    /// Filters, built in order into one WHERE scope
    filters: Vec<WhereClause>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// Rendered SQL with its parameters.
#[derive(Clone, Debug)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: ParamList,
}

impl BuiltQuery {
    /// Get parameter references for tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.as_refs()
    }
}

impl EntrySelect {
    /// Select over the default entry schema.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FilterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set SELECT columns. Each must be a possibly qualified identifier;
    /// `build` fails with [`FilterError::Validation`](crate::FilterError) otherwise.
    pub fn select_cols(mut self, cols: &[&str]) -> Self {
        self.select_cols = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add a filter. Its relation decides how it attaches to earlier filters.
    pub fn filter(mut self, filter: WhereClause) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Render `SELECT ... WHERE ...` with LIMIT/OFFSET.
    pub fn build(&self) -> FilterResult<BuiltQuery> {
        let cols = if self.select_cols.is_empty() {
            format!("{}.*", self.config.entity.table)
        } else {
            self.select_cols
                .iter()
                .map(|col| Ident::parse(col).map(|ident| ident.to_sql()))
                .collect::<FilterResult<Vec<_>>>()?
                .join(", ")
        };
        let mut built = self.render(&format!("SELECT {cols}"))?;

        if let Some(limit) = self.limit {
            built.sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            built.sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(built)
    }

    /// Render the matching-entry count, ignoring LIMIT/OFFSET.
    pub fn build_count(&self) -> FilterResult<BuiltQuery> {
        self.render("SELECT COUNT(*)")
    }

    /// Execute and return all matching rows.
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> FilterResult<Vec<Row>> {
        let built = self.build()?;
        conn.query(&built.sql, &built.params_ref()).await
    }

    /// Execute the count query.
    pub async fn count(&self, conn: &impl GenericClient) -> FilterResult<i64> {
        let built = self.build_count()?;
        let row = conn.query_one(&built.sql, &built.params_ref()).await?;
        Ok(row.try_get::<_, i64>(0)?)
    }

    fn where_expr(&self) -> FilterResult<Expr> {
        let mut sink = ExprSink::with_config(&self.config);
        for filter in &self.filters {
            filter.build(&mut sink);
        }
        sink.finish()
    }

    fn render(&self, head: &str) -> FilterResult<BuiltQuery> {
        self.config.validate()?;
        let mut sql = format!("{head} FROM {}", self.config.entity.table);

        let (where_sql, params) = self.where_expr()?.to_sql();
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "entry_filter",
            filters = self.filters.len(),
            param_count = params.len(),
            sql = %sql,
            "compiled entry query"
        );

        Ok(BuiltQuery { sql, params })
    }
}
