use std::str::FromStr;

use async_trait::async_trait;
use cpg_core::errors::ExecError;
use cpg_core::executor::QueryExecutor;
use cpg_core::query::{QueryResult, QuerySpec};
use rust_decimal::Decimal;
use tracing::debug;

use crate::render::render;
use crate::DbPool;

/// [`QueryExecutor`] over the SQLite reporting view.
pub struct SqlQueryExecutor {
    pool: DbPool,
}

impl SqlQueryExecutor {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for SqlQueryExecutor {
    async fn execute(&self, spec: &QuerySpec) -> Result<QueryResult, ExecError> {
        let rendered = render(spec);
        debug!(
            event_name = "db.query.execute",
            metric = ?spec.metric,
            sql = %rendered.sql,
            bind_count = rendered.binds.len(),
            "executing report query"
        );

        let mut query = sqlx::query_scalar::<_, Option<String>>(&rendered.sql);
        for value in &rendered.binds {
            query = query.bind(value);
        }

        let value = query.fetch_optional(&self.pool).await.map_err(exec_error)?.flatten();

        match value {
            None => Ok(QueryResult::no_data()),
            Some(text) => Ok(QueryResult::value(spec.metric, parse_decimal(&text)?)),
        }
    }
}

/// SQLite prints large reals in exponent form, which `from_str` rejects.
fn parse_decimal(text: &str) -> Result<Decimal, ExecError> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|error| ExecError::Query(format!("invalid decimal aggregate `{text}`: {error}")))
}

/// Connectivity problems are `Unavailable`; anything the database rejected is `Query`.
fn exec_error(error: sqlx::Error) -> ExecError {
    match &error {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::WorkerCrashed => ExecError::Unavailable(error.to_string()),
        _ => ExecError::Query(error.to_string()),
    }
}
