use sqlx::{postgres::PgArguments, postgres::PgRow, FromRow, PgPool, Postgres};

use crate::database::manager::DatabaseError;
use crate::filter::types::{FilterParam, SqlResult};

/// Run a rendered filter query and map every row
pub async fn select_all<T>(sql_result: &SqlResult, pool: &PgPool) -> Result<Vec<T>, DatabaseError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut q = sqlx::query_as::<_, T>(&sql_result.query);
    for p in sql_result.params.iter() {
        q = bind_param_query_as(q, p);
    }
    Ok(q.fetch_all(pool).await?)
}

/// Run a rendered `SELECT COUNT(*) AS count` query
pub async fn count(sql_result: &SqlResult, pool: &PgPool) -> Result<i64, DatabaseError> {
    let mut q = sqlx::query_scalar::<_, i64>(&sql_result.query);
    for p in sql_result.params.iter() {
        q = bind_param_query_scalar(q, p);
    }
    Ok(q.fetch_one(pool).await?)
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    v: &FilterParam,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        FilterParam::Int(i) => q.bind(*i),
        FilterParam::BigInt(i) => q.bind(*i),
        FilterParam::Text(s) => q.bind(s.clone()),
        FilterParam::Bool(b) => q.bind(*b),
        FilterParam::Timestamp(t) => q.bind(*t),
    }
}

fn bind_param_query_scalar<'q, O>(
    q: sqlx::query::QueryScalar<'q, Postgres, O, PgArguments>,
    v: &FilterParam,
) -> sqlx::query::QueryScalar<'q, Postgres, O, PgArguments> {
    match v {
        FilterParam::Int(i) => q.bind(*i),
        FilterParam::BigInt(i) => q.bind(*i),
        FilterParam::Text(s) => q.bind(s.clone()),
        FilterParam::Bool(b) => q.bind(*b),
        FilterParam::Timestamp(t) => q.bind(*t),
    }
}
