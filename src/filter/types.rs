use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A bound query parameter. Values never get spliced into SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterParam {
    Int(i32),
    BigInt(i64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl From<i32> for FilterParam {
    fn from(v: i32) -> Self {
        FilterParam::Int(v)
    }
}

impl From<i64> for FilterParam {
    fn from(v: i64) -> Self {
        FilterParam::BigInt(v)
    }
}

impl From<bool> for FilterParam {
    fn from(v: bool) -> Self {
        FilterParam::Bool(v)
    }
}

impl From<String> for FilterParam {
    fn from(v: String) -> Self {
        FilterParam::Text(v)
    }
}

impl From<&str> for FilterParam {
    fn from(v: &str) -> Self {
        FilterParam::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for FilterParam {
    fn from(v: DateTime<Utc>) -> Self {
        FilterParam::Timestamp(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lt,
    ILike,
}

impl FilterOp {
    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::ILike => "ILIKE",
        }
    }
}

/// One `WHERE` term. Columns are compile-time identifiers, optionally alias-qualified (`t.status`).
#[derive(Debug, Clone)]
pub enum FilterWhereInfo {
    Compare {
        column: &'static str,
        operator: FilterOp,
        data: FilterParam,
    },
    Null {
        column: &'static str,
        is_null: bool,
    },
    /// `(a op $n OR b op $n)` sharing a single parameter
    AnyOf {
        columns: Vec<&'static str>,
        operator: FilterOp,
        data: FilterParam,
    },
    /// `(column = $n OR column IS NULL)`
    EqOrNull {
        column: &'static str,
        data: FilterParam,
    },
    /// `column IN (SELECT select FROM table WHERE key = $n)`
    InSubquery {
        column: &'static str,
        select: &'static str,
        table: &'static str,
        key: &'static str,
        data: FilterParam,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: &'static str,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FilterParam>,
}
