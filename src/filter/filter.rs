use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOp, FilterOrderInfo, FilterParam, FilterWhereInfo, SortDirection, SqlResult};

/// Builder for the dynamic part of a list query: `WHERE`, `ORDER BY`, `LIMIT/OFFSET`.
///
/// The caller supplies the `SELECT ... FROM ... JOIN ...` head; the filter only
/// appends clauses and collects bind parameters in placeholder order.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<FilterWhereInfo>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(self, column: &'static str, value: impl Into<FilterParam>) -> Self {
        self.compare(column, FilterOp::Eq, value.into())
    }

    /// `eq` when a value is present, no-op otherwise
    pub fn eq_opt<T: Into<FilterParam>>(self, column: &'static str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    pub fn gte(self, column: &'static str, value: impl Into<FilterParam>) -> Self {
        self.compare(column, FilterOp::Gte, value.into())
    }

    pub fn lt(self, column: &'static str, value: impl Into<FilterParam>) -> Self {
        self.compare(column, FilterOp::Lt, value.into())
    }

    pub fn is_null(mut self, column: &'static str) -> Self {
        self.conditions.push(FilterWhereInfo::Null { column, is_null: true });
        self
    }

    /// `column = value`, or rows where `column` is unset
    pub fn eq_or_null(mut self, column: &'static str, value: impl Into<FilterParam>) -> Self {
        self.conditions.push(FilterWhereInfo::EqOrNull { column, data: value.into() });
        self
    }

    /// Case-insensitive substring match over any of `columns`. Blank terms are ignored.
    pub fn search(mut self, columns: &[&'static str], term: Option<&str>) -> Self {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return self;
        };
        self.conditions.push(FilterWhereInfo::AnyOf {
            columns: columns.to_vec(),
            operator: FilterOp::ILike,
            data: FilterParam::Text(format!("%{}%", escape_like(term))),
        });
        self
    }

    /// Any of `columns` equals `value`
    pub fn any_eq(mut self, columns: &[&'static str], value: impl Into<FilterParam>) -> Self {
        self.conditions.push(FilterWhereInfo::AnyOf {
            columns: columns.to_vec(),
            operator: FilterOp::Eq,
            data: value.into(),
        });
        self
    }

    pub fn in_subquery(
        mut self,
        column: &'static str,
        select: &'static str,
        table: &'static str,
        key: &'static str,
        value: impl Into<FilterParam>,
    ) -> Self {
        self.conditions.push(FilterWhereInfo::InSubquery {
            column,
            select,
            table,
            key,
            data: value.into(),
        });
        self
    }

    pub fn order(mut self, column: &'static str, sort: SortDirection) -> Self {
        self.order_data.push(FilterOrderInfo { column, sort });
        self
    }

    pub fn limit(mut self, limit: i64, offset: Option<i64>) -> Result<Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
            }
        }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    /// `WHERE ...` (or empty) with placeholders starting after `starting_param_index`
    pub fn to_where_sql(&self, starting_param_index: usize) -> Result<SqlResult, FilterError> {
        if self.conditions.is_empty() {
            return Ok(SqlResult { query: String::new(), params: vec![] });
        }
        let (where_clause, params) = FilterWhere::generate(&self.conditions, starting_param_index)?;
        Ok(SqlResult { query: format!("WHERE {}", where_clause), params })
    }

    /// Append the filter to a `SELECT ... FROM ...` head
    pub fn to_sql(&self, select_from: &str) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql(0)?;
        let order_clause = FilterOrder::generate(&self.order_data)?;
        let limit_clause = self.build_limit_clause();

        let query = [select_from.to_string(), where_result.query, order_clause, limit_clause]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    /// `SELECT COUNT(*) AS count FROM <from>` with the same conditions, ignoring order and paging
    pub fn to_count_sql(&self, from: &str) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql(0)?;
        let query = if where_result.query.is_empty() {
            format!("SELECT COUNT(*) AS count FROM {}", from)
        } else {
            format!("SELECT COUNT(*) AS count FROM {} {}", from, where_result.query)
        };
        Ok(SqlResult { query, params: where_result.params })
    }

    fn compare(mut self, column: &'static str, operator: FilterOp, data: FilterParam) -> Self {
        self.conditions.push(FilterWhereInfo::Compare { column, operator, data });
        self
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
