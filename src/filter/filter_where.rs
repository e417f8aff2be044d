use super::error::FilterError;
use super::types::{FilterParam, FilterWhereInfo};

pub struct FilterWhere {
    param_values: Vec<FilterParam>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render conditions joined by `AND`. Placeholders continue after `starting_param_index`.
    pub fn generate(
        conditions: &[FilterWhereInfo],
        starting_param_index: usize,
    ) -> Result<(String, Vec<FilterParam>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let mut sql_conditions = Vec::with_capacity(conditions.len());
        for condition in conditions {
            sql_conditions.push(filter_where.build_sql_condition(condition)?);
        }
        Ok((sql_conditions.join(" AND "), filter_where.param_values))
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        match condition {
            FilterWhereInfo::Compare { column, operator, data } => {
                let column = quote_identifier(column)?;
                let placeholder = self.push_param(data.clone());
                Ok(format!("{} {} {}", column, operator.to_sql(), placeholder))
            }
            FilterWhereInfo::Null { column, is_null } => {
                let column = quote_identifier(column)?;
                Ok(if *is_null {
                    format!("{} IS NULL", column)
                } else {
                    format!("{} IS NOT NULL", column)
                })
            }
            FilterWhereInfo::EqOrNull { column, data } => {
                let column = quote_identifier(column)?;
                let placeholder = self.push_param(data.clone());
                Ok(format!("({} = {} OR {} IS NULL)", column, placeholder, column))
            }
            FilterWhereInfo::AnyOf { columns, operator, data } => {
                if columns.is_empty() {
                    return Err(FilterError::InvalidColumn("Column list cannot be empty".to_string()));
                }
                let placeholder = self.push_param(data.clone());
                let parts = columns
                    .iter()
                    .map(|c| quote_identifier(c).map(|c| format!("{} {} {}", c, operator.to_sql(), placeholder)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("({})", parts.join(" OR ")))
            }
            FilterWhereInfo::InSubquery { column, select, table, key, data } => {
                let column = quote_identifier(column)?;
                let select = quote_identifier(select)?;
                let key = quote_identifier(key)?;
                if table.contains('.') {
                    return Err(FilterError::InvalidTableName(table.to_string()));
                }
                let table = quote_identifier(table).map_err(|_| FilterError::InvalidTableName(table.to_string()))?;
                let placeholder = self.push_param(data.clone());
                Ok(format!("{} IN (SELECT {} FROM {} WHERE {} = {})", column, select, table, key, placeholder))
            }
        }
    }

    fn push_param(&mut self, value: FilterParam) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

/// Quote `column` or `alias.column` after checking each segment is a plain identifier
pub fn quote_identifier(name: &str) -> Result<String, FilterError> {
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() > 2 {
        return Err(FilterError::InvalidColumn(name.to_string()));
    }
    for segment in &segments {
        let mut chars = segment.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidColumn(name.to_string()));
        }
    }
    Ok(segments.iter().map(|s| format!("\"{}\"", s)).collect::<Vec<_>>().join("."))
}
