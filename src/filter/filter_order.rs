use super::error::FilterError;
use super::filter_where::quote_identifier;
use super::types::FilterOrderInfo;

pub struct FilterOrder;

impl FilterOrder {
    pub fn generate(order_data: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if order_data.is_empty() {
            return Ok(String::new());
        }
        let parts = order_data
            .iter()
            .map(|info| quote_identifier(info.column).map(|c| format!("{} {}", c, info.sort.to_sql())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}
