//! Dynamic predicate assembly for the filtered consumption listing.
//!
//! Each present filter field contributes one `column = $n` predicate and one
//! positional parameter. Values never reach the statement text.

use crate::storage::gateway::SqlParam;
use crate::storage::models::CONSUMPTION_COLUMNS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumptionFilter {
    pub user_id: Option<i32>,
    pub year: Option<i32>,
    pub month: Option<i32>,
}

// Statement text plus the parameters aligned with its placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct FilterQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl ConsumptionFilter {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.year.is_none() && self.month.is_none()
    }

    /// Present fields as (column, value) pairs, in the order user_id, year, month.
    pub fn predicates(&self) -> Vec<(&'static str, i32)> {
        [
            ("user_id", self.user_id),
            ("year", self.year),
            ("month", self.month),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
    }

    pub fn to_query(&self) -> FilterQuery {
        let mut sql = format!("SELECT {} FROM monthly_consumptions", CONSUMPTION_COLUMNS);
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        for (index, (column, value)) in self.predicates().into_iter().enumerate() {
            conditions.push(format!("{} = ${}", column, index + 1));
            params.push(SqlParam::Int(value));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        sql.push_str(" ORDER BY year, month");

        FilterQuery { sql, params }
    }
}
