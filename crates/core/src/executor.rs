use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::errors::ExecError;
use crate::query::{FilterClause, FilterOperator, Metric, QueryResult, QuerySpec, ReportField};

/// Runs a [`QuerySpec`] against a data source. Implementations own translation into a concrete
/// query language, parameter binding, and any connection pooling.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, spec: &QuerySpec) -> Result<QueryResult, ExecError>;
}

/// One row of the promotion reporting view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub promotion_id: String,
    pub promotion_name: String,
    pub promotion_start_date: NaiveDate,
    pub brand: String,
    pub customer: String,
    pub total_trade_spend: Decimal,
    pub gross_profit: Decimal,
}

impl ReportRow {
    fn field_value(&self, field: ReportField) -> String {
        match field {
            ReportField::Year => self.promotion_start_date.year().to_string(),
            ReportField::Brand => self.brand.clone(),
            ReportField::Customer => self.customer.clone(),
        }
    }

    fn matches(&self, filter: &FilterClause) -> bool {
        match filter.operator {
            FilterOperator::Eq => {
                self.field_value(filter.field).eq_ignore_ascii_case(&filter.value)
            }
        }
    }
}

/// Executor over rows held in memory. Aggregates the same way the SQL executor does.
#[derive(Default)]
pub struct InMemoryQueryExecutor {
    rows: RwLock<Vec<ReportRow>>,
}

impl InMemoryQueryExecutor {
    pub fn new(rows: Vec<ReportRow>) -> Self {
        Self { rows: RwLock::new(rows) }
    }

    pub async fn insert(&self, row: ReportRow) {
        self.rows.write().await.push(row);
    }
}

#[async_trait]
impl QueryExecutor for InMemoryQueryExecutor {
    async fn execute(&self, spec: &QuerySpec) -> Result<QueryResult, ExecError> {
        let rows = self.rows.read().await;
        let selected = rows
            .iter()
            .filter(|row| spec.filter.as_ref().map_or(true, |filter| row.matches(filter)))
            .collect::<Vec<_>>();

        Ok(aggregate(spec.metric, &selected).map_or_else(QueryResult::no_data, |value| {
            QueryResult::value(spec.metric, value)
        }))
    }
}

/// `None` mirrors SQL: an aggregate over no rows, or a ratio over zero spend, is NULL.
fn aggregate(metric: Metric, rows: &[&ReportRow]) -> Option<Decimal> {
    if rows.is_empty() {
        return None;
    }

    let trade_spend = rows.iter().map(|row| row.total_trade_spend).sum::<Decimal>();
    let gross_profit = rows.iter().map(|row| row.gross_profit).sum::<Decimal>();

    match metric {
        Metric::TradeSpend => Some(trade_spend),
        Metric::GrossProfit => Some(gross_profit),
        Metric::Roi => {
            gross_profit.checked_div(trade_spend).map(|ratio| ratio * Decimal::ONE_HUNDRED)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{InMemoryQueryExecutor, QueryExecutor, ReportRow};
    use crate::query::{FilterClause, Metric, QueryResult, QuerySpec, ReportField};

    fn row(
        id: &str,
        date: (i32, u32, u32),
        brand: &str,
        customer: &str,
        spend: i64,
        profit: i64,
    ) -> ReportRow {
        ReportRow {
            promotion_id: id.to_string(),
            promotion_name: format!("{brand} promotion"),
            promotion_start_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                .expect("valid fixture date"),
            brand: brand.to_string(),
            customer: customer.to_string(),
            total_trade_spend: Decimal::from(spend),
            gross_profit: Decimal::from(profit),
        }
    }

    fn executor() -> InMemoryQueryExecutor {
        InMemoryQueryExecutor::new(vec![
            row("P-1", (2016, 3, 1), "CESAR", "TARGET", 1_000, 2_500),
            row("P-2", (2016, 7, 9), "KANTONG", "WALMART", 3_000, 4_000),
            row("P-3", (2017, 1, 15), "CESAR", "WALMART", 2_000, 1_000),
        ])
    }

    #[tokio::test]
    async fn filters_by_year_of_start_date() {
        let spec = QuerySpec {
            metric: Metric::TradeSpend,
            filter: Some(FilterClause::eq(ReportField::Year, "2016")),
            group_by: Some(ReportField::Year),
        };

        let result = executor().execute(&spec).await.expect("execute");

        assert_eq!(result, QueryResult { scalar: "4000".to_string(), found: true });
    }

    #[tokio::test]
    async fn brand_filter_ignores_case() {
        let spec = QuerySpec {
            metric: Metric::GrossProfit,
            filter: Some(FilterClause::eq(ReportField::Brand, "cesar")),
            group_by: Some(ReportField::Brand),
        };

        let result = executor().execute(&spec).await.expect("execute");

        assert_eq!(result.scalar, "3500");
    }

    #[tokio::test]
    async fn roi_is_profit_over_spend_percentage() {
        let result =
            executor().execute(&QuerySpec::ungrouped(Metric::Roi)).await.expect("execute");

        assert_eq!(result.scalar, "125.0");
    }

    #[tokio::test]
    async fn unmatched_filter_reports_no_data() {
        let spec = QuerySpec {
            metric: Metric::Roi,
            filter: Some(FilterClause::eq(ReportField::Customer, "COSTCO")),
            group_by: Some(ReportField::Customer),
        };

        let result = executor().execute(&spec).await.expect("execute");

        assert_eq!(result, QueryResult::no_data());
    }

    #[tokio::test]
    async fn zero_spend_roi_reports_no_data() {
        let executor = InMemoryQueryExecutor::default();
        executor.insert(row("P-9", (2018, 2, 2), "NEON", "TARGET", 0, 500)).await;

        let result = executor.execute(&QuerySpec::ungrouped(Metric::Roi)).await.expect("execute");

        assert!(!result.found);
    }
}
