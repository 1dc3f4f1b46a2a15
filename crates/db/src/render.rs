//! SQL text for a [`QuerySpec`] against the `promotion_report` view.
//!
//! Filter literals never reach the SQL text; they are returned as positional binds.

use cpg_core::query::{FilterOperator, Metric, QuerySpec, ReportField};

pub const REPORT_VIEW: &str = "promotion_report";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedQuery {
    pub sql: String,
    pub binds: Vec<String>,
}

/// Aggregates are returned as text so the executor parses them losslessly into a `Decimal`.
fn aggregate_expression(metric: Metric) -> &'static str {
    match metric {
        Metric::TradeSpend => "CAST(SUM(total_trade_spend) AS TEXT)",
        Metric::GrossProfit => "CAST(SUM(gross_profit) AS TEXT)",
        Metric::Roi => concat!(
            "CAST(SUM(gross_profit) * 100.0",
            " / NULLIF(SUM(total_trade_spend), 0) AS TEXT)"
        ),
    }
}

fn column(field: ReportField) -> &'static str {
    match field {
        ReportField::Year => "promotion_year",
        ReportField::Brand => "brand",
        ReportField::Customer => "customer",
    }
}

/// Year values are digits; brand and customer names compare without case.
fn collation(field: ReportField) -> &'static str {
    match field {
        ReportField::Year => "",
        ReportField::Brand | ReportField::Customer => " COLLATE NOCASE",
    }
}

pub fn render(spec: &QuerySpec) -> RenderedQuery {
    let mut sql =
        format!("SELECT {} AS value\nFROM {REPORT_VIEW}", aggregate_expression(spec.metric));
    let mut binds = Vec::new();

    if let Some(filter) = &spec.filter {
        let operator = match filter.operator {
            FilterOperator::Eq => "=",
        };
        sql.push_str(&format!(
            "\nWHERE {} {operator} ?1{}",
            column(filter.field),
            collation(filter.field)
        ));
        binds.push(filter.value.clone());
    }

    if let Some(field) = spec.group_by {
        sql.push_str(&format!("\nGROUP BY {}{}", column(field), collation(field)));
    }

    RenderedQuery { sql, binds }
}
