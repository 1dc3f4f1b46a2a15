use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::intent::{SlotName, Slots};

/// Text carried by a result when the reporting view returned no row.
pub const NO_DATA_TEXT: &str = "no data found";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TradeSpend,
    GrossProfit,
    Roi,
}

impl Metric {
    pub fn title(self) -> &'static str {
        match self {
            Self::TradeSpend => "Total Trade Spend",
            Self::GrossProfit => "Total Gross Profit",
            Self::Roi => "Total ROI",
        }
    }

    /// The reporting field this metric is sliced by.
    pub fn slice_field(self) -> ReportField {
        match self {
            Self::TradeSpend => ReportField::Year,
            Self::GrossProfit => ReportField::Brand,
            Self::Roi => ReportField::Customer,
        }
    }

    /// Decimal places of a rendered value. ROI is a percentage with one decimal.
    pub fn scale(self) -> u32 {
        match self {
            Self::TradeSpend | Self::GrossProfit => 0,
            Self::Roi => 1,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Fields of the reporting view a query may filter or group on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportField {
    Year,
    Brand,
    Customer,
}

impl ReportField {
    pub fn slot(self) -> SlotName {
        match self {
            Self::Year => SlotName::Year,
            Self::Brand => SlotName::Brand,
            Self::Customer => SlotName::Customer,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
}

/// A single `field <op> literal` predicate. The literal is bound by the executor, never spliced
/// into query text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterClause {
    pub field: ReportField,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterClause {
    pub fn eq(field: ReportField, value: impl Into<String>) -> Self {
        Self { field, operator: FilterOperator::Eq, value: value.into() }
    }
}

/// Language independent description of one aggregate over the reporting view.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuerySpec {
    pub metric: Metric,
    pub filter: Option<FilterClause>,
    pub group_by: Option<ReportField>,
}

impl QuerySpec {
    pub fn ungrouped(metric: Metric) -> Self {
        Self { metric, filter: None, group_by: None }
    }

    /// Builds the query for `metric`. Only the slot matching the metric's slice field shapes the
    /// query; a populated slot yields a filter and a grouping on that field.
    pub fn build(metric: Metric, slots: &Slots) -> Self {
        let field = metric.slice_field();
        match slots.get(field.slot()) {
            Some(value) => Self {
                metric,
                filter: Some(FilterClause::eq(field, value)),
                group_by: Some(field),
            },
            None => Self::ungrouped(metric),
        }
    }
}

/// Scalar answer of an executed [`QuerySpec`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub scalar: String,
    pub found: bool,
}

impl QueryResult {
    pub fn value(metric: Metric, value: Decimal) -> Self {
        let mut rounded =
            value.round_dp_with_strategy(metric.scale(), RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(metric.scale());
        Self { scalar: rounded.to_string(), found: true }
    }

    pub fn no_data() -> Self {
        Self { scalar: NO_DATA_TEXT.to_string(), found: false }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{FilterClause, Metric, QueryResult, QuerySpec, ReportField, NO_DATA_TEXT};
    use crate::intent::{SlotName, Slots};

    #[test]
    fn trade_spend_filters_on_supplied_year() {
        let spec = QuerySpec::build(Metric::TradeSpend, &Slots::new().with(SlotName::Year, "2017"));

        assert_eq!(spec.filter, Some(FilterClause::eq(ReportField::Year, "2017")));
        assert_eq!(spec.group_by, Some(ReportField::Year));
    }

    #[test]
    fn gross_profit_filters_on_brand() {
        let spec =
            QuerySpec::build(Metric::GrossProfit, &Slots::new().with(SlotName::Brand, "CESAR"));

        assert_eq!(spec.filter, Some(FilterClause::eq(ReportField::Brand, "CESAR")));
        assert_eq!(spec.group_by, Some(ReportField::Brand));
    }

    #[test]
    fn roi_without_customer_is_ungrouped() {
        let spec = QuerySpec::build(Metric::Roi, &Slots::new());

        assert_eq!(spec, QuerySpec::ungrouped(Metric::Roi));
    }

    #[test]
    fn unrelated_slots_do_not_shape_the_query() {
        let slots = Slots::new().with(SlotName::Brand, "CESAR").with(SlotName::Customer, "TARGET");

        let spec = QuerySpec::build(Metric::TradeSpend, &slots);

        assert_eq!(spec, QuerySpec::ungrouped(Metric::TradeSpend));
    }

    #[test]
    fn build_is_deterministic_for_every_slot_combination() {
        let values =
            [(SlotName::Year, "2016"), (SlotName::Brand, "CESAR"), (SlotName::Customer, "TARGET")];

        for mask in 0..8u8 {
            let slots = values
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .fold(Slots::new(), |slots, (_, (slot, value))| slots.with(*slot, value));

            for metric in [Metric::TradeSpend, Metric::GrossProfit, Metric::Roi] {
                let first = QuerySpec::build(metric, &slots);
                let second = QuerySpec::build(metric, &slots.clone());

                assert_eq!(first, second, "{metric:?} with slot mask {mask:03b}");
                let field = metric.slice_field();
                assert_eq!(
                    first.filter.is_some(),
                    slots.get(field.slot()).is_some(),
                    "{metric:?} filter presence with slot mask {mask:03b}"
                );
                assert_eq!(first.group_by.is_some(), first.filter.is_some());
            }
        }
    }

    #[test]
    fn values_are_rendered_at_metric_scale() {
        assert_eq!(
            QueryResult::value(Metric::TradeSpend, Decimal::new(2_030_906_605, 1)).scalar,
            "203090661"
        );
        assert_eq!(QueryResult::value(Metric::Roi, Decimal::new(26_034, 2)).scalar, "260.3");
        assert_eq!(QueryResult::value(Metric::Roi, Decimal::from(260)).scalar, "260.0");
    }

    #[test]
    fn no_data_carries_sentinel_text() {
        let result = QueryResult::no_data();

        assert!(!result.found);
        assert_eq!(result.scalar, NO_DATA_TEXT);
        assert_ne!(result, QueryResult::value(Metric::GrossProfit, Decimal::ZERO));
    }
}
