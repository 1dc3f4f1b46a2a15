use chrono::NaiveDate;
use cpg_core::executor::ReportRow;
use rust_decimal::Decimal;

use crate::connection::DbPool;

/// Promotion ids inserted by [`DemoDataset::SQL`].
const DEMO_PROMOTION_IDS: &[&str] = &["316669", "316670", "316671", "402115", "402116"];

/// Expected aggregates over the demo rows, checked by [`DemoDataset::verify`].
const DEMO_TOTALS: &[DemoTotal] = &[
    DemoTotal {
        label: "trade-spend-2016",
        sql: "SELECT CAST(SUM(total_trade_spend) AS INTEGER) FROM promotion_report \
              WHERE promotion_year = '2016'",
        expected: 203_090_661,
    },
    DemoTotal {
        label: "gross-profit-cesar",
        sql: "SELECT CAST(SUM(gross_profit) AS INTEGER) FROM promotion_report \
              WHERE brand = 'CESAR'",
        expected: 2_376_586,
    },
    DemoTotal {
        label: "trade-spend-target",
        sql: "SELECT CAST(SUM(total_trade_spend) AS INTEGER) FROM promotion_report \
              WHERE customer = 'TARGET'",
        expected: 60_000_000,
    },
];

struct DemoTotal {
    label: &'static str,
    sql: &'static str,
    expected: i64,
}

/// Small promotion dataset that answers the sample questions the assistant suggests.
pub struct DemoDataset;

impl DemoDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_promotions.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, sqlx::Error> {
        let before = Self::count(pool).await?;

        let mut tx = pool.begin().await?;
        sqlx::query(Self::SQL).execute(&mut *tx).await?;
        tx.commit().await?;

        let after = Self::count(pool).await?;
        Ok(SeedResult {
            rows_inserted: (after - before).max(0) as u64,
            rows_total: DEMO_PROMOTION_IDS.len() as u64,
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, sqlx::Error> {
        let mut checks = Vec::new();

        checks.push(("demo-rows", Self::count(pool).await? == DEMO_PROMOTION_IDS.len() as i64));

        for total in DEMO_TOTALS {
            let actual: Option<i64> = sqlx::query_scalar(total.sql).fetch_one(pool).await?;
            checks.push((total.label, actual == Some(total.expected)));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    pub async fn clean(pool: &DbPool) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        for id in DEMO_PROMOTION_IDS {
            sqlx::query("DELETE FROM promotion_fact WHERE promotion_id = ?1")
                .bind(*id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// The same rows as [`DemoDataset::SQL`], for in-memory executors.
    pub fn rows() -> Vec<ReportRow> {
        [
            ("316669", "KANTONG PINEAPPLE PRICE REDUCTION", (2016, 3, 14), "KANTONG", "WALMART",
                120_000_000, 90_000_000),
            ("316670", "CESAR CLASSICS MULTIBUY", (2016, 5, 2), "CESAR", "TARGET", 50_000_000,
                1_376_586),
            ("316671", "NEON SUMMER DISPLAY", (2016, 9, 20), "NEON", "COSTCO", 33_090_661,
                20_000_000),
            ("402115", "CESAR WINTER BUNDLE", (2017, 2, 11), "CESAR", "WALMART", 8_000_000,
                1_000_000),
            ("402116", "MUSK FEATURE AND DISPLAY", (2017, 6, 5), "MUSK", "TARGET", 10_000_000,
                154_803_414),
        ]
        .into_iter()
        .filter_map(|(id, name, (year, month, day), brand, customer, spend, profit)| {
            Some(ReportRow {
                promotion_id: id.to_string(),
                promotion_name: name.to_string(),
                promotion_start_date: NaiveDate::from_ymd_opt(year, month, day)?,
                brand: brand.to_string(),
                customer: customer.to_string(),
                total_trade_spend: Decimal::from(spend),
                gross_profit: Decimal::from(profit),
            })
        })
        .collect()
    }

    async fn count(pool: &DbPool) -> Result<i64, sqlx::Error> {
        let placeholders = (1..=DEMO_PROMOTION_IDS.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql =
            format!("SELECT COUNT(1) FROM promotion_fact WHERE promotion_id IN ({placeholders})");

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for id in DEMO_PROMOTION_IDS {
            query = query.bind(*id);
        }
        query.fetch_one(pool).await
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub rows_inserted: u64,
    pub rows_total: u64,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
