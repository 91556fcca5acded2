//! # Sales Statistics
//!
//! Aggregates the ledger into the three windows the stats endpoint
//! reports: today, month to date, year to date. Only completed sales
//! count; voided sales left no row and refunds are excluded by status.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use vela_db::SaleRepository;

/// Aggregate figures for one time window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub sale_count: i64,
    pub revenue_cents: i64,
    /// revenue / count, floored. Zero when the window is empty.
    pub average_sale_cents: i64,
}

impl PeriodStats {
    fn from_totals(sale_count: i64, revenue_cents: i64) -> Self {
        let average_sale_cents = if sale_count > 0 {
            revenue_cents / sale_count
        } else {
            0
        };
        PeriodStats {
            sale_count,
            revenue_cents,
            average_sale_cents,
        }
    }
}

/// The stats endpoint payload.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesStats {
    pub today: PeriodStats,
    pub month_to_date: PeriodStats,
    pub year_to_date: PeriodStats,
}

/// Computes ledger statistics.
#[derive(Debug, Clone)]
pub struct StatsService {
    sales: SaleRepository,
}

impl StatsService {
    pub fn new(sales: SaleRepository) -> Self {
        StatsService { sales }
    }

    /// Computes today / month-to-date / year-to-date figures, all ending
    /// at `now`. Window starts are UTC midnights.
    pub async fn compute(&self, now: DateTime<Utc>) -> EngineResult<SalesStats> {
        let today = now.date_naive();
        let month_start = first_of_month(today);
        let year_start = first_of_year(today);

        let day_totals = self.sales.period_totals(start_of_day(today), now).await?;
        let month_totals = self
            .sales
            .period_totals(start_of_day(month_start), now)
            .await?;
        let year_totals = self
            .sales
            .period_totals(start_of_day(year_start), now)
            .await?;

        Ok(SalesStats {
            today: PeriodStats::from_totals(day_totals.sale_count, day_totals.revenue_cents),
            month_to_date: PeriodStats::from_totals(
                month_totals.sale_count,
                month_totals.revenue_cents,
            ),
            year_to_date: PeriodStats::from_totals(
                year_totals.sale_count,
                year_totals.revenue_cents,
            ),
        })
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

fn first_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vela_core::{PaymentMethod, Sale, SaleStatus};
    use vela_db::{Database, DbConfig};

    fn sale_at(id: &str, total: i64, at: DateTime<Utc>) -> Sale {
        Sale {
            id: id.to_string(),
            customer_name: None,
            customer_phone: None,
            notes: None,
            subtotal_cents: total,
            discount_cents: 0,
            tax_cents: 0,
            grand_total_cents: total,
            payment_method: PaymentMethod::Cash,
            amount_paid_cents: total,
            change_cents: 0,
            status: SaleStatus::Completed,
            created_at: at,
        }
    }

    #[tokio::test]
    async fn test_empty_ledger() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stats = StatsService::new(db.sales());

        let result = stats.compute(Utc::now()).await.unwrap();
        assert_eq!(result.today.sale_count, 0);
        assert_eq!(result.today.average_sale_cents, 0);
        assert_eq!(result.year_to_date.revenue_cents, 0);
    }

    #[tokio::test]
    async fn test_windows_and_average() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stats = StatsService::new(db.sales());

        // Fixed "now" mid-year, mid-month, mid-day so window arithmetic
        // is deterministic.
        let now = NaiveDate::from_ymd_opt(2026, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc();

        // Two sales today, one earlier this month, one earlier this year,
        // one last year.
        db.sales()
            .insert(&sale_at("a", 1000, now - Duration::hours(2)), &[])
            .await
            .unwrap();
        db.sales()
            .insert(&sale_at("b", 3000, now - Duration::hours(1)), &[])
            .await
            .unwrap();
        db.sales()
            .insert(&sale_at("c", 5000, now - Duration::days(10)), &[])
            .await
            .unwrap();
        db.sales()
            .insert(&sale_at("d", 7000, now - Duration::days(100)), &[])
            .await
            .unwrap();
        db.sales()
            .insert(&sale_at("e", 9000, now - Duration::days(400)), &[])
            .await
            .unwrap();

        let result = stats.compute(now).await.unwrap();

        assert_eq!(result.today.sale_count, 2);
        assert_eq!(result.today.revenue_cents, 4000);
        assert_eq!(result.today.average_sale_cents, 2000);

        assert_eq!(result.month_to_date.sale_count, 3);
        assert_eq!(result.month_to_date.revenue_cents, 9000);
        assert_eq!(result.month_to_date.average_sale_cents, 3000);

        assert_eq!(result.year_to_date.sale_count, 4);
        assert_eq!(result.year_to_date.revenue_cents, 16000);
        assert_eq!(result.year_to_date.average_sale_cents, 4000);
    }

    #[tokio::test]
    async fn test_refunded_sales_excluded() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stats = StatsService::new(db.sales());

        let now = Utc::now();
        let mut refunded = sale_at("r", 9999, now - Duration::minutes(5));
        refunded.status = SaleStatus::Refunded;
        db.sales().insert(&refunded, &[]).await.unwrap();

        let result = stats.compute(now).await.unwrap();
        assert_eq!(result.today.sale_count, 0);
    }
}
