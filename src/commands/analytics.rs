use crate::analytics::{by_month, compose, window_transactions, Dashboard, DashboardOptions};
use crate::api::Mode;
use crate::commands::{open_session, Out};
use crate::model::{Amount, Filter, Transaction};
use crate::{Config, Result};
use serde::Serialize;

/// Income and expenses for one month of the year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`
    pub month: String,
    pub income: Amount,
    pub expenses: Amount,
    pub bookings: usize,
}

/// The analytics view: the whole-year dashboard plus a month-by-month breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub year: i32,
    pub months: Vec<MonthlyTotal>,
    pub dashboard: Dashboard,
}

pub async fn analytics(config: Config, mode: Mode, year: i32) -> Result<Out<Analytics>> {
    let filter = Filter::year(year);
    let session = open_session(&config, mode, filter).await?;
    let snapshot = session.snapshot()?;

    let options = DashboardOptions {
        top_services: config.top_services(),
    };
    let dashboard = compose(
        snapshot.transactions(),
        snapshot.clients(),
        &filter,
        &options,
    );
    let months = monthly_totals(&window_transactions(snapshot.transactions(), &filter));

    let message = format!(
        "{year}: income {}, expenses {}, forecast next month {}, {} predicted bookings",
        dashboard.total_income,
        dashboard.total_expenses,
        dashboard.forecasted_income,
        dashboard.predicted_bookings
    );
    Ok(Out::new(
        message,
        Analytics {
            year,
            months,
            dashboard,
        },
    ))
}

/// One row per month that has any transaction, in chronological order.
fn monthly_totals(transactions: &[&Transaction]) -> Vec<MonthlyTotal> {
    let income = by_month(transactions.iter().copied().filter(|t| t.is_income()));
    let expenses = by_month(transactions.iter().copied().filter(|t| t.is_expense()));
    let all = by_month(transactions.iter().copied());

    all.sorted_by_key()
        .into_iter()
        .map(|(month, _)| MonthlyTotal {
            month: month.to_string(),
            income: income.get(month).map(|b| b.sum).unwrap_or_default(),
            expenses: expenses.get(month).map(|b| b.sum).unwrap_or_default(),
            bookings: income.get(month).map_or(0, |b| b.count),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_analytics_months() {
        let env = TestEnv::new().await;
        let out = analytics(env.config(), Mode::Test, 2025).await.unwrap();
        let a = out.structure().unwrap();
        let months: Vec<&str> = a.months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2025-07", "2025-08", "2025-09", "2025-10"]);
        assert_eq!(a.months[0].income.fixed(), "290.00");
        assert_eq!(a.months[0].expenses.fixed(), "734.20");
        assert_eq!(a.months[0].bookings, 4);
        let income: Amount = a.months.iter().map(|m| m.income).sum();
        assert_eq!(income, a.dashboard.total_income);
    }

    #[tokio::test]
    async fn test_analytics_empty_year() {
        let env = TestEnv::new().await;
        let out = analytics(env.config(), Mode::Test, 1999).await.unwrap();
        let a = out.structure().unwrap();
        assert!(a.months.is_empty());
        assert_eq!(a.dashboard.forecasted_income, "0.00");
    }
}
