//! Composes the dashboard view-model for one time window.

use crate::analytics::aggregate::{by_category, by_month, group_by};
use crate::analytics::forecast::{forecast_income, predict_bookings, series};
use crate::analytics::retention::{retention, VisitLog};
use crate::model::{Amount, Client, Date, Filter, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// The number of services shown in the service chart when nothing else is configured.
pub const DEFAULT_TOP_SERVICES: usize = 4;

/// The number of transactions listed under recent activity.
const RECENT_TRANSACTIONS: usize = 4;

/// A slice of the expense breakdown chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseSlice {
    pub name: String,
    pub value: Amount,
}

/// A bar of the service popularity chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCount {
    pub service: String,
    pub count: usize,
}

/// A row of the client table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetail {
    pub id: String,
    pub name: String,
    pub service: String,
    /// Income from this client inside the window.
    pub amount: Amount,
    pub date: Date,
    pub number_of_visits: usize,
}

/// Everything the dashboard displays for a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub filter: Filter,
    pub total_income: Amount,
    pub total_expenses: Amount,
    pub balance: Amount,
    pub total_clients: usize,
    pub pie_data: Vec<ExpenseSlice>,
    pub service_data: Vec<ServiceCount>,
    pub retention_rate: String,
    pub average_days: String,
    pub forecasted_income: String,
    pub predicted_bookings: u64,
    pub client_details: Vec<ClientDetail>,
    pub recent_transactions: Vec<Transaction>,
}

/// Settings that shape the dashboard without changing its figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    pub top_services: usize,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            top_services: DEFAULT_TOP_SERVICES,
        }
    }
}

/// The transactions inside `filter`, in their original order.
pub fn window_transactions<'a>(
    transactions: &'a [Transaction],
    filter: &Filter,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|t| filter.contains(t.date()))
        .collect()
}

/// The clients inside `filter`, in their original order.
pub fn window_clients<'a>(clients: &'a [Client], filter: &Filter) -> Vec<&'a Client> {
    clients.iter().filter(|c| c.in_window(filter)).collect()
}

/// Builds the dashboard from the full collections. Only records inside `filter` contribute.
pub fn compose(
    transactions: &[Transaction],
    clients: &[Client],
    filter: &Filter,
    options: &DashboardOptions,
) -> Dashboard {
    let in_window = window_transactions(transactions, filter);
    let income: Vec<&Transaction> = in_window.iter().copied().filter(|t| t.is_income()).collect();
    let expenses: Vec<&Transaction> = in_window
        .iter()
        .copied()
        .filter(|t| t.is_expense())
        .collect();
    let window_clients = window_clients(clients, filter);

    let total_income: Amount = income.iter().map(|t| t.amount()).sum();
    let total_expenses: Amount = expenses.iter().map(|t| t.amount()).sum();

    let pie_data = by_category(expenses.iter().copied())
        .iter()
        .map(|(name, bucket)| ExpenseSlice {
            name: name.to_string(),
            value: bucket.sum,
        })
        .collect();

    let service_buckets = group_by(
        window_clients.iter().copied(),
        |c: &Client| c.service.clone(),
        |_| Amount::ZERO,
    );
    let service_data = service_buckets
        .top_by_count(options.top_services)
        .into_iter()
        .map(|(service, bucket)| ServiceCount {
            service: service.to_string(),
            count: bucket.count,
        })
        .collect();

    let retention = retention(&VisitLog::from_clients(window_clients.iter().copied(), filter));

    let months = by_month(income.iter().copied());
    let income_series = series(&months, |_, sum| sum.value());
    let booking_series = series(&months, |count, _| Decimal::from(count));
    let forecasted_income = forecast_income(&income_series);
    let predicted_bookings = predict_bookings(&booking_series, income.len());

    let client_details = client_details(&window_clients, &income, filter);

    let mut recent: Vec<&Transaction> = in_window.clone();
    recent.sort_by(|a, b| b.date().cmp(a.date()));
    let recent_transactions = recent
        .into_iter()
        .take(RECENT_TRANSACTIONS)
        .cloned()
        .collect();

    debug!(
        "Composed dashboard for {filter}: {} transactions, {} clients, {} months",
        in_window.len(),
        window_clients.len(),
        months.len()
    );

    Dashboard {
        filter: *filter,
        total_income,
        total_expenses,
        balance: total_income - total_expenses,
        total_clients: window_clients.len(),
        pie_data,
        service_data,
        retention_rate: retention.rate_display(),
        average_days: retention.average_days_display(),
        forecasted_income: forecasted_income.fixed(),
        predicted_bookings,
        client_details,
        recent_transactions,
    }
}

fn client_details(clients: &[&Client], income: &[&Transaction], filter: &Filter) -> Vec<ClientDetail> {
    let mut by_client: HashMap<&str, Amount> = HashMap::new();
    for t in income {
        if let Some(id) = t.client_id() {
            *by_client.entry(id).or_default() += t.amount();
        }
    }

    clients
        .iter()
        .map(|c| ClientDetail {
            id: c.id.clone(),
            name: c.name.clone(),
            service: c.service.clone(),
            amount: by_client.get(c.id.as_str()).copied().unwrap_or_default(),
            date: c.date,
            number_of_visits: c.visits_in(filter).count(),
        })
        .collect()
}
