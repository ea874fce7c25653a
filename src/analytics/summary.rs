use crate::model::{Amount, Client, Date, Transaction, Visit};
use serde::Serialize;

/// The detail view for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub id: String,
    pub name: String,
    pub service: String,
    pub registered: Date,
    /// Income recorded against this client across every transaction supplied.
    pub total_spent: Amount,
    pub visit_count: usize,
    pub first_visit: Option<Date>,
    pub last_visit: Option<Date>,
    /// Newest first.
    pub visits: Vec<Visit>,
}

impl ClientSummary {
    pub fn new(client: &Client, transactions: &[Transaction]) -> Self {
        let total_spent = transactions
            .iter()
            .filter(|t| t.is_income() && t.client_id() == Some(client.id.as_str()))
            .map(|t| t.amount())
            .sum();

        let mut visits = client.visit_history.clone();
        visits.sort_by(|a, b| b.date.cmp(&a.date));

        Self {
            id: client.id.clone(),
            name: client.name.clone(),
            service: client.service.clone(),
            registered: client.date,
            total_spent,
            visit_count: visits.len(),
            first_visit: visits.last().map(|v| v.date),
            last_visit: visits.first().map(|v| v.date),
            visits,
        }
    }
}
