//! Request and response bodies of the tracker API, and their conversion to the model.

use crate::model::{Amount, Client, ClientUpdate, Date, NewEntry, Transaction, TransactionType, Visit, VisitEntry};
use crate::Result;
use anyhow::ensure;
use serde::{Deserialize, Serialize};

/// Every response carries `success` and `message` beside its own fields.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(flatten)]
    body: T,
}

impl<T> Envelope<T> {
    /// The body of a successful response, or an error carrying the server's message.
    pub(super) fn into_body(self, action: &str) -> Result<T> {
        ensure!(
            self.success,
            "The tracker API could not {action}: {}",
            self.message
        );
        Ok(self.body)
    }
}

/// Only the message, for reading error bodies.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub(super) message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ApiVisit {
    #[serde(rename = "_id")]
    id: String,
    visit_id: String,
    date: Date,
    service: String,
    amount: Amount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ApiClient {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    service: String,
    date: Date,
    #[serde(default)]
    visit_history: Vec<ApiVisit>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ApiTransaction {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(rename = "type")]
    kind: TransactionType,
    amount: Amount,
    #[serde(default)]
    service: Option<String>,
    #[serde(default)]
    category: Option<String>,
    date: Date,
}

impl From<ApiVisit> for Visit {
    fn from(v: ApiVisit) -> Self {
        Visit {
            id: v.id,
            visit_id: v.visit_id,
            date: v.date,
            service: v.service,
            amount: v.amount,
        }
    }
}

impl From<ApiClient> for Client {
    fn from(c: ApiClient) -> Self {
        Client {
            id: c.id,
            name: c.name,
            service: c.service,
            date: c.date,
            visit_history: c.visit_history.into_iter().map(Visit::from).collect(),
        }
    }
}

impl From<ApiTransaction> for Transaction {
    fn from(t: ApiTransaction) -> Self {
        Transaction::new(
            t.id,
            t.client_id,
            t.date,
            t.kind,
            t.amount,
            t.category,
            t.service,
        )
    }
}

/// `GET /tracker/all`. The `expenses` list repeats the expense transactions and is not used.
#[derive(Debug, Deserialize)]
pub(super) struct AllData {
    pub(super) data: AllDataBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct AllDataBody {
    #[serde(default)]
    pub(super) clients: Vec<ApiClient>,
    #[serde(default)]
    pub(super) transactions: Vec<ApiTransaction>,
}

/// `POST /tracker/income` and `PATCH /tracker/clients/{id}/income`.
#[derive(Debug, Deserialize)]
pub(super) struct ClientTransaction {
    pub(super) client: ApiClient,
    pub(super) transaction: ApiTransaction,
}

/// `POST /tracker/expense`.
#[derive(Debug, Deserialize)]
pub(super) struct ExpenseTransaction {
    pub(super) transaction: ApiTransaction,
}

/// `PATCH /tracker/clients/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdatedClient {
    pub(super) client: ApiClient,
    #[serde(default)]
    pub(super) updated_transaction: Option<ApiTransaction>,
}

/// `DELETE /tracker/clients/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DeletedClient {
    pub(super) deleted_client_id: String,
    #[serde(default)]
    pub(super) deleted_transactions_count: u64,
}

/// `DELETE /tracker/reset`.
#[derive(Debug, Deserialize)]
pub(super) struct ResetData {
    pub(super) data: ResetCounts,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ResetCounts {
    #[serde(default)]
    pub(super) clients_deleted: u64,
    #[serde(default)]
    pub(super) transactions_deleted: u64,
    #[serde(default)]
    pub(super) expenses_deleted: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AddIncome<'a> {
    client_name: &'a str,
    service: &'a str,
    amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<Date>,
}

#[derive(Debug, Serialize)]
pub(super) struct AddExpense<'a> {
    category: &'a str,
    amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<Date>,
}

/// The two request bodies a `NewEntry` can become.
#[derive(Debug)]
pub(super) enum EntryRequest<'a> {
    Income(AddIncome<'a>),
    Expense(AddExpense<'a>),
}

impl<'a> From<&'a NewEntry> for EntryRequest<'a> {
    fn from(entry: &'a NewEntry) -> Self {
        match entry {
            NewEntry::Income {
                client_name,
                service,
                amount,
                date,
            } => EntryRequest::Income(AddIncome {
                client_name,
                service,
                amount: *amount,
                date: *date,
            }),
            NewEntry::Expense {
                category,
                amount,
                date,
            } => EntryRequest::Expense(AddExpense {
                category,
                amount: *amount,
                date: *date,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct AddVisit<'a> {
    service: &'a str,
    amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<Date>,
}

impl<'a> From<&'a VisitEntry> for AddVisit<'a> {
    fn from(v: &'a VisitEntry) -> Self {
        Self {
            service: &v.service,
            amount: v.amount,
            date: v.date,
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateClient<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visit_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_service: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_amount: Option<Amount>,
}

impl<'a> From<&'a ClientUpdate> for UpdateClient<'a> {
    fn from(update: &'a ClientUpdate) -> Self {
        match update {
            ClientUpdate::Rename { name } => Self {
                name: Some(name),
                ..Self::default()
            },
            ClientUpdate::Visit {
                visit_id,
                service,
                amount,
            } => Self {
                visit_id: Some(visit_id),
                new_service: service.as_deref(),
                new_amount: *amount,
                ..Self::default()
            },
        }
    }
}
