use crate::model::{Amount, Date};
use serde::{Deserialize, Serialize};

/// The fallback bucket for expenses with no category (and income with no service).
pub const OTHER: &str = "Other";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// A single income or expense record.
///
/// Income transactions carry a `service` and usually a `client_id`; expense transactions carry a
/// `category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: String,
    #[serde(default)]
    client_id: Option<String>,
    date: Date,
    #[serde(rename = "type")]
    kind: TransactionType,
    amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    service: Option<String>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        client_id: Option<String>,
        date: Date,
        kind: TransactionType,
        amount: Amount,
        category: Option<String>,
        service: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            client_id: client_id.filter(|s| !s.is_empty()),
            date,
            kind,
            amount,
            category: category.filter(|s| !s.trim().is_empty()),
            service: service.filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn income(
        id: impl Into<String>,
        client_id: Option<String>,
        date: Date,
        amount: Amount,
        service: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            client_id,
            date,
            TransactionType::Income,
            amount,
            None,
            Some(service.into()),
        )
    }

    pub fn expense(
        id: impl Into<String>,
        date: Date,
        amount: Amount,
        category: Option<String>,
    ) -> Self {
        Self::new(
            id,
            None,
            date,
            TransactionType::Expense,
            amount,
            category,
            None,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn date(&self) -> &Date {
        &self.date
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// The category, if it is present and not blank.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// The service, if it is present and not blank.
    pub fn service(&self) -> Option<&str> {
        self.service.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub(crate) fn set_amount(&mut self, amount: Amount) {
        self.amount = amount;
    }

    pub(crate) fn set_service(&mut self, service: impl Into<String>) {
        self.service = Some(service.into()).filter(|s| !s.trim().is_empty());
    }

    /// The category, or `"Other"` when there is none.
    pub fn category_or_other(&self) -> &str {
        self.category().unwrap_or(OTHER)
    }

    /// The service, or `"Other"` when there is none.
    pub fn service_or_other(&self) -> &str {
        self.service().unwrap_or(OTHER)
    }
}
