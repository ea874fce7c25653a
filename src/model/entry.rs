//! Submission payloads, validated before they reach the tracker API.

use crate::model::{Amount, Date};
use crate::Result;
use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};

/// A new income or expense entry, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NewEntry {
    #[serde(rename_all = "camelCase")]
    Income {
        client_name: String,
        service: String,
        amount: Amount,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<Date>,
    },
    #[serde(rename_all = "camelCase")]
    Expense {
        category: String,
        amount: Amount,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<Date>,
    },
}

impl NewEntry {
    /// Checks the entry and returns it with its text fields trimmed.
    pub fn validated(self) -> Result<Self> {
        Ok(match self {
            NewEntry::Income {
                client_name,
                service,
                amount,
                date,
            } => NewEntry::Income {
                client_name: required("client name", &client_name)?,
                service: required("service", &service)?,
                amount: non_negative(amount)?,
                date,
            },
            NewEntry::Expense {
                category,
                amount,
                date,
            } => NewEntry::Expense {
                category: required("category", &category)?,
                amount: non_negative(amount)?,
                date,
            },
        })
    }
}

/// A further visit for an existing client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitEntry {
    pub service: String,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Date>,
}

impl VisitEntry {
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            service: required("service", &self.service)?,
            amount: non_negative(self.amount)?,
            date: self.date,
        })
    }
}

/// An edit to an existing client: a rename, or a correction of one visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientUpdate {
    Rename {
        name: String,
    },
    Visit {
        visit_id: String,
        service: Option<String>,
        amount: Option<Amount>,
    },
}

impl ClientUpdate {
    pub fn validated(self) -> Result<Self> {
        Ok(match self {
            ClientUpdate::Rename { name } => ClientUpdate::Rename {
                name: required("name", &name)?,
            },
            ClientUpdate::Visit {
                visit_id,
                service,
                amount,
            } => {
                if service.is_none() && amount.is_none() {
                    bail!("A visit edit needs a new service, a new amount, or both");
                }
                ClientUpdate::Visit {
                    visit_id: required("visit id", &visit_id)?,
                    service: service.map(|s| required("service", &s)).transpose()?,
                    amount: amount.map(non_negative).transpose()?,
                }
            }
        })
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    ensure!(!trimmed.is_empty(), "The {field} must not be empty");
    Ok(trimmed.to_string())
}

fn non_negative(amount: Amount) -> Result<Amount> {
    ensure!(
        !amount.is_negative(),
        "The amount must not be negative, got {amount}"
    );
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn amount(v: i64) -> Amount {
        Amount::new(Decimal::from(v))
    }

    #[test]
    fn test_income_trims_fields() {
        let entry = NewEntry::Income {
            client_name: "  Grace ".into(),
            service: "Colour".into(),
            amount: amount(60),
            date: None,
        }
        .validated()
        .unwrap();
        match entry {
            NewEntry::Income { client_name, .. } => assert_eq!(client_name, "Grace"),
            NewEntry::Expense { .. } => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_rejects_blank_name() {
        let result = NewEntry::Income {
            client_name: "   ".into(),
            service: "Colour".into(),
            amount: amount(60),
            date: None,
        }
        .validated();
        assert!(result.unwrap_err().to_string().contains("client name"));
    }

    #[test]
    fn test_rejects_negative_amount() {
        let result = NewEntry::Expense {
            category: "Rent".into(),
            amount: amount(-1),
            date: None,
        }
        .validated();
        assert!(result.is_err());
    }

    #[test]
    fn test_tagged_serde() {
        let json = r#"{"type":"expense","category":"Supplies","amount":10}"#;
        let entry: NewEntry = serde_json::from_str(json).unwrap();
        assert_eq!(
            entry,
            NewEntry::Expense {
                category: "Supplies".into(),
                amount: amount(10),
                date: None,
            }
        );
        let json = r#"{"type":"income","clientName":"Ada","service":"Cut","amount":"40"}"#;
        let entry: NewEntry = serde_json::from_str(json).unwrap();
        assert!(matches!(entry, NewEntry::Income { .. }));
        assert!(serde_json::from_str::<NewEntry>(r#"{"type":"refund","amount":1}"#).is_err());
    }

    #[test]
    fn test_visit_update_needs_a_change() {
        let update = ClientUpdate::Visit {
            visit_id: "v1".into(),
            service: None,
            amount: None,
        };
        assert!(update.validated().is_err());
    }
}
