//! Implements the `Tracker` trait in memory for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a tracker server.

use crate::api::{Cleared, Collections, Deleted, Edited, Recorded, Tracker};
use crate::model::{
    normalize_name, Amount, Client, ClientUpdate, Date, Filter, NewEntry, Transaction, Visit,
    VisitEntry,
};
use crate::utils::generate_id;
use crate::Result;
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Mutex, MutexGuard};
use tracing::trace;

/// The data held by a `TestTracker`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestTrackerState {
    pub clients: Vec<Client>,
    /// Newest first, the way the server lists them.
    pub transactions: Vec<Transaction>,
    /// Which transaction records the income of each visit, keyed by visit id.
    pub visit_transactions: HashMap<String, String>,
}

/// An in-memory `Tracker` that, by default, is seeded with the data in this module.
#[derive(Debug, Default)]
pub struct TestTracker {
    state: Mutex<TestTrackerState>,
}

impl TestTracker {
    pub fn new(state: TestTrackerState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// A tracker with the seed data from this module.
    pub fn seeded() -> Result<Self> {
        let tracker = Self::default();
        for entry in load_seed(INCOME_DATA, ENTRY_INCOME)?
            .into_iter()
            .chain(load_seed(EXPENSE_DATA, ENTRY_EXPENSE)?)
        {
            tracker.lock()?.record(&entry)?;
        }
        Ok(tracker)
    }

    pub fn state(&self) -> Result<TestTrackerState> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, TestTrackerState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("The test tracker state is poisoned"))
    }
}

impl TestTrackerState {
    fn client_mut(&mut self, client_id: &str) -> Result<&mut Client> {
        self.clients
            .iter_mut()
            .find(|c| c.id == client_id)
            .with_context(|| format!("Client '{client_id}' not found"))
    }

    /// Adds a visit to the client at `ix` and returns the transaction for it.
    fn visit(&mut self, ix: usize, service: &str, amount: Amount, date: Date) -> Transaction {
        let client = &mut self.clients[ix];
        let visit = Visit {
            id: generate_id("v"),
            visit_id: generate_id("visit"),
            date,
            service: service.to_string(),
            amount,
        };
        client.service = service.to_string();
        let transaction = Transaction::income(
            generate_id("t"),
            Some(client.id.clone()),
            date,
            amount,
            service,
        );
        self.visit_transactions
            .insert(visit.visit_id.clone(), transaction.id().to_string());
        client.visit_history.push(visit);
        self.transactions.insert(0, transaction.clone());
        transaction
    }

    fn record(&mut self, entry: &NewEntry) -> Result<Recorded> {
        match entry {
            NewEntry::Income {
                client_name,
                service,
                amount,
                date,
            } => {
                let date = date.unwrap_or_else(Date::now);
                let name = normalize_name(client_name);
                let ix = match self
                    .clients
                    .iter()
                    .position(|c| c.normalized_name() == name)
                {
                    Some(ix) => ix,
                    None => {
                        self.clients.insert(
                            0,
                            Client {
                                id: generate_id("c"),
                                name: client_name.trim().to_string(),
                                service: service.clone(),
                                date,
                                visit_history: Vec::new(),
                            },
                        );
                        0
                    }
                };
                let transaction = self.visit(ix, service, *amount, date);
                Ok(Recorded {
                    client: Some(self.clients[ix].clone()),
                    transaction,
                })
            }
            NewEntry::Expense {
                category,
                amount,
                date,
            } => {
                let transaction = Transaction::expense(
                    generate_id("t"),
                    date.unwrap_or_else(Date::now),
                    *amount,
                    Some(category.clone()),
                );
                self.transactions.insert(0, transaction.clone());
                Ok(Recorded {
                    client: None,
                    transaction,
                })
            }
        }
    }
}

#[async_trait::async_trait]
impl Tracker for TestTracker {
    async fn fetch_all(&self, filter: &Filter) -> Result<Collections> {
        trace!("fetch_all for {filter}");
        let state = self.lock()?;
        Ok(Collections {
            clients: state
                .clients
                .iter()
                .filter(|c| c.in_window(filter))
                .cloned()
                .collect(),
            transactions: state
                .transactions
                .iter()
                .filter(|t| filter.contains(t.date()))
                .cloned()
                .collect(),
        })
    }

    async fn add_entry(&self, entry: &NewEntry) -> Result<Recorded> {
        self.lock()?.record(entry)
    }

    async fn add_visit(&self, client_id: &str, visit: &VisitEntry) -> Result<Recorded> {
        let mut state = self.lock()?;
        let ix = state
            .clients
            .iter()
            .position(|c| c.id == client_id)
            .with_context(|| format!("Client '{client_id}' not found"))?;
        let date = visit.date.unwrap_or_else(Date::now);
        let transaction = state.visit(ix, &visit.service, visit.amount, date);
        Ok(Recorded {
            client: Some(state.clients[ix].clone()),
            transaction,
        })
    }

    async fn update_client(&self, client_id: &str, update: &ClientUpdate) -> Result<Edited> {
        let mut state = self.lock()?;
        match update {
            ClientUpdate::Rename { name } => {
                let client = state.client_mut(client_id)?;
                client.name = name.clone();
                Ok(Edited {
                    client: client.clone(),
                    updated_transaction: None,
                })
            }
            ClientUpdate::Visit {
                visit_id,
                service,
                amount,
            } => {
                let client = state.client_mut(client_id)?;
                let visit = client
                    .visit_history
                    .iter_mut()
                    .find(|v| &v.visit_id == visit_id)
                    .with_context(|| format!("Visit '{visit_id}' not found"))?;
                if let Some(service) = service {
                    visit.service = service.clone();
                }
                if let Some(amount) = amount {
                    visit.amount = *amount;
                }
                let (service, amount) = (visit.service.clone(), visit.amount);
                let client = client.clone();

                let transaction_id = state.visit_transactions.get(visit_id.as_str()).cloned();
                let updated_transaction = transaction_id.and_then(|id| {
                    let t = state.transactions.iter_mut().find(|t| t.id() == id)?;
                    t.set_service(service);
                    t.set_amount(amount);
                    Some(t.clone())
                });
                Ok(Edited {
                    client,
                    updated_transaction,
                })
            }
        }
    }

    async fn delete_client(&self, client_id: &str) -> Result<Deleted> {
        let mut state = self.lock()?;
        let before = state.clients.len();
        state.clients.retain(|c| c.id != client_id);
        if state.clients.len() == before {
            return Err(anyhow!("Client '{client_id}' not found"));
        }
        let before = state.transactions.len();
        state
            .transactions
            .retain(|t| t.client_id() != Some(client_id));
        Ok(Deleted {
            client_id: client_id.to_string(),
            transactions_deleted: (before - state.transactions.len()) as u64,
        })
    }

    async fn reset(&self) -> Result<Cleared> {
        let mut state = self.lock()?;
        let cleared = Cleared {
            clients_deleted: state.clients.len() as u64,
            transactions_deleted: state.transactions.len() as u64,
            expenses_deleted: state.transactions.iter().filter(|t| t.is_expense()).count() as u64,
        };
        *state = TestTrackerState::default();
        Ok(cleared)
    }
}

const ENTRY_INCOME: &str = "income";
const ENTRY_EXPENSE: &str = "expense";

/// One row of seed data. Income rows have a client and service, expense rows a category.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
struct SeedRow {
    #[serde(default)]
    client: String,
    #[serde(default)]
    service: String,
    #[serde(default)]
    category: String,
    amount: Amount,
    date: Date,
}

/// Loads entries from a CSV-formatted string with a header row.
fn load_seed(csv_data: &str, kind: &str) -> Result<Vec<NewEntry>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut entries = Vec::new();
    for result in rdr.deserialize() {
        let row: SeedRow = result.context("Unable to parse seed data")?;
        let entry = if kind == ENTRY_INCOME {
            NewEntry::Income {
                client_name: row.client,
                service: row.service,
                amount: row.amount,
                date: Some(row.date),
            }
        } else {
            NewEntry::Expense {
                category: row.category,
                amount: row.amount,
                date: Some(row.date),
            }
        };
        entries.push(entry);
    }
    Ok(entries)
}

/// Seed income, oldest first.
const INCOME_DATA: &str = r##"client,service,amount,date
Amara Okafor,Box Braids,120.00,2025-07-03
Jade Whitfield,Silk Press,65.00,2025-07-09
Priya Raman,Lash Lift,45.00,2025-07-15
Amara Okafor,Cornrows,60.00,2025-07-24
Sofia Marin,Silk Press,65.00,2025-08-02
Jade Whitfield,Wash & Blow Dry,35.00,2025-08-06
Nia Campbell,Knotless Braids,150.00,2025-08-14
Priya Raman,Brow Tint,20.00,2025-08-19
Amara Okafor,Box Braids,120.00,2025-08-30
Leah Morgan,Lash Lift,45.00,2025-09-05
Sofia Marin,Silk Press,65.00,2025-09-11
Nia Campbell,Cornrows,60.00,2025-09-20
Jade Whitfield,Silk Press,"£1,000.00",2025-09-27
Zoe Adeyemi,Knotless Braids,150.00,2025-10-02
Leah Morgan,Brow Tint,20.00,2025-10-08
"##;

/// Seed expenses, oldest first.
const EXPENSE_DATA: &str = r##"category,amount,date
Supplies,84.20,2025-07-05
Rent,650.00,2025-07-31
Utilities,72.15,2025-08-04
Supplies,46.90,2025-08-21
Rent,650.00,2025-08-31
Marketing,30.00,2025-09-10
Rent,650.00,2025-09-30
Supplies,58.35,2025-10-03
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Month;
    use std::str::FromStr;

    fn amount(v: &str) -> Amount {
        Amount::from_str(v).unwrap()
    }

    fn income(name: &str, service: &str, v: &str, date: &str) -> NewEntry {
        NewEntry::Income {
            client_name: name.into(),
            service: service.into(),
            amount: amount(v),
            date: Some(Date::from_str(date).unwrap()),
        }
    }

    #[test]
    fn test_seeded() {
        let state = TestTracker::seeded().unwrap().state().unwrap();
        assert_eq!(state.clients.len(), 7);
        assert_eq!(state.transactions.len(), 23);
        let amara = state
            .clients
            .iter()
            .find(|c| c.name == "Amara Okafor")
            .unwrap();
        assert_eq!(amara.visit_history.len(), 3);
        assert_eq!(amara.service, "Box Braids");
        let jade_total: Amount = state
            .transactions
            .iter()
            .filter(|t| t.client_id() == Some(state.clients.iter().find(|c| c.name == "Jade Whitfield").unwrap().id.as_str()))
            .map(|t| t.amount())
            .sum();
        assert_eq!(jade_total.fixed(), "1100.00");
    }

    #[tokio::test]
    async fn test_income_for_known_name_reuses_client() {
        let tracker = TestTracker::default();
        let first = tracker
            .add_entry(&income("Ada", "Cut", "40", "2025-10-01"))
            .await
            .unwrap();
        let second = tracker
            .add_entry(&income(" ada ", "Colour", "60", "2025-10-11"))
            .await
            .unwrap();
        let (first, second) = (first.client.unwrap(), second.client.unwrap());
        assert_eq!(first.id, second.id);
        assert_eq!(second.visit_history.len(), 2);
        assert_eq!(second.service, "Colour");
        assert_eq!(second.date, Date::from_str("2025-10-01").unwrap());
        assert_eq!(tracker.state().unwrap().transactions.len(), 2);
    }

    #[tokio::test]
    async fn test_edit_visit_updates_its_transaction() {
        let tracker = TestTracker::default();
        let recorded = tracker
            .add_entry(&income("Ada", "Cut", "40", "2025-10-01"))
            .await
            .unwrap();
        let client = recorded.client.unwrap();
        let update = ClientUpdate::Visit {
            visit_id: client.visit_history[0].visit_id.clone(),
            service: Some("Trim".into()),
            amount: Some(amount("35")),
        };
        let edited = tracker.update_client(&client.id, &update).await.unwrap();
        assert_eq!(edited.client.visit_history[0].amount, amount("35"));
        let t = edited.updated_transaction.unwrap();
        assert_eq!(t.id(), recorded.transaction.id());
        assert_eq!(t.amount(), amount("35"));
        assert_eq!(t.service(), Some("Trim"));
    }

    #[tokio::test]
    async fn test_delete_client_cascades() {
        let tracker = TestTracker::default();
        let a = tracker
            .add_entry(&income("Ada", "Cut", "40", "2025-10-01"))
            .await
            .unwrap();
        tracker
            .add_entry(&income("Bob", "Beard", "15", "2025-10-02"))
            .await
            .unwrap();
        let id = a.client.unwrap().id;
        let deleted = tracker.delete_client(&id).await.unwrap();
        assert_eq!(deleted.transactions_deleted, 1);
        let state = tracker.state().unwrap();
        assert_eq!(state.clients.len(), 1);
        assert!(state.transactions.iter().all(|t| t.client_id() != Some(id.as_str())));
        assert!(tracker.delete_client(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_applies_window() {
        let tracker = TestTracker::seeded().unwrap();
        let october = Filter::new(Month::Month(10), Some(2025));
        let data = tracker.fetch_all(&october).await.unwrap();
        assert!(data.transactions.iter().all(|t| t.date().month() == 10));
        let names: Vec<&str> = data.clients.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Zoe Adeyemi"));
        assert!(names.contains(&"Leah Morgan"));
    }

    #[tokio::test]
    async fn test_reset() {
        let tracker = TestTracker::seeded().unwrap();
        let cleared = tracker.reset().await.unwrap();
        assert_eq!(cleared.clients_deleted, 7);
        assert_eq!(cleared.expenses_deleted, 8);
        assert_eq!(tracker.state().unwrap(), TestTrackerState::default());
    }
}
