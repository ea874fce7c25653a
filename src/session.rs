//! The application state: the latest snapshot of the tracker's data and the submission guard.

use crate::api::{Cleared, Collections, Deleted, Edited, Recorded, Tracker};
use crate::model::{Amount, Client, ClientUpdate, Filter, NewEntry, Transaction, VisitEntry};
use crate::submit::{SingleFlight, SubmitState};
use crate::Result;
use anyhow::{anyhow, Context};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// The clients and transactions from the most recent fetch, as changed by later submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    filter: Filter,
    clients: Vec<Client>,
    transactions: Vec<Transaction>,
}

impl Snapshot {
    pub fn new(filter: Filter, collections: Collections) -> Self {
        Self {
            filter,
            clients: collections.clients,
            transactions: collections.transactions,
        }
    }

    /// The filter the snapshot was fetched with.
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn client(&self, client_id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == client_id)
    }

    /// Income transactions that cannot be paired with a visit of the same amount on the client
    /// they reference. Each visit pairs with at most one transaction.
    pub fn unreconciled_income(&self) -> Vec<&Transaction> {
        let mut unpaired: HashMap<&str, Vec<Amount>> = self
            .clients
            .iter()
            .map(|c| {
                let amounts = c.visit_history.iter().map(|v| v.amount).collect();
                (c.id.as_str(), amounts)
            })
            .collect();

        self.transactions
            .iter()
            .filter(|t| t.is_income())
            .filter(|t| {
                let Some(amounts) = t.client_id().and_then(|id| unpaired.get_mut(id)) else {
                    return true;
                };
                match amounts.iter().position(|a| *a == t.amount()) {
                    Some(ix) => {
                        amounts.swap_remove(ix);
                        false
                    }
                    None => true,
                }
            })
            .collect()
    }

    /// Replaces the client with the same id, or adds it to the front.
    fn upsert_client(&mut self, client: Client) {
        match self.clients.iter_mut().find(|c| c.id == client.id) {
            Some(existing) => *existing = client,
            None => self.clients.insert(0, client),
        }
    }

    fn replace_transaction(&mut self, transaction: Transaction) {
        if let Some(existing) = self
            .transactions
            .iter_mut()
            .find(|t| t.id() == transaction.id())
        {
            *existing = transaction;
        }
    }

    fn merge_recorded(&mut self, recorded: &Recorded) {
        if let Some(client) = &recorded.client {
            self.upsert_client(client.clone());
        }
        self.transactions.insert(0, recorded.transaction.clone());
    }

    fn merge_edited(&mut self, edited: &Edited) {
        self.upsert_client(edited.client.clone());
        if let Some(transaction) = &edited.updated_transaction {
            self.replace_transaction(transaction.clone());
        }
    }

    /// Removes the client and every transaction that references it.
    fn remove_client(&mut self, client_id: &str) {
        self.clients.retain(|c| c.id != client_id);
        self.transactions
            .retain(|t| t.client_id() != Some(client_id));
    }

    fn clear(&mut self) {
        self.clients.clear();
        self.transactions.clear();
    }
}

/// Holds the tracker, the current snapshot and the submission guard. Every mutation goes through
/// the guard and, when it succeeds, is merged into the snapshot.
pub struct Session {
    tracker: Box<dyn Tracker>,
    snapshot: Mutex<Snapshot>,
    flight: SingleFlight,
}

impl Session {
    pub fn new(tracker: Box<dyn Tracker>) -> Self {
        Self {
            tracker,
            snapshot: Mutex::new(Snapshot::default()),
            flight: SingleFlight::new(),
        }
    }

    /// Creates a session and fetches its first snapshot.
    pub async fn open(tracker: Box<dyn Tracker>, filter: Filter) -> Result<Self> {
        let session = Self::new(tracker);
        session.refresh(filter).await?;
        Ok(session)
    }

    /// Fetches the data for `filter` and replaces the whole snapshot with it.
    pub async fn refresh(&self, filter: Filter) -> Result<()> {
        let collections = self
            .tracker
            .fetch_all(&filter)
            .await
            .with_context(|| format!("Unable to fetch the ledger for {filter}"))?;
        debug!(
            "Fetched {} clients and {} transactions for {filter}",
            collections.clients.len(),
            collections.transactions.len()
        );
        *self.lock()? = Snapshot::new(filter, collections);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.lock()?.clone())
    }

    pub fn submit_state(&self) -> SubmitState {
        self.flight.state()
    }

    /// Validates and submits a new income or expense entry.
    pub async fn add_entry(&self, entry: NewEntry) -> Result<Recorded> {
        let entry = entry.validated()?;
        let recorded = self
            .flight
            .run(self.tracker.add_entry(&entry))
            .await?;
        self.lock()?.merge_recorded(&recorded);
        info!("Recorded transaction {}", recorded.transaction.id());
        Ok(recorded)
    }

    /// Validates and submits a further visit for `client_id`.
    pub async fn add_visit(&self, client_id: &str, visit: VisitEntry) -> Result<Recorded> {
        let visit = visit.validated()?;
        let recorded = self
            .flight
            .run(self.tracker.add_visit(client_id, &visit))
            .await?;
        self.lock()?.merge_recorded(&recorded);
        info!("Recorded a visit for client {client_id}");
        Ok(recorded)
    }

    pub async fn update_client(&self, client_id: &str, update: ClientUpdate) -> Result<Edited> {
        let update = update.validated()?;
        let edited = self
            .flight
            .run(self.tracker.update_client(client_id, &update))
            .await?;
        self.lock()?.merge_edited(&edited);
        Ok(edited)
    }

    pub async fn delete_client(&self, client_id: &str) -> Result<Deleted> {
        let deleted = self
            .flight
            .run(self.tracker.delete_client(client_id))
            .await?;
        self.lock()?.remove_client(client_id);
        Ok(deleted)
    }

    pub async fn reset(&self) -> Result<Cleared> {
        let cleared = self.flight.run(self.tracker.reset()).await?;
        self.lock()?.clear();
        Ok(cleared)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Snapshot>> {
        self.snapshot
            .lock()
            .map_err(|_| anyhow!("The session snapshot is poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TestTracker, TestTrackerState};
    use crate::model::{Date, Month, Visit};
    use std::str::FromStr;
    use std::sync::Arc;
    use tokio::sync::Semaphore;

    fn amount(v: &str) -> Amount {
        Amount::from_str(v).unwrap()
    }

    fn income(name: &str, v: &str, date: &str) -> NewEntry {
        NewEntry::Income {
            client_name: name.into(),
            service: "Cut".into(),
            amount: amount(v),
            date: Some(Date::from_str(date).unwrap()),
        }
    }

    /// Holds `add_entry` until a permit is added to `gate`.
    struct GatedTracker {
        inner: TestTracker,
        gate: Arc<Semaphore>,
    }

    #[async_trait::async_trait]
    impl Tracker for GatedTracker {
        async fn fetch_all(&self, filter: &Filter) -> Result<Collections> {
            self.inner.fetch_all(filter).await
        }

        async fn add_entry(&self, entry: &NewEntry) -> Result<Recorded> {
            let _permit = self.gate.acquire().await?;
            self.inner.add_entry(entry).await
        }

        async fn add_visit(&self, client_id: &str, visit: &VisitEntry) -> Result<Recorded> {
            self.inner.add_visit(client_id, visit).await
        }

        async fn update_client(&self, client_id: &str, update: &ClientUpdate) -> Result<Edited> {
            self.inner.update_client(client_id, update).await
        }

        async fn delete_client(&self, client_id: &str) -> Result<Deleted> {
            self.inner.delete_client(client_id).await
        }

        async fn reset(&self) -> Result<Cleared> {
            self.inner.reset().await
        }
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot() {
        let session = Session::open(Box::new(TestTracker::seeded().unwrap()), Filter::all())
            .await
            .unwrap();
        assert_eq!(session.snapshot().unwrap().transactions().len(), 23);

        let october = Filter::new(Month::Month(10), Some(2025));
        session.refresh(october).await.unwrap();
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.filter(), &october);
        assert!(snapshot
            .transactions()
            .iter()
            .all(|t| t.date().month() == 10));
    }

    #[tokio::test]
    async fn test_add_entry_merges_response() {
        let session = Session::new(Box::new(TestTracker::default()));
        let first = session.add_entry(income("Ada", "40", "2025-10-01")).await.unwrap();
        session.add_entry(income("ada", "60", "2025-10-11")).await.unwrap();
        session
            .add_entry(NewEntry::Expense {
                category: "Supplies".into(),
                amount: amount("10"),
                date: None,
            })
            .await
            .unwrap();

        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.clients().len(), 1);
        assert_eq!(snapshot.clients()[0].visit_history.len(), 2);
        assert_eq!(snapshot.transactions().len(), 3);
        assert!(snapshot.transactions()[0].is_expense());
        assert_eq!(
            snapshot.transactions()[2].id(),
            first.transaction.id()
        );
        assert!(snapshot.unreconciled_income().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_entry_is_rejected_before_the_tracker() {
        let session = Session::new(Box::new(TestTracker::default()));
        let result = session.add_entry(income("  ", "40", "2025-10-01")).await;
        assert!(result.is_err());
        let result = session.add_entry(income("Ada", "-5", "2025-10-01")).await;
        assert!(result.is_err());
        session.refresh(Filter::all()).await.unwrap();
        assert!(session.snapshot().unwrap().transactions().is_empty());
        assert_eq!(session.submit_state(), SubmitState::Idle);
    }

    #[tokio::test]
    async fn test_second_submission_while_in_flight_is_rejected() {
        let gate = Arc::new(Semaphore::new(0));
        let session = Session::new(Box::new(GatedTracker {
            inner: TestTracker::default(),
            gate: gate.clone(),
        }));

        let first = session.add_entry(income("Ada", "40", "2025-10-01"));
        let second = async {
            let result = session.add_entry(income("Bob", "15", "2025-10-02")).await;
            gate.add_permits(1);
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err().to_string(), "busy");
        session.refresh(Filter::all()).await.unwrap();
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.clients().len(), 1);
        assert_eq!(snapshot.clients()[0].name, "Ada");
        assert_eq!(session.submit_state(), SubmitState::Idle);
    }

    #[tokio::test]
    async fn test_delete_client_removes_its_transactions() {
        let session = Session::open(Box::new(TestTracker::seeded().unwrap()), Filter::all())
            .await
            .unwrap();
        let snapshot = session.snapshot().unwrap();
        let amara = snapshot
            .clients()
            .iter()
            .find(|c| c.name == "Amara Okafor")
            .unwrap();
        let before = snapshot.transactions().len();

        let deleted = session.delete_client(&amara.id).await.unwrap();
        assert_eq!(deleted.transactions_deleted, 3);

        let after = session.snapshot().unwrap();
        assert!(after.client(&amara.id).is_none());
        assert_eq!(after.transactions().len(), before - 3);
        assert!(after
            .transactions()
            .iter()
            .all(|t| t.client_id() != Some(amara.id.as_str())));
    }

    #[tokio::test]
    async fn test_edit_visit_replaces_transaction() {
        let session = Session::new(Box::new(TestTracker::default()));
        let recorded = session.add_entry(income("Ada", "40", "2025-10-01")).await.unwrap();
        let client = recorded.client.unwrap();
        session
            .update_client(
                &client.id,
                ClientUpdate::Visit {
                    visit_id: client.visit_history[0].visit_id.clone(),
                    service: None,
                    amount: Some(amount("45")),
                },
            )
            .await
            .unwrap();
        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.transactions().len(), 1);
        assert_eq!(snapshot.transactions()[0].amount(), amount("45"));
        assert_eq!(snapshot.clients()[0].visit_history[0].amount, amount("45"));
    }

    #[tokio::test]
    async fn test_failed_submission_leaves_snapshot() {
        let session = Session::new(Box::new(TestTracker::default()));
        let result = session
            .update_client("missing", ClientUpdate::Rename { name: "Ada".into() })
            .await;
        assert!(result.is_err());
        assert_eq!(session.snapshot().unwrap(), Snapshot::default());
        assert_eq!(session.submit_state(), SubmitState::Idle);
    }

    #[tokio::test]
    async fn test_reset_clears_snapshot() {
        let session = Session::open(Box::new(TestTracker::seeded().unwrap()), Filter::all())
            .await
            .unwrap();
        session.reset().await.unwrap();
        let snapshot = session.snapshot().unwrap();
        assert!(snapshot.clients().is_empty());
        assert!(snapshot.transactions().is_empty());
    }

    #[test]
    fn test_unreconciled_income() {
        let day = |s: &str| Date::from_str(s).unwrap();
        let visit = |id: &str, v: &str| Visit {
            id: id.into(),
            visit_id: id.into(),
            date: day("2025-10-01"),
            service: "Cut".into(),
            amount: amount(v),
        };
        let state = TestTrackerState {
            clients: vec![Client {
                id: "c1".into(),
                name: "Ada".into(),
                service: "Cut".into(),
                date: day("2025-10-01"),
                visit_history: vec![visit("v1", "40"), visit("v2", "40")],
            }],
            transactions: vec![
                Transaction::income("t1", Some("c1".into()), day("2025-10-01"), amount("40"), "Cut"),
                Transaction::income("t2", Some("c1".into()), day("2025-10-02"), amount("40"), "Cut"),
                Transaction::income("t3", Some("c1".into()), day("2025-10-03"), amount("40"), "Cut"),
                Transaction::income("t4", Some("c9".into()), day("2025-10-03"), amount("5"), "Cut"),
                Transaction::income("t5", None, day("2025-10-03"), amount("5"), "Cut"),
                Transaction::expense("t6", day("2025-10-03"), amount("5"), None),
            ],
            visit_transactions: HashMap::new(),
        };
        let snapshot = Snapshot::new(
            Filter::all(),
            Collections {
                clients: state.clients,
                transactions: state.transactions,
            },
        );
        let ids: Vec<&str> = snapshot
            .unreconciled_income()
            .into_iter()
            .map(|t| t.id())
            .collect();
        assert_eq!(ids, vec!["t3", "t4", "t5"]);
    }
}
